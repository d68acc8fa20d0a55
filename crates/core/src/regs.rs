// PinLab - GPIO Controller Simulation Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// Only bits 0, 8, 16 and 24 of the command-source registers are writable:
/// one bit per 8-pin group.
pub const CMD_SRC_MASK: u32 = 0x0101_0101;

/// Logical owner of an 8-pin group, encoded across the two command-source
/// registers. Only the ARM core is modeled as an active source; groups owned
/// by the LPC bus or the coprocessor reject processor writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Arm = 0,
    Lpc = 1,
    Coprocessor = 2,
    Reserved = 3,
}

// Interrupt sensitivity codes, assembled from the three sensitivity registers
// (bit b of int_sens_0 is code bit 0, and so on).
pub const SENS_FALLING_EDGE: u32 = 0;
pub const SENS_RISING_EDGE: u32 = 1;
pub const SENS_LEVEL_LOW: u32 = 2;
pub const SENS_LEVEL_HIGH: u32 = 3;
pub const SENS_DUAL_EDGE: u32 = 4;

/// One bank of registers controlling up to 32 pins.
///
/// Every field is architectural state and is carried verbatim through
/// snapshot/restore. The debounce-select registers are stored but inert:
/// debounce timing is explicitly unmodeled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSet {
    /// Committed, processor-visible pin state.
    pub data_value: u32,
    /// Shadow of the last externally-asserted or written level, pre-commit.
    pub data_read: u32,
    /// 1 = output.
    pub direction: u32,
    pub int_enable: u32,
    pub int_sens_0: u32,
    pub int_sens_1: u32,
    pub int_sens_2: u32,
    /// Sticky; a bit stays set until cleared by a status-register write.
    pub int_status: u32,
    pub reset_tol: u32,
    pub cmd_source_0: u32,
    pub cmd_source_1: u32,
    pub debounce_1: u32,
    pub debounce_2: u32,
    /// 1 = pin excluded from value commitment and interrupt evaluation.
    pub input_mask: u32,
}

impl RegisterSet {
    /// Owner code of the 8-pin group containing `bit`.
    pub fn group_owner(&self, bit: u32) -> u32 {
        let group_bit = bit & !7;
        ((self.cmd_source_0 >> group_bit) & 1) | (((self.cmd_source_1 >> group_bit) & 1) << 1)
    }

    /// Merge a processor write against the current value, group by group.
    ///
    /// Each 8-bit group takes its bits from `value` only if the group is
    /// owned by the ARM source; otherwise it keeps the bits from `old`.
    pub fn arbitrate(&self, old: u32, value: u32) -> u32 {
        let mut merged = 0;
        for shift in (0..32).step_by(8) {
            let group = 0xffu32 << shift;
            if self.group_owner(shift) == CommandSource::Arm as u32 {
                merged |= group & value;
            } else {
                merged |= group & old;
            }
        }
        merged
    }

    /// Sensitivity code for one pin.
    pub fn sensitivity(&self, bit: u32) -> u32 {
        ((self.int_sens_0 >> bit) & 1)
            | (((self.int_sens_1 >> bit) & 1) << 1)
            | (((self.int_sens_2 >> bit) & 1) << 2)
    }

    /// Evaluate the interrupt trigger for `bit` after its committed value may
    /// have changed. Sets the sticky status bit and reports whether a
    /// triggering event occurred.
    ///
    /// Level triggers fire on the transition that produced the level, not on
    /// every re-evaluation: the caller only visits bits that changed.
    pub fn evaluate_trigger(&mut self, bit: u32, prev_high: bool) -> bool {
        let curr_high = (self.data_value >> bit) & 1 != 0;
        let rising = curr_high && !prev_high;
        let falling = !curr_high && prev_high;

        let fired = match self.sensitivity(bit) {
            SENS_FALLING_EDGE => falling,
            SENS_RISING_EDGE => rising,
            SENS_LEVEL_LOW => !curr_high,
            SENS_LEVEL_HIGH => curr_high,
            // Dual edge; undefined codes behave the same.
            _ => rising || falling,
        };

        if fired {
            self.int_status |= 1 << bit;
        }
        fired
    }
}
