// PinLab - GPIO Controller Simulation Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Logical level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(b: bool) -> Self {
        if b {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

/// An interrupt line driven by the controller.
///
/// The line latches asserted until the consumer clears it; `pulses` counts
/// every assertion so tests can verify one pulse per triggering event.
#[derive(Debug, Clone, Default)]
pub struct IrqLine {
    asserted: bool,
    pulses: u64,
}

impl IrqLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self) {
        self.asserted = true;
        self.pulses += 1;
    }

    pub fn clear(&mut self) {
        self.asserted = false;
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }
}
