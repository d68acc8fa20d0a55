// PinLab - GPIO Controller Simulation Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::dispatch::{build_dispatch, RegEntry, RegKind};
use crate::regs::{RegisterSet, CMD_SRC_MASK};
use crate::signals::{IrqLine, Level};
use crate::variant::{ChipModel, Variant};
use crate::{Peripheral, SimResult, SimulationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot payload: the architectural register contents, nothing derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ControllerState {
    sets: Vec<RegisterSet>,
    debounce_time: [u32; 3],
}

/// One instance of the multi-bank GPIO controller.
///
/// All mutation flows through the dispatch/arbiter/evaluator pipeline: a bus
/// write is masked by the set's capabilities, merged by command-source
/// ownership, committed, and the interrupt evaluator runs over every bit of
/// committed state that changed. External pin stimulus enters the same path
/// through the data-read shadow.
#[derive(Debug)]
pub struct GpioController {
    variant: &'static Variant,
    sets: Vec<RegisterSet>,
    dispatch: HashMap<u64, RegEntry>,
    /// Shared debounce timers. Stored but inert: debounce timing is unmodeled.
    debounce_time: [u32; 3],
    pin_names: HashMap<String, u32>,
    /// One interrupt output per physical pin.
    outputs: Vec<IrqLine>,
    /// Controller-level summary IRQ, pulsed once per triggering event.
    irq: IrqLine,
}

impl GpioController {
    pub fn new(model: ChipModel) -> SimResult<Self> {
        Self::with_variant(model.descriptor())
    }

    pub fn with_variant(variant: &'static Variant) -> SimResult<Self> {
        variant.validate()?;
        let dispatch = build_dispatch(variant)?;

        let mut pin_names = HashMap::new();
        for pin in 0..variant.nr_pins {
            if let Some(name) = variant.pin_name(pin) {
                pin_names.insert(name, pin);
            }
        }

        Ok(Self {
            variant,
            sets: vec![RegisterSet::default(); variant.total_sets()],
            dispatch,
            debounce_time: [0; 3],
            pin_names,
            outputs: vec![IrqLine::new(); variant.nr_pins as usize],
            irq: IrqLine::new(),
        })
    }

    pub fn variant(&self) -> &'static Variant {
        self.variant
    }

    pub fn irq(&self) -> &IrqLine {
        &self.irq
    }

    pub fn clear_irq(&mut self) {
        self.irq.clear();
    }

    pub fn output(&self, pin: u32) -> Option<&IrqLine> {
        self.outputs.get(pin as usize)
    }

    pub fn register_set(&self, set: usize) -> Option<&RegisterSet> {
        self.sets.get(set)
    }

    /// Commit pending data-read levels of one set into data_value and run the
    /// trigger evaluator over every bit that changed.
    ///
    /// A bit is committed iff it differs between the shadow and the committed
    /// value, its direction bit is set, and its input-mask bit is clear.
    fn refresh_set(&mut self, set_idx: usize) {
        let diff = self.sets[set_idx].data_value ^ self.sets[set_idx].data_read;
        if diff == 0 || self.sets[set_idx].direction == 0 {
            return;
        }

        for bit in 0..32u32 {
            let mask = 1u32 << bit;
            if diff & mask == 0 {
                continue;
            }
            let regs = &mut self.sets[set_idx];
            if regs.direction & mask == 0 || regs.input_mask & mask != 0 {
                continue;
            }
            let prev_high = regs.data_value & mask != 0;
            if prev_high {
                regs.data_value &= !mask;
            } else {
                regs.data_value |= mask;
            }
            let fired = regs.evaluate_trigger(bit, prev_high);
            if fired && self.sets[set_idx].int_enable & mask != 0 {
                if let Some(pin) = self.variant.pin_from_set_bit(set_idx, bit) {
                    self.outputs[pin as usize].raise();
                }
                self.irq.raise();
            }
        }
    }

    fn write_set_reg(&mut self, entry: RegEntry, value: u32) {
        let caps = &self.variant.sets[entry.set];
        let value = value & caps.writable();
        let set = entry.set;
        let regs = &mut self.sets[set];

        match entry.kind {
            RegKind::DataValue => {
                // Software writes land in the data-read shadow; commitment is
                // direction-gated like any other stimulus.
                let v = value & (caps.output | !caps.input);
                regs.data_read = regs.arbitrate(regs.data_read, v);
                self.refresh_set(set);
            }
            RegKind::Direction => {
                let v = value & (caps.output | !caps.input);
                regs.direction = regs.arbitrate(regs.direction, v);
                self.refresh_set(set);
            }
            RegKind::IntEnable => {
                regs.int_enable = regs.arbitrate(regs.int_enable, value);
                self.refresh_set(set);
            }
            RegKind::IntSens0 => {
                regs.int_sens_0 = regs.arbitrate(regs.int_sens_0, value);
                self.refresh_set(set);
            }
            RegKind::IntSens1 => {
                regs.int_sens_1 = regs.arbitrate(regs.int_sens_1, value);
                self.refresh_set(set);
            }
            RegKind::IntSens2 => {
                regs.int_sens_2 = regs.arbitrate(regs.int_sens_2, value);
                self.refresh_set(set);
            }
            RegKind::IntStatus => {
                // Taken literally: this is how software clears sticky bits.
                regs.int_status = value;
                self.refresh_set(set);
            }
            RegKind::ResetTolerant => {
                regs.reset_tol = regs.arbitrate(regs.reset_tol, value);
            }
            RegKind::Debounce1 => {
                regs.debounce_1 = regs.arbitrate(regs.debounce_1, value);
            }
            RegKind::Debounce2 => {
                regs.debounce_2 = regs.arbitrate(regs.debounce_2, value);
            }
            RegKind::CmdSource0 => {
                regs.cmd_source_0 = value & CMD_SRC_MASK;
            }
            RegKind::CmdSource1 => {
                regs.cmd_source_1 = value & CMD_SRC_MASK;
            }
            RegKind::InputMask => {
                regs.input_mask = value & caps.input;
                self.refresh_set(set);
            }
            // Handled by the caller before reaching here.
            RegKind::DataRead
            | RegKind::DebounceTime1
            | RegKind::DebounceTime2
            | RegKind::DebounceTime3 => {}
        }
    }

    /// Read the committed logical level of a pin.
    pub fn pin_level(&self, pin: u32) -> bool {
        if pin >= self.variant.nr_pins {
            tracing::warn!("pin {} out of range for {}", pin, self.variant.name);
            return false;
        }
        let (set, bit) = self.variant.pin_to_set_bit(pin);
        (self.sets[set].data_value >> bit) & 1 != 0
    }

    /// Drive a pin from outside the controller. This is how external stimulus
    /// reaches software; pins configured as outputs ignore it at commit time.
    pub fn set_pin_level(&mut self, pin: u32, level: Level) {
        if pin >= self.variant.nr_pins {
            tracing::warn!("pin {} out of range for {}", pin, self.variant.name);
            return;
        }
        let (set, bit) = self.variant.pin_to_set_bit(pin);
        let mask = 1u32 << bit;
        if level.is_high() {
            self.sets[set].data_read |= mask;
        } else {
            self.sets[set].data_read &= !mask;
        }
        self.refresh_set(set);
    }

    pub fn pin_by_name(&self, name: &str) -> Option<u32> {
        self.pin_names.get(name).copied()
    }

    /// Boolean property get: `gpio<GroupLabel><IndexWithinGroup>`.
    pub fn get_named_pin(&self, name: &str) -> bool {
        match self.pin_by_name(name) {
            Some(pin) => self.pin_level(pin),
            None => {
                tracing::warn!("unknown pin property '{}'", name);
                false
            }
        }
    }

    /// Boolean property set, routed through the external pin-level path.
    pub fn set_named_pin(&mut self, name: &str, level: Level) {
        match self.pin_by_name(name) {
            Some(pin) => self.set_pin_level(pin, level),
            None => tracing::warn!("unknown pin property '{}'", name),
        }
    }
}

impl Peripheral for GpioController {
    fn read(&self, offset: u64, size: u32) -> u32 {
        if size != 4 {
            tracing::warn!("unsupported {}-byte read at {:#x}", size, offset);
            return 0;
        }
        let Some(&entry) = self.dispatch.get(&offset) else {
            tracing::warn!("read of unmapped register at {:#x}", offset);
            return 0;
        };

        match entry.kind {
            RegKind::DebounceTime1 => return self.debounce_time[0],
            RegKind::DebounceTime2 => return self.debounce_time[1],
            RegKind::DebounceTime3 => return self.debounce_time[2],
            _ => {}
        }

        let regs = &self.sets[entry.set];
        match entry.kind {
            RegKind::DataValue => regs.data_value,
            RegKind::Direction => regs.direction,
            RegKind::IntEnable => regs.int_enable,
            RegKind::IntSens0 => regs.int_sens_0,
            RegKind::IntSens1 => regs.int_sens_1,
            RegKind::IntSens2 => regs.int_sens_2,
            RegKind::IntStatus => regs.int_status,
            RegKind::ResetTolerant => regs.reset_tol,
            RegKind::Debounce1 => regs.debounce_1,
            RegKind::Debounce2 => regs.debounce_2,
            RegKind::CmdSource0 => regs.cmd_source_0,
            RegKind::CmdSource1 => regs.cmd_source_1,
            RegKind::DataRead => regs.data_read,
            RegKind::InputMask => regs.input_mask,
            _ => 0,
        }
    }

    fn write(&mut self, offset: u64, size: u32, value: u32) {
        if size != 4 {
            tracing::warn!("unsupported {}-byte write at {:#x}", size, offset);
            return;
        }
        let Some(&entry) = self.dispatch.get(&offset) else {
            tracing::warn!("write to unmapped register at {:#x}", offset);
            return;
        };

        match entry.kind {
            RegKind::DebounceTime1 => self.debounce_time[0] = value,
            RegKind::DebounceTime2 => self.debounce_time[1] = value,
            RegKind::DebounceTime3 => self.debounce_time[2] = value,
            RegKind::DataRead => {
                tracing::warn!("write to read-only data-read register at {:#x}", offset);
            }
            _ => self.write_set_reg(entry, value),
        }
    }

    fn reset(&mut self) {
        // Deliberate deviation from hardware: reset-tolerant latches are not
        // preserved across a platform reset.
        self.sets.fill(RegisterSet::default());
        self.debounce_time = [0; 3];
        for line in &mut self.outputs {
            line.clear();
        }
        self.irq.clear();
    }

    fn snapshot(&self) -> serde_json::Value {
        let state = ControllerState {
            sets: self.sets.clone(),
            debounce_time: self.debounce_time,
        };
        serde_json::to_value(&state).unwrap_or(serde_json::Value::Null)
    }

    fn restore(&mut self, state: serde_json::Value) -> SimResult<()> {
        let state: ControllerState = serde_json::from_value(state)
            .map_err(|e| SimulationError::RestoreError(e.to_string()))?;
        if state.sets.len() != self.sets.len() {
            return Err(SimulationError::RestoreError(format!(
                "snapshot has {} register sets, {} expects {}",
                state.sets.len(),
                self.variant.name,
                self.sets.len()
            )));
        }
        self.sets = state.sets;
        self.debounce_time = state.debounce_time;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::AST2500;

    fn controller() -> GpioController {
        GpioController::new(ChipModel::Ast2500).unwrap()
    }

    #[test]
    fn test_reset_values_are_zero() {
        let c = controller();
        for set in 0..AST2500.total_sets() {
            assert_eq!(*c.register_set(set).unwrap(), RegisterSet::default());
        }
    }

    #[test]
    fn test_access_size_faults_are_benign() {
        let mut c = controller();
        assert_eq!(c.read(0x000, 2), 0);
        c.write(0x004, 1, 0xff);
        assert_eq!(c.register_set(0).unwrap().direction, 0);
    }

    #[test]
    fn test_unmapped_offset_faults_are_benign() {
        let mut c = controller();
        assert_eq!(c.read(0x3f0, 4), 0);
        c.write(0x3f0, 4, 0xffff_ffff);
        // Secondary bank is absent on the ast2500.
        assert_eq!(c.read(0x800, 4), 0);
        c.write(0x800, 4, 1);
        for set in 0..AST2500.total_sets() {
            assert_eq!(*c.register_set(set).unwrap(), RegisterSet::default());
        }
    }

    #[test]
    fn test_data_read_register_is_read_only() {
        let mut c = controller();
        c.set_pin_level(0, Level::High);
        assert_eq!(c.read(0x0C0, 4), 1);
        c.write(0x0C0, 4, 0xffff_fffe);
        assert_eq!(c.read(0x0C0, 4), 1);
    }

    #[test]
    fn test_direction_gates_commitment() {
        let mut c = controller();
        c.set_pin_level(3, Level::High);
        // Input-configured (direction 0): shadow updated, nothing committed.
        assert!(!c.pin_level(3));
        assert_eq!(c.register_set(0).unwrap().data_read, 1 << 3);

        c.write(0x004, 4, 1 << 3);
        // Direction flip commits the pending shadow level.
        assert!(c.pin_level(3));
    }

    #[test]
    fn test_input_mask_excludes_pin() {
        let mut c = controller();
        c.write(0x004, 4, 0x3); // pins 0,1 output
        c.write(0x1D0, 4, 0x1); // mask pin 0
        c.set_pin_level(0, Level::High);
        c.set_pin_level(1, Level::High);
        assert!(!c.pin_level(0));
        assert!(c.pin_level(1));
    }

    #[test]
    fn test_interrupt_output_requires_enable() {
        let mut c = controller();
        c.write(0x004, 4, 0x3); // output
        c.write(0x00C, 4, 0x3); // rising edge for pins 0,1
        c.write(0x008, 4, 0x1); // enable only pin 0

        c.set_pin_level(0, Level::High);
        c.set_pin_level(1, Level::High);

        // Both status bits latch; only the enabled pin pulses its line.
        assert_eq!(c.register_set(0).unwrap().int_status, 0x3);
        assert_eq!(c.output(0).unwrap().pulses(), 1);
        assert_eq!(c.output(1).unwrap().pulses(), 0);
        assert_eq!(c.irq().pulses(), 1);
    }

    #[test]
    fn test_status_is_sticky_until_cleared() {
        let mut c = controller();
        c.write(0x004, 4, 0x1);
        c.write(0x00C, 4, 0x1); // rising
        c.set_pin_level(0, Level::High);
        c.set_pin_level(0, Level::Low);
        assert_eq!(c.register_set(0).unwrap().int_status, 0x1);
        c.write(0x018, 4, 0x0);
        assert_eq!(c.register_set(0).unwrap().int_status, 0x0);
    }

    #[test]
    fn test_named_pin_properties() {
        let mut c = controller();
        c.write(0x004, 4, 0xffff_ffff);
        c.set_named_pin("gpioB2", Level::High);
        assert!(c.get_named_pin("gpioB2"));
        assert!(c.pin_level(10));
        // Unknown names are benign.
        assert!(!c.get_named_pin("gpioXYZ9"));
        c.set_named_pin("gpio??", Level::High);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut c = controller();
        c.write(0x004, 4, 0x0000_00f0);
        c.write(0x060, 4, 0xffff_ffff);
        c.write(0x050, 4, 0x1234);
        let snap = c.snapshot();

        let mut fresh = controller();
        fresh.restore(snap).unwrap();
        assert_eq!(fresh.register_set(0).unwrap().direction, 0x0000_00f0);
        assert_eq!(fresh.register_set(0).unwrap().cmd_source_0, CMD_SRC_MASK);
        assert_eq!(fresh.read(0x050, 4), 0x1234);
    }

    #[test]
    fn test_restore_rejects_wrong_shape() {
        let mut c = controller();
        let snap = serde_json::json!({ "sets": [], "debounce_time": [0, 0, 0] });
        assert!(c.restore(snap).is_err());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut c = controller();
        c.write(0x004, 4, 0xffff_ffff);
        c.write(0x01C, 4, 0xffff_ffff); // reset-tolerant bits are not preserved
        c.write(0x050, 4, 77);
        c.reset();
        assert_eq!(*c.register_set(0).unwrap(), RegisterSet::default());
        assert_eq!(c.read(0x050, 4), 0);
    }
}
