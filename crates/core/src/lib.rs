// PinLab - GPIO Controller Simulation Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod controller;
pub mod dispatch;
pub mod regs;
pub mod signals;
pub mod variant;

pub use controller::GpioController;
pub use signals::{IrqLine, Level};
pub use variant::{ChipModel, Variant};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("variant '{variant}' is inconsistent: {reason}")]
    InvalidVariant {
        variant: &'static str,
        reason: String,
    },
    #[error("snapshot restore failed: {0}")]
    RestoreError(String),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait representing a memory-mapped peripheral as seen by the host platform.
///
/// The controller modeled here only accepts 4-byte accesses, so the bus-facing
/// surface is word-granular. Guest-visible faults (bad offset, bad size) never
/// surface as errors: reads yield zero and writes are discarded, so the trait
/// methods are infallible by design.
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&self, offset: u64, size: u32) -> u32;
    fn write(&mut self, offset: u64, size: u32, value: u32);
    fn reset(&mut self);
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
    fn restore(&mut self, _state: serde_json::Value) -> SimResult<()> {
        Ok(())
    }
}
