//! Core traits and types for Z180 single-board-computer emulation.
//!
//! The CPU executes whole instructions and reports the virtual cycles each
//! one consumed. All component timing derives from that cycle count.

mod bus;
mod cpu;
mod cycles;
mod device;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use cycles::Cycles;
pub use device::Device;
