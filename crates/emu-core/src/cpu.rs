//! CPU core trait.

use crate::{Bus, Cycles};

/// A CPU that executes instructions against a bus.
///
/// The type parameter `B` is the bus type this CPU operates on.
pub trait Cpu<B: Bus> {
    /// Execute one instruction (or one halted idle step, or one interrupt
    /// acceptance). Returns the virtual cycles consumed.
    fn step(&mut self, bus: &mut B) -> u32;

    /// Reset the CPU to its initial state.
    fn reset(&mut self);

    /// Current program counter.
    fn pc(&self) -> u16;

    /// True if the CPU has executed HALT and not yet been woken.
    fn is_halted(&self) -> bool;

    /// Total virtual cycles elapsed since creation.
    fn cycles(&self) -> Cycles;
}
