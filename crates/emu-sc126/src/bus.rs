//! SC126 bus: memory through the MMU, ports through the Z180 window.

use emu_core::{Bus, Device};
use zilog_z180::{IoPorts, Mmu};

/// The SC126 bus, implementing `emu_core::Bus`.
///
/// Owns the MMU (with its ROM/RAM backing) and the I/O dispatcher (with
/// the on-chip peripherals and external device registry). The CPU
/// reaches all of these through the `Bus` trait.
pub struct Sc126Bus {
    pub mmu: Mmu,
    pub io: IoPorts,
}

impl Sc126Bus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mmu: Mmu::new(),
            io: IoPorts::new(),
        }
    }

    /// Register an external device at an 8-bit port.
    pub fn register_device(&mut self, port: u8, device: Box<dyn Device>) {
        self.io.register_device(port, device);
    }
}

impl Default for Sc126Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for Sc126Bus {
    fn read(&mut self, address: u16) -> u8 {
        self.mmu.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.mmu.write(address, value);
    }

    fn read_io(&mut self, port: u16) -> u8 {
        self.io.read(port, &self.mmu)
    }

    fn write_io(&mut self, port: u16, value: u8) {
        self.io.write(port, value, &mut self.mmu);
    }

    fn pending_interrupt(&mut self) -> Option<u8> {
        self.io.pending_vector()
    }
}
