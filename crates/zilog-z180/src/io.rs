//! The Z180 internal I/O window and external port dispatch.
//!
//! On-chip peripheral registers occupy a 64-byte window in the 8-bit
//! port space, relocatable to any 0x40 boundary through the ICR. Ports
//! outside the window route to externally registered devices. The
//! dispatcher also arbitrates the pending interrupt vector.
//!
//! Offsets the dispatcher does not intercept are backed by a plain
//! register file, so firmware probing reserved registers reads back what
//! it wrote.

use std::collections::HashMap;

use emu_core::Device;

use crate::asci::Asci;
use crate::mmu::Mmu;
use crate::prt::Prt;

/// Internal register file offset of IL, the interrupt vector low register.
pub const IL_OFFSET: u8 = 0x33;

/// Vector low bits for PRT channel 0.
pub const VECTOR_PRT0: u8 = 0x04;

/// Vector low bits for PRT channel 1.
pub const VECTOR_PRT1: u8 = 0x06;

/// Vector low bits for ASCI channel 0.
pub const VECTOR_ASCI0: u8 = 0x0E;

/// Internal I/O window plus external device registry.
pub struct IoPorts {
    /// Window base; always one of 0x00, 0x40, 0x80, 0xC0.
    base: u8,
    /// Backing store for offsets nothing else claims.
    regs: [u8; 64],
    pub asci0: Asci,
    pub asci1: Asci,
    pub prt: Prt,
    devices: HashMap<u8, Box<dyn Device>>,
}

impl IoPorts {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: 0,
            regs: [0; 64],
            asci0: Asci::new(),
            asci1: Asci::new(),
            prt: Prt::new(),
            devices: HashMap::new(),
        }
    }

    /// Reset window base and peripherals. Device registrations survive.
    pub fn reset(&mut self) {
        self.base = 0;
        self.regs = [0; 64];
        self.asci0.reset();
        self.asci1.reset();
        self.prt.reset();
    }

    /// Current window base.
    #[must_use]
    pub fn base(&self) -> u8 {
        self.base
    }

    /// Relocate the window. Only bits 7-6 of `base` are significant.
    pub fn set_base(&mut self, base: u8) {
        self.base = base & 0xC0;
    }

    /// Register an external device at an 8-bit port.
    pub fn register_device(&mut self, port: u8, device: Box<dyn Device>) {
        self.devices.insert(port, device);
    }

    /// True if the low byte of `port` falls inside the internal window.
    #[must_use]
    pub fn is_internal(&self, port: u16) -> bool {
        (port as u8) & 0xC0 == self.base
    }

    /// Read a port, routing internal or external.
    pub fn read(&mut self, port: u16, mmu: &Mmu) -> u8 {
        if self.is_internal(port) {
            self.read_internal((port as u8) & 0x3F, mmu)
        } else {
            let port = port as u8;
            match self.devices.get_mut(&port) {
                Some(device) => device.read(port),
                None => {
                    tracing::trace!(port, "read of unmapped external port");
                    0xFF
                }
            }
        }
    }

    /// Write a port, routing internal or external.
    pub fn write(&mut self, port: u16, value: u8, mmu: &mut Mmu) {
        if self.is_internal(port) {
            self.write_internal((port as u8) & 0x3F, value, mmu);
        } else {
            let port = port as u8;
            match self.devices.get_mut(&port) {
                Some(device) => device.write(port, value),
                None => tracing::trace!(port, value, "write to unmapped external port"),
            }
        }
    }

    fn read_internal(&mut self, offset: u8, mmu: &Mmu) -> u8 {
        match offset {
            0x00 => self.asci0.read_cntla(),
            0x01 => self.asci1.read_cntla(),
            0x02 => self.asci0.read_cntlb(),
            0x03 => self.asci1.read_cntlb(),
            0x04 => self.asci0.read_stat(),
            0x05 => self.asci1.read_stat(),
            0x06 | 0x08 => self.asci0.read_rdr(),
            0x07 | 0x09 => self.asci1.read_rdr(),
            // CSIO stub: values chosen so the firmware skips SD probing
            0x0A => 0x00,
            0x0B => 0xFF,
            0x0E => self.asci0.read_ier(),
            0x0F => self.asci1.read_ier(),
            0x10 => self.prt.read_tcr(),
            0x11 => 0,
            0x12 => self.asci0.read_asext(),
            0x13 => self.asci1.read_asext(),
            0x14 => self.prt.read_tmdr_lo(0),
            0x15 => self.prt.read_tmdr_hi(0),
            0x16 => self.prt.read_trld_lo(0),
            0x17 => self.prt.read_trld_hi(0),
            0x18 => self.prt.read_tmdr_lo(1),
            0x19 => self.prt.read_tmdr_hi(1),
            0x1A => self.prt.read_trld_lo(1),
            0x1B => self.prt.read_trld_hi(1),
            0x38 => mmu.cbr,
            0x39 => mmu.bbr,
            0x3A => mmu.cbar,
            0x3F => self.base & 0xC0,
            _ => self.regs[offset as usize],
        }
    }

    fn write_internal(&mut self, offset: u8, value: u8, mmu: &mut Mmu) {
        match offset {
            0x00 => self.asci0.write_cntla(value),
            0x01 => self.asci1.write_cntla(value),
            0x02 => self.asci0.write_cntlb(value),
            0x03 => self.asci1.write_cntlb(value),
            0x04 => self.asci0.write_stat(value),
            0x05 => self.asci1.write_stat(value),
            0x06 => self.asci0.write_tdr(value),
            0x07 => self.asci1.write_tdr(value),
            0x0A | 0x0B => {} // CSIO stub ignores writes
            0x0E => self.asci0.write_ier(value),
            0x0F => self.asci1.write_ier(value),
            0x10 => self.prt.write_tcr(value),
            0x11 => {}
            0x12 => self.asci0.write_asext(value),
            0x13 => self.asci1.write_asext(value),
            0x14 => self.prt.write_tmdr_lo(0, value),
            0x15 => self.prt.write_tmdr_hi(0, value),
            0x16 => self.prt.write_trld_lo(0, value),
            0x17 => self.prt.write_trld_hi(0, value),
            0x18 => self.prt.write_tmdr_lo(1, value),
            0x19 => self.prt.write_tmdr_hi(1, value),
            0x1A => self.prt.write_trld_lo(1, value),
            0x1B => self.prt.write_trld_hi(1, value),
            0x38 => mmu.cbr = value,
            0x39 => mmu.bbr = value,
            0x3A => mmu.cbar = value,
            0x3F => self.base = value & 0xC0,
            _ => self.regs[offset as usize] = value,
        }
    }

    /// Vector of the highest-priority pending interrupt source.
    ///
    /// Priority order is PRT channel 0, PRT channel 1, ASCI channel 0.
    /// The vector combines the IL register's high bits with the source's
    /// fixed low bits.
    #[must_use]
    pub fn pending_vector(&self) -> Option<u8> {
        let il = self.regs[IL_OFFSET as usize] & 0xE0;
        if self.prt.interrupt_pending(0) {
            Some(il | VECTOR_PRT0)
        } else if self.prt.interrupt_pending(1) {
            Some(il | VECTOR_PRT1)
        } else if self.asci0.interrupt_pending() {
            Some(il | VECTOR_ASCI0)
        } else {
            None
        }
    }
}

impl Default for IoPorts {
    fn default() -> Self {
        Self::new()
    }
}
