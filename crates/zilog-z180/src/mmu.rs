//! Z180 MMU: logical-to-physical translation over ROM and RAM.
//!
//! The 16-bit logical space splits into three regions by the CBAR
//! thresholds (4 KiB units): Common Area 0 from zero, the Bank Area
//! relocated by BBR, and Common Area 1 relocated by CBR. The resulting
//! 20-bit physical space backs ROM in the lower half and RAM in the
//! upper half.

#![allow(clippy::cast_possible_truncation)]

/// ROM size in bytes (512 KiB), fixed.
pub const ROM_SIZE: usize = 0x8_0000;

/// RAM size in bytes (512 KiB), fixed.
pub const RAM_SIZE: usize = 0x8_0000;

/// Physical address where RAM begins.
pub const RAM_BASE: u32 = 0x8_0000;

/// Mask for the 20-bit physical address space.
pub const PHYS_MASK: u32 = 0xF_FFFF;

/// CBAR value at reset: everything above 0xF000 is Common Area 1.
const CBAR_RESET: u8 = 0xF0;

/// The Z180 MMU together with its backing store.
pub struct Mmu {
    /// Common/Bank Area Register: high nibble CA threshold, low nibble BA.
    pub cbar: u8,
    /// Bank Base Register.
    pub bbr: u8,
    /// Common Base Register.
    pub cbr: u8,
    rom: Vec<u8>,
    ram: Vec<u8>,
}

impl Mmu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cbar: CBAR_RESET,
            bbr: 0,
            cbr: 0,
            rom: vec![0; ROM_SIZE],
            ram: vec![0; RAM_SIZE],
        }
    }

    /// Reset the translation registers. Memory contents are untouched.
    pub fn reset(&mut self) {
        self.cbar = CBAR_RESET;
        self.bbr = 0;
        self.cbr = 0;
    }

    /// Copy a ROM image into the low physical region.
    ///
    /// At most [`ROM_SIZE`] bytes are taken; the remainder of ROM is
    /// zeroed, so a short image always leaves a deterministic tail.
    pub fn load_rom(&mut self, image: &[u8]) {
        let n = image.len().min(ROM_SIZE);
        self.rom[..n].copy_from_slice(&image[..n]);
        self.rom[n..].fill(0);
    }

    /// Translate a 16-bit logical address to a 20-bit physical address.
    ///
    /// The base-register addition runs at 32-bit width before masking:
    /// carry out of bit 15 must propagate into bits 16-19.
    #[must_use]
    pub fn translate(&self, logical: u16) -> u32 {
        let ba = u16::from(self.cbar & 0x0F) << 12;
        let ca = u16::from(self.cbar >> 4) << 12;

        let base = if logical < ba {
            0
        } else if logical < ca {
            self.bbr
        } else {
            self.cbr
        };

        (u32::from(logical) + (u32::from(base) << 12)) & PHYS_MASK
    }

    /// Read a byte through the MMU.
    #[must_use]
    pub fn read(&self, logical: u16) -> u8 {
        self.phys_read(self.translate(logical))
    }

    /// Write a byte through the MMU. Writes that land in ROM are dropped.
    pub fn write(&mut self, logical: u16, value: u8) {
        self.phys_write(self.translate(logical), value);
    }

    /// Read a physical address directly.
    #[must_use]
    pub fn phys_read(&self, address: u32) -> u8 {
        let address = address as usize;
        if address < ROM_SIZE {
            self.rom[address]
        } else if address < ROM_SIZE + RAM_SIZE {
            self.ram[address - ROM_SIZE]
        } else {
            0xFF
        }
    }

    /// Write a physical address directly. ROM and out-of-range writes
    /// are silently discarded.
    pub fn phys_write(&mut self, address: u32, value: u8) {
        let address = address as usize;
        if (ROM_SIZE..ROM_SIZE + RAM_SIZE).contains(&address) {
            self.ram[address - ROM_SIZE] = value;
        }
    }

    /// The full RAM contents.
    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Replace the RAM contents. `data` must be exactly [`RAM_SIZE`]
    /// bytes; anything else is ignored and `false` is returned.
    pub fn restore_ram(&mut self, data: &[u8]) -> bool {
        if data.len() != RAM_SIZE {
            return false;
        }
        self.ram.copy_from_slice(data);
        true
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
