//! Z180 CPU core, instruction-stepped.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.
#![allow(clippy::cast_possible_wrap)] // Intentional i8 casts for displacements.
#![allow(clippy::cast_sign_loss)]

use emu_core::{Bus, Cpu, Cycles};

use crate::flags::{CF, PF, SF, ZF};
use crate::registers::Registers;

/// Which register pair currently stands in for HL.
///
/// Set by a DD or FD prefix for the duration of one instruction; memory
/// operands written `(HL)` become `(IX+d)` / `(IY+d)` while it is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Index {
    Hl,
    Ix,
    Iy,
}

/// Z180 CPU.
///
/// The CPU does not own the bus; each `step` borrows it. Cycle counts are
/// approximate (memory 3, M1 fetch 4, I/O 4, small fixed extras) — the
/// timers only consume them as relative time.
pub struct Z180 {
    /// Register file.
    pub regs: Registers,
    /// Monotonic virtual cycle counter.
    cycles: u64,
    /// Active index override for the current instruction.
    index: Index,
    /// EI enables interrupts only after the following instruction.
    ei_pending: bool,
}

impl Z180 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            cycles: 0,
            index: Index::Hl,
            ei_pending: false,
        }
    }

    /// Total virtual cycles elapsed since creation. Survives reset.
    #[must_use]
    pub fn cycles(&self) -> Cycles {
        Cycles::new(self.cycles)
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    /// True while the CPU sits in HALT.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.regs.halted
    }

    /// Zero all registers and interrupt state. The cycle counter keeps
    /// counting; RAM-relative time must stay monotonic across resets.
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.index = Index::Hl;
        self.ei_pending = false;
    }

    /// Accrue internal cycles.
    pub(crate) fn tick(&mut self, cycles: u32) {
        self.cycles += u64::from(cycles);
    }

    /// Increment R, preserving bit 7.
    fn inc_r(&mut self) {
        self.regs.r = (self.regs.r & 0x80) | (self.regs.r.wrapping_add(1) & 0x7F);
    }

    /// M1 cycle: fetch an opcode byte, bumping PC and R.
    pub(crate) fn fetch_opcode<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let opcode = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.inc_r();
        self.tick(4);
        opcode
    }

    /// Fetch an immediate operand byte.
    pub(crate) fn next8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.tick(3);
        value
    }

    /// Fetch an immediate operand word, little-endian.
    pub(crate) fn next16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.next8(bus);
        let hi = self.next8(bus);
        u16::from(lo) | (u16::from(hi) << 8)
    }

    pub(crate) fn read8<B: Bus>(&mut self, bus: &mut B, address: u16) -> u8 {
        self.tick(3);
        bus.read(address)
    }

    pub(crate) fn write8<B: Bus>(&mut self, bus: &mut B, address: u16, value: u8) {
        self.tick(3);
        bus.write(address, value);
    }

    pub(crate) fn read16<B: Bus>(&mut self, bus: &mut B, address: u16) -> u16 {
        let lo = self.read8(bus, address);
        let hi = self.read8(bus, address.wrapping_add(1));
        u16::from(lo) | (u16::from(hi) << 8)
    }

    pub(crate) fn write16<B: Bus>(&mut self, bus: &mut B, address: u16, value: u16) {
        self.write8(bus, address, value as u8);
        self.write8(bus, address.wrapping_add(1), (value >> 8) as u8);
    }

    pub(crate) fn in8<B: Bus>(&mut self, bus: &mut B, port: u16) -> u8 {
        self.tick(4);
        bus.read_io(port)
    }

    pub(crate) fn out8<B: Bus>(&mut self, bus: &mut B, port: u16, value: u8) {
        self.tick(4);
        bus.write_io(port, value);
    }

    /// Push a word, high byte at the higher address.
    pub(crate) fn push16<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        let sp = self.regs.sp;
        self.write8(bus, sp, (value >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        let sp = self.regs.sp;
        self.write8(bus, sp, value as u8);
    }

    pub(crate) fn pop16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let sp = self.regs.sp;
        let lo = self.read8(bus, sp);
        let hi = self.read8(bus, sp.wrapping_add(1));
        self.regs.sp = sp.wrapping_add(2);
        u16::from(lo) | (u16::from(hi) << 8)
    }

    /// The register pair standing in for HL under the active prefix.
    pub(crate) fn hl_pair(&self) -> u16 {
        match self.index {
            Index::Hl => self.regs.hl(),
            Index::Ix => self.regs.ix,
            Index::Iy => self.regs.iy,
        }
    }

    pub(crate) fn set_hl_pair(&mut self, value: u16) {
        match self.index {
            Index::Hl => self.regs.set_hl(value),
            Index::Ix => self.regs.ix = value,
            Index::Iy => self.regs.iy = value,
        }
    }

    /// Effective address of a `(HL)` memory operand.
    ///
    /// Under DD/FD this fetches the signed displacement byte, which must
    /// therefore happen before any later immediate operand.
    pub(crate) fn ea<B: Bus>(&mut self, bus: &mut B) -> u16 {
        match self.index {
            Index::Hl => self.regs.hl(),
            Index::Ix => {
                let d = self.next8(bus) as i8;
                self.tick(5);
                self.regs.ix.wrapping_add(d as i16 as u16)
            }
            Index::Iy => {
                let d = self.next8(bus) as i8;
                self.tick(5);
                self.regs.iy.wrapping_add(d as i16 as u16)
            }
        }
    }

    /// Get register by 3-bit encoding, honoring the index override for
    /// H and L (IXH/IXL/IYH/IYL).
    pub(crate) fn reg8(&self, r: u8) -> u8 {
        match r & 7 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => (self.hl_pair() >> 8) as u8,
            5 => self.hl_pair() as u8,
            7 => self.regs.a,
            _ => 0, // (HL) is handled by the caller
        }
    }

    /// Set register by 3-bit encoding, honoring the index override.
    pub(crate) fn set_reg8(&mut self, r: u8, value: u8) {
        match r & 7 {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => {
                let pair = (self.hl_pair() & 0x00FF) | (u16::from(value) << 8);
                self.set_hl_pair(pair);
            }
            5 => {
                let pair = (self.hl_pair() & 0xFF00) | u16::from(value);
                self.set_hl_pair(pair);
            }
            7 => self.regs.a = value,
            _ => {} // (HL) is handled by the caller
        }
    }

    /// Get register by 3-bit encoding, never index-remapped.
    ///
    /// Used when the instruction also has a memory operand: in
    /// `LD H,(IX+d)` the H really is H.
    pub(crate) fn reg8_plain(&self, r: u8) -> u8 {
        match r & 7 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            7 => self.regs.a,
            _ => 0,
        }
    }

    pub(crate) fn set_reg8_plain(&mut self, r: u8, value: u8) {
        match r & 7 {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            7 => self.regs.a = value,
            _ => {}
        }
    }

    /// Get register pair by 2-bit encoding (SP family), index-aware.
    pub(crate) fn reg16(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.hl_pair(),
            _ => self.regs.sp,
        }
    }

    pub(crate) fn set_reg16(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.set_hl_pair(value),
            _ => self.regs.sp = value,
        }
    }

    /// Get register pair by 2-bit encoding, HL never remapped (ED space).
    pub(crate) fn reg16_plain(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    pub(crate) fn set_reg16_plain(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.sp = value,
        }
    }

    /// Get register pair for PUSH/POP (AF instead of SP), index-aware.
    pub(crate) fn reg16_af(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.hl_pair(),
            _ => self.regs.af(),
        }
    }

    pub(crate) fn set_reg16_af(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.set_hl_pair(value),
            _ => self.regs.set_af(value),
        }
    }

    /// Evaluate condition code (NZ, Z, NC, C, PO, PE, P, M).
    pub(crate) fn condition(&self, cc: u8) -> bool {
        match cc & 7 {
            0 => self.regs.f & ZF == 0,
            1 => self.regs.f & ZF != 0,
            2 => self.regs.f & CF == 0,
            3 => self.regs.f & CF != 0,
            4 => self.regs.f & PF == 0,
            5 => self.regs.f & PF != 0,
            6 => self.regs.f & SF == 0,
            _ => self.regs.f & SF != 0,
        }
    }

    /// Replace the flags register.
    pub(crate) fn set_f(&mut self, flags: u8) {
        self.regs.f = flags;
    }

    /// Accept an interrupt with the given vector byte.
    fn accept_interrupt<B: Bus>(&mut self, bus: &mut B, vector: u8) {
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.ei_pending = false;
        self.tick(12);

        match self.regs.im {
            2 => {
                let table = (u16::from(self.regs.i) << 8) | u16::from(vector);
                let target = self.read16(bus, table);
                let pc = self.regs.pc;
                self.push16(bus, pc);
                self.regs.pc = target;
            }
            // IM 1, and IM 0 as a pragmatic approximation
            _ => {
                let pc = self.regs.pc;
                self.push16(bus, pc);
                self.regs.pc = 0x0038;
            }
        }
    }

    /// Run a DD/FD-prefixed instruction.
    ///
    /// Consecutive prefixes each cost a fetch; the last one wins. ED
    /// cancels the override; a byte with no index meaning executes as
    /// base with the override simply never consulted.
    fn execute_indexed<B: Bus>(&mut self, bus: &mut B, index: Index) {
        let mut index = index;
        loop {
            self.index = index;
            let opcode = self.fetch_opcode(bus);
            match opcode {
                0xDD => index = Index::Ix,
                0xFD => index = Index::Iy,
                0xED => {
                    self.index = Index::Hl;
                    let op = self.fetch_opcode(bus);
                    self.execute_ed(bus, op);
                    return;
                }
                0xCB => {
                    self.execute_index_cb(bus);
                    return;
                }
                _ => {
                    self.execute_main(bus, opcode);
                    return;
                }
            }
        }
    }
}

impl Default for Z180 {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Bus> Cpu<B> for Z180 {
    fn step(&mut self, bus: &mut B) -> u32 {
        let start = self.cycles;

        if self.regs.iff1
            && !self.ei_pending
            && let Some(vector) = bus.pending_interrupt()
        {
            self.accept_interrupt(bus, vector);
            return (self.cycles - start) as u32;
        }

        if self.regs.halted {
            self.tick(4);
            return (self.cycles - start) as u32;
        }

        // EI takes effect here, one instruction late, after the poll above
        // has been skipped once.
        if self.ei_pending {
            self.ei_pending = false;
            self.regs.iff1 = true;
            self.regs.iff2 = true;
        }

        let opcode = self.fetch_opcode(bus);
        match opcode {
            0xCB => {
                let op = self.fetch_opcode(bus);
                self.execute_cb(bus, op);
            }
            0xED => {
                let op = self.fetch_opcode(bus);
                self.execute_ed(bus, op);
            }
            0xDD => self.execute_indexed(bus, Index::Ix),
            0xFD => self.execute_indexed(bus, Index::Iy),
            _ => self.execute_main(bus, opcode),
        }
        self.index = Index::Hl;

        (self.cycles - start) as u32
    }

    fn reset(&mut self) {
        Z180::reset(self);
    }

    fn pc(&self) -> u16 {
        Z180::pc(self)
    }

    fn is_halted(&self) -> bool {
        Z180::is_halted(self)
    }

    fn cycles(&self) -> Cycles {
        Z180::cycles(self)
    }
}

// Instruction execution lives in a separate file for readability.
mod execute;
