//! Instruction execution for the Z180.

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, ZF, sz, szp};

use super::{Index, Z180};

impl Z180 {
    // =========================================================================
    // Unprefixed instructions
    // =========================================================================

    /// Execute an unprefixed instruction (also reached with an index
    /// override active, in which case HL-flavored operands follow it).
    pub(super) fn execute_main<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // NOP
            0x00 => {}

            // LD rr, nn (01=BC, 11=DE, 21=HL, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let nn = self.next16(bus);
                self.set_reg16((op >> 4) & 3, nn);
            }

            // LD (BC), A
            0x02 => {
                let addr = self.regs.bc();
                let a = self.regs.a;
                self.write8(bus, addr, a);
            }

            // INC rr (03=BC, 13=DE, 23=HL, 33=SP)
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.tick(2);
                let rp = (op >> 4) & 3;
                let value = self.reg16(rp).wrapping_add(1);
                self.set_reg16(rp, value);
            }

            // INC r (04=B, 0C=C, 14=D, 1C=E, 24=H, 2C=L, 3C=A)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = (op >> 3) & 7;
                let result = alu::inc8(self.reg8(r));
                self.set_reg8(r, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // DEC r (05=B, 0D=C, 15=D, 1D=E, 25=H, 2D=L, 3D=A)
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = (op >> 3) & 7;
                let result = alu::dec8(self.reg8(r));
                self.set_reg8(r, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // LD r, n (06=B, 0E=C, 16=D, 1E=E, 26=H, 2E=L, 3E=A)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let n = self.next8(bus);
                self.set_reg8((op >> 3) & 7, n);
            }

            // RLCA
            0x07 => {
                let carry = self.regs.a >> 7;
                self.regs.a = self.regs.a.rotate_left(1);
                self.set_f((self.regs.f & (SF | ZF | PF)) | carry);
            }

            // EX AF, AF'
            0x08 => self.regs.swap_af(),

            // ADD HL, rr (09=BC, 19=DE, 29=HL, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.tick(7);
                let rr = self.reg16((op >> 4) & 3);
                let (value, flags) = alu::add16(self.hl_pair(), rr);
                self.set_hl_pair(value);
                self.set_f((self.regs.f & (SF | ZF | PF)) | flags);
            }

            // LD A, (BC)
            0x0A => {
                let addr = self.regs.bc();
                self.regs.a = self.read8(bus, addr);
            }

            // DEC rr (0B=BC, 1B=DE, 2B=HL, 3B=SP)
            0x0B | 0x1B | 0x2B | 0x3B => {
                self.tick(2);
                let rp = (op >> 4) & 3;
                let value = self.reg16(rp).wrapping_sub(1);
                self.set_reg16(rp, value);
            }

            // RRCA
            0x0F => {
                let carry = self.regs.a & 1;
                self.regs.a = self.regs.a.rotate_right(1);
                self.set_f((self.regs.f & (SF | ZF | PF)) | carry);
            }

            // DJNZ e
            0x10 => {
                self.tick(1);
                let d = self.next8(bus) as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.tick(5);
                    self.regs.pc = self.regs.pc.wrapping_add(d as i16 as u16);
                }
            }

            // LD (DE), A
            0x12 => {
                let addr = self.regs.de();
                let a = self.regs.a;
                self.write8(bus, addr, a);
            }

            // RLA
            0x17 => {
                let old_carry = self.regs.f & CF;
                let new_carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | old_carry;
                self.set_f((self.regs.f & (SF | ZF | PF)) | new_carry);
            }

            // JR e
            0x18 => {
                let d = self.next8(bus) as i8;
                self.tick(5);
                self.regs.pc = self.regs.pc.wrapping_add(d as i16 as u16);
            }

            // LD A, (DE)
            0x1A => {
                let addr = self.regs.de();
                self.regs.a = self.read8(bus, addr);
            }

            // RRA
            0x1F => {
                let old_carry = self.regs.f & CF;
                let new_carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (old_carry << 7);
                self.set_f((self.regs.f & (SF | ZF | PF)) | new_carry);
            }

            // JR cc, e (20=NZ, 28=Z, 30=NC, 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let d = self.next8(bus) as i8;
                if self.condition((op >> 3) & 3) {
                    self.tick(5);
                    self.regs.pc = self.regs.pc.wrapping_add(d as i16 as u16);
                }
            }

            // LD (nn), HL
            0x22 => {
                let nn = self.next16(bus);
                let hl = self.hl_pair();
                self.write16(bus, nn, hl);
            }

            // DAA
            0x27 => {
                let result = alu::daa(self.regs.a, self.regs.f);
                self.regs.a = result.value;
                self.set_f(result.flags);
            }

            // LD HL, (nn)
            0x2A => {
                let nn = self.next16(bus);
                let value = self.read16(bus, nn);
                self.set_hl_pair(value);
            }

            // CPL
            0x2F => {
                self.regs.a = !self.regs.a;
                self.set_f((self.regs.f & (SF | ZF | PF | CF)) | HF | NF);
            }

            // LD (nn), A
            0x32 => {
                let nn = self.next16(bus);
                let a = self.regs.a;
                self.write8(bus, nn, a);
            }

            // INC (HL)
            0x34 => {
                let addr = self.ea(bus);
                self.tick(1);
                let result = alu::inc8(self.read8(bus, addr));
                self.write8(bus, addr, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // DEC (HL)
            0x35 => {
                let addr = self.ea(bus);
                self.tick(1);
                let result = alu::dec8(self.read8(bus, addr));
                self.write8(bus, addr, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // LD (HL), n — displacement byte precedes the immediate
            0x36 => {
                let addr = self.ea(bus);
                let n = self.next8(bus);
                self.write8(bus, addr, n);
            }

            // SCF
            0x37 => self.set_f((self.regs.f & (SF | ZF | PF)) | CF),

            // LD A, (nn)
            0x3A => {
                let nn = self.next16(bus);
                self.regs.a = self.read8(bus, nn);
            }

            // CCF
            0x3F => {
                let old_carry = self.regs.f & CF;
                let mut f = self.regs.f & (SF | ZF | PF);
                if old_carry != 0 {
                    f |= HF;
                } else {
                    f |= CF;
                }
                self.set_f(f);
            }

            // HALT
            0x76 => self.regs.halted = true,

            // LD r, r'
            0x40..=0x75 | 0x77..=0x7F => {
                let dst = (op >> 3) & 7;
                let src = op & 7;
                if dst == 6 {
                    let addr = self.ea(bus);
                    let value = self.reg8_plain(src);
                    self.write8(bus, addr, value);
                } else if src == 6 {
                    let addr = self.ea(bus);
                    let value = self.read8(bus, addr);
                    self.set_reg8_plain(dst, value);
                } else {
                    let value = self.reg8(src);
                    self.set_reg8(dst, value);
                }
            }

            // ALU A, r (80-87 ADD, 88-8F ADC, 90-97 SUB, 98-9F SBC,
            // A0-A7 AND, A8-AF XOR, B0-B7 OR, B8-BF CP)
            0x80..=0xBF => {
                let operand = if op & 7 == 6 {
                    let addr = self.ea(bus);
                    self.read8(bus, addr)
                } else {
                    self.reg8(op & 7)
                };
                self.alu_a((op >> 3) & 7, operand);
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                self.tick(1);
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = self.pop16(bus);
                }
            }

            // POP rr (C1=BC, D1=DE, E1=HL, F1=AF)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop16(bus);
                self.set_reg16_af((op >> 4) & 3, value);
            }

            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let nn = self.next16(bus);
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = nn;
                }
            }

            // JP nn
            0xC3 => {
                let nn = self.next16(bus);
                self.regs.pc = nn;
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let nn = self.next16(bus);
                if self.condition((op >> 3) & 7) {
                    self.tick(1);
                    let pc = self.regs.pc;
                    self.push16(bus, pc);
                    self.regs.pc = nn;
                }
            }

            // PUSH rr (C5=BC, D5=DE, E5=HL, F5=AF)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.tick(1);
                let value = self.reg16_af((op >> 4) & 3);
                self.push16(bus, value);
            }

            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let operand = self.next8(bus);
                self.alu_a((op >> 3) & 7, operand);
            }

            // RST n (C7..FF step 8)
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.tick(1);
                let pc = self.regs.pc;
                self.push16(bus, pc);
                self.regs.pc = u16::from(op & 0x38);
            }

            // RET
            0xC9 => self.regs.pc = self.pop16(bus),

            // CALL nn
            0xCD => {
                let nn = self.next16(bus);
                self.tick(1);
                let pc = self.regs.pc;
                self.push16(bus, pc);
                self.regs.pc = nn;
            }

            // OUT (n), A — A supplies the high address byte
            0xD3 => {
                let n = self.next8(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                let a = self.regs.a;
                self.out8(bus, port, a);
            }

            // EXX
            0xD9 => self.regs.exx(),

            // IN A, (n)
            0xDB => {
                let n = self.next8(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.regs.a = self.in8(bus, port);
            }

            // EX (SP), HL
            0xE3 => {
                self.tick(3);
                let sp = self.regs.sp;
                let from_stack = self.read16(bus, sp);
                let hl = self.hl_pair();
                self.write16(bus, sp, hl);
                self.set_hl_pair(from_stack);
            }

            // JP (HL)
            0xE9 => self.regs.pc = self.hl_pair(),

            // EX DE, HL — never index-remapped
            0xEB => {
                let de = self.regs.de();
                let hl = self.regs.hl();
                self.regs.set_de(hl);
                self.regs.set_hl(de);
            }

            // DI
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }

            // LD SP, HL
            0xF9 => {
                self.tick(2);
                self.regs.sp = self.hl_pair();
            }

            // EI — takes effect after the following instruction
            0xFB => self.ei_pending = true,

            // Prefix bytes are consumed by the caller; anything else is a
            // decode fallthrough treated as a no-op.
            _ => tracing::trace!(opcode = op, "unimplemented opcode"),
        }
    }

    /// Apply an 8-bit accumulator ALU operation selected by bits 5-3.
    fn alu_a(&mut self, group: u8, operand: u8) {
        let a = self.regs.a;
        let carry = self.regs.f & CF != 0;
        let result = match group {
            0 => alu::add8(a, operand, false),
            1 => alu::add8(a, operand, carry),
            2 => alu::sub8(a, operand, false),
            3 => alu::sub8(a, operand, carry),
            4 => alu::and8(a, operand),
            5 => alu::xor8(a, operand),
            6 => alu::or8(a, operand),
            // CP: flags only
            _ => {
                let result = alu::sub8(a, operand, false);
                self.set_f(result.flags);
                return;
            }
        };
        self.regs.a = result.value;
        self.set_f(result.flags);
    }

    // =========================================================================
    // CB prefix: rotates, shifts, bit operations
    // =========================================================================

    pub(super) fn execute_cb<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let r = op & 7;

        // BIT only reads its operand
        if op >> 6 == 1 {
            let value = if r == 6 {
                let addr = self.regs.hl();
                self.tick(1);
                self.read8(bus, addr)
            } else {
                self.reg8_plain(r)
            };
            self.bit_flags((op >> 3) & 7, value);
            return;
        }

        let value = if r == 6 {
            let addr = self.regs.hl();
            self.tick(1);
            self.read8(bus, addr)
        } else {
            self.reg8_plain(r)
        };

        let result = self.apply_cb(op, value);

        if r == 6 {
            let addr = self.regs.hl();
            self.write8(bus, addr, result);
        } else {
            self.set_reg8_plain(r, result);
        }
    }

    /// Rotate/shift/res/set by CB opcode; updates flags for the rotate
    /// group, returns the result value.
    fn apply_cb(&mut self, op: u8, value: u8) -> u8 {
        match op >> 6 {
            // Rotates and shifts
            0 => {
                let carry = self.regs.f & CF != 0;
                let result = match (op >> 3) & 7 {
                    0 => alu::rlc8(value),
                    1 => alu::rrc8(value),
                    2 => alu::rl8(value, carry),
                    3 => alu::rr8(value, carry),
                    4 => alu::sla8(value),
                    5 => alu::sra8(value),
                    6 => alu::sll8(value),
                    _ => alu::srl8(value),
                };
                self.set_f(result.flags);
                result.value
            }
            // RES b
            2 => value & !(1 << ((op >> 3) & 7)),
            // SET b
            _ => value | (1 << ((op >> 3) & 7)),
        }
    }

    /// Flags for BIT b: Z (and P) if the bit is clear, H set, N clear,
    /// S only for a set bit 7, C untouched.
    fn bit_flags(&mut self, bit: u8, value: u8) {
        let set = value & (1 << bit) != 0;
        let mut f = (self.regs.f & CF) | HF;
        if !set {
            f |= ZF | PF;
        }
        if bit == 7 && set {
            f |= SF;
        }
        self.set_f(f);
    }

    // =========================================================================
    // DDCB / FDCB prefix: bit operations on (IX+d) / (IY+d)
    // =========================================================================

    pub(super) fn execute_index_cb<B: Bus>(&mut self, bus: &mut B) {
        // Displacement comes before the final opcode byte, which is read
        // without an M1 cycle.
        let d = self.next8(bus) as i8;
        let op = self.next8(bus);
        let base = match self.index {
            Index::Ix => self.regs.ix,
            _ => self.regs.iy,
        };
        let addr = base.wrapping_add(d as i16 as u16);
        self.tick(2);

        let value = self.read8(bus, addr);
        if op >> 6 == 1 {
            self.bit_flags((op >> 3) & 7, value);
            return;
        }

        let result = self.apply_cb(op, value);
        self.write8(bus, addr, result);
    }

    // =========================================================================
    // ED prefix: Z80 extended group plus the Z180 additions
    // =========================================================================

    pub(super) fn execute_ed<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // IN0 r, (n) — Z180 immediate-port input, page-zero high byte
            0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => {
                let n = self.next8(bus);
                let value = self.in8(bus, u16::from(n));
                let r = (op >> 3) & 7;
                if r != 6 {
                    self.set_reg8_plain(r, value);
                }
                self.set_f((self.regs.f & CF) | szp(value));
            }

            // OUT0 (n), r — Z180 immediate-port output
            0x01 | 0x09 | 0x11 | 0x19 | 0x21 | 0x29 | 0x31 | 0x39 => {
                let n = self.next8(bus);
                let r = (op >> 3) & 7;
                let value = if r == 6 { 0 } else { self.reg8_plain(r) };
                self.out8(bus, u16::from(n), value);
            }

            // TST r — Z180: AND into flags only; A unchanged
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = (op >> 3) & 7;
                let operand = if r == 6 {
                    let addr = self.regs.hl();
                    self.read8(bus, addr)
                } else {
                    self.reg8_plain(r)
                };
                let result = alu::and8(self.regs.a, operand);
                self.set_f(result.flags);
            }

            // IN r, (C)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let port = self.regs.bc();
                let value = self.in8(bus, port);
                let r = (op >> 3) & 7;
                if r != 6 {
                    self.set_reg8_plain(r, value);
                }
                self.set_f((self.regs.f & CF) | szp(value));
            }

            // OUT (C), r
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let port = self.regs.bc();
                let r = (op >> 3) & 7;
                let value = if r == 6 { 0 } else { self.reg8_plain(r) };
                self.out8(bus, port, value);
            }

            // SBC HL, rr
            0x42 | 0x52 | 0x62 | 0x72 => {
                self.tick(7);
                let rr = self.reg16_plain((op >> 4) & 3);
                let carry = self.regs.f & CF != 0;
                let (value, flags) = alu::sbc16(self.regs.hl(), rr, carry);
                self.regs.set_hl(value);
                self.set_f(flags);
            }

            // ADC HL, rr
            0x4A | 0x5A | 0x6A | 0x7A => {
                self.tick(7);
                let rr = self.reg16_plain((op >> 4) & 3);
                let carry = self.regs.f & CF != 0;
                let (value, flags) = alu::adc16(self.regs.hl(), rr, carry);
                self.regs.set_hl(value);
                self.set_f(flags);
            }

            // LD (nn), rr
            0x43 | 0x53 | 0x63 | 0x73 => {
                let nn = self.next16(bus);
                let rr = self.reg16_plain((op >> 4) & 3);
                self.write16(bus, nn, rr);
            }

            // LD rr, (nn)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let nn = self.next16(bus);
                let value = self.read16(bus, nn);
                self.set_reg16_plain((op >> 4) & 3, value);
            }

            // NEG
            0x44 => {
                let result = alu::sub8(0, self.regs.a, false);
                self.regs.a = result.value;
                self.set_f(result.flags);
            }

            // RETN
            0x45 => {
                self.regs.pc = self.pop16(bus);
                self.regs.iff1 = self.regs.iff2;
            }

            // RETI — same IFF restore as RETN on this core
            0x4D => {
                self.regs.pc = self.pop16(bus);
                self.regs.iff1 = self.regs.iff2;
            }

            // MLT rr — Z180 unsigned 8x8 multiply into the pair
            0x4C | 0x5C | 0x6C | 0x7C => {
                self.tick(13);
                let rp = (op >> 4) & 3;
                let rr = self.reg16_plain(rp);
                let product = (rr >> 8).wrapping_mul(rr & 0x00FF);
                self.set_reg16_plain(rp, product);
            }

            // IM 0 / IM 1 / IM 2
            0x46 => self.regs.im = 0,
            0x56 => self.regs.im = 1,
            0x5E => self.regs.im = 2,

            // LD I, A
            0x47 => {
                self.tick(1);
                self.regs.i = self.regs.a;
            }

            // LD R, A
            0x4F => {
                self.tick(1);
                self.regs.r = self.regs.a;
            }

            // LD A, I
            0x57 => {
                self.tick(1);
                self.regs.a = self.regs.i;
                self.ld_air_flags();
            }

            // LD A, R
            0x5F => {
                self.tick(1);
                self.regs.a = self.regs.r;
                self.ld_air_flags();
            }

            // TST n — Z180 immediate form
            0x64 => {
                let n = self.next8(bus);
                let result = alu::and8(self.regs.a, n);
                self.set_f(result.flags);
            }

            // RRD
            0x67 => {
                self.tick(4);
                let addr = self.regs.hl();
                let m = self.read8(bus, addr);
                let new_m = (self.regs.a << 4) | (m >> 4);
                self.regs.a = (self.regs.a & 0xF0) | (m & 0x0F);
                self.write8(bus, addr, new_m);
                self.set_f((self.regs.f & CF) | szp(self.regs.a));
            }

            // RLD
            0x6F => {
                self.tick(4);
                let addr = self.regs.hl();
                let m = self.read8(bus, addr);
                let new_m = (m << 4) | (self.regs.a & 0x0F);
                self.regs.a = (self.regs.a & 0xF0) | (m >> 4);
                self.write8(bus, addr, new_m);
                self.set_f((self.regs.f & CF) | szp(self.regs.a));
            }

            // OTIM / OTDM — Z180 block output to port (C)
            0x83 => self.block_otm(bus, 1, false),
            0x8B => self.block_otm(bus, 0xFFFF, false),
            // OTIMR / OTDMR
            0x93 => self.block_otm(bus, 1, true),
            0x9B => self.block_otm(bus, 0xFFFF, true),

            // LDI / LDD / LDIR / LDDR
            0xA0 => self.block_ld(bus, 1, false),
            0xA8 => self.block_ld(bus, 0xFFFF, false),
            0xB0 => self.block_ld(bus, 1, true),
            0xB8 => self.block_ld(bus, 0xFFFF, true),

            // CPI / CPD / CPIR / CPDR
            0xA1 => self.block_cp(bus, 1, false),
            0xA9 => self.block_cp(bus, 0xFFFF, false),
            0xB1 => self.block_cp(bus, 1, true),
            0xB9 => self.block_cp(bus, 0xFFFF, true),

            // INI / IND / INIR / INDR
            0xA2 => self.block_in(bus, 1, false),
            0xAA => self.block_in(bus, 0xFFFF, false),
            0xB2 => self.block_in(bus, 1, true),
            0xBA => self.block_in(bus, 0xFFFF, true),

            // OUTI / OUTD / OTIR / OTDR
            0xA3 => self.block_out(bus, 1, false),
            0xAB => self.block_out(bus, 0xFFFF, false),
            0xB3 => self.block_out(bus, 1, true),
            0xBB => self.block_out(bus, 0xFFFF, true),

            // Decode fallthrough: a no-op
            _ => tracing::trace!(opcode = op, "unimplemented ED opcode"),
        }
    }

    /// Flags for LD A,I / LD A,R: S and Z from the value, P from IFF2,
    /// H and N clear, C untouched.
    fn ld_air_flags(&mut self) {
        let mut f = (self.regs.f & CF) | sz(self.regs.a);
        if self.regs.iff2 {
            f |= PF;
        }
        self.set_f(f);
    }

    /// LDI/LDD core: move (HL) to (DE), step the pointers, decrement BC.
    /// The repeating forms rewind PC while BC is nonzero; a BC that was
    /// already zero wraps to 0xFFFF and terminates after the single
    /// transfer instead of sweeping the whole address space.
    fn block_ld<B: Bus>(&mut self, bus: &mut B, delta: u16, repeat: bool) {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = self.read8(bus, hl);
        self.write8(bus, de, value);
        self.regs.set_hl(hl.wrapping_add(delta));
        self.regs.set_de(de.wrapping_add(delta));
        let pre = self.regs.bc();
        let bc = pre.wrapping_sub(1);
        self.regs.set_bc(bc);
        self.tick(2);

        let mut f = self.regs.f & (SF | ZF | CF);
        if bc != 0 {
            f |= PF;
        }
        self.set_f(f);

        if repeat && bc != 0 && pre != 0 {
            self.tick(5);
            self.regs.pc = self.regs.pc.wrapping_sub(2);
        }
    }

    /// CPI/CPD core: compare A with (HL), step HL, decrement BC.
    /// The repeating forms rewind PC while BC is nonzero and no match.
    fn block_cp<B: Bus>(&mut self, bus: &mut B, delta: u16, repeat: bool) {
        let hl = self.regs.hl();
        let value = self.read8(bus, hl);
        let result = alu::sub8(self.regs.a, value, false);
        self.regs.set_hl(hl.wrapping_add(delta));
        let pre = self.regs.bc();
        let bc = pre.wrapping_sub(1);
        self.regs.set_bc(bc);
        self.tick(2);

        let mut f = (result.flags & (SF | ZF | HF | NF)) | (self.regs.f & CF);
        if bc != 0 {
            f |= PF;
        }
        self.set_f(f);

        if repeat && bc != 0 && pre != 0 && result.flags & ZF == 0 {
            self.tick(5);
            self.regs.pc = self.regs.pc.wrapping_sub(2);
        }
    }

    /// INI/IND core: port (C) to (HL), step HL, decrement B.
    fn block_in<B: Bus>(&mut self, bus: &mut B, delta: u16, repeat: bool) {
        let port = self.regs.bc();
        let value = self.in8(bus, port);
        let hl = self.regs.hl();
        self.write8(bus, hl, value);
        self.regs.set_hl(hl.wrapping_add(delta));
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.tick(1);
        self.block_io_flags();

        if repeat && self.regs.b != 0 {
            self.tick(5);
            self.regs.pc = self.regs.pc.wrapping_sub(2);
        }
    }

    /// OUTI/OUTD core: (HL) to port (C), B decremented before the write
    /// reaches the bus.
    fn block_out<B: Bus>(&mut self, bus: &mut B, delta: u16, repeat: bool) {
        let hl = self.regs.hl();
        let value = self.read8(bus, hl);
        self.regs.b = self.regs.b.wrapping_sub(1);
        let port = self.regs.bc();
        self.out8(bus, port, value);
        self.regs.set_hl(hl.wrapping_add(delta));
        self.tick(1);
        self.block_io_flags();

        if repeat && self.regs.b != 0 {
            self.tick(5);
            self.regs.pc = self.regs.pc.wrapping_sub(2);
        }
    }

    /// OTIM/OTDM core: (HL) to port C with C stepped along HL.
    fn block_otm<B: Bus>(&mut self, bus: &mut B, delta: u16, repeat: bool) {
        let hl = self.regs.hl();
        let value = self.read8(bus, hl);
        let port = u16::from(self.regs.c);
        self.out8(bus, port, value);
        self.regs.set_hl(hl.wrapping_add(delta));
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.regs.c = self.regs.c.wrapping_add(delta as u8);
        self.tick(1);
        self.block_io_flags();

        if repeat && self.regs.b != 0 {
            self.tick(5);
            self.regs.pc = self.regs.pc.wrapping_sub(2);
        }
    }

    /// Flags shared by the block I/O forms: Z from B, N set, C kept.
    fn block_io_flags(&mut self) {
        let mut f = (self.regs.f & CF) | NF;
        if self.regs.b == 0 {
            f |= ZF;
        }
        self.set_f(f);
    }
}
