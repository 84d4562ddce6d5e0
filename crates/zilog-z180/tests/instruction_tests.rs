//! Unit tests for individual Z180 instructions.
//!
//! Each test loads a short machine-code program into a flat bus, runs it
//! to the closing HALT, and checks registers, memory and flags.

use emu_core::{Cpu, SimpleBus};
use zilog_z180::{CF, HF, NF, PF, SF, ZF, Z180};

/// Run the CPU until it halts, with a step safety limit.
fn run_until_halt(cpu: &mut Z180, bus: &mut SimpleBus) {
    let mut steps = 0;
    while !cpu.is_halted() && steps < 100_000 {
        cpu.step(bus);
        steps += 1;
    }
    assert!(cpu.is_halted(), "program did not halt");
}

fn run_program(program: &[u8]) -> (Z180, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, program);
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    (cpu, bus)
}

#[test]
fn nop_advances_pc() {
    let (cpu, _) = run_program(&[0x00, 0x76]); // NOP; HALT
    assert_eq!(cpu.regs.pc, 0x0002);
}

#[test]
fn first_step_of_jp_rom() {
    // The boot path: JP 0x0100 at the reset vector.
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0xC3, 0x00, 0x01]);
    let mut cpu = Z180::new();
    cpu.step(&mut bus);
    assert_eq!(cpu.pc(), 0x0100);
}

#[test]
fn ld_immediates() {
    let (cpu, _) = run_program(&[
        0x3E, 0x42, // LD A, 0x42
        0x01, 0x34, 0x12, // LD BC, 0x1234
        0x21, 0xCD, 0xAB, // LD HL, 0xABCD
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0x42);
    assert_eq!(cpu.regs.bc(), 0x1234);
    assert_eq!(cpu.regs.hl(), 0xABCD);
}

#[test]
fn push_pop_is_identity() {
    let (cpu, _) = run_program(&[
        0x31, 0x00, 0x80, // LD SP, 0x8000
        0x01, 0x34, 0x12, // LD BC, 0x1234
        0xC5, // PUSH BC
        0x01, 0x00, 0x00, // LD BC, 0
        0xC1, // POP BC
        0x76,
    ]);
    assert_eq!(cpu.regs.bc(), 0x1234);
    assert_eq!(cpu.regs.sp, 0x8000);
}

#[test]
fn ex_de_hl_twice_is_identity() {
    let (cpu, _) = run_program(&[
        0x11, 0x22, 0x11, // LD DE, 0x1122
        0x21, 0x44, 0x33, // LD HL, 0x3344
        0xEB, 0xEB, // EX DE,HL; EX DE,HL
        0x76,
    ]);
    assert_eq!(cpu.regs.de(), 0x1122);
    assert_eq!(cpu.regs.hl(), 0x3344);
}

#[test]
fn ld_store_fetch_hl_round_trip() {
    let (cpu, bus) = run_program(&[
        0x21, 0x78, 0x56, // LD HL, 0x5678
        0x22, 0x00, 0x40, // LD (0x4000), HL
        0x21, 0x00, 0x00, // LD HL, 0
        0x2A, 0x00, 0x40, // LD HL, (0x4000)
        0x76,
    ]);
    assert_eq!(cpu.regs.hl(), 0x5678);
    assert_eq!(bus.peek(0x4000), 0x78);
    assert_eq!(bus.peek(0x4001), 0x56);
}

#[test]
fn add_overflow_flags() {
    let (cpu, _) = run_program(&[
        0x3E, 0x7F, // LD A, 0x7F
        0xC6, 0x01, // ADD A, 1
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0x80);
    assert_ne!(cpu.regs.f & PF, 0);
    assert_ne!(cpu.regs.f & HF, 0);
    assert_ne!(cpu.regs.f & SF, 0);
    assert_eq!(cpu.regs.f & ZF, 0);
    assert_eq!(cpu.regs.f & CF, 0);
}

#[test]
fn sub_borrow_flags() {
    let (cpu, _) = run_program(&[
        0x3E, 0x00, // LD A, 0
        0xD6, 0x01, // SUB 1
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0xFF);
    assert_ne!(cpu.regs.f & CF, 0);
    assert_ne!(cpu.regs.f & HF, 0);
    assert_ne!(cpu.regs.f & NF, 0);
    assert_ne!(cpu.regs.f & SF, 0);
}

#[test]
fn cp_preserves_a() {
    let (cpu, _) = run_program(&[
        0x3E, 0x10, // LD A, 0x10
        0xFE, 0x10, // CP 0x10
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0x10);
    assert_ne!(cpu.regs.f & ZF, 0);
}

#[test]
fn daa_after_bcd_addition() {
    let (cpu, _) = run_program(&[
        0x3E, 0x19, // LD A, 0x19
        0xC6, 0x28, // ADD A, 0x28
        0x27, // DAA
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0x47);
    assert_eq!(cpu.regs.f & CF, 0);
}

#[test]
fn inc_dec_leave_carry() {
    let (cpu, _) = run_program(&[
        0x37, // SCF
        0x3E, 0x0F, // LD A, 0x0F
        0x3C, // INC A
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0x10);
    assert_ne!(cpu.regs.f & HF, 0);
    assert_ne!(cpu.regs.f & CF, 0); // carry untouched
    assert_eq!(cpu.regs.f & NF, 0);
}

#[test]
fn djnz_counts_down() {
    let (cpu, _) = run_program(&[
        0x06, 0x05, // LD B, 5
        0x3C, // loop: INC A
        0x10, 0xFD, // DJNZ loop
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 5);
    assert_eq!(cpu.regs.b, 0);
}

#[test]
fn jr_conditional_taken_and_skipped() {
    let (cpu, _) = run_program(&[
        0xAF, // XOR A (Z set)
        0x28, 0x01, // JR Z, +1
        0x3C, // INC A (skipped)
        0x20, 0x01, // JR NZ, +1 (not taken, Z still set)
        0x04, // INC B (executed)
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0);
    assert_eq!(cpu.regs.b, 1);
}

#[test]
fn call_and_ret() {
    let mut bus = SimpleBus::new();
    bus.load(
        0x0000,
        &[
            0x31, 0x00, 0xFF, // LD SP, 0xFF00
            0xCD, 0x00, 0x20, // CALL 0x2000
            0x76, // HALT
        ],
    );
    bus.load(0x2000, &[0x3E, 0x99, 0xC9]); // LD A, 0x99; RET
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x99);
    assert_eq!(cpu.regs.sp, 0xFF00);
    assert_eq!(cpu.regs.pc, 0x0007);
}

#[test]
fn rst_pushes_and_jumps() {
    let mut bus = SimpleBus::new();
    bus.load(
        0x0000,
        &[
            0x31, 0x00, 0xFF, // LD SP, 0xFF00
            0xEF, // RST 0x28
            0x76,
        ],
    );
    bus.load(0x0028, &[0x3E, 0x28, 0xC9]); // LD A, 0x28; RET
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x28);
}

#[test]
fn exx_twice_is_identity() {
    let (cpu, _) = run_program(&[
        0x01, 0x11, 0x11, // LD BC, 0x1111
        0xD9, // EXX
        0x01, 0x22, 0x22, // LD BC, 0x2222
        0xD9, // EXX
        0x76,
    ]);
    assert_eq!(cpu.regs.bc(), 0x2222);
    assert_eq!((cpu.regs.b_alt, cpu.regs.c_alt), (0x11, 0x11));
}

#[test]
fn rotate_a_preserves_szp() {
    let (cpu, _) = run_program(&[
        0x3E, 0x81, // LD A, 0x81
        0x07, // RLCA
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0x03);
    assert_ne!(cpu.regs.f & CF, 0);
}

#[test]
fn cb_rlc_rrc_round_trip() {
    let (cpu, _) = run_program(&[
        0x06, 0xA5, // LD B, 0xA5
        0xCB, 0x00, // RLC B
        0xCB, 0x08, // RRC B
        0x76,
    ]);
    assert_eq!(cpu.regs.b, 0xA5);
}

#[test]
fn cb_bit_set_res_on_memory() {
    let (cpu, bus) = run_program(&[
        0x21, 0x00, 0x40, // LD HL, 0x4000
        0x36, 0x00, // LD (HL), 0
        0xCB, 0xFE, // SET 7, (HL)
        0xCB, 0x7E, // BIT 7, (HL)
        0x76,
    ]);
    assert_eq!(bus.peek(0x4000), 0x80);
    assert_eq!(cpu.regs.f & ZF, 0); // bit was set
    assert_ne!(cpu.regs.f & SF, 0); // bit 7 tested set
    assert_ne!(cpu.regs.f & HF, 0);
}

#[test]
fn srl_shifts_into_carry() {
    let (cpu, _) = run_program(&[
        0x3E, 0x01, // LD A, 1
        0xCB, 0x3F, // SRL A
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0);
    assert_ne!(cpu.regs.f & CF, 0);
    assert_ne!(cpu.regs.f & ZF, 0);
}

#[test]
fn index_displacement_load_store() {
    let (cpu, bus) = run_program(&[
        0xDD, 0x21, 0x00, 0x40, // LD IX, 0x4000
        0x3E, 0x5A, // LD A, 0x5A
        0xDD, 0x77, 0x05, // LD (IX+5), A
        0xDD, 0x46, 0x05, // LD B, (IX+5)
        0x76,
    ]);
    assert_eq!(bus.peek(0x4005), 0x5A);
    assert_eq!(cpu.regs.b, 0x5A);
}

#[test]
fn index_negative_displacement() {
    let (_, bus) = run_program(&[
        0xFD, 0x21, 0x10, 0x40, // LD IY, 0x4010
        0xFD, 0x36, 0xFE, 0x77, // LD (IY-2), 0x77
        0x76,
    ]);
    assert_eq!(bus.peek(0x400E), 0x77);
}

#[test]
fn index_cb_set_on_memory() {
    let (_, bus) = run_program(&[
        0xDD, 0x21, 0x00, 0x40, // LD IX, 0x4000
        0xDD, 0xCB, 0x03, 0xC6, // SET 0, (IX+3)
        0x76,
    ]);
    assert_eq!(bus.peek(0x4003), 0x01);
}

#[test]
fn add_ix_rr_uses_index_register() {
    let (cpu, _) = run_program(&[
        0xDD, 0x21, 0x00, 0x10, // LD IX, 0x1000
        0x01, 0x34, 0x02, // LD BC, 0x0234
        0xDD, 0x09, // ADD IX, BC
        0x76,
    ]);
    assert_eq!(cpu.regs.ix, 0x1234);
}

#[test]
fn ex_sp_hl_swaps_with_stack_top() {
    let (cpu, bus) = run_program(&[
        0x31, 0x00, 0x80, // LD SP, 0x8000
        0x21, 0x22, 0x11, // LD HL, 0x1122
        0xE5, // PUSH HL
        0x21, 0x44, 0x33, // LD HL, 0x3344
        0xE3, // EX (SP), HL
        0x76,
    ]);
    assert_eq!(cpu.regs.hl(), 0x1122);
    assert_eq!(bus.peek(0x7FFE), 0x44);
    assert_eq!(bus.peek(0x7FFF), 0x33);
}

#[test]
fn neg_of_zero_clears_carry() {
    let (cpu, _) = run_program(&[
        0xAF, // XOR A
        0xED, 0x44, // NEG
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0);
    assert_eq!(cpu.regs.f & CF, 0);
    assert_ne!(cpu.regs.f & NF, 0);
}

#[test]
fn mlt_bc_multiplies_halves() {
    let (cpu, _) = run_program(&[
        0x01, 0x02, 0x03, // LD BC, 0x0302
        0xED, 0x4C, // MLT BC
        0x76,
    ]);
    assert_eq!(cpu.regs.bc(), 6);
}

#[test]
fn mlt_full_range() {
    let (cpu, _) = run_program(&[
        0x11, 0xFF, 0xFF, // LD DE, 0xFFFF
        0xED, 0x5C, // MLT DE
        0x76,
    ]);
    assert_eq!(cpu.regs.de(), 255 * 255);
}

#[test]
fn tst_sets_flags_without_storing() {
    let (cpu, _) = run_program(&[
        0x3E, 0xF0, // LD A, 0xF0
        0x06, 0x0F, // LD B, 0x0F
        0xED, 0x04, // TST B
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0xF0);
    assert_ne!(cpu.regs.f & ZF, 0); // 0xF0 & 0x0F == 0
    assert_ne!(cpu.regs.f & HF, 0);
    assert_eq!(cpu.regs.f & (NF | CF), 0);
}

#[test]
fn in0_and_out0_use_immediate_port() {
    let mut bus = SimpleBus::new();
    bus.set_io_in(0x86, 0x5A);
    bus.load(
        0x0000,
        &[
            0xED, 0x00, 0x86, // IN0 B, (0x86)
            0x3E, 0x41, // LD A, 0x41
            0xED, 0x39, 0x87, // OUT0 (0x87), A
            0x76,
        ],
    );
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.b, 0x5A);
    assert_eq!(bus.io_writes(), &[(0x0087, 0x41)]);
}

#[test]
fn in_r_c_sets_szp() {
    let mut bus = SimpleBus::new();
    bus.set_io_in(0x20, 0x00);
    bus.load(
        0x0000,
        &[
            0x01, 0x20, 0x00, // LD BC, 0x0020
            0xED, 0x50, // IN D, (C)
            0x76,
        ],
    );
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.d, 0);
    assert_ne!(cpu.regs.f & ZF, 0);
    assert_ne!(cpu.regs.f & PF, 0);
}

#[test]
fn ldir_copies_and_clears_pv() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[0xAA, 0xBB, 0xCC]);
    bus.load(
        0x0000,
        &[
            0x21, 0x00, 0x40, // LD HL, 0x4000
            0x11, 0x00, 0x50, // LD DE, 0x5000
            0x01, 0x03, 0x00, // LD BC, 3
            0xED, 0xB0, // LDIR
            0x76,
        ],
    );
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(bus.peek(0x5000), 0xAA);
    assert_eq!(bus.peek(0x5001), 0xBB);
    assert_eq!(bus.peek(0x5002), 0xCC);
    assert_eq!(cpu.regs.bc(), 0);
    assert_eq!(cpu.regs.f & PF, 0);
    assert_eq!(cpu.regs.hl(), 0x4003);
    assert_eq!(cpu.regs.de(), 0x5003);
}

#[test]
fn ldir_with_zero_bc_runs_once() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[0x77]);
    bus.load(
        0x0000,
        &[
            0x21, 0x00, 0x40, // LD HL, 0x4000
            0x11, 0x00, 0x50, // LD DE, 0x5000
            0x01, 0x00, 0x00, // LD BC, 0
            0xED, 0xB0, // LDIR
            0x76,
        ],
    );
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(bus.peek(0x5000), 0x77);
    assert_eq!(cpu.regs.bc(), 0xFFFF);
    assert_eq!(cpu.regs.pc, 0x000C); // fell through, no repeat
}

#[test]
fn cpir_stops_on_match() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[0x10, 0x20, 0x30, 0x40]);
    bus.load(
        0x0000,
        &[
            0x21, 0x00, 0x40, // LD HL, 0x4000
            0x01, 0x04, 0x00, // LD BC, 4
            0x3E, 0x30, // LD A, 0x30
            0xED, 0xB1, // CPIR
            0x76,
        ],
    );
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    assert_ne!(cpu.regs.f & ZF, 0); // found
    assert_eq!(cpu.regs.hl(), 0x4003); // one past the match
    assert_eq!(cpu.regs.bc(), 1);
}

#[test]
fn otir_writes_block_to_port() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[1, 2, 3]);
    bus.load(
        0x0000,
        &[
            0x21, 0x00, 0x40, // LD HL, 0x4000
            0x01, 0x30, 0x03, // LD B, 3; C, 0x30
            0xED, 0xB3, // OTIR
            0x76,
        ],
    );
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    let values: Vec<u8> = bus.io_writes().iter().map(|&(_, v)| v).collect();
    assert_eq!(values, vec![1, 2, 3]);
    assert_eq!(cpu.regs.b, 0);
    assert_ne!(cpu.regs.f & ZF, 0);
}

#[test]
fn otim_steps_port_with_pointer() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[0x11, 0x22]);
    bus.load(
        0x0000,
        &[
            0x21, 0x00, 0x40, // LD HL, 0x4000
            0x06, 0x02, // LD B, 2
            0x0E, 0x60, // LD C, 0x60
            0xED, 0x93, // OTIMR
            0x76,
        ],
    );
    let mut cpu = Z180::new();
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(bus.io_writes(), &[(0x0060, 0x11), (0x0061, 0x22)]);
    assert_eq!(cpu.regs.c, 0x62);
    assert_eq!(cpu.regs.b, 0);
}

#[test]
fn rld_rotates_nibbles_through_memory() {
    let (cpu, bus) = run_program(&[
        0x21, 0x00, 0x40, // LD HL, 0x4000
        0x36, 0x31, // LD (HL), 0x31
        0x3E, 0x7A, // LD A, 0x7A
        0xED, 0x6F, // RLD
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0x73);
    assert_eq!(bus.peek(0x4000), 0x1A);
}

#[test]
fn ld_a_i_reflects_iff2() {
    let (cpu, _) = run_program(&[
        0x3E, 0x12, // LD A, 0x12
        0xED, 0x47, // LD I, A
        0x3E, 0x00, // LD A, 0
        0xED, 0x57, // LD A, I
        0x76,
    ]);
    assert_eq!(cpu.regs.a, 0x12);
    assert_eq!(cpu.regs.f & PF, 0); // interrupts disabled
}

#[test]
fn r_register_counts_fetches_only_low_7_bits() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0x00, 0x00, 0x00, 0x76]);
    let mut cpu = Z180::new();
    cpu.regs.r = 0xFE;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r, 0xFF);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r, 0x80); // low 7 wrap, bit 7 preserved
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r, 0x81);
}

#[test]
fn halt_idles_until_interrupt() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0x76]); // HALT
    let mut cpu = Z180::new();
    cpu.step(&mut bus);
    assert!(cpu.is_halted());

    // Halted steps accrue 4 cycles each and go nowhere
    let before = cpu.cycles().get();
    cpu.step(&mut bus);
    assert!(cpu.is_halted());
    assert_eq!(cpu.cycles().get(), before + 4);
}

#[test]
fn im2_interrupt_acceptance() {
    let mut bus = SimpleBus::new();
    // Vector table entry at 0x400E -> 0x9000
    bus.load(0x400E, &[0x00, 0x90]);
    bus.load(0x1234, &[0x00]); // NOP at the interrupted PC

    let mut cpu = Z180::new();
    cpu.regs.i = 0x40;
    cpu.regs.im = 2;
    cpu.regs.iff1 = true;
    cpu.regs.iff2 = true;
    cpu.regs.sp = 0xFF00;
    cpu.regs.pc = 0x1234;

    bus.raise_irq(0x0E);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.pc, 0x9000);
    assert_eq!(cpu.regs.sp, 0xFEFE);
    assert_eq!(bus.peek(0xFEFE), 0x34);
    assert_eq!(bus.peek(0xFEFF), 0x12);
    assert!(!cpu.regs.iff1);
    assert!(!cpu.regs.iff2);
}

#[test]
fn im1_interrupt_jumps_to_0038() {
    let mut bus = SimpleBus::new();
    let mut cpu = Z180::new();
    cpu.regs.im = 1;
    cpu.regs.iff1 = true;
    cpu.regs.sp = 0x8000;
    cpu.regs.pc = 0x2000;

    bus.raise_irq(0xFF);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(cpu.regs.sp, 0x7FFE);
}

#[test]
fn interrupt_wakes_halted_cpu() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0xFB, 0x76]); // EI; HALT
    let mut cpu = Z180::new();
    cpu.regs.im = 1;
    cpu.regs.sp = 0x8000;
    cpu.step(&mut bus); // EI
    cpu.step(&mut bus); // HALT
    assert!(cpu.is_halted());

    bus.raise_irq(0x00);
    cpu.step(&mut bus);
    assert!(!cpu.is_halted());
    assert_eq!(cpu.regs.pc, 0x0038);
    // Return address is the instruction after HALT
    assert_eq!(bus.peek(0x7FFE), 0x02);
}

#[test]
fn ei_enables_after_following_instruction() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0xFB, 0x00, 0x00, 0x76]); // EI; NOP; NOP; HALT
    let mut cpu = Z180::new();
    cpu.regs.im = 1;
    cpu.regs.sp = 0x8000;
    bus.raise_irq(0x00);

    cpu.step(&mut bus); // EI — no acceptance yet
    assert_eq!(cpu.regs.pc, 0x0001);
    cpu.step(&mut bus); // NOP — still shielded
    assert_eq!(cpu.regs.pc, 0x0002);
    cpu.step(&mut bus); // acceptance
    assert_eq!(cpu.regs.pc, 0x0038);
}

#[test]
fn retn_restores_iff1_from_iff2() {
    let mut bus = SimpleBus::new();
    bus.load(
        0x0000,
        &[
            0x31, 0x00, 0x80, // LD SP, 0x8000
            0x21, 0x0A, 0x00, // LD HL, 0x000A
            0xE5, // PUSH HL
            0xED, 0x45, // RETN
            0x00, // (skipped)
            0x76, // 0x000A: HALT
        ],
    );
    let mut cpu = Z180::new();
    cpu.regs.iff2 = true;
    run_until_halt(&mut cpu, &mut bus);
    assert!(cpu.regs.iff1);
}

#[test]
fn adc_hl_sets_sign_and_overflow() {
    let (cpu, _) = run_program(&[
        0x21, 0xFF, 0x7F, // LD HL, 0x7FFF
        0x01, 0x01, 0x00, // LD BC, 1
        0xB7, // OR A (clear carry)
        0xED, 0x4A, // ADC HL, BC
        0x76,
    ]);
    assert_eq!(cpu.regs.hl(), 0x8000);
    assert_ne!(cpu.regs.f & SF, 0);
    assert_ne!(cpu.regs.f & PF, 0);
}

#[test]
fn sbc_hl_borrow() {
    let (cpu, _) = run_program(&[
        0x21, 0x00, 0x00, // LD HL, 0
        0x01, 0x01, 0x00, // LD BC, 1
        0xB7, // OR A (clear carry)
        0xED, 0x42, // SBC HL, BC
        0x76,
    ]);
    assert_eq!(cpu.regs.hl(), 0xFFFF);
    assert_ne!(cpu.regs.f & CF, 0);
}
