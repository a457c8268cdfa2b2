//! End-to-end scenarios: whole programs run through the normal dispatcher,
//! checking final register/pc/trap state rather than individual opcodes.

use rvcore::backends::FlatMemory;
use rvcore::core::{Fetch, Traps, XRegisterFile};
use rvcore::dcode;
use rvcore::dispatch::{self, Extensions};
use rvcore::memory::Memory;
use rvcore::run::run;
use rvcore::trap::TrapKind;
use rvcore::Cpu;

fn cpu_with(words: &[u32]) -> Cpu<FlatMemory> {
    let mut mem = FlatMemory::new(64);
    for (i, &word) in words.iter().enumerate() {
        mem.write_word(i as u32 * 4, word).unwrap();
    }
    let mut cpu = Cpu::new(mem);
    cpu.set_next_pc(0);
    cpu
}

fn run_to_trap(cpu: &mut Cpu<FlatMemory>, extensions: Extensions, budget: u32) {
    run(cpu, budget, |cpu| dispatch::step(cpu, extensions));
}

#[test]
fn immediate_load_then_breakpoint() {
    // addi x1, x0, 10; ebreak
    let mut cpu = cpu_with(&[0x00a0_0093, 0x0010_0073]);
    run_to_trap(&mut cpu, Extensions::I, 10);
    assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
    assert_eq!(cpu.read_x(1), 10);
    assert_eq!(cpu.pc(), 4);
}

#[test]
fn arithmetic_then_store_load_round_trip() {
    // addi x3, x0, 12; sw x3, 16(x0); lw x4, 16(x0); ebreak
    let mut cpu = cpu_with(&[0x00c0_0193, 0x0030_2823, 0x0100_2203, 0x0010_0073]);
    run_to_trap(&mut cpu, Extensions::I, 10);
    assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
    assert_eq!(cpu.read_x(3), 12);
    assert_eq!(cpu.read_x(4), 12);
}

#[test]
fn branch_not_taken_falls_through() {
    // addi x3, x0, 0x55; bne x1, x2, 8 (not taken, x1 == x2 == 0); ebreak
    let mut cpu = cpu_with(&[0x0550_0193, 0x0020_9463, 0x0010_0073]);
    run_to_trap(&mut cpu, Extensions::I, 10);
    assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
    assert_eq!(cpu.read_x(3), 0x55);
    assert_eq!(cpu.pc(), 8);
}

#[test]
fn signed_overflow_division_guard() {
    // lui x1, 0x80000; addi x2, x0, -1; div x3, x1, x2; rem x4, x1, x2; ebreak
    let mut cpu = cpu_with(&[
        0x8000_00b7,
        0xfff0_0113,
        0x0220_c1b3,
        0x0220_e233,
        0x0010_0073,
    ]);
    run_to_trap(&mut cpu, Extensions::IM, 10);
    assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
    assert_eq!(cpu.read_x(3), 0x8000_0000);
    assert_eq!(cpu.read_x(4), 0);
}

#[test]
fn load_past_the_backing_store_faults() {
    // lui x1, 0x10; lw x2, 0(x1)
    let mut cpu = cpu_with(&[0x0001_00b7, 0x0000_a103]);
    run_to_trap(&mut cpu, Extensions::I, 10);
    let trap = cpu.trap_cause().unwrap();
    assert_eq!(trap.kind, TrapKind::LoadAccessFault);
    assert_eq!(trap.context, 0x10000);
}

#[test]
fn compressed_expansion_matches_canonical_semantics() {
    let mut mem = FlatMemory::new(64);
    mem.write_halfword(0, 0x50f5).unwrap(); // c.li x1, -3
    mem.write_word(2, 0x0010_0073).unwrap(); // ebreak, full width
    let mut cpu = Cpu::new(mem);
    cpu.set_next_pc(0);
    run_to_trap(&mut cpu, Extensions::IC, 10);
    assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
    assert_eq!(cpu.read_x(1), 0xffff_fffd);
    assert_eq!(cpu.pc(), 2);
}

#[test]
fn x0_is_never_writable_end_to_end() {
    // addi x0, x0, 7; addi x1, x0, 0; ebreak
    let mut cpu = cpu_with(&[0x0070_0013, 0x0000_0093, 0x0010_0073]);
    run_to_trap(&mut cpu, Extensions::I, 10);
    assert_eq!(cpu.read_x(0), 0);
}

#[test]
fn pc_advances_by_four_between_non_branching_full_width_steps() {
    // three back-to-back nops, then ebreak
    let mut cpu = cpu_with(&[0x0000_0013, 0x0000_0013, 0x0000_0013, 0x0010_0073]);
    dispatch::step(&mut cpu, Extensions::I);
    assert_eq!(cpu.pc(), 0);
    dispatch::step(&mut cpu, Extensions::I);
    assert_eq!(cpu.pc(), 4);
    dispatch::step(&mut cpu, Extensions::I);
    assert_eq!(cpu.pc(), 8);
}

#[test]
fn decoder_never_panics_across_a_spread_of_words() {
    // A grab-bag of opcodes, malformed words, and all-ones/all-zeros, none
    // of which should panic the decoder; unrecognised words just decode to
    // `Operation::Illegal`.
    let words: &[u32] = &[
        0x0000_0000,
        0xffff_ffff,
        0x0000_0003, // opcode only, no valid funct3 combination
        0x0010_0073, // ebreak
        0x0000_0073, // ecall
        0x0000_006f, // jal x0, 0
        0x0000_0017, // auipc x0, 0
        0x0000_0037, // lui x0, 0
        0x0220_80b3, // mul x1, x1, x2
        0x0000_0053, // fadd.s-shaped word, F disabled
    ];
    for &word in words {
        let _ = dcode::encode(word, Extensions::ALL);
        let _ = dcode::encode(word, Extensions::I);
    }
}

#[test]
fn clear_traps_allows_rerunning_the_same_program() {
    let mut cpu = cpu_with(&[0x0010_0073]); // ebreak
    run_to_trap(&mut cpu, Extensions::I, 5);
    assert!(cpu.is_trapped());
    cpu.clear_traps();
    assert!(!cpu.is_trapped());
    cpu.set_next_pc(0);
    run_to_trap(&mut cpu, Extensions::I, 5);
    assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
}
