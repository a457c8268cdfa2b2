//! The run loop: drive one of the dispatcher variants for up to `n` steps
//! or until trapped. Generic over the stepping closure so the same loop
//! serves the normal dispatcher, the pre-decoded cache, and Remix.

use crate::core::Traps;
use crate::memory::Memory;
use crate::Cpu;

/// Execute `step` repeatedly against `cpu`, at most `n` times, stopping
/// early the moment `cpu` is trapped. Re-entrant: the caller may
/// `clear_traps`, reset `next_pc`, and call `run` again.
pub fn run<M, F>(cpu: &mut Cpu<M>, n: u32, mut step: F)
where
    M: Memory,
    F: FnMut(&mut Cpu<M>),
{
    let mut remaining = n;
    while remaining > 0 && !cpu.is_trapped() {
        step(cpu);
        remaining -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::FlatMemory;
    use crate::core::XRegisterFile;
    use crate::dispatch::{self, Extensions};
    use crate::trap::TrapKind;

    #[test]
    fn stops_on_trap_before_budget_exhausted() {
        let mut mem = FlatMemory::new(64);
        mem.load_image(&[
            0x93, 0x00, 0xa0, 0x00, // addi x1, x0, 10
            0x73, 0x00, 0x10, 0x00, // ebreak
        ]);
        let mut cpu = Cpu::new(mem);
        run(&mut cpu, 100, |cpu| dispatch::step(cpu, Extensions::I));
        assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
        assert_eq!(cpu.read_x(1), 10);
        assert_eq!(crate::core::Fetch::pc(&cpu), 4);
    }

    #[test]
    fn stops_on_budget_exhaustion_without_trap() {
        let mut mem = FlatMemory::new(64);
        mem.load_image(&[0x13, 0x00, 0x00, 0x00]); // addi x0, x0, 0 (nop), repeats forever
        let mut cpu = Cpu::new(mem);
        cpu.set_next_pc(0);
        run(&mut cpu, 3, |cpu| {
            cpu.set_next_pc(0);
            dispatch::step(cpu, Extensions::I);
        });
        assert!(!cpu.is_trapped());
    }

    #[test]
    fn is_reentrant_after_clearing_a_trap() {
        use crate::core::Traps;

        let mut mem = FlatMemory::new(64);
        mem.load_image(&[0x73, 0x00, 0x10, 0x00]); // ebreak
        let mut cpu = Cpu::new(mem);
        run(&mut cpu, 10, |cpu| dispatch::step(cpu, Extensions::I));
        assert!(cpu.is_trapped());

        cpu.clear_traps();
        cpu.set_next_pc(0);
        run(&mut cpu, 10, |cpu| dispatch::step(cpu, Extensions::I));
        assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
    }
}
