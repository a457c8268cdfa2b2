//! The "Remix" alternate cache: rewrites instructions in place rather
//! than keeping a side array, grounded on the original `arviss` source's
//! `include/arviss/remix/encoder.h`. Only the I extension is
//! transcoded; M/F instructions are re-decoded on every visit.
//!
//! A transcoded word's low 7 bits carry a discriminator tag chosen so its
//! low two bits are never `0b11` (the pattern every untranscoded
//! full-width RISC-V word carries), and its remaining 25 bits carry an
//! index into this cache's own operand table — the ISA doesn't leave
//! enough spare bits in a 32-bit word to both tag an operation and pack
//! every operand group (a `jal`'s 20-bit immediate plus its `rd` alone
//! need 25 bits), so unlike the source's single self-contained word this
//! implementation keeps operands out of line and the in-place word is
//! just `(index << 7) | TAG`.

use crate::core::{Fetch, Traps};
use crate::dcode::{self, Operation};
use crate::dispatch::Extensions;
use crate::exec::rv32i;
use crate::memory::Memory;
use crate::trap::TrapKind;
use crate::Cpu;

/// The discriminator tag written into a transcoded word's low 7 bits.
/// Zero trivially satisfies "low two bits never `0b11`".
const TRANSCODED_TAG: u32 = 0b000_0000;

/// Upper bound on the side table's length: `index << 7` must fit in the 25
/// bits left over once the low 7 bits carry `TRANSCODED_TAG`.
const MAX_TABLE_LEN: usize = 1 << 25;

/// True for operations this cache is willing to transcode. M and F
/// instructions, and anything already illegal or compressed, fall through
/// to a fresh decode on every visit instead.
fn is_transcodable(op: &Operation) -> bool {
    matches!(
        op,
        Operation::RegReg { .. }
            | Operation::RegImm { .. }
            | Operation::Shift { .. }
            | Operation::Load { .. }
            | Operation::Store { .. }
            | Operation::Branch { .. }
            | Operation::Jal { .. }
            | Operation::Jalr { .. }
            | Operation::Lui { .. }
            | Operation::Auipc { .. }
            | Operation::Fence
            | Operation::Ecall
            | Operation::Ebreak
    )
}

/// The operand side-table a transcoded word's index selects into.
#[derive(Debug, Default)]
pub struct Remix {
    table: Vec<Operation>,
}

impl Remix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panics past `MAX_TABLE_LEN`: the packed word only has 25 spare bits
    /// to carry an index once the low 7 carry `TRANSCODED_TAG`, and a
    /// silent wrap there would alias unrelated table entries.
    fn push(&mut self, op: Operation) -> u32 {
        assert!(
            self.table.len() < MAX_TABLE_LEN,
            "remix side table exceeded {MAX_TABLE_LEN} entries"
        );
        self.table.push(op);
        (self.table.len() - 1) as u32
    }
}

/// Remix's own fetch. A transcoded word is a full 4-byte slot regardless
/// of its low two bits, so its tag must be checked *before* falling back
/// to `Fetch::fetch()`'s generic compressed-vs-full-width classification,
/// which would otherwise misread `TRANSCODED_TAG`'s zero low bits as a
/// 2-byte compressed instruction and both truncate the word and
/// under-advance `next_pc`.
fn raw_fetch<M: Memory>(cpu: &mut Cpu<M>) -> u32 {
    let pc = cpu.transfer();
    let word = match cpu.memory.read_word(pc) {
        Ok(word) => word,
        Err(fault) => {
            cpu.raise_trap(TrapKind::InstructionAccessFault, fault.address);
            return 0;
        }
    };

    if word & 0x7f == TRANSCODED_TAG || word & 0b11 == 0b11 {
        cpu.set_next_pc(pc.wrapping_add(4));
        word
    } else {
        cpu.set_next_pc(pc.wrapping_add(2));
        word & 0xffff
    }
}

/// Fetch, and either transcode-then-execute an untranscoded word, dispatch
/// a previously transcoded one straight from the side table, or (for M/F)
/// decode fresh every time.
pub fn step<M: Memory>(cpu: &mut Cpu<M>, remix: &mut Remix, extensions: Extensions) {
    let word = raw_fetch(cpu);
    if cpu.is_trapped() {
        return;
    }

    if word & 0x7f == TRANSCODED_TAG {
        let index = (word >> 7) as usize;
        match remix.table.get(index).copied() {
            Some(op) => dcode::execute(cpu, &op),
            None => rv32i::illegal(cpu, word),
        }
        return;
    }

    if word & 0b11 == 0b11 {
        let pc = cpu.pc();
        let op = dcode::encode(word, extensions);
        if is_transcodable(&op) {
            let index = remix.push(op);
            let packed = (index << 7) | TRANSCODED_TAG;
            // Ignore the write's own fault status: a failed rewrite just
            // means the next visit re-decodes from the untouched word.
            let _ = cpu.memory.unprotected_write_word(pc, packed);
        }
        dcode::execute(cpu, &op);
    } else {
        rv32i::illegal(cpu, word);
    }
}
