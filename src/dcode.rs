//! The pre-decoded ("DCode") operation cache, grounded on the original
//! `arviss` source's `include/arviss/dcode/encoder.h` and `caches.h`: an
//! array of pre-decoded records keyed by `pc / 4`, each initially the
//! `FetchDecodeExecute` sentinel, filled lazily on first visit.
//!
//! Compressed instructions don't fit the four-byte slot granularity this
//! cache assumes; a slot holding compressed code stores the raw halfword
//! and re-expands it every visit rather than pre-decoding further, which
//! keeps the cache correct (if not maximally fast) for mixed I/C streams.

use crate::core::{FRegisterFile, Fetch, Traps, XRegisterFile};
use crate::decode::*;
use crate::dispatch::Extensions;
use crate::exec::{rv32c, rv32f, rv32i, rv32m};
use crate::isa::*;
use crate::memory::Memory;
use crate::Cpu;

/// Default slot count: 8,192 four-byte slots, i.e. 32 KiB of code space.
pub const DEFAULT_SLOTS: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    FetchDecodeExecute,
    Illegal(u32),
    Compressed(u32),
    RegReg { op: rv32i::AluOp, rd: u8, rs1: u8, rs2: u8 },
    RegImm { op: rv32i::AluOp, rd: u8, rs1: u8, imm: u32 },
    Shift { op: rv32i::AluOp, rd: u8, rs1: u8, shamt: u32 },
    Load { width: rv32i::LoadWidth, rd: u8, rs1: u8, imm: u32 },
    Store { width: rv32i::StoreWidth, rs1: u8, rs2: u8, imm: u32 },
    Branch { cond: rv32i::BranchCond, rs1: u8, rs2: u8, imm: u32 },
    Jal { rd: u8, imm: u32 },
    Jalr { rd: u8, rs1: u8, imm: u32 },
    Lui { rd: u8, imm: u32 },
    Auipc { rd: u8, imm: u32 },
    Fence,
    Ecall,
    Ebreak,
    Mul { op: rv32m::MulOp, rd: u8, rs1: u8, rs2: u8 },
    Div { op: rv32m::DivOp, rd: u8, rs1: u8, rs2: u8 },
    FLoad { rd: u8, rs1: u8, imm: u32 },
    FStore { rs1: u8, rs2: u8, imm: u32 },
    FBin { op: rv32f::FBinOp, rd: u8, rs1: u8, rs2: u8 },
    FSqrt { rd: u8, rs1: u8 },
    FMadd { rd: u8, rs1: u8, rs2: u8, rs3: u8, negate_product: bool, negate_sum: bool },
    FMinMax { is_min: bool, rd: u8, rs1: u8, rs2: u8 },
    FCmp { op: rv32f::FCmpOp, rd: u8, rs1: u8, rs2: u8 },
    FSgnj { op: rv32f::SignOp, rd: u8, rs1: u8, rs2: u8 },
    FCvtWS { unsigned: bool, rd: u8, rs1: u8 },
    FCvtSW { unsigned: bool, rd: u8, rs1: u8 },
    FMvXW { rd: u8, rs1: u8 },
    FMvWX { rd: u8, rs1: u8 },
    FClass { rd: u8, rs1: u8 },
}

/// Decode `word` (already classified as full-width by its low two bits, or
/// a zero-extended compressed halfword) into a pre-decoded record. Mirrors
/// `dispatch::dispatch`'s classification exactly; a decode failure
/// produces `Operation::Illegal`, never a panic.
pub fn encode(word: u32, extensions: Extensions) -> Operation {
    if word & 0b11 != 0b11 {
        return if extensions.c {
            Operation::Compressed(word)
        } else {
            Operation::Illegal(word)
        };
    }

    let op = opcode(word);
    let f3 = funct3(word) as u32;
    let f7 = funct7(word) as u32;

    match op {
        OP_LUI => Operation::Lui { rd: rd(word), imm: imm_u(word) },
        OP_AUIPC => Operation::Auipc { rd: rd(word), imm: imm_u(word) },
        OP_JAL => Operation::Jal { rd: rd(word), imm: imm_j(word) },
        OP_JALR => Operation::Jalr { rd: rd(word), rs1: rs1(word), imm: imm_i(word) },
        OP_BRANCH => encode_branch(word, f3),
        OP_LOAD => encode_load(word, f3),
        OP_STORE => encode_store(word, f3),
        OP_IMM => encode_reg_imm(word, f3, f7),
        OP => encode_reg_reg(word, f3, f7, extensions),
        OP_MISC_MEM => Operation::Fence,
        OP_SYSTEM => encode_system(word, f3),
        OP_LOAD_FP if extensions.f => {
            Operation::FLoad { rd: rd(word), rs1: rs1(word), imm: imm_i(word) }
        }
        OP_STORE_FP if extensions.f => {
            Operation::FStore { rs1: rs1(word), rs2: rs2(word), imm: imm_s(word) }
        }
        OP_FMADD | OP_FMSUB | OP_FNMSUB | OP_FNMADD if extensions.f => {
            let (negate_product, negate_sum) = match op {
                OP_FMADD => (false, false),
                OP_FMSUB => (false, true),
                OP_FNMSUB => (true, false),
                _ => (true, true),
            };
            Operation::FMadd {
                rd: rd(word),
                rs1: rs1(word),
                rs2: rs2(word),
                rs3: rs3(word),
                negate_product,
                negate_sum,
            }
        }
        OP_FP if extensions.f => encode_fp(word, f3, f7),
        _ => Operation::Illegal(word),
    }
}

fn encode_branch(word: u32, f3: u32) -> Operation {
    let cond = match f3 {
        FUNCT3_BEQ => rv32i::BranchCond::Beq,
        FUNCT3_BNE => rv32i::BranchCond::Bne,
        FUNCT3_BLT => rv32i::BranchCond::Blt,
        FUNCT3_BGE => rv32i::BranchCond::Bge,
        FUNCT3_BLTU => rv32i::BranchCond::Bltu,
        FUNCT3_BGEU => rv32i::BranchCond::Bgeu,
        _ => return Operation::Illegal(word),
    };
    Operation::Branch { cond, rs1: rs1(word), rs2: rs2(word), imm: imm_b(word) }
}

fn encode_load(word: u32, f3: u32) -> Operation {
    let width = match f3 {
        FUNCT3_B => rv32i::LoadWidth::Byte,
        FUNCT3_H => rv32i::LoadWidth::Halfword,
        FUNCT3_W => rv32i::LoadWidth::Word,
        FUNCT3_BU => rv32i::LoadWidth::ByteUnsigned,
        FUNCT3_HU => rv32i::LoadWidth::HalfwordUnsigned,
        _ => return Operation::Illegal(word),
    };
    Operation::Load { width, rd: rd(word), rs1: rs1(word), imm: imm_i(word) }
}

fn encode_store(word: u32, f3: u32) -> Operation {
    let width = match f3 {
        FUNCT3_B => rv32i::StoreWidth::Byte,
        FUNCT3_H => rv32i::StoreWidth::Halfword,
        FUNCT3_W => rv32i::StoreWidth::Word,
        _ => return Operation::Illegal(word),
    };
    Operation::Store { width, rs1: rs1(word), rs2: rs2(word), imm: imm_s(word) }
}

fn encode_reg_imm(word: u32, f3: u32, f7: u32) -> Operation {
    match f3 {
        FUNCT3_ADDI => Operation::RegImm { op: rv32i::AluOp::Add, rd: rd(word), rs1: rs1(word), imm: imm_i(word) },
        FUNCT3_SLTI => Operation::RegImm { op: rv32i::AluOp::Slt, rd: rd(word), rs1: rs1(word), imm: imm_i(word) },
        FUNCT3_SLTIU => Operation::RegImm { op: rv32i::AluOp::Sltu, rd: rd(word), rs1: rs1(word), imm: imm_i(word) },
        FUNCT3_XORI => Operation::RegImm { op: rv32i::AluOp::Xor, rd: rd(word), rs1: rs1(word), imm: imm_i(word) },
        FUNCT3_ORI => Operation::RegImm { op: rv32i::AluOp::Or, rd: rd(word), rs1: rs1(word), imm: imm_i(word) },
        FUNCT3_ANDI => Operation::RegImm { op: rv32i::AluOp::And, rd: rd(word), rs1: rs1(word), imm: imm_i(word) },
        FUNCT3_SLLI => Operation::Shift { op: rv32i::AluOp::Sll, rd: rd(word), rs1: rs1(word), shamt: u32::from(shamtw(word)) },
        FUNCT3_SRLI_SRAI => {
            let op = if f7 == FUNCT7_ALT { rv32i::AluOp::Sra } else { rv32i::AluOp::Srl };
            Operation::Shift { op, rd: rd(word), rs1: rs1(word), shamt: u32::from(shamtw(word)) }
        }
        _ => Operation::Illegal(word),
    }
}

fn encode_reg_reg(word: u32, f3: u32, f7: u32, extensions: Extensions) -> Operation {
    if f7 == FUNCT7_MULDIV {
        if !extensions.m {
            return Operation::Illegal(word);
        }
        return match f3 {
            FUNCT3_MUL => Operation::Mul { op: rv32m::MulOp::Mul, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
            FUNCT3_MULH => Operation::Mul { op: rv32m::MulOp::Mulh, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
            FUNCT3_MULHSU => Operation::Mul { op: rv32m::MulOp::Mulhsu, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
            FUNCT3_MULHU => Operation::Mul { op: rv32m::MulOp::Mulhu, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
            FUNCT3_DIV => Operation::Div { op: rv32m::DivOp::Div, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
            FUNCT3_DIVU => Operation::Div { op: rv32m::DivOp::Divu, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
            FUNCT3_REM => Operation::Div { op: rv32m::DivOp::Rem, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
            FUNCT3_REMU => Operation::Div { op: rv32m::DivOp::Remu, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
            _ => Operation::Illegal(word),
        };
    }
    let alu_op = match (f3, f7) {
        (FUNCT3_ADD_SUB, FUNCT7_BASE) => rv32i::AluOp::Add,
        (FUNCT3_ADD_SUB, FUNCT7_ALT) => rv32i::AluOp::Sub,
        (FUNCT3_SLL, FUNCT7_BASE) => rv32i::AluOp::Sll,
        (FUNCT3_SLT, FUNCT7_BASE) => rv32i::AluOp::Slt,
        (FUNCT3_SLTU, FUNCT7_BASE) => rv32i::AluOp::Sltu,
        (FUNCT3_XOR, FUNCT7_BASE) => rv32i::AluOp::Xor,
        (FUNCT3_SRL_SRA, FUNCT7_BASE) => rv32i::AluOp::Srl,
        (FUNCT3_SRL_SRA, FUNCT7_ALT) => rv32i::AluOp::Sra,
        (FUNCT3_OR, FUNCT7_BASE) => rv32i::AluOp::Or,
        (FUNCT3_AND, FUNCT7_BASE) => rv32i::AluOp::And,
        _ => return Operation::Illegal(word),
    };
    Operation::RegReg { op: alu_op, rd: rd(word), rs1: rs1(word), rs2: rs2(word) }
}

fn encode_system(word: u32, f3: u32) -> Operation {
    if f3 != 0 {
        return Operation::Illegal(word);
    }
    match imm_i(word) & 0xfff {
        FUNCT12_ECALL => Operation::Ecall,
        FUNCT12_EBREAK => Operation::Ebreak,
        _ => Operation::Illegal(word),
    }
}

fn encode_fp(word: u32, f3: u32, f7: u32) -> Operation {
    match f7 {
        FUNCT7_FADD => Operation::FBin { op: rv32f::FBinOp::Add, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
        FUNCT7_FSUB => Operation::FBin { op: rv32f::FBinOp::Sub, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
        FUNCT7_FMUL => Operation::FBin { op: rv32f::FBinOp::Mul, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
        FUNCT7_FDIV => Operation::FBin { op: rv32f::FBinOp::Div, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
        FUNCT7_FSQRT => Operation::FSqrt { rd: rd(word), rs1: rs1(word) },
        FUNCT7_FSGNJ => {
            let sign_op = match f3 {
                FUNCT3_FSGNJ => rv32f::SignOp::Fsgnj,
                FUNCT3_FSGNJN => rv32f::SignOp::Fsgnjn,
                FUNCT3_FSGNJX => rv32f::SignOp::Fsgnjx,
                _ => return Operation::Illegal(word),
            };
            Operation::FSgnj { op: sign_op, rd: rd(word), rs1: rs1(word), rs2: rs2(word) }
        }
        FUNCT7_FMINMAX => Operation::FMinMax { is_min: f3 == FUNCT3_FMIN, rd: rd(word), rs1: rs1(word), rs2: rs2(word) },
        FUNCT7_FCMP => {
            let cmp_op = match f3 {
                FUNCT3_FLE => rv32f::FCmpOp::Fle,
                FUNCT3_FLT => rv32f::FCmpOp::Flt,
                FUNCT3_FEQ => rv32f::FCmpOp::Feq,
                _ => return Operation::Illegal(word),
            };
            Operation::FCmp { op: cmp_op, rd: rd(word), rs1: rs1(word), rs2: rs2(word) }
        }
        FUNCT7_FCVT_W_S => Operation::FCvtWS { unsigned: rs2(word) as u32 == RS2_FCVT_WU_S, rd: rd(word), rs1: rs1(word) },
        FUNCT7_FCVT_S_W => Operation::FCvtSW { unsigned: rs2(word) as u32 == RS2_FCVT_S_WU, rd: rd(word), rs1: rs1(word) },
        FUNCT7_FMV_X_W_FCLASS => {
            if f3 == FUNCT3_FCLASS {
                Operation::FClass { rd: rd(word), rs1: rs1(word) }
            } else {
                Operation::FMvXW { rd: rd(word), rs1: rs1(word) }
            }
        }
        FUNCT7_FMV_W_X => Operation::FMvWX { rd: rd(word), rs1: rs1(word) },
        _ => Operation::Illegal(word),
    }
}

/// Apply a pre-decoded operation's effect to the core.
pub fn execute<M: Memory>(cpu: &mut Cpu<M>, op: &Operation) {
    match *op {
        Operation::FetchDecodeExecute => unreachable!("the cache fills this slot before dispatching it"),
        Operation::Illegal(code) => rv32i::illegal(cpu, code),
        Operation::Compressed(word) => rv32c::execute(cpu, word),
        Operation::RegReg { op, rd, rs1, rs2 } => rv32i::reg_reg(cpu, op, rd, rs1, rs2),
        Operation::RegImm { op, rd, rs1, imm } => rv32i::reg_imm(cpu, op, rd, rs1, imm),
        Operation::Shift { op, rd, rs1, shamt } => rv32i::reg_imm(cpu, op, rd, rs1, shamt),
        Operation::Load { width, rd, rs1, imm } => rv32i::load(cpu, width, rd, rs1, imm),
        Operation::Store { width, rs1, rs2, imm } => rv32i::store(cpu, width, rs1, rs2, imm),
        Operation::Branch { cond, rs1, rs2, imm } => rv32i::branch(cpu, cond, rs1, rs2, imm),
        Operation::Jal { rd, imm } => {
            let link = cpu.pc().wrapping_add(4);
            rv32i::jal(cpu, rd, imm, link);
        }
        Operation::Jalr { rd, rs1, imm } => {
            let link = cpu.pc().wrapping_add(4);
            rv32i::jalr(cpu, rd, rs1, imm, link);
        }
        Operation::Lui { rd, imm } => rv32i::lui(cpu, rd, imm),
        Operation::Auipc { rd, imm } => rv32i::auipc(cpu, rd, imm),
        Operation::Fence => rv32i::fence(cpu),
        Operation::Ecall => rv32i::ecall(cpu),
        Operation::Ebreak => rv32i::ebreak(cpu),
        Operation::Mul { op, rd, rs1, rs2 } => rv32m::mul(cpu, op, rd, rs1, rs2),
        Operation::Div { op, rd, rs1, rs2 } => rv32m::div(cpu, op, rd, rs1, rs2),
        Operation::FLoad { rd, rs1, imm } => {
            let addr = cpu.read_x(rs1).wrapping_add(imm);
            if let Some(bits) = cpu.load_word(addr) {
                cpu.write_f(rd, f32::from_bits(bits));
            }
        }
        Operation::FStore { rs1, rs2, imm } => {
            let addr = cpu.read_x(rs1).wrapping_add(imm);
            let bits = cpu.read_f(rs2).to_bits();
            cpu.store_word(addr, bits);
        }
        Operation::FBin { op, rd, rs1, rs2 } => rv32f::fbin(cpu, op, rd, rs1, rs2),
        Operation::FSqrt { rd, rs1 } => rv32f::fsqrt(cpu, rd, rs1),
        Operation::FMadd { rd, rs1, rs2, rs3, negate_product, negate_sum } => {
            rv32f::fmadd(cpu, rd, rs1, rs2, rs3, negate_product, negate_sum)
        }
        Operation::FMinMax { is_min, rd, rs1, rs2 } => {
            if is_min {
                rv32f::fmin(cpu, rd, rs1, rs2);
            } else {
                rv32f::fmax(cpu, rd, rs1, rs2);
            }
        }
        Operation::FCmp { op, rd, rs1, rs2 } => rv32f::fcmp(cpu, op, rd, rs1, rs2),
        Operation::FSgnj { op, rd, rs1, rs2 } => rv32f::fsgnj(cpu, op, rd, rs1, rs2),
        Operation::FCvtWS { unsigned, rd, rs1 } => {
            if unsigned {
                rv32f::fcvt_wu_s(cpu, rd, rs1);
            } else {
                rv32f::fcvt_w_s(cpu, rd, rs1);
            }
        }
        Operation::FCvtSW { unsigned, rd, rs1 } => {
            if unsigned {
                rv32f::fcvt_s_wu(cpu, rd, rs1);
            } else {
                rv32f::fcvt_s_w(cpu, rd, rs1);
            }
        }
        Operation::FMvXW { rd, rs1 } => rv32f::fmv_x_w(cpu, rd, rs1),
        Operation::FMvWX { rd, rs1 } => rv32f::fmv_w_x(cpu, rd, rs1),
        Operation::FClass { rd, rs1 } => rv32f::fclass(cpu, rd, rs1),
    }
}

/// Slot array, one entry per four bytes of code space, lazily filled.
#[derive(Debug)]
pub struct Cache {
    slots: Vec<Operation>,
}

impl Cache {
    pub fn new(slots: usize) -> Self {
        Self { slots: vec![Operation::FetchDecodeExecute; slots] }
    }

    fn slot_for(&self, pc: u32) -> usize {
        (pc / 4) as usize % self.slots.len()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_SLOTS)
    }
}

/// Fetch, look up (or fill) the cache slot for the new `pc`, and dispatch.
pub fn step<M: Memory>(cpu: &mut Cpu<M>, cache: &mut Cache, extensions: Extensions) {
    let word = cpu.fetch();
    if cpu.is_trapped() {
        return;
    }
    let slot = cache.slot_for(cpu.pc());
    if matches!(cache.slots[slot], Operation::FetchDecodeExecute) {
        cache.slots[slot] = encode(word, extensions);
    }
    let op = cache.slots[slot];
    execute(cpu, &op);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::FlatMemory;

    fn cpu() -> Cpu<FlatMemory> {
        Cpu::new(FlatMemory::new(64))
    }

    #[test]
    fn fills_slot_on_first_visit_then_reuses_it() {
        let mut cpu = cpu();
        cpu.memory.write_word(0, 0x00a0_0093).unwrap(); // addi x1, x0, 10
        let mut cache = Cache::new(16);
        cpu.set_next_pc(0);
        step(&mut cpu, &mut cache, Extensions::I);
        assert_eq!(cpu.read_x(1), 10);
        assert!(!matches!(cache.slots[0], Operation::FetchDecodeExecute));

        // Mutate the backing memory; the stale cache entry is still used.
        cpu.memory.write_word(0, 0x0000_0013).unwrap(); // nop (addi x0,x0,0)
        cpu.set_next_pc(0);
        step(&mut cpu, &mut cache, Extensions::I);
        assert_eq!(cpu.read_x(1), 10);
    }

    #[test]
    fn matches_normal_dispatch_for_the_same_program() {
        use crate::dispatch;

        let program: [u32; 3] = [0x00a0_0093, 0x0050_0113, 0x0010_0073]; // addi x1,x0,10; addi x2,x0,5; ebreak
        let mut direct = cpu();
        for (i, &word) in program.iter().enumerate() {
            direct.memory.write_word(i as u32 * 4, word).unwrap();
        }
        let mut cached = cpu();
        for (i, &word) in program.iter().enumerate() {
            cached.memory.write_word(i as u32 * 4, word).unwrap();
        }
        let mut cache = Cache::new(16);

        direct.set_next_pc(0);
        cached.set_next_pc(0);
        for _ in 0..3 {
            dispatch::step(&mut direct, dispatch::Extensions::I);
            step(&mut cached, &mut cache, Extensions::I);
        }
        assert_eq!(direct.read_x(1), cached.read_x(1));
        assert_eq!(direct.read_x(2), cached.read_x(2));
        assert_eq!(direct.trap_cause(), cached.trap_cause());
    }
}
