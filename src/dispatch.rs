//! The decoder/dispatcher: maps a fetched code word to the executor
//! handler that implements it, or to `illegal` if no pattern matches.
//!
//! Ordering follows spec §4.3: system instructions first (exact 12-bit
//! funct match), then register-register, then register-immediate, then
//! the remaining opcode-only groups. Masks are bit-exact with the RISC-V
//! unprivileged ISA; this function must classify every 32-bit word.

use crate::core::{FRegisterFile, Fetch, Traps, XRegisterFile};
use crate::decode::*;
use crate::exec::{rv32c, rv32f, rv32i, rv32m};
use crate::isa::*;
use crate::memory::Memory;
use crate::Cpu;

/// Which extensions beyond the mandatory base are enabled for this
/// dispatcher instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extensions {
    pub m: bool,
    pub c: bool,
    pub f: bool,
}

impl Extensions {
    pub const I: Self = Self { m: false, c: false, f: false };
    pub const IM: Self = Self { m: true, c: false, f: false };
    pub const IC: Self = Self { m: false, c: true, f: false };
    pub const IMC: Self = Self { m: true, c: true, f: false };
    pub const IMF: Self = Self { m: true, c: false, f: true };
    pub const ALL: Self = Self { m: true, c: true, f: true };
}

/// Fetch one instruction and dispatch it. Returns without effect beyond
/// whatever the handler did (register writes, memory writes, `next_pc`
/// redirection, or a raised trap).
pub fn step<M: Memory>(cpu: &mut Cpu<M>, extensions: Extensions) {
    let word = cpu.fetch();
    if cpu.is_trapped() {
        return;
    }
    dispatch(cpu, word, extensions);
}

pub fn dispatch<M: Memory>(cpu: &mut Cpu<M>, word: u32, extensions: Extensions) {
    if word & 0b11 != 0b11 {
        if extensions.c {
            rv32c::execute(cpu, word);
        } else {
            rv32i::illegal(cpu, word);
        }
        return;
    }
    dispatch_full_width(cpu, word, extensions);
}

fn dispatch_full_width<M: Memory>(cpu: &mut Cpu<M>, word: u32, extensions: Extensions) {
    let op = opcode(word);
    let f3 = funct3(word) as u32;
    let f7 = funct7(word) as u32;

    match op {
        OP_LUI => rv32i::lui(cpu, rd(word), imm_u(word)),
        OP_AUIPC => rv32i::auipc(cpu, rd(word), imm_u(word)),
        OP_JAL => {
            let link = cpu.pc().wrapping_add(4);
            rv32i::jal(cpu, rd(word), imm_j(word), link);
        }
        OP_JALR => {
            let link = cpu.pc().wrapping_add(4);
            rv32i::jalr(cpu, rd(word), rs1(word), imm_i(word), link);
        }
        OP_BRANCH => dispatch_branch(cpu, word, f3),
        OP_LOAD => dispatch_load(cpu, word, f3),
        OP_STORE => dispatch_store(cpu, word, f3),
        OP_IMM => dispatch_reg_imm(cpu, word, f3),
        OP => dispatch_reg_reg(cpu, word, f3, f7, extensions),
        OP_MISC_MEM => rv32i::fence(cpu),
        OP_SYSTEM => dispatch_system(cpu, word, f3),
        OP_LOAD_FP if extensions.f => {
            let addr = cpu.read_x(rs1(word)).wrapping_add(imm_i(word));
            if let Some(bits) = cpu.load_word(addr) {
                cpu.write_f(rd(word), f32::from_bits(bits));
            }
        }
        OP_STORE_FP if extensions.f => {
            let addr = cpu.read_x(rs1(word)).wrapping_add(imm_s(word));
            let bits = cpu.read_f(rs2(word)).to_bits();
            cpu.store_word(addr, bits);
        }
        OP_FMADD | OP_FMSUB | OP_FNMSUB | OP_FNMADD if extensions.f => {
            dispatch_fmadd(cpu, word, op)
        }
        OP_FP if extensions.f => dispatch_fp(cpu, word, f3, f7),
        _ => rv32i::illegal(cpu, word),
    }
}

fn dispatch_branch<M: Memory>(cpu: &mut Cpu<M>, word: u32, f3: u32) {
    let cond = match f3 {
        FUNCT3_BEQ => rv32i::BranchCond::Beq,
        FUNCT3_BNE => rv32i::BranchCond::Bne,
        FUNCT3_BLT => rv32i::BranchCond::Blt,
        FUNCT3_BGE => rv32i::BranchCond::Bge,
        FUNCT3_BLTU => rv32i::BranchCond::Bltu,
        FUNCT3_BGEU => rv32i::BranchCond::Bgeu,
        _ => {
            rv32i::illegal(cpu, word);
            return;
        }
    };
    rv32i::branch(cpu, cond, rs1(word), rs2(word), imm_b(word));
}

fn dispatch_load<M: Memory>(cpu: &mut Cpu<M>, word: u32, f3: u32) {
    let width = match f3 {
        FUNCT3_B => rv32i::LoadWidth::Byte,
        FUNCT3_H => rv32i::LoadWidth::Halfword,
        FUNCT3_W => rv32i::LoadWidth::Word,
        FUNCT3_BU => rv32i::LoadWidth::ByteUnsigned,
        FUNCT3_HU => rv32i::LoadWidth::HalfwordUnsigned,
        _ => {
            rv32i::illegal(cpu, word);
            return;
        }
    };
    rv32i::load(cpu, width, rd(word), rs1(word), imm_i(word));
}

fn dispatch_store<M: Memory>(cpu: &mut Cpu<M>, word: u32, f3: u32) {
    let width = match f3 {
        FUNCT3_B => rv32i::StoreWidth::Byte,
        FUNCT3_H => rv32i::StoreWidth::Halfword,
        FUNCT3_W => rv32i::StoreWidth::Word,
        _ => {
            rv32i::illegal(cpu, word);
            return;
        }
    };
    rv32i::store(cpu, width, rs1(word), rs2(word), imm_s(word));
}

fn dispatch_reg_imm<M: Memory>(cpu: &mut Cpu<M>, word: u32, f3: u32) {
    let op = match f3 {
        FUNCT3_ADDI => rv32i::AluOp::Add,
        FUNCT3_SLTI => rv32i::AluOp::Slt,
        FUNCT3_SLTIU => rv32i::AluOp::Sltu,
        FUNCT3_XORI => rv32i::AluOp::Xor,
        FUNCT3_ORI => rv32i::AluOp::Or,
        FUNCT3_ANDI => rv32i::AluOp::And,
        FUNCT3_SLLI => rv32i::AluOp::Sll,
        FUNCT3_SRLI_SRAI => {
            if funct7(word) as u32 == FUNCT7_ALT {
                rv32i::AluOp::Sra
            } else {
                rv32i::AluOp::Srl
            }
        }
        _ => {
            rv32i::illegal(cpu, word);
            return;
        }
    };
    let imm = match f3 {
        FUNCT3_SLLI | FUNCT3_SRLI_SRAI => u32::from(shamtw(word)),
        _ => imm_i(word),
    };
    rv32i::reg_imm(cpu, op, rd(word), rs1(word), imm);
}

fn dispatch_reg_reg<M: Memory>(cpu: &mut Cpu<M>, word: u32, f3: u32, f7: u32, extensions: Extensions) {
    if f7 == FUNCT7_MULDIV {
        if !extensions.m {
            rv32i::illegal(cpu, word);
            return;
        }
        dispatch_muldiv(cpu, word, f3);
        return;
    }
    let op = match (f3, f7) {
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
        _ => {
            rv32i::illegal(cpu, word);
            return;
        }
    };
    rv32i::reg_reg(cpu, op, rd(word), rs1(word), rs2(word));
}

fn dispatch_muldiv<M: Memory>(cpu: &mut Cpu<M>, word: u32, f3: u32) {
    match f3 {
        FUNCT3_MUL => rv32m::mul(cpu, rv32m::MulOp::Mul, rd(word), rs1(word), rs2(word)),
        FUNCT3_MULH => rv32m::mul(cpu, rv32m::MulOp::Mulh, rd(word), rs1(word), rs2(word)),
        FUNCT3_MULHSU => rv32m::mul(cpu, rv32m::MulOp::Mulhsu, rd(word), rs1(word), rs2(word)),
        FUNCT3_MULHU => rv32m::mul(cpu, rv32m::MulOp::Mulhu, rd(word), rs1(word), rs2(word)),
        FUNCT3_DIV => rv32m::div(cpu, rv32m::DivOp::Div, rd(word), rs1(word), rs2(word)),
        FUNCT3_DIVU => rv32m::div(cpu, rv32m::DivOp::Divu, rd(word), rs1(word), rs2(word)),
        FUNCT3_REM => rv32m::div(cpu, rv32m::DivOp::Rem, rd(word), rs1(word), rs2(word)),
        FUNCT3_REMU => rv32m::div(cpu, rv32m::DivOp::Remu, rd(word), rs1(word), rs2(word)),
        _ => rv32i::illegal(cpu, word),
    }
}

fn dispatch_system<M: Memory>(cpu: &mut Cpu<M>, word: u32, f3: u32) {
    if f3 != 0 {
        rv32i::illegal(cpu, word);
        return;
    }
    match imm_i(word) & 0xfff {
        FUNCT12_ECALL => rv32i::ecall(cpu),
        FUNCT12_EBREAK => rv32i::ebreak(cpu),
        _ => rv32i::illegal(cpu, word),
    }
}

fn dispatch_fmadd<M: Memory>(cpu: &mut Cpu<M>, word: u32, op: u32) {
    let (negate_product, negate_sum) = match op {
        OP_FMADD => (false, false),
        OP_FMSUB => (false, true),
        OP_FNMSUB => (true, false),
        OP_FNMADD => (true, true),
        _ => unreachable!("caller already matched one of the four fused opcodes"),
    };
    rv32f::fmadd(cpu, rd(word), rs1(word), rs2(word), rs3(word), negate_product, negate_sum);
}

fn dispatch_fp<M: Memory>(cpu: &mut Cpu<M>, word: u32, f3: u32, f7: u32) {
    match f7 {
        FUNCT7_FADD => rv32f::fbin(cpu, rv32f::FBinOp::Add, rd(word), rs1(word), rs2(word)),
        FUNCT7_FSUB => rv32f::fbin(cpu, rv32f::FBinOp::Sub, rd(word), rs1(word), rs2(word)),
        FUNCT7_FMUL => rv32f::fbin(cpu, rv32f::FBinOp::Mul, rd(word), rs1(word), rs2(word)),
        FUNCT7_FDIV => rv32f::fbin(cpu, rv32f::FBinOp::Div, rd(word), rs1(word), rs2(word)),
        FUNCT7_FSQRT => rv32f::fsqrt(cpu, rd(word), rs1(word)),
        FUNCT7_FSGNJ => {
            let sign_op = match f3 {
                FUNCT3_FSGNJ => rv32f::SignOp::Fsgnj,
                FUNCT3_FSGNJN => rv32f::SignOp::Fsgnjn,
                FUNCT3_FSGNJX => rv32f::SignOp::Fsgnjx,
                _ => {
                    rv32i::illegal(cpu, word);
                    return;
                }
            };
            rv32f::fsgnj(cpu, sign_op, rd(word), rs1(word), rs2(word));
        }
        FUNCT7_FMINMAX => {
            if f3 == FUNCT3_FMIN {
                rv32f::fmin(cpu, rd(word), rs1(word), rs2(word));
            } else {
                rv32f::fmax(cpu, rd(word), rs1(word), rs2(word));
            }
        }
        FUNCT7_FCMP => {
            let cmp_op = match f3 {
                FUNCT3_FLE => rv32f::FCmpOp::Fle,
                FUNCT3_FLT => rv32f::FCmpOp::Flt,
                FUNCT3_FEQ => rv32f::FCmpOp::Feq,
                _ => {
                    rv32i::illegal(cpu, word);
                    return;
                }
            };
            rv32f::fcmp(cpu, cmp_op, rd(word), rs1(word), rs2(word));
        }
        FUNCT7_FCVT_W_S => {
            if rs2(word) as u32 == RS2_FCVT_WU_S {
                rv32f::fcvt_wu_s(cpu, rd(word), rs1(word));
            } else {
                rv32f::fcvt_w_s(cpu, rd(word), rs1(word));
            }
        }
        FUNCT7_FCVT_S_W => {
            if rs2(word) as u32 == RS2_FCVT_S_WU {
                rv32f::fcvt_s_wu(cpu, rd(word), rs1(word));
            } else {
                rv32f::fcvt_s_w(cpu, rd(word), rs1(word));
            }
        }
        FUNCT7_FMV_X_W_FCLASS => {
            if f3 == FUNCT3_FCLASS {
                rv32f::fclass(cpu, rd(word), rs1(word));
            } else {
                rv32f::fmv_x_w(cpu, rd(word), rs1(word));
            }
        }
        FUNCT7_FMV_W_X => rv32f::fmv_w_x(cpu, rd(word), rs1(word)),
        _ => rv32i::illegal(cpu, word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::FlatMemory;
    use crate::core::{Traps, XRegisterFile};
    use crate::trap::TrapKind;

    fn cpu() -> Cpu<FlatMemory> {
        Cpu::new(FlatMemory::new(64))
    }

    #[test]
    fn addi_through_full_dispatch() {
        let mut cpu = cpu();
        // addi x1, x0, 10
        let instr = 0x00a0_0093;
        dispatch(&mut cpu, instr, Extensions::I);
        assert_eq!(cpu.read_x(1), 10);
    }

    #[test]
    fn unrecognised_word_raises_illegal_instruction() {
        let mut cpu = cpu();
        dispatch(&mut cpu, 0xffff_ffff, Extensions::I);
        assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::IllegalInstruction);
    }

    #[test]
    fn compressed_word_without_c_extension_is_illegal() {
        let mut cpu = cpu();
        dispatch(&mut cpu, 0x0001, Extensions::I);
        assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::IllegalInstruction);
    }

    #[test]
    fn muldiv_without_m_extension_is_illegal() {
        let mut cpu = cpu();
        // mul x1, x0, x0: opcode=0110011, funct3=000, funct7=0000001
        let instr = 0x0200_00b3;
        dispatch(&mut cpu, instr, Extensions::I);
        assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::IllegalInstruction);
    }

    #[test]
    fn ebreak_raises_breakpoint_through_dispatch() {
        let mut cpu = cpu();
        let instr = 0x0010_0073;
        dispatch(&mut cpu, instr, Extensions::I);
        assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
    }
}
