//! Compressed (`C` extension) instruction expansion.
//!
//! Each compressed form is decoded to its operands directly (no detour
//! through a synthesised full-width word) and dispatched straight to the
//! RV32I/M handler that implements its canonical expansion, per spec:
//! "semantics are exactly those of the expansion."

use crate::core::{Fetch, Traps, XRegisterFile};
use crate::decode::*;
use crate::exec::rv32i::{self, AluOp, BranchCond, LoadWidth, StoreWidth};
use crate::memory::Memory;
use crate::trap::TrapKind;
use crate::Cpu;

const SP: u8 = 2;

/// The compressed instruction's funct3 lives at bits [15:13], unlike the
/// full-width encoding's [14:12] (see `decode::funct3`).
fn c_funct3(instr: u32) -> u32 {
    extract_field(instr, 15, 13)
}

pub fn execute<M: Memory>(cpu: &mut Cpu<M>, instr: u32) {
    let quadrant = extract_field(instr, 1, 0);
    let f3 = c_funct3(instr);
    match quadrant {
        0b00 => quadrant0(cpu, instr, f3),
        0b01 => quadrant1(cpu, instr, f3),
        0b10 => quadrant2(cpu, instr, f3),
        _ => rv32i::illegal(cpu, instr),
    }
}

fn quadrant0<M: Memory>(cpu: &mut Cpu<M>, instr: u32, f3: u32) {
    match f3 {
        0b000 => {
            // c.addi4spn: rd' = x2 + nzuimm
            let nzuimm = c_nzuimm10(instr);
            if nzuimm == 0 {
                rv32i::illegal(cpu, instr);
                return;
            }
            rv32i::reg_imm(cpu, AluOp::Add, c_rs2p(instr), SP, nzuimm);
        }
        0b010 => {
            // c.lw: rd' = m32[rs1' + uimm]
            rv32i::load(cpu, LoadWidth::Word, c_rs2p(instr), c_rs1p(instr), c_uimm7(instr));
        }
        0b110 => {
            // c.sw: m32[rs1' + uimm] = rs2'
            rv32i::store(cpu, StoreWidth::Word, c_rs1p(instr), c_rs2p(instr), c_uimm7(instr));
        }
        _ => rv32i::illegal(cpu, instr),
    }
}

fn quadrant1<M: Memory>(cpu: &mut Cpu<M>, instr: u32, f3: u32) {
    let link = cpu.pc().wrapping_add(4);
    match f3 {
        0b000 => {
            // c.addi (rd == 0 is c.nop; addi x0,x0,imm is harmless either way)
            rv32i::reg_imm(cpu, AluOp::Add, c_rd_rs1(instr), c_rd_rs1(instr), c_nzimm6(instr));
        }
        0b001 => {
            // c.jal: x1 = link; pc += imm
            rv32i::jal(cpu, 1, c_imm12(instr), link);
        }
        0b010 => {
            // c.li: rd = sx(imm)
            rv32i::reg_imm(cpu, AluOp::Add, c_rd_rs1(instr), 0, c_imm6(instr));
        }
        0b011 => {
            let rd = c_rd_rs1(instr);
            if rd == SP {
                rv32i::reg_imm(cpu, AluOp::Add, SP, SP, c_nzimm10(instr));
            } else if rd != 0 {
                rv32i::lui(cpu, rd, c_nzimm18(instr));
            } else {
                rv32i::illegal(cpu, instr);
            }
        }
        0b100 => quadrant1_arith(cpu, instr),
        0b101 => {
            // c.j: unconditional, no linkage.
            rv32i::jal(cpu, 0, c_imm12(instr), link);
        }
        0b110 => {
            rv32i::branch(cpu, BranchCond::Beq, c_rs1p(instr), 0, c_bimm9(instr));
        }
        0b111 => {
            rv32i::branch(cpu, BranchCond::Bne, c_rs1p(instr), 0, c_bimm9(instr));
        }
        _ => unreachable!("funct3 is a 3-bit field"),
    }
}

fn quadrant1_arith<M: Memory>(cpu: &mut Cpu<M>, instr: u32) {
    let rd = c_rs1p(instr);
    let high2 = extract_field(instr, 11, 10);
    match high2 {
        0b00 => rv32i::reg_imm(cpu, AluOp::Srl, rd, rd, c_nzuimm6(instr)),
        0b01 => rv32i::reg_imm(cpu, AluOp::Sra, rd, rd, c_nzuimm6(instr)),
        0b10 => rv32i::reg_imm(cpu, AluOp::And, rd, rd, c_imm6(instr)),
        0b11 => {
            let rs2 = c_rs2p(instr);
            if extract_field(instr, 12, 12) != 0 {
                // c.subw/c.addw: RV64-only, not supported on this RV32 core.
                rv32i::illegal(cpu, instr);
                return;
            }
            let op = match extract_field(instr, 6, 5) {
                0b00 => AluOp::Sub,
                0b01 => AluOp::Xor,
                0b10 => AluOp::Or,
                0b11 => AluOp::And,
                _ => unreachable!("2-bit field"),
            };
            rv32i::reg_reg(cpu, op, rd, rd, rs2);
        }
        _ => unreachable!("2-bit field"),
    }
}

fn quadrant2<M: Memory>(cpu: &mut Cpu<M>, instr: u32, f3: u32) {
    let link = cpu.pc().wrapping_add(4);
    match f3 {
        0b000 => {
            rv32i::reg_imm(
                cpu,
                AluOp::Sll,
                c_rd_rs1(instr),
                c_rd_rs1(instr),
                c_nzuimm6(instr),
            );
        }
        0b010 => {
            let rd = c_rd_rs1(instr);
            if rd == 0 {
                rv32i::illegal(cpu, instr);
                return;
            }
            rv32i::load(cpu, LoadWidth::Word, rd, SP, c_uimm8sp(instr));
        }
        0b100 => {
            let rd_rs1 = c_rd_rs1(instr);
            let rs2 = c_rs2(instr);
            let bit12 = extract_field(instr, 12, 12);
            if bit12 == 0 {
                if rs2 == 0 {
                    if rd_rs1 == 0 {
                        rv32i::illegal(cpu, instr);
                    } else {
                        rv32i::jalr(cpu, 0, rd_rs1, 0, link);
                    }
                } else {
                    rv32i::reg_reg(cpu, AluOp::Add, rd_rs1, 0, rs2);
                }
            } else if rd_rs1 == 0 && rs2 == 0 {
                cpu.raise_trap(TrapKind::Breakpoint, 0);
            } else if rs2 == 0 {
                rv32i::jalr(cpu, 1, rd_rs1, 0, link);
            } else {
                rv32i::reg_reg(cpu, AluOp::Add, rd_rs1, rd_rs1, rs2);
            }
        }
        0b110 => {
            rv32i::store(cpu, StoreWidth::Word, SP, c_rs2(instr), c_uimm8sp_s(instr));
        }
        _ => rv32i::illegal(cpu, instr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::FlatMemory;

    fn cpu() -> Cpu<FlatMemory> {
        Cpu::new(FlatMemory::new(64))
    }

    #[test]
    fn c_li_loads_negative_immediate() {
        let mut cpu = cpu();
        // c.li x1, -3: funct3=010, imm[5]=1, rd=00001, imm[4:0]=11101, op=01
        let instr = 0b010_1_00001_11101_01u16 as u32;
        execute(&mut cpu, instr);
        assert_eq!(cpu.read_x(1), 0xffff_fffd);
    }

    #[test]
    fn c_addi4spn_zero_immediate_is_illegal() {
        let mut cpu = cpu();
        let instr = 0b000_00000000_000_00u16 as u32;
        execute(&mut cpu, instr);
        assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::IllegalInstruction);
    }

    #[test]
    fn c_add_accumulates_into_rd() {
        let mut cpu = cpu();
        cpu.write_x(1, 10);
        cpu.write_x(2, 5);
        // c.add x1, x2: funct4=1001, rd/rs1=00001, rs2=00010, op=10
        let instr = 0b1001_00001_00010_10u16 as u32;
        execute(&mut cpu, instr);
        assert_eq!(cpu.read_x(1), 15);
    }

    #[test]
    fn c_ebreak_raises_breakpoint() {
        let mut cpu = cpu();
        let instr = 0b1001_00000_00000_10u16 as u32;
        execute(&mut cpu, instr);
        assert_eq!(cpu.trap_cause().unwrap().kind, TrapKind::Breakpoint);
    }
}
