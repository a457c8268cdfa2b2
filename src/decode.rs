//! Pure operand-extraction functions over a raw 32-bit (or 16-bit,
//! zero-extended) instruction word.
//!
//! These mirror the teacher's `From<u32> for Rtype`-style field accessors
//! (`instr/instr_type.rs`) generalized with `bits::extract_field`, plus the
//! scattered-bit reconstructions the RISC-V C extension requires for its
//! compressed immediates. Every function here is a pure, allocation-free
//! read of the instruction bits; none of them touch architectural state.

use crate::bits::{extract_field, sign_extend};

/// Destination register field, common to R/I/S/U/J-type and several
/// compressed forms.
pub fn rd(instr: u32) -> u8 {
    extract_field(instr, 11, 7) as u8
}

pub fn rs1(instr: u32) -> u8 {
    extract_field(instr, 19, 15) as u8
}

pub fn rs2(instr: u32) -> u8 {
    extract_field(instr, 24, 20) as u8
}

pub fn rs3(instr: u32) -> u8 {
    extract_field(instr, 31, 27) as u8
}

/// Rounding-mode field (R4-type and most F-extension R-type ops). Accepted
/// but never honored by the executor.
pub fn rm(instr: u32) -> u8 {
    extract_field(instr, 14, 12) as u8
}

pub fn funct3(instr: u32) -> u8 {
    extract_field(instr, 14, 12) as u8
}

pub fn funct7(instr: u32) -> u8 {
    extract_field(instr, 31, 25) as u8
}

pub fn funct5(instr: u32) -> u8 {
    extract_field(instr, 31, 27) as u8
}

pub fn opcode(instr: u32) -> u32 {
    extract_field(instr, 6, 0)
}

/// 5-bit shift amount used by `slli`/`srli`/`srai` in RV32.
pub fn shamtw(instr: u32) -> u8 {
    extract_field(instr, 24, 20) as u8
}

/// Fence mode nibble (`fm`), the top 4 bits of the `fence` encoding.
pub fn fm(instr: u32) -> u8 {
    extract_field(instr, 31, 28) as u8
}

/// A compressed register field (3 bits) names x8..x15.
pub fn c_reg(field: u32) -> u8 {
    8 + field as u8
}

pub fn c_rs1p(instr: u32) -> u8 {
    c_reg(extract_field(instr, 9, 7))
}

pub fn c_rs2p(instr: u32) -> u8 {
    c_reg(extract_field(instr, 4, 2))
}

pub fn c_rdp(instr: u32) -> u8 {
    c_rs1p(instr)
}

/// Full-width registers used directly by some compressed forms (`c.mv`,
/// `c.add`, `c.jr`, `c.jalr`, `c.lwsp`, `c.swsp`, ...).
pub fn c_rd_rs1(instr: u32) -> u8 {
    extract_field(instr, 11, 7) as u8
}

pub fn c_rs2(instr: u32) -> u8 {
    extract_field(instr, 6, 2) as u8
}

// --- Full-width (32-bit) sign-extended immediates --------------------------

pub fn imm_i(instr: u32) -> u32 {
    sign_extend(extract_field(instr, 31, 20), 11)
}

pub fn imm_s(instr: u32) -> u32 {
    let value = (extract_field(instr, 31, 25) << 5) | extract_field(instr, 11, 7);
    sign_extend(value, 11)
}

pub fn imm_b(instr: u32) -> u32 {
    let value = (extract_field(instr, 31, 31) << 12)
        | (extract_field(instr, 7, 7) << 11)
        | (extract_field(instr, 30, 25) << 5)
        | (extract_field(instr, 11, 8) << 1);
    sign_extend(value, 12)
}

pub fn imm_u(instr: u32) -> u32 {
    extract_field(instr, 31, 12) << 12
}

pub fn imm_j(instr: u32) -> u32 {
    let value = (extract_field(instr, 31, 31) << 20)
        | (extract_field(instr, 19, 12) << 12)
        | (extract_field(instr, 20, 20) << 11)
        | (extract_field(instr, 30, 21) << 1);
    sign_extend(value, 20)
}

// --- Compressed (16-bit) scattered-bit immediates ---------------------------
//
// Each function reassembles the RISC-V C extension's scrambled bit layout
// into a normal sign- or zero-extended 32-bit value. Bit positions are taken
// directly from the unprivileged ISA manual's compressed instruction tables.

/// `c.addi4spn`'s `nzuimm[9:2]`, zero-extended, already scaled (bits 1:0 are
/// always zero).
pub fn c_nzuimm10(instr: u32) -> u32 {
    (extract_field(instr, 10, 7) << 6)
        | (extract_field(instr, 12, 11) << 4)
        | (extract_field(instr, 5, 5) << 3)
        | (extract_field(instr, 6, 6) << 2)
}

/// `c.addi`'s 6-bit signed immediate.
pub fn c_nzimm6(instr: u32) -> u32 {
    let value = (extract_field(instr, 12, 12) << 5) | extract_field(instr, 6, 2);
    sign_extend(value, 5)
}

/// `c.li`/`c.andi`'s 6-bit signed immediate (same bit layout as
/// `c_nzimm6`; kept as a distinct name because the ISA names it separately
/// and the caller's nonzero requirement differs).
pub fn c_imm6(instr: u32) -> u32 {
    c_nzimm6(instr)
}

/// `c.slli`/`c.srli`/`c.srai`'s 6-bit zero-extended shift amount.
pub fn c_nzuimm6(instr: u32) -> u32 {
    (extract_field(instr, 12, 12) << 5) | extract_field(instr, 6, 2)
}

/// `c.addi16sp`'s 10-bit signed immediate, already scaled by 16.
pub fn c_nzimm10(instr: u32) -> u32 {
    let value = (extract_field(instr, 12, 12) << 9)
        | (extract_field(instr, 6, 6) << 4)
        | (extract_field(instr, 5, 5) << 6)
        | (extract_field(instr, 4, 3) << 7)
        | (extract_field(instr, 2, 2) << 5);
    sign_extend(value, 9)
}

/// `c.lui`'s 18-bit signed immediate, already scaled into the upper bits
/// (i.e. it lands directly in `rd`'s bits 17:12, matching `lui`'s `imm_u`
/// shape after shifting).
pub fn c_nzimm18(instr: u32) -> u32 {
    let value = (extract_field(instr, 12, 12) << 17) | (extract_field(instr, 6, 2) << 12);
    sign_extend(value, 17)
}

/// `c.beqz`/`c.bnez`'s 9-bit signed branch offset.
pub fn c_bimm9(instr: u32) -> u32 {
    let value = (extract_field(instr, 12, 12) << 8)
        | (extract_field(instr, 6, 5) << 6)
        | (extract_field(instr, 2, 2) << 5)
        | (extract_field(instr, 11, 10) << 3)
        | (extract_field(instr, 4, 3) << 1);
    sign_extend(value, 8)
}

/// `c.j`/`c.jal`'s 12-bit signed jump offset.
pub fn c_imm12(instr: u32) -> u32 {
    let value = (extract_field(instr, 12, 12) << 11)
        | (extract_field(instr, 8, 8) << 10)
        | (extract_field(instr, 10, 9) << 8)
        | (extract_field(instr, 6, 6) << 7)
        | (extract_field(instr, 7, 7) << 6)
        | (extract_field(instr, 2, 2) << 5)
        | (extract_field(instr, 11, 11) << 4)
        | (extract_field(instr, 5, 3) << 1);
    sign_extend(value, 11)
}

/// `c.lw`/`c.sw`'s 7-bit zero-extended word offset.
pub fn c_uimm7(instr: u32) -> u32 {
    (extract_field(instr, 5, 5) << 6)
        | (extract_field(instr, 12, 10) << 3)
        | (extract_field(instr, 6, 6) << 2)
}

/// `c.lwsp`'s 8-bit zero-extended stack-relative word offset.
pub fn c_uimm8sp(instr: u32) -> u32 {
    (extract_field(instr, 3, 2) << 6)
        | (extract_field(instr, 12, 12) << 5)
        | (extract_field(instr, 6, 4) << 2)
}

/// `c.swsp`'s 8-bit zero-extended stack-relative word offset.
pub fn c_uimm8sp_s(instr: u32) -> u32 {
    (extract_field(instr, 8, 7) << 6) | (extract_field(instr, 12, 9) << 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imm_i_sign_extends() {
        // addi x1, x0, -1 -> imm field all ones.
        let instr = 0xfff0_0093;
        assert_eq!(imm_i(instr), 0xffff_ffff);
    }

    #[test]
    fn imm_u_leaves_lower_bits_zero() {
        let lui = 0x0000_00b7u32 | (53u32 << 12);
        assert_eq!(imm_u(lui), 53 << 12);
    }

    #[test]
    fn imm_j_matches_known_encoding() {
        // jal x0, -4 encodes offset -4 (0x1_ffff_c when sign-extended to 21 bits).
        let instr = 0xffdf_f06f;
        assert_eq!(imm_j(instr) as i32, -4);
    }

    #[test]
    fn c_nzimm6_sign_extends_negative() {
        // c.li x1, -3: funct3=010, imm[5]=1, rd=00001, imm[4:0]=11101, op=01
        let instr = 0b010_1_00001_11101_01u16 as u32;
        assert_eq!(c_imm6(instr) as i32, -3);
    }

    #[test]
    fn c_bimm9_reassembles_scattered_bits() {
        // Just check zero immediate decodes to zero.
        assert_eq!(c_bimm9(0), 0);
    }

    #[test]
    fn c_nzimm10_matches_original_source_known_value() {
        // c.addi16sp sp, 16: quadrant=01, funct3=011, rd=x2(sp), bit6=1
        // (the sole source of nzimm[4]), all other immediate bits zero.
        // Cross-checked against the original source's C_nzimm10().
        let instr = 0b011_0_00010_1_0_00_0_01u32;
        assert_eq!(c_nzimm10(instr) as i32, 16);
    }
}
