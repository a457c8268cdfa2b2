//! Opcode and funct3/funct7 constants, grounded on the teacher's
//! `instr/opcodes.rs`, extended with the M-extension funct7 and the F
//! extension's major opcodes.

// Major opcodes (bits [6:0]).
pub const OP_LUI: u32 = 0b011_0111;
pub const OP_AUIPC: u32 = 0b001_0111;
pub const OP_JAL: u32 = 0b110_1111;
pub const OP_JALR: u32 = 0b110_0111;
pub const OP_IMM: u32 = 0b001_0011;
pub const OP: u32 = 0b011_0011;
pub const OP_BRANCH: u32 = 0b110_0011;
pub const OP_LOAD: u32 = 0b000_0011;
pub const OP_STORE: u32 = 0b010_0011;
pub const OP_MISC_MEM: u32 = 0b000_1111;
pub const OP_SYSTEM: u32 = 0b111_0011;

// F-extension major opcodes.
pub const OP_LOAD_FP: u32 = 0b000_0111;
pub const OP_STORE_FP: u32 = 0b010_0111;
pub const OP_FMADD: u32 = 0b100_0011;
pub const OP_FMSUB: u32 = 0b100_0111;
pub const OP_FNMSUB: u32 = 0b100_1011;
pub const OP_FNMADD: u32 = 0b100_1111;
pub const OP_FP: u32 = 0b101_0011;

// Conditional branch funct3.
pub const FUNCT3_BEQ: u32 = 0b000;
pub const FUNCT3_BNE: u32 = 0b001;
pub const FUNCT3_BLT: u32 = 0b100;
pub const FUNCT3_BGE: u32 = 0b101;
pub const FUNCT3_BLTU: u32 = 0b110;
pub const FUNCT3_BGEU: u32 = 0b111;

// Load/store widths.
pub const FUNCT3_B: u32 = 0b000;
pub const FUNCT3_H: u32 = 0b001;
pub const FUNCT3_W: u32 = 0b010;
pub const FUNCT3_BU: u32 = 0b100;
pub const FUNCT3_HU: u32 = 0b101;

// Register-immediate funct3.
pub const FUNCT3_ADDI: u32 = 0b000;
pub const FUNCT3_SLTI: u32 = 0b010;
pub const FUNCT3_SLTIU: u32 = 0b011;
pub const FUNCT3_XORI: u32 = 0b100;
pub const FUNCT3_ORI: u32 = 0b110;
pub const FUNCT3_ANDI: u32 = 0b111;
pub const FUNCT3_SLLI: u32 = 0b001;
pub const FUNCT3_SRLI_SRAI: u32 = 0b101;

// Register-register funct3 (shared between base ALU and M extension).
pub const FUNCT3_ADD_SUB: u32 = 0b000;
pub const FUNCT3_SLL: u32 = 0b001;
pub const FUNCT3_SLT: u32 = 0b010;
pub const FUNCT3_SLTU: u32 = 0b011;
pub const FUNCT3_XOR: u32 = 0b100;
pub const FUNCT3_SRL_SRA: u32 = 0b101;
pub const FUNCT3_OR: u32 = 0b110;
pub const FUNCT3_AND: u32 = 0b111;

pub const FUNCT3_MUL: u32 = 0b000;
pub const FUNCT3_MULH: u32 = 0b001;
pub const FUNCT3_MULHSU: u32 = 0b010;
pub const FUNCT3_MULHU: u32 = 0b011;
pub const FUNCT3_DIV: u32 = 0b100;
pub const FUNCT3_DIVU: u32 = 0b101;
pub const FUNCT3_REM: u32 = 0b110;
pub const FUNCT3_REMU: u32 = 0b111;

pub const FUNCT7_BASE: u32 = 0b000_0000;
pub const FUNCT7_ALT: u32 = 0b010_0000; // sub / sra / srai
pub const FUNCT7_MULDIV: u32 = 0b000_0001;

// System instructions (OP_SYSTEM, funct3 == 0).
pub const FUNCT12_ECALL: u32 = 0x000;
pub const FUNCT12_EBREAK: u32 = 0x001;

// F-extension funct7 (bits [31:25]), rs2 field carries the format variant
// for conversions and sign-injection groups.
pub const FUNCT7_FADD: u32 = 0b000_0000;
pub const FUNCT7_FSUB: u32 = 0b000_0100;
pub const FUNCT7_FMUL: u32 = 0b000_1000;
pub const FUNCT7_FDIV: u32 = 0b000_1100;
pub const FUNCT7_FSQRT: u32 = 0b010_1100;
pub const FUNCT7_FSGNJ: u32 = 0b001_0000;
pub const FUNCT7_FMINMAX: u32 = 0b001_0100;
pub const FUNCT7_FCVT_W_S: u32 = 0b110_0000;
pub const FUNCT7_FCVT_S_W: u32 = 0b110_1000;
pub const FUNCT7_FMV_X_W_FCLASS: u32 = 0b111_0000;
pub const FUNCT7_FMV_W_X: u32 = 0b111_1000;
pub const FUNCT7_FCMP: u32 = 0b101_0000;

pub const FUNCT3_FSGNJ: u32 = 0b000;
pub const FUNCT3_FSGNJN: u32 = 0b001;
pub const FUNCT3_FSGNJX: u32 = 0b010;
pub const FUNCT3_FMIN: u32 = 0b000;
pub const FUNCT3_FMAX: u32 = 0b001;
pub const FUNCT3_FLE: u32 = 0b000;
pub const FUNCT3_FLT: u32 = 0b001;
pub const FUNCT3_FEQ: u32 = 0b010;
pub const FUNCT3_FCLASS: u32 = 0b001;
pub const FUNCT3_FMV_X_W: u32 = 0b000;

pub const RS2_FCVT_W_S: u32 = 0;
pub const RS2_FCVT_WU_S: u32 = 1;
pub const RS2_FCVT_S_W: u32 = 0;
pub const RS2_FCVT_S_WU: u32 = 1;
