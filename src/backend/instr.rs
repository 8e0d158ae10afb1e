//! Bytecode instruction set
//!
//! A small register machine with two virtual register files (`iN` for
//! int/bool/string-index values, `fN` for float32) and a flat data
//! memory indexed by variable slot. Instructions are quadruples; each
//! opcode uses a fixed number of operands. The textual encoding (one
//! line per instruction, `NAME o1, o2, o3`) is the wire contract for
//! downstream runtimes, preceded by one `SSTR` line per string-table
//! entry.

use std::fmt;

// I/O syscall codes carried by CALL.
pub const SYS_READ_INT: i32 = 0;
pub const SYS_READ_REAL: i32 = 1;
pub const SYS_READ_BOOL: i32 = 2;
pub const SYS_READ_STR: i32 = 3;
pub const SYS_WRITE_INT: i32 = 4;
pub const SYS_WRITE_REAL: i32 = 5;
pub const SYS_WRITE_BOOL: i32 = 6;
pub const SYS_WRITE_STR: i32 = 7;

/// Opcodes. The `i`/`f`/`s` suffix in the wire name selects the operand
/// representation: int register, float register, or string-table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Halt,
    Noop,

    AddI,
    AddF,
    SubI,
    SubF,
    MulI,
    MulF,
    DivI,
    DivF,
    ModI,
    ModF,

    EquI,
    EquF,
    EquS,
    NeqI,
    NeqF,
    NeqS,
    LthI,
    LthF,
    LthS,
    LteI,
    LteF,
    LteS,
    GthI,
    GthF,
    GthS,
    GteI,
    GteF,
    GteS,

    /// `JUMP addr`, absolute
    Jump,
    /// `BOTb ix, off`, branch relative to this instruction when ix == 1
    Bot,
    /// `BOFb ix, off`, branch relative to this instruction when ix == 0
    Bof,

    /// `LDWi ix, slot`
    LdwI,
    /// `LDWf fx, slot`
    LdwF,
    /// `LDIi ix, const`
    LdiI,
    /// `LDIf fx, const`, f32 bit pattern carried in the i32 operand
    LdiF,
    /// `STWi slot, ix`
    StwI,
    /// `STWf slot, fx`
    StwF,

    /// `WIDf fx, iy`, widen an int register into a float register
    WidF,

    /// `CALL code, x`, I/O syscall
    Call,
}

impl OpCode {
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Halt => "HALT",
            OpCode::Noop => "NOOP",
            OpCode::AddI => "ADDi",
            OpCode::AddF => "ADDf",
            OpCode::SubI => "SUBi",
            OpCode::SubF => "SUBf",
            OpCode::MulI => "MULi",
            OpCode::MulF => "MULf",
            OpCode::DivI => "DIVi",
            OpCode::DivF => "DIVf",
            OpCode::ModI => "MODi",
            OpCode::ModF => "MODf",
            OpCode::EquI => "EQUi",
            OpCode::EquF => "EQUf",
            OpCode::EquS => "EQUs",
            OpCode::NeqI => "NEQi",
            OpCode::NeqF => "NEQf",
            OpCode::NeqS => "NEQs",
            OpCode::LthI => "LTHi",
            OpCode::LthF => "LTHf",
            OpCode::LthS => "LTHs",
            OpCode::LteI => "LTEi",
            OpCode::LteF => "LTEf",
            OpCode::LteS => "LTEs",
            OpCode::GthI => "GTHi",
            OpCode::GthF => "GTHf",
            OpCode::GthS => "GTHs",
            OpCode::GteI => "GTEi",
            OpCode::GteF => "GTEf",
            OpCode::GteS => "GTEs",
            OpCode::Jump => "JUMP",
            OpCode::Bot => "BOTb",
            OpCode::Bof => "BOFb",
            OpCode::LdwI => "LDWi",
            OpCode::LdwF => "LDWf",
            OpCode::LdiI => "LDIi",
            OpCode::LdiF => "LDIf",
            OpCode::StwI => "STWi",
            OpCode::StwF => "STWf",
            OpCode::WidF => "WIDf",
            OpCode::Call => "CALL",
        }
    }

    /// Operands this opcode uses in the textual encoding
    pub fn operand_count(self) -> usize {
        match self {
            OpCode::Halt | OpCode::Noop => 0,
            OpCode::Jump => 1,
            OpCode::Bot
            | OpCode::Bof
            | OpCode::LdwI
            | OpCode::LdwF
            | OpCode::LdiI
            | OpCode::LdiF
            | OpCode::StwI
            | OpCode::StwF
            | OpCode::WidF
            | OpCode::Call => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Instruction quadruple; unused operands stay zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: OpCode,
    pub o1: i32,
    pub o2: i32,
    pub o3: i32,
}

impl Instruction {
    pub fn new(op: OpCode, o1: i32, o2: i32, o3: i32) -> Self {
        Self { op, o1, o2, o3 }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // LDIf carries a float constant as a bit pattern; the listing
        // shows the decoded value
        if self.op == OpCode::LdiF {
            return write!(
                f,
                "{} {}, {}",
                self.op,
                self.o1,
                f32::from_bits(self.o2 as u32)
            );
        }
        match self.op.operand_count() {
            0 => write!(f, "{}", self.op),
            1 => write!(f, "{} {}", self.op, self.o1),
            2 => write!(f, "{} {}, {}", self.op, self.o1, self.o2),
            _ => write!(f, "{} {}, {}, {}", self.op, self.o1, self.o2, self.o3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn listing_uses_per_opcode_operand_counts() {
        assert_eq!(Instruction::new(OpCode::Halt, 0, 0, 0).to_string(), "HALT");
        assert_eq!(
            Instruction::new(OpCode::Jump, 12, 0, 0).to_string(),
            "JUMP 12"
        );
        assert_eq!(
            Instruction::new(OpCode::Bof, 3, 5, 0).to_string(),
            "BOFb 3, 5"
        );
        assert_eq!(
            Instruction::new(OpCode::AddI, 2, 0, 1).to_string(),
            "ADDi 2, 0, 1"
        );
    }

    #[test]
    fn float_immediates_print_decoded() {
        let instr = Instruction::new(OpCode::LdiF, 0, 2.5f32.to_bits() as i32, 0);
        assert_eq!(instr.to_string(), "LDIf 0, 2.5");
    }
}
