//! Bytecode generation
//!
//! Direct, non-optimizing lowering of the typed AST. Registers come from
//! two monotonic counters (one per file, no reuse, no spilling); every
//! literal or variable load takes a fresh register and one instruction.
//! Forward branches are emitted with a zero offset and backpatched once
//! the end of their body is known. `return` inside `main` becomes a
//! `JUMP` patched to the final `HALT` address.

use std::fmt;

use log::debug;

use crate::backend::instr::{
    Instruction, OpCode, SYS_READ_BOOL, SYS_READ_INT, SYS_READ_REAL, SYS_READ_STR,
    SYS_WRITE_BOOL, SYS_WRITE_INT, SYS_WRITE_REAL, SYS_WRITE_STR,
};
use crate::sema::ast::{Node, NodeKind};
use crate::sema::checker::CheckedProgram;
use crate::sema::tables::VarTable;
use crate::types::Type;
use crate::utils::{Error, Result};

/// A generated program: the string-table preamble plus the instruction
/// stream
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub strings: Vec<String>,
    pub code: Vec<Instruction>,
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.strings {
            writeln!(f, "SSTR {}", s)?;
        }
        for instr in &self.code {
            writeln!(f, "{}", instr)?;
        }
        Ok(())
    }
}

/// Operand representation of a relational instruction
#[derive(Clone, Copy, PartialEq, Eq)]
enum Repr {
    Int,
    Float,
    Str,
}

pub struct CodeGen<'a> {
    vars: &'a VarTable,
    code: Vec<Instruction>,
    next_int_reg: i32,
    next_float_reg: i32,
    /// Addresses of `JUMP`s emitted for `return`, patched to `HALT`
    return_jumps: Vec<usize>,
}

impl<'a> CodeGen<'a> {
    /// Lower a checked program. The caller must have gated on
    /// [`CheckedProgram::passed`].
    pub fn generate(checked: &CheckedProgram) -> Result<Bytecode> {
        let mut gen = CodeGen {
            vars: &checked.vars,
            code: Vec::new(),
            next_int_reg: 0,
            next_float_reg: 0,
            return_jumps: Vec::new(),
        };
        gen.gen_node(&checked.ast)?;
        let halt = gen.emit(OpCode::Halt, 0, 0, 0);
        for addr in std::mem::take(&mut gen.return_jumps) {
            gen.code[addr].o1 = halt as i32;
        }
        debug!(
            "generated {} instructions, {} int regs, {} float regs",
            gen.code.len(),
            gen.next_int_reg,
            gen.next_float_reg
        );
        Ok(Bytecode {
            strings: checked.strings.iter().map(String::from).collect(),
            code: gen.code,
        })
    }

    fn emit(&mut self, op: OpCode, o1: i32, o2: i32, o3: i32) -> usize {
        self.code.push(Instruction::new(op, o1, o2, o3));
        self.code.len() - 1
    }

    fn new_int_reg(&mut self) -> i32 {
        let r = self.next_int_reg;
        self.next_int_reg += 1;
        r
    }

    fn new_float_reg(&mut self) -> i32 {
        let r = self.next_float_reg;
        self.next_float_reg += 1;
        r
    }

    /// Point a branch at the current end of the stream; offsets are
    /// relative to the branch's own address
    fn patch_branch(&mut self, at: usize) {
        self.code[at].o2 = self.code.len() as i32 - at as i32;
    }

    fn patch_jump(&mut self, at: usize) {
        self.code[at].o1 = self.code.len() as i32;
    }

    // ==================== Statements ====================

    fn gen_node(&mut self, node: &Node) -> Result<()> {
        match node.kind {
            NodeKind::Program | NodeKind::FuncList | NodeKind::StmtSection => {
                for child in &node.children {
                    self.gen_node(child)?;
                }
                Ok(())
            }

            // Only main's body is reachable; other bodies have no call
            // mechanism in the ISA
            NodeKind::FuncMain => self.gen_node(node.child(1)),
            NodeKind::FuncDecl => Ok(()),

            NodeKind::VarDecl | NodeKind::DeclareAssign => {
                if let Some(init) = node.children.first() {
                    let slot = node.int_data;
                    let reg = self.gen_expr(init)?;
                    self.gen_store(slot, reg, init.ty)?;
                }
                Ok(())
            }

            NodeKind::Assign => {
                // RHS first, then the store
                let value = node.child(1);
                let reg = self.gen_expr(value)?;
                self.gen_store(node.child(0).int_data, reg, value.ty)
            }

            NodeKind::PlusAssign | NodeKind::MinusAssign => {
                let target = node.child(0);
                let value = node.child(1);
                let slot = target.int_data;
                let value_reg = self.gen_expr(value)?;
                let cur = self.gen_load(slot, target.ty)?;
                let float = target.ty == Type::Float32;
                let op = match (node.kind, float) {
                    (NodeKind::PlusAssign, false) => OpCode::AddI,
                    (NodeKind::PlusAssign, true) => OpCode::AddF,
                    (_, false) => OpCode::SubI,
                    (_, true) => OpCode::SubF,
                };
                let dst = if float {
                    self.new_float_reg()
                } else {
                    self.new_int_reg()
                };
                self.emit(op, dst, cur, value_reg);
                self.gen_store(slot, dst, target.ty)
            }

            NodeKind::PlusPlus | NodeKind::MinusMinus => {
                let target = node.child(0);
                let slot = target.int_data;
                let cur = self.gen_load(slot, target.ty)?;
                let float = target.ty == Type::Float32;
                let (one, op) = if float {
                    let r = self.new_float_reg();
                    self.emit(OpCode::LdiF, r, 1.0f32.to_bits() as i32, 0);
                    let op = if node.kind == NodeKind::PlusPlus {
                        OpCode::AddF
                    } else {
                        OpCode::SubF
                    };
                    (r, op)
                } else {
                    let r = self.new_int_reg();
                    self.emit(OpCode::LdiI, r, 1, 0);
                    let op = if node.kind == NodeKind::PlusPlus {
                        OpCode::AddI
                    } else {
                        OpCode::SubI
                    };
                    (r, op)
                };
                let dst = if float {
                    self.new_float_reg()
                } else {
                    self.new_int_reg()
                };
                self.emit(op, dst, cur, one);
                self.gen_store(slot, dst, target.ty)
            }

            NodeKind::If => {
                let cond = self.gen_expr(node.child(0))?;
                let branch = self.emit(OpCode::Bof, cond, 0, 0);
                self.gen_node(node.child(1))?;
                if let Some(else_block) = node.children.get(2) {
                    let skip_else = self.emit(OpCode::Jump, 0, 0, 0);
                    self.patch_branch(branch);
                    self.gen_node(else_block)?;
                    self.patch_jump(skip_else);
                } else {
                    self.patch_branch(branch);
                }
                Ok(())
            }

            NodeKind::For => {
                let start = self.code.len() as i32;
                if node.children.len() == 2 {
                    let cond = self.gen_expr(node.child(0))?;
                    let exit = self.emit(OpCode::Bof, cond, 0, 0);
                    self.gen_node(node.child(1))?;
                    self.emit(OpCode::Jump, start, 0, 0);
                    self.patch_branch(exit);
                } else {
                    self.gen_node(node.child(0))?;
                    self.emit(OpCode::Jump, start, 0, 0);
                }
                Ok(())
            }

            NodeKind::Return => {
                if let Some(value) = node.children.first() {
                    self.gen_expr(value)?;
                }
                let jump = self.emit(OpCode::Jump, 0, 0, 0);
                self.return_jumps.push(jump);
                Ok(())
            }

            NodeKind::Input => {
                let target = node.child(0);
                let slot = target.int_data;
                match self.vars.ty(slot as usize) {
                    Type::Int => {
                        let r = self.new_int_reg();
                        self.emit(OpCode::Call, SYS_READ_INT, r, 0);
                        self.emit(OpCode::StwI, slot, r, 0);
                    }
                    Type::Float32 => {
                        let r = self.new_float_reg();
                        self.emit(OpCode::Call, SYS_READ_REAL, r, 0);
                        self.emit(OpCode::StwF, slot, r, 0);
                    }
                    Type::Bool => {
                        let r = self.new_int_reg();
                        self.emit(OpCode::Call, SYS_READ_BOOL, r, 0);
                        self.emit(OpCode::StwI, slot, r, 0);
                    }
                    Type::Str => {
                        // The call leaves the new string-table index in r
                        let r = self.new_int_reg();
                        self.emit(OpCode::Call, SYS_READ_STR, r, 0);
                        self.emit(OpCode::StwI, slot, r, 0);
                    }
                    ty => {
                        return Err(Error::InvalidValueType {
                            ty,
                            stage: "code generation",
                        })
                    }
                }
                Ok(())
            }

            NodeKind::Output => {
                for arg in &node.child(0).children {
                    let reg = self.gen_expr(arg)?;
                    let call = match arg.ty {
                        Type::Int => SYS_WRITE_INT,
                        Type::Float32 => SYS_WRITE_REAL,
                        Type::Bool => SYS_WRITE_BOOL,
                        Type::Str => SYS_WRITE_STR,
                        ty => {
                            return Err(Error::InvalidValueType {
                                ty,
                                stage: "code generation",
                            })
                        }
                    };
                    self.emit(OpCode::Call, call, reg, 0);
                }
                Ok(())
            }

            NodeKind::FuncCall => Err(Error::Unsupported {
                construct: "function call",
                stage: "code generation",
            }),
            NodeKind::Switch => Err(Error::Unsupported {
                construct: "switch statement",
                stage: "code generation",
            }),

            // Expression kinds are only reachable through gen_expr
            _ => {
                self.gen_expr(node)?;
                Ok(())
            }
        }
    }

    fn gen_store(&mut self, slot: i32, reg: i32, ty: Type) -> Result<()> {
        match ty {
            Type::Float32 => self.emit(OpCode::StwF, slot, reg, 0),
            Type::Int | Type::Bool | Type::Str => self.emit(OpCode::StwI, slot, reg, 0),
            ty => {
                return Err(Error::InvalidValueType {
                    ty,
                    stage: "code generation",
                })
            }
        };
        Ok(())
    }

    fn gen_load(&mut self, slot: i32, ty: Type) -> Result<i32> {
        let (op, reg) = match ty {
            Type::Float32 => (OpCode::LdwF, self.new_float_reg()),
            Type::Int | Type::Bool | Type::Str => (OpCode::LdwI, self.new_int_reg()),
            ty => {
                return Err(Error::InvalidValueType {
                    ty,
                    stage: "code generation",
                })
            }
        };
        self.emit(op, reg, slot, 0);
        Ok(reg)
    }

    // ==================== Expressions ====================

    /// Lower an expression; returns its result register, in the file
    /// selected by the node's resolved type
    fn gen_expr(&mut self, node: &Node) -> Result<i32> {
        match node.kind {
            NodeKind::IntVal | NodeKind::BoolVal | NodeKind::StringVal => {
                let r = self.new_int_reg();
                self.emit(OpCode::LdiI, r, node.int_data, 0);
                Ok(r)
            }
            NodeKind::FloatVal => {
                let r = self.new_float_reg();
                self.emit(OpCode::LdiF, r, node.float_data.to_bits() as i32, 0);
                Ok(r)
            }
            NodeKind::VarUse => self.gen_load(node.int_data, node.ty),

            NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div | NodeKind::Mod => {
                self.gen_arith(node)
            }

            NodeKind::Eq
            | NodeKind::Ne
            | NodeKind::Lt
            | NodeKind::Le
            | NodeKind::Gt
            | NodeKind::Ge => self.gen_relational(node),

            NodeKind::FuncCall => Err(Error::Unsupported {
                construct: "function call",
                stage: "code generation",
            }),

            _ => Err(Error::InvalidValueType {
                ty: node.ty,
                stage: "code generation",
            }),
        }
    }

    fn gen_arith(&mut self, node: &Node) -> Result<i32> {
        let lhs = node.child(0);
        let rhs = node.child(1);
        let l = self.gen_expr(lhs)?;
        let r = self.gen_expr(rhs)?;

        if node.ty == Type::Float32 {
            let l = self.widen(l, lhs.ty);
            let r = self.widen(r, rhs.ty);
            let op = match node.kind {
                NodeKind::Add => OpCode::AddF,
                NodeKind::Sub => OpCode::SubF,
                NodeKind::Mul => OpCode::MulF,
                NodeKind::Div => OpCode::DivF,
                _ => OpCode::ModF,
            };
            let dst = self.new_float_reg();
            self.emit(op, dst, l, r);
            Ok(dst)
        } else {
            let op = match node.kind {
                NodeKind::Add => OpCode::AddI,
                NodeKind::Sub => OpCode::SubI,
                NodeKind::Mul => OpCode::MulI,
                NodeKind::Div => OpCode::DivI,
                _ => OpCode::ModI,
            };
            let dst = self.new_int_reg();
            self.emit(op, dst, l, r);
            Ok(dst)
        }
    }

    fn gen_relational(&mut self, node: &Node) -> Result<i32> {
        let lhs = node.child(0);
        let rhs = node.child(1);
        let mut l = self.gen_expr(lhs)?;
        let mut r = self.gen_expr(rhs)?;

        let repr = if lhs.ty == Type::Str {
            Repr::Str
        } else if lhs.ty == Type::Float32 || rhs.ty == Type::Float32 {
            l = self.widen(l, lhs.ty);
            r = self.widen(r, rhs.ty);
            Repr::Float
        } else {
            Repr::Int
        };

        let op = match (node.kind, repr) {
            (NodeKind::Eq, Repr::Int) => OpCode::EquI,
            (NodeKind::Eq, Repr::Float) => OpCode::EquF,
            (NodeKind::Eq, Repr::Str) => OpCode::EquS,
            (NodeKind::Ne, Repr::Int) => OpCode::NeqI,
            (NodeKind::Ne, Repr::Float) => OpCode::NeqF,
            (NodeKind::Ne, Repr::Str) => OpCode::NeqS,
            (NodeKind::Lt, Repr::Int) => OpCode::LthI,
            (NodeKind::Lt, Repr::Float) => OpCode::LthF,
            (NodeKind::Lt, Repr::Str) => OpCode::LthS,
            (NodeKind::Le, Repr::Int) => OpCode::LteI,
            (NodeKind::Le, Repr::Float) => OpCode::LteF,
            (NodeKind::Le, Repr::Str) => OpCode::LteS,
            (NodeKind::Gt, Repr::Int) => OpCode::GthI,
            (NodeKind::Gt, Repr::Float) => OpCode::GthF,
            (NodeKind::Gt, Repr::Str) => OpCode::GthS,
            (NodeKind::Ge, Repr::Int) => OpCode::GteI,
            (NodeKind::Ge, Repr::Float) => OpCode::GteF,
            (_, _) => OpCode::GteS,
        };
        // Relational results are always booleans in the int file
        let dst = self.new_int_reg();
        self.emit(op, dst, l, r);
        Ok(dst)
    }

    /// Move an int-file value into a fresh float register when the
    /// operand representation asks for floats
    fn widen(&mut self, reg: i32, ty: Type) -> i32 {
        if ty == Type::Float32 {
            return reg;
        }
        let dst = self.new_float_reg();
        self.emit(OpCode::WidF, dst, reg, 0);
        dst
    }
}
