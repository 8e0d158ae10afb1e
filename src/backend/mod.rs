//! Execution backends: bytecode generation and the tree-walking
//! interpreter. Both consume the typed AST and agree on observable
//! semantics.

pub mod codegen;
pub mod instr;
pub mod interp;

pub use codegen::{Bytecode, CodeGen};
pub use instr::{Instruction, OpCode};
pub use interp::Interpreter;
