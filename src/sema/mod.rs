//! Semantic analysis: symbol tables, typed AST and the checker

pub mod ast;
pub mod checker;
pub mod tables;

pub use checker::{CheckedProgram, Diagnostic, SemanticChecker};
