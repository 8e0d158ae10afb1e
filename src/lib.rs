//! minigo compiler core
//!
//! Semantic and execution backend for a small Go-like language:
//! the front end produces an untyped parse tree, the semantic checker
//! turns it into a typed AST plus symbol tables, and either the
//! bytecode generator or the tree-walking interpreter consumes that.

pub mod backend;
pub mod frontend;
pub mod sema;
pub mod types;
pub mod utils;

pub use utils::{Error, Result};
