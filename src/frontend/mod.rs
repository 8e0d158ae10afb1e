//! Front end: lexer, parse tree and recursive-descent parser
//!
//! The parser's only contract with the rest of the compiler is the parse
//! tree in [`syntax`]: one node per grammar rule, every terminal carrying
//! its text and 1-based source line. Syntax errors are reported before the
//! semantic core ever runs.

pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
