//! Error handling for minigo

use crate::types::Type;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
///
/// Semantic diagnostics are not errors: the checker accumulates them and
/// keeps going. These variants cover syntax errors and the fatal conditions
/// that stop code generation or interpretation on the spot.
#[derive(Error, Debug)]
pub enum Error {
    // ==================== Lexer / Parser Errors ====================
    #[error("SYNTAX ERROR ({line}): unexpected character '{ch}'")]
    UnexpectedChar { ch: char, line: u32 },

    #[error("SYNTAX ERROR ({line}): malformed number literal '{text}'")]
    InvalidNumber { text: String, line: u32 },

    #[error("SYNTAX ERROR ({line}): unterminated string literal")]
    UnterminatedString { line: u32 },

    #[error("SYNTAX ERROR ({line}): expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        line: u32,
    },

    // ==================== Fatal Backend Errors ====================
    #[error("unsupported construct reached {stage}: {construct}")]
    Unsupported {
        construct: &'static str,
        stage: &'static str,
    },

    #[error("invalid value type '{ty}' reached {stage}")]
    InvalidValueType { ty: Type, stage: &'static str },

    #[error("operand stack mismatch: expected {expected} value")]
    StackMismatch { expected: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
