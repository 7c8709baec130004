//! # Error Types for the Stack VM specification crate

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    // Instruction table errors
    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),

    #[error("Duplicate mnemonic: {0}")]
    DuplicateMnemonic(String),

    #[error("Duplicate opcode {opcode:#04x}: already assigned to {owner}")]
    DuplicateOpcode { opcode: u8, owner: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid mnemonic: {0:?}")]
    InvalidMnemonic(String),

    #[error("Invalid table entry at line {line}: {message}")]
    Parse { line: usize, message: String },

    // Instruction errors
    #[error("{0} requires an operand")]
    MissingOperand(String),

    #[error("{0} takes no operand")]
    UnexpectedOperand(String),

    #[error("Operand out of range: {0}")]
    OperandOutOfRange(i64),

    #[error("Invalid instruction encoding: {0:?}")]
    InvalidEncoding(String),

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpecError>;
