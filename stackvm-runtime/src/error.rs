//! Runtime error types
//!
//! [`Fault`] is what a single step (or a run) reports; it is data, not a
//! crash, and a faulting step never changes machine state. [`RuntimeError`]
//! covers failures to set the engine up, such as undecodable encoded programs
//! or seed data that does not fit in memory.

use serde::{Deserialize, Serialize};
use stackvm_disassembler::DisassemblerError;
use stackvm_spec::{ConfigError, SpecError, Word};
use thiserror::Error;

/// Recoverable execution-time condition
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Fault {
    #[error("Stack underflow at pc {pc}: needed {needed}, available {available}")]
    StackUnderflow {
        pc: usize,
        needed: usize,
        available: usize,
    },

    #[error("Stack overflow at pc {pc}: depth limit {limit}")]
    StackOverflow { pc: usize, limit: usize },

    #[error("Division by zero at pc {pc}")]
    DivisionByZero { pc: usize },

    #[error("Memory out of bounds at pc {pc}: address {address} (size {size})")]
    MemoryOutOfBounds {
        pc: usize,
        address: Word,
        size: usize,
    },

    #[error("Invalid jump target at pc {pc}: {target} (program length {len})")]
    InvalidJumpTarget { pc: usize, target: usize, len: usize },

    #[error("Processor is halted")]
    AlreadyHalted,

    #[error("Program complete")]
    ProgramComplete,

    #[error("Step limit exceeded: {limit}")]
    StepLimitExceeded { limit: u64 },

    #[error("Execution cancelled")]
    Cancelled,
}

impl Fault {
    /// Raised by an instruction, as opposed to the engine refusing to run one
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            Fault::StackUnderflow { .. }
                | Fault::StackOverflow { .. }
                | Fault::DivisionByZero { .. }
                | Fault::MemoryOutOfBounds { .. }
                | Fault::InvalidJumpTarget { .. }
        )
    }

    /// Program counter of the faulting instruction, if any
    pub fn pc(&self) -> Option<usize> {
        match *self {
            Fault::StackUnderflow { pc, .. }
            | Fault::StackOverflow { pc, .. }
            | Fault::DivisionByZero { pc }
            | Fault::MemoryOutOfBounds { pc, .. }
            | Fault::InvalidJumpTarget { pc, .. } => Some(pc),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Instruction set error: {0}")]
    SpecError(#[from] SpecError),

    #[error("Invalid machine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode error: {0}")]
    Decode(#[from] DisassemblerError),

    #[error("Seed data at {address} does not fit in memory of {size} cells")]
    SeedOutOfBounds { address: usize, size: usize },

    #[error("Unknown task: {0}")]
    UnknownTask(u32),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
