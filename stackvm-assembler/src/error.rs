//! Assembler errors
//!
//! Bad source lines are diagnostics, not errors. Only failures to obtain the
//! inputs (source file, table file) end up here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Instruction table error: {0}")]
    Table(#[from] stackvm_spec::SpecError),
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
