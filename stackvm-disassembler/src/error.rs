//! Disassembler errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisassemblerError {
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("Opcode 0x{opcode:02X} is mapped to `{mnemonic}`, which has no execution semantics")]
    UnsupportedMnemonic { opcode: u8, mnemonic: String },

    #[error("Unexpected operand field {field:06X} for `{mnemonic}`")]
    UnexpectedOperand { mnemonic: String, field: u32 },

    #[error("Invalid jump target {0}")]
    InvalidTarget(i64),

    #[error("Instruction {index}: {source}")]
    At {
        index: usize,
        #[source]
        source: Box<DisassemblerError>,
    },

    #[error("Encoding error: {0}")]
    Encoding(#[from] stackvm_spec::SpecError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DisassemblerError {
    /// Attach the position of the failing instruction
    pub fn at(self, index: usize) -> Self {
        DisassemblerError::At {
            index,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;
