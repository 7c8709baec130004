//! Assembly diagnostics
//!
//! Problems found in individual source lines. They are collected rather than
//! raised, so one bad line never stops the rest of the source from
//! assembling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong on a line
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Mnemonic not registered in the instruction table (line skipped)
    #[error("unknown instruction `{token}`")]
    UnknownInstruction { token: String },

    /// Operand is not a valid literal or does not fit the field (encoded as 0)
    #[error("invalid operand `{token}`")]
    InvalidOperand { token: String },

    /// Required operand absent (encoded as 0)
    #[error("`{mnemonic}` requires an operand")]
    MissingOperand { mnemonic: String },

    /// Operand given to an instruction that takes none (ignored)
    #[error("`{mnemonic}` takes no operand, found `{token}`")]
    UnexpectedOperand { mnemonic: String, token: String },

    /// Jump target names a label that is never defined (encoded as 0)
    #[error("undefined label `{label}`")]
    UndefinedLabel { label: String },

    /// Label defined twice; the first definition wins
    #[error("duplicate label `{label}`")]
    DuplicateLabel { label: String },

    /// Bad label name, or no mnemonic where one is expected (line skipped)
    #[error("malformed line: {message}")]
    MalformedLine { message: String },
}

/// A diagnostic attached to a 1-based source line
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("line {line}: {kind}")]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind) -> Self {
        Self { line, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diag = Diagnostic::new(
            3,
            DiagnosticKind::UnknownInstruction {
                token: "FOO".to_string(),
            },
        );
        assert_eq!(diag.to_string(), "line 3: unknown instruction `FOO`");

        let diag = Diagnostic::new(
            1,
            DiagnosticKind::UnexpectedOperand {
                mnemonic: "ADD".to_string(),
                token: "4".to_string(),
            },
        );
        assert_eq!(diag.to_string(), "line 1: `ADD` takes no operand, found `4`");
    }
}
