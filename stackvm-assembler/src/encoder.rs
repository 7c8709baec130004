//! Instruction encoding to the fixed-width text form
//!
//! Each instruction becomes `OOPPPPPP`: two hex digits of opcode followed by
//! six hex digits of operand. An encoded listing holds one such record per
//! line.

use crate::assembler::Assembler;
use crate::diagnostic::Diagnostic;
use stackvm_spec::{EncodedInstruction, InstructionTable, Program, SpecError};

/// Encode a single source line
///
/// Returns `None` when the line holds no instruction (blank, comment, label
/// only) or was skipped; diagnostics describe why.
pub fn encode_line(
    text: &str,
    table: &InstructionTable,
) -> (Option<EncodedInstruction>, Vec<Diagnostic>) {
    let assembly = Assembler::new(table).assemble(text.lines().next().unwrap_or_default());
    (assembly.encoded.first().copied(), assembly.diagnostics)
}

/// Encode an already assembled program with a (possibly different) table
pub fn encode_program(
    program: &Program,
    table: &InstructionTable,
) -> Result<Vec<EncodedInstruction>, SpecError> {
    program.encode(table)
}

/// One encoded record per line
pub fn to_listing(encoded: &[EncodedInstruction]) -> String {
    let mut out = String::with_capacity(encoded.len() * 9);
    for word in encoded {
        out.push_str(&word.to_string());
        out.push('\n');
    }
    out
}

/// Parse an encoded listing; blank lines and `;` comments are ignored
pub fn parse_listing(text: &str) -> Result<Vec<EncodedInstruction>, SpecError> {
    text.lines()
        .map(|line| line.split(';').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::parse)
        .collect()
}
