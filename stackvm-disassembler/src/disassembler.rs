//! Main disassembler logic

use crate::decoder::decode;
use crate::error::Result;
use crate::formatter::format_line_with_encoding;
use stackvm_spec::{EncodedInstruction, InstructionTable};

/// Disassemble an encoded instruction stream into a listing
///
/// Records that do not decode are kept in the listing as `; ERROR` lines so
/// the rest of the stream stays readable.
pub fn disassemble(encoded: &[EncodedInstruction], table: &InstructionTable) -> Result<String> {
    let mut output = String::new();

    output.push_str("; Stack VM Disassembly\n");
    output.push_str(&format!("; {} instructions\n", encoded.len()));
    output.push('\n');

    for (index, word) in encoded.iter().enumerate() {
        match decode(*word, table) {
            Ok(instr) => output.push_str(&format_line_with_encoding(index, word, &instr)),
            Err(e) => output.push_str(&format!("{:04}: {}  ; ERROR: {}", index, word, e)),
        }
        output.push('\n');
    }

    Ok(output)
}

/// Read an encoded listing file and disassemble it
pub fn disassemble_file(
    path: impl AsRef<std::path::Path>,
    table: &InstructionTable,
) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    let encoded = text
        .lines()
        .map(|line| line.split(';').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<Vec<EncodedInstruction>, _>>()?;
    disassemble(&encoded, table)
}
