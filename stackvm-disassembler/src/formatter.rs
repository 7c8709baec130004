//! Instruction formatting to assembly text

use stackvm_spec::{EncodedInstruction, Instruction, Program};

/// Format instruction as assembly text
pub fn format(instr: &Instruction) -> String {
    match instr {
        Instruction::Read { addr: Some(addr) } => format!("READ [{}]", format_address(*addr)),
        Instruction::Write { addr: Some(addr) } => format!("WRITE [{}]", format_address(*addr)),
        other => other.to_string(),
    }
}

/// Listing line: `0000: PUSH 5`
pub fn format_line(index: usize, instr: &Instruction) -> String {
    format!("{:04}: {}", index, format(instr))
}

/// Listing line with the encoded record: `0000: 01000005  PUSH 5`
pub fn format_line_with_encoding(
    index: usize,
    encoded: &EncodedInstruction,
    instr: &Instruction,
) -> String {
    format!("{:04}: {}  {}", index, encoded, format(instr))
}

/// Full program listing; labels are printed on their own line
pub fn format_program(program: &Program) -> String {
    let mut out = String::new();
    for (index, instr) in program.instructions.iter().enumerate() {
        if let Some(label) = program.label_at(index) {
            out.push_str(label);
            out.push_str(":\n");
        }
        out.push_str(&format_line(index, instr));
        out.push('\n');
    }
    out
}

fn format_address(addr: i64) -> String {
    if addr < 0 {
        addr.to_string()
    } else {
        format!("0x{:X}", addr)
    }
}
