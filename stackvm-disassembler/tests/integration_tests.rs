//! Integration tests for the stack VM disassembler
//!
//! Tests the complete disassembly workflow including:
//! - Decoding assembler output
//! - Listing formats
//! - Error handling for invalid encodings

use stackvm_assembler::{assemble, Assembler};
use stackvm_disassembler::{
    decode, decode_program, disassemble, disassemble_file, format, format_program,
    DisassemblerError,
};
use stackvm_spec::{EncodedInstruction, Instruction, InstructionTable, Mnemonic};

// ============================================================================
// Decode Tests
// ============================================================================

#[test]
fn test_decode_every_mnemonic() {
    let table = InstructionTable::builtin();
    for m in Mnemonic::ALL {
        let operand = m.operand_class().is_required().then_some(7);
        let instr = Instruction::from_parts(m, operand).unwrap();
        let word = stackvm_spec::encode_instruction(&instr, &table).unwrap();
        assert_eq!(decode(word, &table).unwrap(), instr, "{}", m);
    }
}

#[test]
fn test_decode_assembled_program() {
    let source = r#"
        PUSH 0x100
        READ
        READ [0x101]
        ADD
        WRITE [0x120]
    top:
        DECC
        JNZ top
        HALT
    "#;
    let assembly = assemble(source);
    assert!(assembly.is_clean());

    let table = InstructionTable::builtin();
    let decoded = decode_program(&assembly.encoded, &table).unwrap();
    assert_eq!(decoded.instructions, assembly.program.instructions);
}

#[test]
fn test_decode_with_custom_table() {
    let mut table = InstructionTable::builtin();
    table.update("ADD", 0x99).unwrap();
    let assembly = Assembler::new(&table).assemble("PUSH 1\nPUSH 2\nADD");

    assert_eq!(decode(assembly.encoded[2], &table).unwrap(), Instruction::Add);
    // Same stream under the built-in table no longer decodes
    let builtin = InstructionTable::builtin();
    assert!(matches!(
        decode(assembly.encoded[2], &builtin),
        Err(DisassemblerError::UnknownOpcode(0x99))
    ));
}

#[test]
fn test_decode_invalid_stream() {
    let table = InstructionTable::builtin();
    let words: Vec<EncodedInstruction> = ["01000001", "16000005"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    let err = decode_program(&words, &table).unwrap_err();
    assert!(err.to_string().starts_with("Instruction 1:"));
}

// ============================================================================
// Formatting Tests
// ============================================================================

#[test]
fn test_formatted_text_reassembles() {
    let source = "PUSH -4\nREAD [0x20]\nWRITE\nSWAP\nROL\nJZ 0\nHALT";
    let assembly = assemble(source);

    let text: Vec<String> = assembly.program.instructions.iter().map(format).collect();
    let again = assemble(&text.join("\n"));
    assert!(again.is_clean());
    assert_eq!(again.encoded, assembly.encoded);
}

#[test]
fn test_program_listing() {
    let assembly = assemble("start: PUSH 1\nJMP start");
    assert_eq!(
        format_program(&assembly.program),
        "start:\n0000: PUSH 1\n0001: JMP 0\n"
    );
}

#[test]
fn test_disassemble_listing_file() {
    let path = std::env::temp_dir().join(format!("stackvm-disasm-{}.hex", std::process::id()));
    std::fs::write(&path, "; encoded\n01000005\n01000003\n10000000\nFF000000\n").unwrap();

    let table = InstructionTable::builtin();
    let listing = disassemble_file(&path, &table).unwrap();
    assert!(listing.contains("0002: 10000000  ADD"));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_disassemble_listing_file_bad_record() {
    let path = std::env::temp_dir().join(format!("stackvm-disasm-bad-{}.hex", std::process::id()));
    std::fs::write(&path, "0100\n").unwrap();

    let table = InstructionTable::builtin();
    assert!(matches!(
        disassemble_file(&path, &table),
        Err(DisassemblerError::Encoding(_))
    ));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_disassemble_empty() {
    let table = InstructionTable::builtin();
    let listing = disassemble(&[], &table).unwrap();
    assert!(listing.contains("0 instructions"));
}
