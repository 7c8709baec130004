//! Instruction decoder
//!
//! Maps an encoded record back to an [`Instruction`] using the same table the
//! assembler used. The operand field is interpreted according to the operand
//! class of the mnemonic the opcode resolves to.

use crate::error::{DisassemblerError, Result};
use stackvm_spec::{EncodedInstruction, Instruction, InstructionTable, OperandClass, Program};

/// Decode one encoded instruction
pub fn decode(encoded: EncodedInstruction, table: &InstructionTable) -> Result<Instruction> {
    let name = table
        .mnemonic_for(encoded.opcode)
        .ok_or(DisassemblerError::UnknownOpcode(encoded.opcode))?;
    let entry = table
        .resolve(name)
        .ok_or(DisassemblerError::UnknownOpcode(encoded.opcode))?;
    let mnemonic = entry
        .kind()
        .ok_or_else(|| DisassemblerError::UnsupportedMnemonic {
            opcode: encoded.opcode,
            mnemonic: name.to_string(),
        })?;

    let value = encoded.operand_value();
    let operand = match mnemonic.operand_class() {
        OperandClass::None => {
            if encoded.operand != 0 {
                return Err(DisassemblerError::UnexpectedOperand {
                    mnemonic: mnemonic.name().to_string(),
                    field: encoded.operand,
                });
            }
            None
        }
        OperandClass::Literal => Some(value),
        OperandClass::Target => {
            if value < 0 {
                return Err(DisassemblerError::InvalidTarget(value));
            }
            Some(value)
        }
        // Without the flag bit, only an all-zero field is the stack form
        OperandClass::OptionalAddress => match encoded.address() {
            Some(addr) => Some(addr),
            None if encoded.operand == 0 => None,
            None => Some(value),
        },
    };

    Ok(Instruction::from_parts(mnemonic, operand)?)
}

/// Decode a packed 32-bit word
pub fn decode_word(word: u32, table: &InstructionTable) -> Result<Instruction> {
    decode(EncodedInstruction::from_word(word), table)
}

/// Decode a whole instruction stream into a program (no labels)
pub fn decode_program(encoded: &[EncodedInstruction], table: &InstructionTable) -> Result<Program> {
    encoded
        .iter()
        .enumerate()
        .map(|(index, &word)| decode(word, table).map_err(|e| e.at(index)))
        .collect::<Result<Vec<_>>>()
        .map(Program::new)
}
