//! # Program Structure
//!
//! An assembled program: the instruction sequence plus the labels that were
//! resolved while building it.

use crate::encoding::EncodedInstruction;
use crate::error::Result;
use crate::instruction::Instruction;
use crate::opcode::OperandClass;
use crate::table::InstructionTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Assembled program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Instructions, indexed by program counter
    pub instructions: Vec<Instruction>,

    /// Label name → instruction index
    pub labels: BTreeMap<String, usize>,
}

impl Program {
    /// Create a program without labels
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            labels: BTreeMap::new(),
        }
    }

    /// Create a program with a label map
    pub fn with_labels(instructions: Vec<Instruction>, labels: BTreeMap<String, usize>) -> Self {
        Self {
            instructions,
            labels,
        }
    }

    /// Instruction at `pc`
    #[inline]
    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Label pointing at `pc`, if any
    pub fn label_at(&self, pc: usize) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, &index)| index == pc)
            .map(|(name, _)| name.as_str())
    }

    /// Encode every instruction with the given table
    pub fn encode(&self, table: &InstructionTable) -> Result<Vec<EncodedInstruction>> {
        self.instructions
            .iter()
            .map(|instr| encode_instruction(instr, table))
            .collect()
    }
}

/// Encode one instruction: table opcode + operand field (all-zero if absent)
pub fn encode_instruction(instr: &Instruction, table: &InstructionTable) -> Result<EncodedInstruction> {
    let opcode = table.lookup(instr.mnemonic().name())?;
    encode_with_opcode(instr, opcode)
}

/// Encode one instruction under an already resolved opcode
pub fn encode_with_opcode(instr: &Instruction, opcode: u8) -> Result<EncodedInstruction> {
    match (instr.mnemonic().operand_class(), instr.operand()) {
        (_, None) => Ok(EncodedInstruction::without_operand(opcode)),
        (OperandClass::OptionalAddress, Some(addr)) => EncodedInstruction::with_address(opcode, addr),
        (_, Some(value)) => EncodedInstruction::new(opcode, value),
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Program::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instr) in self.instructions.iter().enumerate() {
            if let Some(label) = self.label_at(pc) {
                writeln!(f, "{}:", label)?;
            }
            writeln!(f, "    {}", instr)?;
        }
        Ok(())
    }
}
