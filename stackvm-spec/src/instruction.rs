//! Stack VM Instruction Set
//!
//! One variant per instruction kind. Operands are resolved at assembly time,
//! so the engine never sees a mnemonic string.

use crate::error::SpecError;
use crate::opcode::{Mnemonic, OperandClass};
use crate::Word;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stack VM Instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    // ========== Stack ==========
    /// PUSH: push(value)
    Push { value: Word },

    /// POP: discard top
    Pop,

    /// DUP: push copy of top
    Dup,

    /// SWAP: [.., a, b] -> [.., b, a]
    Swap,

    /// ROR: pop first, second, third; push second, first, third
    Ror,

    /// ROL: pop first, second, third; push first, third, second
    Rol,

    // ========== Arithmetic ==========
    /// ADD: push(second + first)
    Add,

    /// SUB: push(second - first)
    Sub,

    /// MUL: push(second * first)
    Mul,

    /// DIV: push(second / first), truncating
    Div,

    /// INC: top + 1
    Inc,

    /// DEC: top - 1
    Dec,

    /// CMP: push(second) if first <= second, else push(first)
    Cmp,

    /// CMPC: push(counter) if first <= counter, else push(first); counter -= 1
    Cmpc,

    // ========== Memory ==========
    /// READ: push(memory[addr]); addr popped unless given
    Read { addr: Option<Word> },

    /// WRITE: memory[addr] = pop(); addr popped first unless given
    Write { addr: Option<Word> },

    // ========== Control ==========
    /// JMP: pc = target
    Jmp { target: usize },

    /// JZ: pop cond; pc = target if cond == 0
    Jz { target: usize },

    /// JNZ: pop cond; pc = target if cond != 0
    Jnz { target: usize },

    // ========== Counter register ==========
    /// LDC: counter = top - 1 (top stays)
    Ldc,

    /// STC: push(counter)
    Stc,

    /// INCC: counter += 1
    Incc,

    /// DECC: counter -= 1
    Decc,

    // ========== System ==========
    /// HALT
    Halt,
}

impl Instruction {
    /// Build an instruction from a mnemonic and its (already parsed) operand
    pub fn from_parts(mnemonic: Mnemonic, operand: Option<Word>) -> Result<Self, SpecError> {
        let class = mnemonic.operand_class();
        if operand.is_some() && !class.accepts_operand() {
            return Err(SpecError::UnexpectedOperand(mnemonic.name().to_string()));
        }
        if operand.is_none() && class.is_required() {
            return Err(SpecError::MissingOperand(mnemonic.name().to_string()));
        }

        let instr = match mnemonic {
            Mnemonic::Push => Instruction::Push {
                value: operand.unwrap_or_default(),
            },
            Mnemonic::Pop => Instruction::Pop,
            Mnemonic::Dup => Instruction::Dup,
            Mnemonic::Swap => Instruction::Swap,
            Mnemonic::Ror => Instruction::Ror,
            Mnemonic::Rol => Instruction::Rol,
            Mnemonic::Add => Instruction::Add,
            Mnemonic::Sub => Instruction::Sub,
            Mnemonic::Mul => Instruction::Mul,
            Mnemonic::Div => Instruction::Div,
            Mnemonic::Inc => Instruction::Inc,
            Mnemonic::Dec => Instruction::Dec,
            Mnemonic::Cmp => Instruction::Cmp,
            Mnemonic::Cmpc => Instruction::Cmpc,
            Mnemonic::Read => Instruction::Read { addr: operand },
            Mnemonic::Write => Instruction::Write { addr: operand },
            Mnemonic::Jmp => Instruction::Jmp {
                target: target(operand)?,
            },
            Mnemonic::Jz => Instruction::Jz {
                target: target(operand)?,
            },
            Mnemonic::Jnz => Instruction::Jnz {
                target: target(operand)?,
            },
            Mnemonic::Ldc => Instruction::Ldc,
            Mnemonic::Stc => Instruction::Stc,
            Mnemonic::Incc => Instruction::Incc,
            Mnemonic::Decc => Instruction::Decc,
            Mnemonic::Halt => Instruction::Halt,
        };
        Ok(instr)
    }

    /// Instruction kind
    pub const fn mnemonic(&self) -> Mnemonic {
        match self {
            Instruction::Push { .. } => Mnemonic::Push,
            Instruction::Pop => Mnemonic::Pop,
            Instruction::Dup => Mnemonic::Dup,
            Instruction::Swap => Mnemonic::Swap,
            Instruction::Ror => Mnemonic::Ror,
            Instruction::Rol => Mnemonic::Rol,
            Instruction::Add => Mnemonic::Add,
            Instruction::Sub => Mnemonic::Sub,
            Instruction::Mul => Mnemonic::Mul,
            Instruction::Div => Mnemonic::Div,
            Instruction::Inc => Mnemonic::Inc,
            Instruction::Dec => Mnemonic::Dec,
            Instruction::Cmp => Mnemonic::Cmp,
            Instruction::Cmpc => Mnemonic::Cmpc,
            Instruction::Read { .. } => Mnemonic::Read,
            Instruction::Write { .. } => Mnemonic::Write,
            Instruction::Jmp { .. } => Mnemonic::Jmp,
            Instruction::Jz { .. } => Mnemonic::Jz,
            Instruction::Jnz { .. } => Mnemonic::Jnz,
            Instruction::Ldc => Mnemonic::Ldc,
            Instruction::Stc => Mnemonic::Stc,
            Instruction::Incc => Mnemonic::Incc,
            Instruction::Decc => Mnemonic::Decc,
            Instruction::Halt => Mnemonic::Halt,
        }
    }

    /// Operand value, if the instruction carries one
    pub const fn operand(&self) -> Option<Word> {
        match *self {
            Instruction::Push { value } => Some(value),
            Instruction::Read { addr } | Instruction::Write { addr } => addr,
            Instruction::Jmp { target }
            | Instruction::Jz { target }
            | Instruction::Jnz { target } => Some(target as Word),
            _ => None,
        }
    }

    /// Operand class of this instruction's mnemonic
    #[inline]
    pub const fn operand_class(&self) -> OperandClass {
        self.mnemonic().operand_class()
    }
}

fn target(operand: Option<Word>) -> Result<usize, SpecError> {
    let value = operand.unwrap_or_default();
    usize::try_from(value).map_err(|_| SpecError::OperandOutOfRange(value))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand() {
            Some(operand) => write!(f, "{} {}", self.mnemonic(), operand),
            None => write!(f, "{}", self.mnemonic()),
        }
    }
}
