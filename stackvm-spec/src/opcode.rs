//! # Mnemonic Definitions
//!
//! The closed set of instruction kinds the machine understands, with their
//! operand classes and default opcodes.
//!
//! ## Default Opcodes
//!
//! - 0x01-0x06: Stack (PUSH, POP, DUP, SWAP, ROR, ROL)
//! - 0x10-0x17: Arithmetic (ADD, SUB, MUL, DIV, INC, DEC, CMP, CMPC)
//! - 0x20-0x21: Memory (READ, WRITE)
//! - 0x30-0x32: Control (JMP, JZ, JNZ)
//! - 0x40-0x43: Counter register (LDC, STC, INCC, DECC)
//! - 0xFF: HALT
//!
//! The opcode a program is actually encoded with comes from the
//! [`InstructionTable`](crate::table::InstructionTable); these values only
//! seed the built-in table.

use crate::error::SpecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of operand an instruction carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandClass {
    /// No operand
    None,
    /// Required immediate literal (PUSH)
    Literal,
    /// Required instruction index or label (JMP, JZ, JNZ)
    Target,
    /// Memory address taken from the operand if present, from the stack otherwise
    OptionalAddress,
}

impl OperandClass {
    /// Whether a line without an operand is malformed for this class
    #[inline]
    pub const fn is_required(self) -> bool {
        matches!(self, OperandClass::Literal | OperandClass::Target)
    }

    /// Whether the class accepts an operand at all
    #[inline]
    pub const fn accepts_operand(self) -> bool {
        !matches!(self, OperandClass::None)
    }
}

/// Instruction mnemonic
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mnemonic {
    // ========== Stack ==========
    /// PUSH lit: push(lit)
    Push,
    /// POP / DROP: discard top
    Pop,
    /// DUP: push copy of top
    Dup,
    /// SWAP: exchange the two top values
    Swap,
    /// ROR: rotate the three top values
    Ror,
    /// ROL: rotate the three top values the other way
    Rol,

    // ========== Arithmetic ==========
    /// ADD: push(second + first)
    Add,
    /// SUB: push(second - first)
    Sub,
    /// MUL: push(second * first)
    Mul,
    /// DIV: push(second / first)
    Div,
    /// INC: top + 1
    Inc,
    /// DEC: top - 1
    Dec,
    /// CMP: push the larger of the two top values
    Cmp,
    /// CMPC: push the larger of top and the counter register, then decrement counter
    Cmpc,

    // ========== Memory ==========
    /// READ / LOAD: push(memory[addr])
    Read,
    /// WRITE / STORE: memory[addr] = value
    Write,

    // ========== Control ==========
    /// JMP t: pc = t
    Jmp,
    /// JZ t: pop; branch if zero
    Jz,
    /// JNZ t: pop; branch if non-zero
    Jnz,

    // ========== Counter register ==========
    /// LDC: counter = top - 1
    Ldc,
    /// STC: push(counter)
    Stc,
    /// INCC: counter += 1
    Incc,
    /// DECC: counter -= 1
    Decc,

    // ========== System ==========
    /// HALT: stop execution
    Halt,
}

impl Mnemonic {
    /// Every mnemonic, in default-opcode order
    pub const ALL: [Mnemonic; 24] = [
        Mnemonic::Push,
        Mnemonic::Pop,
        Mnemonic::Dup,
        Mnemonic::Swap,
        Mnemonic::Ror,
        Mnemonic::Rol,
        Mnemonic::Add,
        Mnemonic::Sub,
        Mnemonic::Mul,
        Mnemonic::Div,
        Mnemonic::Inc,
        Mnemonic::Dec,
        Mnemonic::Cmp,
        Mnemonic::Cmpc,
        Mnemonic::Read,
        Mnemonic::Write,
        Mnemonic::Jmp,
        Mnemonic::Jz,
        Mnemonic::Jnz,
        Mnemonic::Ldc,
        Mnemonic::Stc,
        Mnemonic::Incc,
        Mnemonic::Decc,
        Mnemonic::Halt,
    ];

    /// Canonical (upper-case) name
    pub const fn name(self) -> &'static str {
        match self {
            Mnemonic::Push => "PUSH",
            Mnemonic::Pop => "POP",
            Mnemonic::Dup => "DUP",
            Mnemonic::Swap => "SWAP",
            Mnemonic::Ror => "ROR",
            Mnemonic::Rol => "ROL",
            Mnemonic::Add => "ADD",
            Mnemonic::Sub => "SUB",
            Mnemonic::Mul => "MUL",
            Mnemonic::Div => "DIV",
            Mnemonic::Inc => "INC",
            Mnemonic::Dec => "DEC",
            Mnemonic::Cmp => "CMP",
            Mnemonic::Cmpc => "CMPC",
            Mnemonic::Read => "READ",
            Mnemonic::Write => "WRITE",
            Mnemonic::Jmp => "JMP",
            Mnemonic::Jz => "JZ",
            Mnemonic::Jnz => "JNZ",
            Mnemonic::Ldc => "LDC",
            Mnemonic::Stc => "STC",
            Mnemonic::Incc => "INCC",
            Mnemonic::Decc => "DECC",
            Mnemonic::Halt => "HALT",
        }
    }

    /// Alternative spellings accepted by the assembler
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Mnemonic::Pop => &["DROP"],
            Mnemonic::Read => &["LOAD"],
            Mnemonic::Write => &["STORE"],
            _ => &[],
        }
    }

    /// Resolve a mnemonic or alias, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.iter().copied().find(|m| {
            m.name().eq_ignore_ascii_case(name)
                || m.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(name))
        })
    }

    /// Operand class
    pub const fn operand_class(self) -> OperandClass {
        match self {
            Mnemonic::Push => OperandClass::Literal,
            Mnemonic::Jmp | Mnemonic::Jz | Mnemonic::Jnz => OperandClass::Target,
            Mnemonic::Read | Mnemonic::Write => OperandClass::OptionalAddress,
            _ => OperandClass::None,
        }
    }

    /// Opcode used by the built-in instruction table
    pub const fn default_opcode(self) -> u8 {
        match self {
            Mnemonic::Push => 0x01,
            Mnemonic::Pop => 0x02,
            Mnemonic::Dup => 0x03,
            Mnemonic::Swap => 0x04,
            Mnemonic::Ror => 0x05,
            Mnemonic::Rol => 0x06,
            Mnemonic::Add => 0x10,
            Mnemonic::Sub => 0x11,
            Mnemonic::Mul => 0x12,
            Mnemonic::Div => 0x13,
            Mnemonic::Inc => 0x14,
            Mnemonic::Dec => 0x15,
            Mnemonic::Cmp => 0x16,
            Mnemonic::Cmpc => 0x17,
            Mnemonic::Read => 0x20,
            Mnemonic::Write => 0x21,
            Mnemonic::Jmp => 0x30,
            Mnemonic::Jz => 0x31,
            Mnemonic::Jnz => 0x32,
            Mnemonic::Ldc => 0x40,
            Mnemonic::Stc => 0x41,
            Mnemonic::Incc => 0x42,
            Mnemonic::Decc => 0x43,
            Mnemonic::Halt => 0xFF,
        }
    }

    /// Instructions that may set pc to something other than pc + 1
    #[inline]
    pub const fn is_control_transfer(self) -> bool {
        matches!(self, Mnemonic::Jmp | Mnemonic::Jz | Mnemonic::Jnz)
    }

    /// Instructions after which zero/carry/overflow are recomputed
    #[inline]
    pub const fn sets_flags(self) -> bool {
        matches!(
            self,
            Mnemonic::Add
                | Mnemonic::Sub
                | Mnemonic::Mul
                | Mnemonic::Div
                | Mnemonic::Inc
                | Mnemonic::Dec
                | Mnemonic::Cmp
                | Mnemonic::Cmpc
        )
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mnemonic {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mnemonic::from_name(s).ok_or_else(|| SpecError::UnknownInstruction(s.to_string()))
    }
}
