//! # Instruction Encoding Constants and Helpers
//!
//! Every instruction encodes to a fixed-width record: an opcode followed by a
//! zero-padded operand field written in hexadecimal.
//!
//! ## Instruction Format
//!
//! ```text
//! text:   OO PPPPPP         (2 hex digits opcode, 6 hex digits operand)
//! word:   [opcode:8][operand:24]
//! ```
//!
//! The operand field holds a 24-bit two's complement value. Literals outside
//! [`MIN_OPERAND`]..=[`MAX_OPERAND`] cannot be encoded.
//!
//! The address form of READ and WRITE sets [`ADDRESS_FLAG`] (bit 23) and keeps
//! the address in the low 23 bits, so `READ [0]` (`20800000`) stays distinct
//! from the stack form `READ` (`20000000`).

use crate::error::SpecError;
use crate::Word;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Field Layout
// ============================================================================

/// Hex digits in the operand field
pub const OPERAND_DIGITS: usize = 6;

/// Hex digits in the opcode field
pub const OPCODE_DIGITS: usize = 2;

/// Operand field width in bits
pub const OPERAND_BITS: u32 = 24;

/// Operand field mask (24 bits)
pub const OPERAND_MASK: u32 = (1 << OPERAND_BITS) - 1;

/// Opcode field position in the packed word
pub const OPCODE_SHIFT: u32 = OPERAND_BITS;

/// Smallest encodable literal
pub const MIN_OPERAND: Word = -(1 << (OPERAND_BITS - 1));

/// Largest encodable literal
pub const MAX_OPERAND: Word = (1 << (OPERAND_BITS - 1)) - 1;

/// Marks an operand field as an explicit memory address
pub const ADDRESS_FLAG: u32 = 1 << (OPERAND_BITS - 1);

/// Largest encodable explicit address
pub const MAX_ADDRESS: Word = (ADDRESS_FLAG - 1) as Word;

// ============================================================================
// Field Helpers
// ============================================================================

/// Check whether a literal fits in the operand field
#[inline]
pub const fn operand_in_range(value: Word) -> bool {
    value >= MIN_OPERAND && value <= MAX_OPERAND
}

/// Check whether an explicit address fits beside the flag bit
#[inline]
pub const fn address_in_range(addr: Word) -> bool {
    addr >= 0 && addr <= MAX_ADDRESS
}

/// Truncate a literal to its 24-bit field representation
#[inline]
pub const fn pack_operand(value: Word) -> u32 {
    (value as u32) & OPERAND_MASK
}

/// Sign-extend a 24-bit operand field
#[inline]
pub const fn unpack_operand(field: u32) -> Word {
    let field = field & OPERAND_MASK;
    if field & (1 << (OPERAND_BITS - 1)) != 0 {
        field as Word - (1 << OPERAND_BITS)
    } else {
        field as Word
    }
}

// ============================================================================
// Encoded Instruction
// ============================================================================

/// One encoded instruction: opcode plus fixed-width operand field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedInstruction {
    /// Opcode from the instruction table
    pub opcode: u8,
    /// 24-bit operand field (two's complement)
    pub operand: u32,
}

impl EncodedInstruction {
    /// Encode an opcode with an operand literal
    pub fn new(opcode: u8, value: Word) -> Result<Self, SpecError> {
        if !operand_in_range(value) {
            return Err(SpecError::OperandOutOfRange(value));
        }
        Ok(Self {
            opcode,
            operand: pack_operand(value),
        })
    }

    /// Encode an opcode with an explicit address (flag bit set)
    pub fn with_address(opcode: u8, addr: Word) -> Result<Self, SpecError> {
        if !address_in_range(addr) {
            return Err(SpecError::OperandOutOfRange(addr));
        }
        Ok(Self {
            opcode,
            operand: ADDRESS_FLAG | addr as u32,
        })
    }

    /// Encode an opcode with an all-zero operand field
    #[inline]
    pub const fn without_operand(opcode: u8) -> Self {
        Self { opcode, operand: 0 }
    }

    /// Signed operand value
    #[inline]
    pub const fn operand_value(&self) -> Word {
        unpack_operand(self.operand)
    }

    /// Explicit address, if the flag bit is set
    #[inline]
    pub const fn address(&self) -> Option<Word> {
        if self.operand & ADDRESS_FLAG != 0 {
            Some((self.operand & OPERAND_MASK & !ADDRESS_FLAG) as Word)
        } else {
            None
        }
    }

    /// Pack into a 32-bit word: `[opcode:8][operand:24]`
    #[inline]
    pub const fn to_word(self) -> u32 {
        ((self.opcode as u32) << OPCODE_SHIFT) | (self.operand & OPERAND_MASK)
    }

    /// Unpack a 32-bit word
    #[inline]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: (word >> OPCODE_SHIFT) as u8,
            operand: word & OPERAND_MASK,
        }
    }

    /// Operand field as 6 upper-case hex digits
    pub fn operand_field(&self) -> String {
        format!("{:0width$X}", self.operand & OPERAND_MASK, width = OPERAND_DIGITS)
    }
}

impl fmt::Display for EncodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:0ow$X}{:0pw$X}",
            self.opcode,
            self.operand & OPERAND_MASK,
            ow = OPCODE_DIGITS,
            pw = OPERAND_DIGITS
        )
    }
}

impl FromStr for EncodedInstruction {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.len() != OPCODE_DIGITS + OPERAND_DIGITS
            || !text.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(SpecError::InvalidEncoding(s.to_string()));
        }
        let word =
            u32::from_str_radix(text, 16).map_err(|_| SpecError::InvalidEncoding(s.to_string()))?;
        Ok(Self::from_word(word))
    }
}
