//! # Stack VM Specification
//!
//! Core types shared by the assembler, disassembler and runtime.
//!
//! ## Key Features
//! - 24 instruction kinds over a single data stack
//! - A counter register driven by LDC/STC/INCC/DECC
//! - Fixed-width encoding: 8-bit opcode + 24-bit operand field (6 hex digits)
//! - Editable, file-backed mnemonic → opcode table
//! - Flat word-addressed data memory

pub mod config;
pub mod encoding;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod table;

pub use config::{ConfigError, MachineConfig, MemoryPolicy};
pub use encoding::{EncodedInstruction, MAX_ADDRESS, MAX_OPERAND, MIN_OPERAND};
pub use error::SpecError;
pub use instruction::Instruction;
pub use opcode::{Mnemonic, OperandClass};
pub use program::{encode_instruction, encode_with_opcode, Program};
pub use table::{parse_opcode, InstructionTable, OpcodeEntry};

/// Data word (stack values, memory cells, counter register)
pub type Word = i64;

/// Default execution step limit
pub const DEFAULT_STEP_LIMIT: u64 = 1000;
