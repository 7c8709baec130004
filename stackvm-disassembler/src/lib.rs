//! # Stack VM Disassembler
//!
//! Decode fixed-width encoded instructions back into [`Instruction`]s and
//! render them as assembly listings.
//!
//! Decoding needs the instruction table the stream was encoded with, since
//! opcodes are not fixed.
//!
//! ## Example
//!
//! ```rust
//! use stackvm_spec::{EncodedInstruction, Instruction, InstructionTable};
//! use stackvm_disassembler::{decode, format_line};
//!
//! let table = InstructionTable::builtin();
//! let word: EncodedInstruction = "01000005".parse().unwrap();
//! let instr = decode(word, &table).unwrap();
//! assert_eq!(instr, Instruction::Push { value: 5 });
//! assert_eq!(format_line(0, &instr), "0000: PUSH 5");
//! ```
//!
//! [`Instruction`]: stackvm_spec::Instruction

pub mod decoder;
pub mod disassembler;
pub mod error;
pub mod formatter;

pub use decoder::{decode, decode_program, decode_word};
pub use disassembler::{disassemble, disassemble_file};
pub use error::{DisassemblerError, Result};
pub use formatter::{format, format_line, format_program};
