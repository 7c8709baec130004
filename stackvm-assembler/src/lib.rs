//! Stack VM Assembler
//!
//! Assemble stack VM assembly language into instructions and their
//! fixed-width encoding.
//!
//! ## Example
//!
//! ```rust
//! use stackvm_assembler::assemble;
//!
//! let source = r#"
//!     PUSH 5
//!     PUSH 0x3
//!     ADD
//!     HALT
//! "#;
//!
//! let assembly = assemble(source);
//! assert!(assembly.is_clean());
//! assert_eq!(assembly.hex_lines()[1], "01000003");
//! ```

pub mod assembler;
pub mod diagnostic;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod parser;

pub use assembler::{assemble, assemble_with_table_file, Assembler, Assembly};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use encoder::{encode_line, parse_listing, to_listing};
pub use error::{AssemblerError, Result};
pub use parser::parse_literal;
