//! Main assembler logic
//!
//! Two passes over the source. The first parses every line, resolves
//! mnemonics against the instruction table and binds labels to instruction
//! indices. The second resolves operands (literals or labels) and encodes.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::Result;
use crate::parser::{is_identifier, parse_line, parse_literal, Operand};
use serde::{Deserialize, Serialize};
use stackvm_spec::encoding::{address_in_range, operand_in_range};
use stackvm_spec::{
    encode_with_opcode, EncodedInstruction, Instruction, InstructionTable, Mnemonic, OperandClass,
    Program, Word,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Result of assembling a source text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    /// Decoded instructions, ready for the engine
    pub program: Program,
    /// Wire form, one entry per instruction
    pub encoded: Vec<EncodedInstruction>,
    /// Per-line problems, in source order
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    /// No diagnostics were produced
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Encoded instructions as 8-digit hex strings
    pub fn hex_lines(&self) -> Vec<String> {
        self.encoded.iter().map(|e| e.to_string()).collect()
    }
}

/// A line that survived the first pass
struct Pending {
    line: usize,
    mnemonic: Mnemonic,
    opcode: u8,
    operand: Option<Operand>,
}

/// Assembler bound to an instruction table
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a> {
    table: &'a InstructionTable,
}

impl<'a> Assembler<'a> {
    pub fn new(table: &'a InstructionTable) -> Self {
        Self { table }
    }

    /// Assemble source text; never fails, problems become diagnostics
    pub fn assemble(&self, source: &str) -> Assembly {
        let mut diagnostics = Vec::new();
        let mut labels = BTreeMap::new();
        let mut pending = Vec::new();

        // ========== Pass 1: shape, mnemonics, labels ==========
        for (index, text) in source.lines().enumerate() {
            let line = index + 1;
            let parsed = match parse_line(text) {
                Ok(parsed) => parsed,
                Err(kind) => {
                    diagnostics.push(Diagnostic::new(line, kind));
                    continue;
                }
            };

            if let Some(label) = parsed.label {
                if labels.contains_key(&label) {
                    diagnostics.push(Diagnostic::new(line, DiagnosticKind::DuplicateLabel { label }));
                } else {
                    labels.insert(label, pending.len());
                }
            }

            let Some(token) = parsed.mnemonic else {
                continue;
            };
            if !parsed.extra.is_empty() {
                tracing::warn!("line {}: ignoring `{}` after the operand", line, parsed.extra.join(" "));
            }

            match self.resolve_mnemonic(&token) {
                Some((mnemonic, opcode)) => pending.push(Pending {
                    line,
                    mnemonic,
                    opcode,
                    operand: parsed.operand,
                }),
                None => diagnostics.push(Diagnostic::new(
                    line,
                    DiagnosticKind::UnknownInstruction { token },
                )),
            }
        }

        // ========== Pass 2: operands and encoding ==========
        let mut instructions = Vec::with_capacity(pending.len());
        let mut encoded = Vec::with_capacity(pending.len());

        for item in pending {
            let operand = self.resolve_operand(&item, &labels, &mut diagnostics);
            let instr = match Instruction::from_parts(item.mnemonic, operand) {
                Ok(instr) => instr,
                Err(_) => {
                    // Negative jump target
                    diagnostics.push(Diagnostic::new(
                        item.line,
                        DiagnosticKind::InvalidOperand {
                            token: item
                                .operand
                                .as_ref()
                                .map(|op| op.token().to_string())
                                .unwrap_or_default(),
                        },
                    ));
                    match Instruction::from_parts(item.mnemonic, operand.map(|_| 0)) {
                        Ok(instr) => instr,
                        Err(_) => continue,
                    }
                }
            };

            // Operands were range checked above, so encoding cannot fail
            let word = encode_with_opcode(&instr, item.opcode)
                .unwrap_or_else(|_| EncodedInstruction::without_operand(item.opcode));

            instructions.push(instr);
            encoded.push(word);
        }

        diagnostics.sort_by_key(|d| d.line);
        for diag in &diagnostics {
            tracing::warn!("{}", diag);
        }
        tracing::debug!(
            "assembled {} instructions, {} labels, {} diagnostics",
            instructions.len(),
            labels.len(),
            diagnostics.len()
        );

        Assembly {
            program: Program::with_labels(instructions, labels),
            encoded,
            diagnostics,
        }
    }

    /// Read and assemble a source file; only I/O failures are errors
    pub fn assemble_file(&self, path: impl AsRef<Path>) -> Result<Assembly> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Ok(self.assemble(&source))
    }

    /// Table entry for a source mnemonic, if it names an executable kind
    fn resolve_mnemonic(&self, token: &str) -> Option<(Mnemonic, u8)> {
        let entry = self.table.resolve(token)?;
        let kind = entry.kind()?;
        Some((kind, entry.opcode))
    }

    fn resolve_operand(
        &self,
        item: &Pending,
        labels: &BTreeMap<String, usize>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Word> {
        let class = item.mnemonic.operand_class();
        let mut report = |kind| diagnostics.push(Diagnostic::new(item.line, kind));

        let Some(operand) = &item.operand else {
            if class.is_required() {
                report(DiagnosticKind::MissingOperand {
                    mnemonic: item.mnemonic.name().to_string(),
                });
                return Some(0);
            }
            return None;
        };

        let token = operand.token();

        if !class.accepts_operand() {
            report(DiagnosticKind::UnexpectedOperand {
                mnemonic: item.mnemonic.name().to_string(),
                token: token.to_string(),
            });
            return None;
        }

        let invalid = || DiagnosticKind::InvalidOperand {
            token: token.to_string(),
        };

        let misplaced = matches!(operand, Operand::Address(_)) && class != OperandClass::OptionalAddress;
        if misplaced || matches!(operand, Operand::Malformed(_)) {
            report(invalid());
            return Some(0);
        }

        let value = match parse_literal(token) {
            Some(value) => value,
            None => match labels.get(token) {
                Some(&index) => index as Word,
                None if class == OperandClass::Target && is_identifier(token) => {
                    report(DiagnosticKind::UndefinedLabel {
                        label: token.to_string(),
                    });
                    return Some(0);
                }
                None => {
                    report(invalid());
                    return Some(0);
                }
            },
        };

        let in_range = match class {
            OperandClass::OptionalAddress => address_in_range(value),
            _ => operand_in_range(value),
        };
        if !in_range {
            report(invalid());
            return Some(0);
        }

        Some(value)
    }
}

/// Assemble with the built-in instruction table
pub fn assemble(source: &str) -> Assembly {
    Assembler::new(&InstructionTable::builtin()).assemble(source)
}

/// Assemble a source file against a table file
pub fn assemble_with_table_file(
    source: impl AsRef<Path>,
    table: impl AsRef<Path>,
) -> Result<Assembly> {
    let table = InstructionTable::load(table)?;
    Assembler::new(&table).assemble_file(source)
}
