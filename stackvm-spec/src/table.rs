//! # Instruction Table
//!
//! Mnemonic ↔ opcode mapping with no duplicate mnemonics and no duplicate
//! opcodes. A table may be backed by a text file; every mutation is written
//! back immediately, and a mutation whose write fails is undone.
//!
//! ## File Format
//!
//! ```text
//! PUSH	0x01
//! POP	0x02
//! ; comments and blank lines are ignored
//! ```
//!
//! Fields may be separated by tabs or spaces. Opcodes are always hex, with or
//! without a `0x` prefix (`ADD\t10` is 0x10). Saved files always use
//! `<MNEMONIC>\t0x<OPCODE>`.

use crate::error::{Result, SpecError};
use crate::opcode::Mnemonic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A single table row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpcodeEntry {
    pub mnemonic: String,
    pub opcode: u8,
}

impl OpcodeEntry {
    pub fn new(mnemonic: impl Into<String>, opcode: u8) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            opcode,
        }
    }

    /// Instruction kind this entry encodes, if it names one
    pub fn kind(&self) -> Option<Mnemonic> {
        Mnemonic::from_name(&self.mnemonic)
    }
}

/// Mnemonic → opcode table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTable {
    entries: Vec<OpcodeEntry>,
    store: Option<PathBuf>,
}

impl Default for InstructionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl InstructionTable {
    /// Table with every mnemonic at its default opcode
    pub fn builtin() -> Self {
        Self {
            entries: Mnemonic::ALL
                .iter()
                .map(|m| OpcodeEntry::new(m.name(), m.default_opcode()))
                .collect(),
            store: None,
        }
    }

    /// Table with no entries
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            store: None,
        }
    }

    /// Build an in-memory table, rejecting duplicates
    pub fn from_entries(entries: impl IntoIterator<Item = OpcodeEntry>) -> Result<Self> {
        let mut table = Self::empty();
        for entry in entries {
            table.insert(entry.mnemonic, entry.opcode)?;
        }
        Ok(table)
    }

    /// Parse the text format
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::empty();

        for (line_num, raw) in text.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                return Err(SpecError::Parse {
                    line: line_num + 1,
                    message: format!("expected `<mnemonic> <opcode>`, found {:?}", raw.trim()),
                });
            }

            // Anything after the mnemonic is the opcode, e.g. "0x 01"
            let number = parts[1..].concat();
            let opcode = parse_opcode(&number).ok_or_else(|| SpecError::Parse {
                line: line_num + 1,
                message: format!("invalid opcode {:?}", number),
            })?;

            table
                .insert(parts[0].to_string(), opcode)
                .map_err(|e| SpecError::Parse {
                    line: line_num + 1,
                    message: e.to_string(),
                })?;
        }

        Ok(table)
    }

    /// Load a file-backed table; later mutations are saved to `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut table = Self::parse(&text)?;
        table.store = Some(path.to_path_buf());
        tracing::debug!("loaded {} opcode entries from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load `path`, or write the built-in table there if it does not exist yet
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        let table = Self::builtin().with_store(path);
        table.save()?;
        Ok(table)
    }

    /// Attach a backing file without writing it
    pub fn with_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.store = Some(path.into());
        self
    }

    /// Backing file, if any
    pub fn store(&self) -> Option<&Path> {
        self.store.as_deref()
    }

    /// Serialize to the text format
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!("{}\t0x{:02X}\n", entry.mnemonic, entry.opcode));
        }
        out
    }

    /// Write to the backing file (no-op for in-memory tables)
    pub fn save(&self) -> Result<()> {
        match &self.store {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }

    /// Write to an explicit path
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_text()).map_err(|e| {
            tracing::warn!("failed to save instruction table to {}: {}", path.display(), e);
            SpecError::IoError(e)
        })
    }

    // ========== Queries ==========

    /// Opcode for a mnemonic (case-insensitive, aliases resolve by kind)
    pub fn lookup(&self, mnemonic: &str) -> Result<u8> {
        self.resolve(mnemonic)
            .map(|entry| entry.opcode)
            .ok_or_else(|| SpecError::UnknownInstruction(mnemonic.to_string()))
    }

    /// Registered entry for a mnemonic
    pub fn resolve(&self, mnemonic: &str) -> Option<&OpcodeEntry> {
        let mnemonic = mnemonic.trim();
        if let Some(entry) = self.position(mnemonic).map(|i| &self.entries[i]) {
            return Some(entry);
        }
        // DROP finds POP, READ finds LOAD, and so on
        let kind = Mnemonic::from_name(mnemonic)?;
        self.entries.iter().find(|entry| entry.kind() == Some(kind))
    }

    /// Mnemonic registered for an opcode
    pub fn mnemonic_for(&self, opcode: u8) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.opcode == opcode)
            .map(|entry| entry.mnemonic.as_str())
    }

    pub fn contains(&self, mnemonic: &str) -> bool {
        self.position(mnemonic).is_some()
    }

    pub fn entries(&self) -> &[OpcodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ========== Mutations (persisted) ==========

    /// Register a new mnemonic
    pub fn add(&mut self, mnemonic: &str, opcode: u8) -> Result<()> {
        self.commit(|table| table.insert(mnemonic.to_string(), opcode))?;
        tracing::debug!("added {} = {:#04x}", mnemonic, opcode);
        Ok(())
    }

    /// Remove a mnemonic
    pub fn remove(&mut self, mnemonic: &str) -> Result<OpcodeEntry> {
        self.commit(|table| {
            let index = table
                .position(mnemonic)
                .ok_or_else(|| SpecError::NotFound(mnemonic.to_string()))?;
            Ok(table.entries.remove(index))
        })
    }

    /// Remove whatever mnemonic owns `opcode`
    pub fn remove_opcode(&mut self, opcode: u8) -> Result<OpcodeEntry> {
        self.commit(|table| {
            let index = table
                .entries
                .iter()
                .position(|entry| entry.opcode == opcode)
                .ok_or_else(|| SpecError::NotFound(format!("{:#04x}", opcode)))?;
            Ok(table.entries.remove(index))
        })
    }

    /// Reassign the opcode of an existing mnemonic
    pub fn update(&mut self, mnemonic: &str, opcode: u8) -> Result<()> {
        self.commit(|table| {
            let index = table
                .position(mnemonic)
                .ok_or_else(|| SpecError::NotFound(mnemonic.to_string()))?;
            if let Some(owner) = table
                .entries
                .iter()
                .enumerate()
                .find(|(i, entry)| *i != index && entry.opcode == opcode)
                .map(|(_, entry)| entry.mnemonic.clone())
            {
                return Err(SpecError::DuplicateOpcode { opcode, owner });
            }
            table.entries[index].opcode = opcode;
            Ok(())
        })
    }

    /// Apply `change` and persist it; a failed save restores the entries
    fn commit<T>(&mut self, change: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let before = self.entries.clone();
        let value = change(self)?;
        if let Err(e) = self.save() {
            self.entries = before;
            return Err(e);
        }
        Ok(value)
    }

    fn insert(&mut self, mnemonic: String, opcode: u8) -> Result<()> {
        let mnemonic = normalize_mnemonic(&mnemonic)?;
        if self.contains(&mnemonic) {
            return Err(SpecError::DuplicateMnemonic(mnemonic));
        }
        if let Some(owner) = self.mnemonic_for(opcode) {
            return Err(SpecError::DuplicateOpcode {
                opcode,
                owner: owner.to_string(),
            });
        }
        self.entries.push(OpcodeEntry::new(mnemonic, opcode));
        Ok(())
    }

    fn position(&self, mnemonic: &str) -> Option<usize> {
        let mnemonic = mnemonic.trim();
        self.entries
            .iter()
            .position(|entry| entry.mnemonic.eq_ignore_ascii_case(mnemonic))
    }
}

fn normalize_mnemonic(name: &str) -> Result<String> {
    let name = name.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(SpecError::InvalidMnemonic(name.to_string()));
    }
    Ok(name.to_ascii_uppercase())
}

/// Parse an opcode field: hex digits, optionally `0x`-prefixed
pub fn parse_opcode(text: &str) -> Option<u8> {
    let text = text.trim();
    let digits = match text.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => &text[2..],
        _ => text,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

fn strip_comment(line: &str) -> &str {
    match line.find([';', '#']) {
        Some(index) => &line[..index],
        None => line,
    }
}
