//! Processor state
//!
//! Everything the engine mutates except memory: the data stack, program
//! counter, counter register, flags and halted status.

use serde::{Deserialize, Serialize};
use stackvm_spec::Word;
use std::collections::BTreeMap;

/// Flag register, recomputed by arithmetic and comparison instructions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flags {
    /// Last result was zero
    pub zero: bool,
    /// Unsigned carry or borrow out of 64 bits
    pub carry: bool,
    /// Signed 64-bit overflow
    pub overflow: bool,
}

impl Flags {
    pub const CLEAR: Self = Self {
        zero: false,
        carry: false,
        overflow: false,
    };

    /// Flags for a result with no carry or overflow
    #[inline]
    pub const fn from_result(result: Word) -> Self {
        Self {
            zero: result == 0,
            carry: false,
            overflow: false,
        }
    }
}

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineStatus {
    /// Loaded or reset, nothing executed yet
    Ready,
    /// At least one step executed, more remain
    Running,
    /// HALT executed or the program counter reached the end
    Halted,
}

/// Processor state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorState {
    /// Data stack (top = last)
    pub stack: Vec<Word>,

    /// Index of the next instruction
    pub pc: usize,

    /// Counter register
    pub counter: Word,

    /// Flag register
    pub flags: Flags,

    /// Set by HALT, or when pc reaches the end of the program
    pub halted: bool,

    /// Text of the most recently executed instruction
    pub current_instruction: String,
}

impl ProcessorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status given the installed program length and executed step count
    pub fn status(&self, program_len: usize, steps: u64) -> EngineStatus {
        if self.halted || self.pc >= program_len {
            EngineStatus::Halted
        } else if steps == 0 {
            EngineStatus::Ready
        } else {
            EngineStatus::Running
        }
    }
}

/// Copy of the observable machine state for front-ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSnapshot {
    pub stack: Vec<Word>,
    pub pc: usize,
    pub counter: Word,
    pub flags: Flags,
    pub halted: bool,
    pub status: EngineStatus,
    pub current_instruction: String,
    /// Steps executed since load or reset
    pub steps: u64,
    /// Memory size in cells
    pub memory_size: usize,
    /// Non-zero memory cells, by address
    pub memory: BTreeMap<usize, Word>,
}

impl ProcessorSnapshot {
    /// Memory cell value (0 for cells not listed)
    pub fn cell(&self, address: usize) -> Word {
        self.memory.get(&address).copied().unwrap_or(0)
    }
}
