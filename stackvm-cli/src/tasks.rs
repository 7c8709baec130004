//! # Task Catalogue
//!
//! Built-in exercises: each one is a program plus the memory it expects to
//! find at load time and the result it must leave behind.
//!
//! Data layout shared by all tasks: the element count lives at `0x100` and
//! the elements follow from `0x101`.

use serde::{Deserialize, Serialize};
use stackvm_runtime::ProcessorSnapshot;
use stackvm_spec::Word;

/// Where a task leaves its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expectation {
    /// Value on top of the stack
    StackTop(Word),
    /// Value of one memory cell
    Memory { address: usize, value: Word },
}

impl Expectation {
    /// The observed value this expectation refers to
    pub fn observe(&self, snapshot: &ProcessorSnapshot) -> Option<Word> {
        match *self {
            Expectation::StackTop(_) => snapshot.stack.last().copied(),
            Expectation::Memory { address, .. } => Some(snapshot.cell(address)),
        }
    }

    pub fn expected(&self) -> Word {
        match *self {
            Expectation::StackTop(value) | Expectation::Memory { value, .. } => value,
        }
    }
}

/// A block of seed data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub address: usize,
    pub values: Vec<Word>,
}

/// A catalogue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub source: String,
    pub seeds: Vec<Seed>,
    pub expectation: Expectation,
}

/// Outcome of checking a task against the machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCheck {
    pub id: u32,
    pub passed: bool,
    pub expected: Word,
    pub actual: Option<Word>,
    pub halted: bool,
}

impl Task {
    /// Compare a snapshot against the expected result
    pub fn verify(&self, snapshot: &ProcessorSnapshot) -> TaskCheck {
        let actual = self.expectation.observe(snapshot);
        let expected = self.expectation.expected();
        TaskCheck {
            id: self.id,
            passed: snapshot.halted && actual == Some(expected),
            expected,
            actual,
            halted: snapshot.halted,
        }
    }
}

const SUM_SOURCE: &str = r#"; Sum of an array
        PUSH 0          ; accumulator
        PUSH 0x100
        READ            ; element count
        LDC             ; counter = count - 1
        POP
loop:
        STC
        PUSH 0x101
        ADD
        READ            ; a[counter]
        ADD
        STC
        JZ done
        DECC
        JMP loop
done:
        HALT
"#;

const DOT_SOURCE: &str = r#"; Dot product of two vectors, stored at 0x120
        PUSH 0          ; accumulator
        PUSH 0x100
        READ            ; element count
        LDC
        POP
loop:
        STC
        PUSH 0x101
        ADD
        READ            ; a[counter]
        STC
        PUSH 0x111
        ADD
        READ            ; b[counter]
        MUL
        ADD
        STC
        JZ done
        DECC
        JMP loop
done:
        PUSH 0x120
        WRITE
        HALT
"#;

const MAX_SOURCE: &str = r#"; Maximum of an array
        PUSH 0x101
        READ            ; running maximum = a[0]
        PUSH 0x100
        READ
        LDC             ; counter = count - 1
        POP
loop:
        STC
        JZ done
        STC
        PUSH 0x101
        ADD
        READ            ; a[counter]
        CMP             ; keep the larger
        DECC
        JMP loop
done:
        HALT
"#;

/// All built-in tasks
pub fn catalogue() -> Vec<Task> {
    vec![
        Task {
            id: 1,
            name: "array-sum".to_string(),
            description: "Sum of the 7 elements at 0x101, count at 0x100".to_string(),
            source: SUM_SOURCE.to_string(),
            seeds: vec![Seed {
                address: 0x100,
                values: vec![7, 10, 20, 30, 40, 50, 60, 70],
            }],
            expectation: Expectation::StackTop(280),
        },
        Task {
            id: 2,
            name: "dot-product".to_string(),
            description: "Dot product of 10-element vectors at 0x101 and 0x111, result at 0x120"
                .to_string(),
            source: DOT_SOURCE.to_string(),
            seeds: vec![
                Seed {
                    address: 0x100,
                    values: vec![10, 2, 3, 1, 4, 5, 2, 3, 1, 4, 2],
                },
                Seed {
                    address: 0x110,
                    values: vec![10, 1, 2, 3, 1, 2, 3, 1, 2, 3, 1],
                },
            ],
            expectation: Expectation::Memory {
                address: 0x120,
                value: 50,
            },
        },
        Task {
            id: 3,
            name: "array-max".to_string(),
            description: "Largest of the 8 elements at 0x101, count at 0x100".to_string(),
            source: MAX_SOURCE.to_string(),
            seeds: vec![Seed {
                address: 0x100,
                values: vec![8, 12, 45, 7, 89, 23, 56, 34, 3],
            }],
            expectation: Expectation::StackTop(89),
        },
    ]
}

/// Look up a task by id
pub fn find(id: u32) -> Option<Task> {
    catalogue().into_iter().find(|task| task.id == id)
}
