//! Instruction execution
//!
//! [`execute`] is a pure function of the current state: it reads the
//! processor state and memory and returns the next state plus an optional
//! memory write. The engine commits a [`Transition`] only when execution
//! succeeds, so a fault never leaves a partially updated machine.

use crate::error::Fault;
use crate::memory::Memory;
use crate::state::{Flags, ProcessorState};
use stackvm_spec::{Instruction, MachineConfig, Word};

/// A pending memory store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryWrite {
    pub index: usize,
    pub value: Word,
}

/// Outcome of one successful instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ProcessorState,
    pub write: Option<MemoryWrite>,
}

/// Execute single instruction
pub fn execute(
    instr: &Instruction,
    state: &ProcessorState,
    memory: &Memory,
    program_len: usize,
    config: &MachineConfig,
) -> Result<Transition, Fault> {
    let pc = state.pc;
    let mut next = state.clone();
    let mut stack = Stack {
        values: &mut next.stack,
        pc,
        limit: config.max_stack_depth,
    };
    let mut write = None;
    let mut next_pc = pc + 1;

    match *instr {
        // ========== Stack ==========
        Instruction::Push { value } => stack.push(value)?,

        Instruction::Pop => {
            stack.pop_n::<1>()?;
        }

        Instruction::Dup => {
            let top = stack.peek()?;
            stack.push(top)?;
        }

        Instruction::Swap => {
            let [first, second] = stack.pop_n::<2>()?;
            stack.push(first)?;
            stack.push(second)?;
        }

        Instruction::Ror => {
            let [first, second, third] = stack.pop_n::<3>()?;
            stack.push(second)?;
            stack.push(first)?;
            stack.push(third)?;
        }

        Instruction::Rol => {
            let [first, second, third] = stack.pop_n::<3>()?;
            stack.push(first)?;
            stack.push(third)?;
            stack.push(second)?;
        }

        // ========== Arithmetic ==========
        Instruction::Add => {
            let [first, second] = stack.pop_n::<2>()?;
            let (result, overflow) = second.overflowing_add(first);
            let carry = (second as u64).overflowing_add(first as u64).1;
            stack.push(result)?;
            next.flags = arith_flags(result, carry, overflow);
        }

        Instruction::Sub => {
            let [first, second] = stack.pop_n::<2>()?;
            let (result, overflow) = second.overflowing_sub(first);
            let carry = (second as u64) < (first as u64);
            stack.push(result)?;
            next.flags = arith_flags(result, carry, overflow);
        }

        Instruction::Mul => {
            let [first, second] = stack.pop_n::<2>()?;
            let (result, overflow) = second.overflowing_mul(first);
            let carry = (second as u64).overflowing_mul(first as u64).1;
            stack.push(result)?;
            next.flags = arith_flags(result, carry, overflow);
        }

        Instruction::Div => {
            let [first, second] = stack.pop_n::<2>()?;
            if first == 0 {
                return Err(Fault::DivisionByZero { pc });
            }
            // Only MIN / -1 overflows
            let (result, overflow) = second.overflowing_div(first);
            stack.push(result)?;
            next.flags = arith_flags(result, false, overflow);
        }

        Instruction::Inc => {
            let [top] = stack.pop_n::<1>()?;
            let (result, overflow) = top.overflowing_add(1);
            stack.push(result)?;
            next.flags = arith_flags(result, top == -1, overflow);
        }

        Instruction::Dec => {
            let [top] = stack.pop_n::<1>()?;
            let (result, overflow) = top.overflowing_sub(1);
            stack.push(result)?;
            next.flags = arith_flags(result, top == 0, overflow);
        }

        Instruction::Cmp => {
            let [first, second] = stack.pop_n::<2>()?;
            let result = if first <= second { second } else { first };
            stack.push(result)?;
            next.flags = Flags::from_result(result);
        }

        Instruction::Cmpc => {
            let [first] = stack.pop_n::<1>()?;
            let result = if first <= state.counter {
                state.counter
            } else {
                first
            };
            stack.push(result)?;
            next.counter = state.counter.wrapping_sub(1);
            next.flags = Flags::from_result(result);
        }

        // ========== Memory ==========
        Instruction::Read { addr } => {
            let address = match addr {
                Some(address) => address,
                None => stack.pop_n::<1>()?[0],
            };
            let value = memory.read(address).ok_or(Fault::MemoryOutOfBounds {
                pc,
                address,
                size: memory.len(),
            })?;
            stack.push(value)?;
        }

        Instruction::Write { addr } => {
            let (address, value) = match addr {
                Some(address) => (address, stack.pop_n::<1>()?[0]),
                None => {
                    let [address, value] = stack.pop_n::<2>()?;
                    (address, value)
                }
            };
            let index = memory.writable(address).ok_or(Fault::MemoryOutOfBounds {
                pc,
                address,
                size: memory.len(),
            })?;
            write = Some(MemoryWrite { index, value });
        }

        // ========== Control ==========
        Instruction::Jmp { target } => {
            next_pc = check_target(target, program_len, pc)?;
        }

        Instruction::Jz { target } => {
            let target = check_target(target, program_len, pc)?;
            let [cond] = stack.pop_n::<1>()?;
            if cond == 0 {
                next_pc = target;
            }
        }

        Instruction::Jnz { target } => {
            let target = check_target(target, program_len, pc)?;
            let [cond] = stack.pop_n::<1>()?;
            if cond != 0 {
                next_pc = target;
            }
        }

        // ========== Counter register ==========
        Instruction::Ldc => {
            next.counter = stack.peek()?.wrapping_sub(1);
        }

        Instruction::Stc => stack.push(state.counter)?,

        Instruction::Incc => {
            next.counter = state.counter.wrapping_add(1);
        }

        Instruction::Decc => {
            next.counter = state.counter.wrapping_sub(1);
        }

        // ========== System ==========
        Instruction::Halt => {
            next.halted = true;
            next_pc = pc;
        }
    }

    next.pc = next_pc;
    // Running off the end counts as halting
    if next_pc >= program_len {
        next.halted = true;
    }
    next.current_instruction = instr.to_string();

    Ok(Transition { state: next, write })
}

#[inline]
fn arith_flags(result: Word, carry: bool, overflow: bool) -> Flags {
    Flags {
        zero: result == 0,
        carry,
        overflow,
    }
}

#[inline]
fn check_target(target: usize, program_len: usize, pc: usize) -> Result<usize, Fault> {
    if target > program_len {
        return Err(Fault::InvalidJumpTarget {
            pc,
            target,
            len: program_len,
        });
    }
    Ok(target)
}

/// Depth-checked view of the data stack
struct Stack<'a> {
    values: &'a mut Vec<Word>,
    pc: usize,
    limit: usize,
}

impl Stack<'_> {
    /// Pop `N` values, top first; nothing is popped on underflow
    fn pop_n<const N: usize>(&mut self) -> Result<[Word; N], Fault> {
        let available = self.values.len();
        if available < N {
            return Err(Fault::StackUnderflow {
                pc: self.pc,
                needed: N,
                available,
            });
        }
        let mut out = [0; N];
        for slot in out.iter_mut() {
            // Length checked above
            *slot = self.values.pop().unwrap_or_default();
        }
        Ok(out)
    }

    fn peek(&self) -> Result<Word, Fault> {
        self.values.last().copied().ok_or(Fault::StackUnderflow {
            pc: self.pc,
            needed: 1,
            available: 0,
        })
    }

    fn push(&mut self, value: Word) -> Result<(), Fault> {
        if self.values.len() >= self.limit {
            return Err(Fault::StackOverflow {
                pc: self.pc,
                limit: self.limit,
            });
        }
        self.values.push(value);
        Ok(())
    }
}
