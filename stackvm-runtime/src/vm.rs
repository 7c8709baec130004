//! Execution engine for the stack VM
//!
//! The [`Engine`] owns the installed program, the processor state, memory
//! and the step history. It is single-threaded and not reentrant; callers
//! that share one across threads must serialise access themselves.

use crate::error::{Fault, Result, RuntimeError};
use crate::execute::execute;
use crate::history::{HistoryEntry, StepRecorder};
use crate::memory::Memory;
use crate::state::{EngineStatus, ProcessorSnapshot, ProcessorState};
use serde::{Deserialize, Serialize};
use stackvm_disassembler::decode_program;
use stackvm_spec::{EncodedInstruction, InstructionTable, MachineConfig, Program, Word};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Machine sizing and memory policy
    pub machine: MachineConfig,

    /// Default bound for [`Engine::run`]
    pub step_limit: u64,

    /// Log every executed step at info level instead of debug
    pub trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            machine: MachineConfig::DEFAULT,
            step_limit: stackvm_spec::DEFAULT_STEP_LIMIT,
            trace: false,
        }
    }
}

/// Result of a single [`Engine::step`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// State after the step (unchanged if it faulted)
    pub state: ProcessorState,
    /// History entry appended by the step
    pub entry: Option<HistoryEntry>,
    pub fault: Option<Fault>,
}

/// Result of [`Engine::execute_remaining`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub state: ProcessorState,
    /// Full history since load or reset
    pub history: Vec<HistoryEntry>,
    /// Steps executed by this call
    pub steps: u64,
    /// Why the run stopped early; `None` for HALT or end of program
    pub fault: Option<Fault>,
}

impl RunReport {
    /// Stopped at HALT or end of program
    pub fn completed(&self) -> bool {
        self.fault.is_none()
    }
}

/// Cooperative cancellation flag checked between steps
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Stack VM execution engine
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    program: Program,
    state: ProcessorState,
    memory: Memory,
    history: StepRecorder,
    steps: u64,
    cancel: CancelToken,
}

impl Engine {
    /// Create an engine with an empty program
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.machine.validate()?;
        Ok(Self {
            memory: Memory::new(&config.machine),
            config,
            program: Program::default(),
            state: ProcessorState::new(),
            history: StepRecorder::new(),
            steps: 0,
            cancel: CancelToken::new(),
        })
    }

    /// Create an engine and install `program`
    pub fn with_program(program: Program, config: EngineConfig) -> Result<Self> {
        let mut engine = Self::new(config)?;
        engine.load_program(program);
        Ok(engine)
    }

    // ========== Loading ==========

    /// Install a program; state, memory and history start from zero
    pub fn load_program(&mut self, program: Program) {
        tracing::debug!("loading program of {} instructions", program.len());
        self.program = program;
        self.reset();
    }

    /// Decode an encoded instruction stream and install it
    pub fn load_encoded(
        &mut self,
        encoded: &[EncodedInstruction],
        table: &InstructionTable,
    ) -> Result<()> {
        let program = decode_program(encoded, table)?;
        self.load_program(program);
        Ok(())
    }

    /// Copy `values` into memory starting at `address`
    pub fn seed_memory(&mut self, address: usize, values: &[Word]) -> Result<()> {
        self.memory
            .load(address, values)
            .map_err(|bad| RuntimeError::SeedOutOfBounds {
                address: bad,
                size: self.memory.len(),
            })
    }

    /// Back to `Ready`: zero state, memory and history; the program stays
    pub fn reset(&mut self) {
        self.state = ProcessorState::new();
        self.memory.clear(self.config.machine.memory_size);
        self.history.clear();
        self.steps = 0;
        self.cancel.reset();
    }

    // ========== Execution ==========

    /// Execute one instruction
    pub fn step(&mut self) -> StepResult {
        match self.try_step() {
            Ok(entry) => StepResult {
                state: self.state.clone(),
                entry: Some(entry),
                fault: None,
            },
            Err(fault) => StepResult {
                state: self.state.clone(),
                entry: None,
                fault: Some(fault),
            },
        }
    }

    /// Step until HALT, end of program, a fault, cancellation or `step_limit`
    pub fn execute_remaining(&mut self, step_limit: u64) -> RunReport {
        let mut steps = 0;

        let fault = if self.state.halted {
            Some(Fault::AlreadyHalted)
        } else {
            loop {
                if self.is_finished() {
                    break None;
                }
                if self.cancel.is_cancelled() {
                    tracing::debug!("run cancelled after {} steps", steps);
                    break Some(Fault::Cancelled);
                }
                if steps >= step_limit {
                    tracing::warn!("step limit of {} reached at pc {}", step_limit, self.state.pc);
                    break Some(Fault::StepLimitExceeded { limit: step_limit });
                }
                match self.try_step() {
                    Ok(_) => steps += 1,
                    Err(fault) => break Some(fault),
                }
            }
        };

        RunReport {
            state: self.state.clone(),
            history: self.history.all().to_vec(),
            steps,
            fault,
        }
    }

    /// [`Engine::execute_remaining`] with the configured step limit
    pub fn run(&mut self) -> RunReport {
        self.execute_remaining(self.config.step_limit)
    }

    fn try_step(&mut self) -> std::result::Result<HistoryEntry, Fault> {
        let instr = *self.program.get(self.state.pc).ok_or(Fault::ProgramComplete)?;
        if self.state.halted {
            return Err(Fault::AlreadyHalted);
        }

        let transition = execute(
            &instr,
            &self.state,
            &self.memory,
            self.program.len(),
            &self.config.machine,
        )
        .map_err(|fault| {
            tracing::debug!("fault: {}", fault);
            fault
        })?;

        if let Some(write) = transition.write {
            self.memory.store(write.index, write.value);
        }
        self.state = transition.state;
        self.steps += 1;

        if self.config.trace {
            tracing::info!(
                "[{:6}] {:<12} pc={} stack={:?}",
                self.steps,
                self.state.current_instruction,
                self.state.pc,
                self.state.stack
            );
        } else {
            tracing::debug!(
                "[{:6}] {:<12} pc={} stack={:?}",
                self.steps,
                self.state.current_instruction,
                self.state.pc,
                self.state.stack
            );
        }

        let entry = HistoryEntry {
            step: self.steps,
            command: self.state.current_instruction.clone(),
            stack: self.state.stack.clone(),
            pc_after: self.state.pc,
            flags: self.state.flags,
            counter: self.state.counter,
        };
        self.history.record(entry.clone());
        Ok(entry)
    }

    fn is_finished(&self) -> bool {
        self.state.halted || self.state.pc >= self.program.len()
    }

    // ========== Observation ==========

    pub fn state(&self) -> &ProcessorState {
        &self.state
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.all()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Steps executed since load or reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn status(&self) -> EngineStatus {
        self.state.status(self.program.len(), self.steps)
    }

    /// Token that cancels a run from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn snapshot(&self) -> ProcessorSnapshot {
        ProcessorSnapshot {
            stack: self.state.stack.clone(),
            pc: self.state.pc,
            counter: self.state.counter,
            flags: self.state.flags,
            // An empty program is halted before any step runs
            halted: self.status() == EngineStatus::Halted,
            status: self.status(),
            current_instruction: self.state.current_instruction.clone(),
            steps: self.steps,
            memory_size: self.memory.len(),
            memory: self.memory.non_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackvm_spec::{Instruction, MemoryPolicy};

    fn engine(instructions: Vec<Instruction>) -> Engine {
        Engine::with_program(Program::new(instructions), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_engine_basic_execution() {
        let mut vm = engine(vec![
            Instruction::Push { value: 5 },
            Instruction::Push { value: 3 },
            Instruction::Add,
            Instruction::Halt,
        ]);
        assert_eq!(vm.status(), EngineStatus::Ready);

        for _ in 0..3 {
            assert!(vm.step().fault.is_none());
        }
        assert_eq!(vm.state().stack, vec![8]);
        assert!(!vm.state().flags.zero);
        assert_eq!(vm.status(), EngineStatus::Running);

        let result = vm.step();
        assert!(result.state.halted);
        assert_eq!(result.entry.map(|e| e.command), Some("HALT".to_string()));
        assert_eq!(vm.status(), EngineStatus::Halted);
        assert_eq!(vm.history().len(), 4);
    }

    #[test]
    fn test_step_after_halt() {
        let mut vm = engine(vec![Instruction::Halt, Instruction::Push { value: 1 }]);
        vm.step();
        let result = vm.step();
        assert_eq!(result.fault, Some(Fault::AlreadyHalted));
        assert!(result.entry.is_none());
        assert_eq!(vm.history().len(), 1);
    }

    #[test]
    fn test_step_past_end() {
        let mut vm = engine(vec![Instruction::Push { value: 1 }]);
        let result = vm.step();
        assert!(result.fault.is_none());
        assert!(result.state.halted);
        assert!(vm.snapshot().halted);

        let result = vm.step();
        assert_eq!(result.fault, Some(Fault::ProgramComplete));
        assert_eq!(result.state.stack, vec![1]);
        assert_eq!(vm.status(), EngineStatus::Halted);
    }

    #[test]
    fn test_run_off_end_reports_halted() {
        let mut vm = engine(vec![Instruction::Push { value: 1 }, Instruction::Push { value: 2 }]);
        let report = vm.run();
        assert!(report.completed());
        assert!(report.state.halted);
        assert_eq!(report.state.pc, 2);

        let snapshot = vm.snapshot();
        assert!(snapshot.halted);
        assert_eq!(snapshot.status, EngineStatus::Halted);

        let empty = engine(Vec::new());
        assert!(empty.snapshot().halted);
    }

    #[test]
    fn test_fault_leaves_state_unchanged() {
        let mut vm = engine(vec![Instruction::Pop]);
        let before = vm.state().clone();
        let result = vm.step();
        assert!(matches!(result.fault, Some(Fault::StackUnderflow { .. })));
        assert_eq!(vm.state(), &before);
        assert_eq!(vm.state().pc, 0);
        assert!(vm.history().is_empty());
    }

    #[test]
    fn test_memory_write_commits() {
        let mut vm = engine(vec![
            Instruction::Push { value: 42 },
            Instruction::Write { addr: Some(0x10) },
            Instruction::Read { addr: Some(0x10) },
        ]);
        let report = vm.run();
        assert!(report.completed());
        assert_eq!(vm.memory().read(0x10), Some(42));
        assert_eq!(report.state.stack, vec![42]);
        assert_eq!(vm.snapshot().cell(0x10), 42);
    }

    #[test]
    fn test_execute_remaining_limit() {
        let mut vm = engine(vec![Instruction::Jmp { target: 0 }]);
        let report = vm.execute_remaining(50);
        assert_eq!(report.fault, Some(Fault::StepLimitExceeded { limit: 50 }));
        assert_eq!(report.steps, 50);
        assert_eq!(report.history.len(), 50);
    }

    #[test]
    fn test_execute_remaining_when_halted() {
        let mut vm = engine(vec![Instruction::Halt]);
        assert!(vm.run().completed());
        let report = vm.run();
        assert_eq!(report.fault, Some(Fault::AlreadyHalted));
        assert_eq!(report.steps, 0);
    }

    #[test]
    fn test_cancellation() {
        let mut vm = engine(vec![Instruction::Jmp { target: 0 }]);
        vm.cancel_token().cancel();
        let report = vm.execute_remaining(1000);
        assert_eq!(report.fault, Some(Fault::Cancelled));
        assert_eq!(report.steps, 0);

        vm.reset();
        assert!(!vm.cancel_token().is_cancelled());
    }

    #[test]
    fn test_reset() {
        let mut vm = engine(vec![
            Instruction::Push { value: 9 },
            Instruction::Write { addr: Some(1) },
            Instruction::Incc,
            Instruction::Halt,
        ]);
        vm.run();
        vm.reset();

        assert_eq!(vm.state(), &ProcessorState::new());
        assert!(vm.memory().non_zero().is_empty());
        assert!(vm.history().is_empty());
        assert_eq!(vm.status(), EngineStatus::Ready);
        assert_eq!(vm.program().len(), 4);
    }

    #[test]
    fn test_seed_memory() {
        let mut vm = engine(vec![Instruction::Read { addr: Some(0x100) }]);
        vm.seed_memory(0x100, &[7, 8]).unwrap();
        assert_eq!(vm.memory().read(0x101), Some(8));

        assert!(matches!(
            vm.seed_memory(4095, &[1, 2]),
            Err(RuntimeError::SeedOutOfBounds { address: 4096, .. })
        ));
    }

    #[test]
    fn test_grow_policy_engine() {
        let config = EngineConfig {
            machine: MachineConfig::DEFAULT.with_memory_policy(MemoryPolicy::Grow),
            ..EngineConfig::default()
        };
        let program = Program::new(vec![
            Instruction::Push { value: 3 },
            Instruction::Write { addr: Some(5000) },
        ]);
        let mut vm = Engine::with_program(program, config).unwrap();
        assert!(vm.run().completed());
        assert_eq!(vm.memory().len(), 5001);

        vm.reset();
        assert_eq!(vm.memory().len(), 4096);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = EngineConfig::default();
        config.machine.max_stack_depth = 0;
        assert!(matches!(Engine::new(config), Err(RuntimeError::Config(_))));
    }

    #[test]
    fn test_load_encoded() {
        let table = InstructionTable::builtin();
        let words: Vec<EncodedInstruction> = ["01000002", "01000003", "12000000", "FF000000"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();

        let mut vm = Engine::new(EngineConfig::default()).unwrap();
        vm.load_encoded(&words, &table).unwrap();
        let report = vm.run();
        assert_eq!(report.state.stack, vec![6]);
    }
}
