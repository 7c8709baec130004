//! # Session Facade
//!
//! One [`Session`] per front-end client. The engine is not reentrant, so the
//! session keeps it behind a mutex and every call takes the lock for its
//! whole duration.

use crate::tasks::{self, Task, TaskCheck};
use stackvm_assembler::{Assembler, Assembly, Diagnostic};
use stackvm_runtime::{
    CancelToken, Engine, EngineConfig, HistoryEntry, ProcessorSnapshot, Result, RunReport,
    RuntimeError, StepResult,
};
use stackvm_spec::{InstructionTable, Program};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Short description of a catalogue entry
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaskInfo {
    pub id: u32,
    pub name: String,
    pub description: String,
}

impl From<&Task> for TaskInfo {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    engine: Engine,
    active_task: Option<Task>,
}

impl Inner {
    fn seed_active_task(&mut self) -> Result<()> {
        if let Some(task) = &self.active_task {
            for seed in &task.seeds {
                self.engine.seed_memory(seed.address, &seed.values)?;
            }
        }
        Ok(())
    }
}

/// Mutex-guarded engine plus the table used to assemble for it
#[derive(Debug)]
pub struct Session {
    inner: Mutex<Inner>,
    table: InstructionTable,
    cancel: CancelToken,
}

impl Session {
    /// Session with the built-in instruction table
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_table(config, InstructionTable::builtin())
    }

    pub fn with_table(config: EngineConfig, table: InstructionTable) -> Result<Self> {
        let engine = Engine::new(config)?;
        let cancel = engine.cancel_token();
        Ok(Self {
            inner: Mutex::new(Inner {
                engine,
                active_task: None,
            }),
            table,
            cancel,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Engine calls commit whole steps, so a poisoned lock still holds a usable engine
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn table(&self) -> &InstructionTable {
        &self.table
    }

    // ========== Loading ==========

    /// Assemble without touching the engine
    pub fn assemble(&self, source: &str) -> Assembly {
        Assembler::new(&self.table).assemble(source)
    }

    pub fn load_program(&self, program: Program) {
        let mut inner = self.lock();
        inner.active_task = None;
        inner.engine.load_program(program);
    }

    /// Assemble and install; lines with diagnostics are left out
    pub fn load_source(&self, source: &str) -> Vec<Diagnostic> {
        let assembly = self.assemble(source);
        self.load_program(assembly.program);
        assembly.diagnostics
    }

    /// Install a catalogue task with its seed memory
    pub fn load_task(&self, id: u32) -> Result<ProcessorSnapshot> {
        let task = tasks::find(id).ok_or(RuntimeError::UnknownTask(id))?;
        let assembly = self.assemble(&task.source);
        if !assembly.is_clean() {
            return Err(RuntimeError::Other(format!(
                "task {} does not assemble with the current table: {}",
                id, assembly.diagnostics[0]
            )));
        }

        tracing::info!("loading task {} ({})", task.id, task.name);
        let mut inner = self.lock();
        inner.engine.load_program(assembly.program);
        inner.active_task = Some(task);
        inner.seed_active_task()?;
        Ok(inner.engine.snapshot())
    }

    pub fn tasks(&self) -> Vec<TaskInfo> {
        tasks::catalogue().iter().map(TaskInfo::from).collect()
    }

    /// Check the machine against the expected result of task `id`
    pub fn verify_task(&self, id: u32) -> Result<TaskCheck> {
        let task = tasks::find(id).ok_or(RuntimeError::UnknownTask(id))?;
        let check = task.verify(&self.state());
        if !check.passed {
            tracing::warn!(
                "task {} failed: expected {}, got {:?}",
                id,
                check.expected,
                check.actual
            );
        }
        Ok(check)
    }

    /// Id of the task currently installed, if any
    pub fn active_task(&self) -> Option<u32> {
        self.lock().active_task.as_ref().map(|task| task.id)
    }

    // ========== Execution ==========

    pub fn step(&self) -> StepResult {
        self.lock().engine.step()
    }

    pub fn execute_remaining(&self, step_limit: u64) -> RunReport {
        self.lock().engine.execute_remaining(step_limit)
    }

    /// Run with the configured step limit
    pub fn run(&self) -> RunReport {
        self.lock().engine.run()
    }

    /// Back to `Ready`; an active task gets its seed memory back
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.engine.reset();
        inner.seed_active_task()
    }

    /// Token that cancels the current run without taking the lock
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    // ========== Observation ==========

    pub fn state(&self) -> ProcessorSnapshot {
        self.lock().engine.snapshot()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().engine.history().to_vec()
    }
}
