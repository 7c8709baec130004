//! # Stack VM Runtime
//!
//! Execute stack VM programs one instruction at a time, with observable
//! state after every step.
//!
//! ## Features
//!
//! - **Pure step function**: [`execute`] maps a state to the next state
//! - **Fault isolation**: a faulting step changes nothing
//! - **Step history**: one [`HistoryEntry`] per executed instruction
//! - **Bounded runs**: step limit plus cooperative cancellation
//!
//! ## Example
//!
//! ```rust
//! use stackvm_runtime::{Engine, EngineConfig};
//! use stackvm_spec::{Instruction, Program};
//!
//! let program = Program::new(vec![
//!     Instruction::Push { value: 5 },
//!     Instruction::Push { value: 3 },
//!     Instruction::Add,
//!     Instruction::Halt,
//! ]);
//! let mut engine = Engine::with_program(program, EngineConfig::default()).unwrap();
//! let report = engine.run();
//! assert!(report.completed());
//! assert_eq!(report.state.stack, vec![8]);
//! ```

pub mod error;
pub mod execute;
pub mod history;
pub mod memory;
pub mod state;
pub mod vm;

pub use error::{Fault, Result, RuntimeError};
pub use execute::{execute, MemoryWrite, Transition};
pub use history::{HistoryEntry, StepRecorder};
pub use memory::Memory;
pub use state::{EngineStatus, Flags, ProcessorSnapshot, ProcessorState};
pub use vm::{CancelToken, Engine, EngineConfig, RunReport, StepResult};

/// Simple execution helper
///
/// Runs a program with the default configuration and returns the report.
pub fn run(program: stackvm_spec::Program) -> Result<RunReport> {
    let mut engine = Engine::with_program(program, EngineConfig::default())?;
    Ok(engine.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackvm_spec::{Instruction, Program};

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.step_limit, 1000);
        assert!(!config.trace);
        assert_eq!(config.machine.memory_size, 4096);
        assert_eq!(config.machine.max_stack_depth, 256);
    }

    #[test]
    fn test_run_helper() {
        let program = Program::new(vec![
            Instruction::Push { value: 0 },
            Instruction::Dec,
            Instruction::Halt,
        ]);
        let report = run(program).unwrap();
        assert_eq!(report.state.stack, vec![-1]);
        assert!(report.state.halted);
    }

    #[test]
    fn test_engine_config_serializes() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
