//! Integration tests for the stack VM runtime

use proptest::prelude::*;
use stackvm_assembler::assemble;
use stackvm_runtime::{Engine, EngineConfig, EngineStatus, Fault};
use stackvm_spec::Program;

fn load(source: &str) -> Engine {
    let assembly = assemble(source);
    assert!(assembly.is_clean(), "{:?}", assembly.diagnostics);
    Engine::with_program(assembly.program, EngineConfig::default()).unwrap()
}

#[test]
fn test_simple_halt() {
    let mut vm = load("HALT");
    let report = vm.run();
    assert!(report.completed());
    assert_eq!(report.steps, 1);
    assert!(report.state.halted);
}

#[test]
fn test_add_program() {
    let mut vm = load("PUSH 5\nPUSH 3\nADD\nHALT");

    for expected in [vec![5], vec![5, 3], vec![8]] {
        let result = vm.step();
        assert_eq!(result.entry.unwrap().stack, expected);
    }
    assert!(!vm.state().flags.zero);
    assert!(!vm.state().halted);

    let result = vm.step();
    assert!(result.state.halted);
}

#[test]
fn test_history_entries() {
    let mut vm = load("PUSH 2\nPUSH 2\nSUB\nHALT");
    let report = vm.run();

    let commands: Vec<&str> = report.history.iter().map(|e| e.command.as_str()).collect();
    assert_eq!(commands, vec!["PUSH 2", "PUSH 2", "SUB", "HALT"]);

    let steps: Vec<u64> = report.history.iter().map(|e| e.step).collect();
    assert_eq!(steps, vec![1, 2, 3, 4]);

    let sub = &report.history[2];
    assert_eq!(sub.stack, vec![0]);
    assert_eq!(sub.pc_after, 3);
    assert!(sub.flags.zero);
}

#[test]
fn test_program_without_halt_completes() {
    let mut vm = load("PUSH 1\nPUSH 2");
    let report = vm.run();
    assert!(report.completed());
    assert!(report.state.halted);
    assert!(vm.snapshot().halted);
    assert_eq!(report.state.pc, 2);
    assert_eq!(vm.status(), EngineStatus::Halted);
    assert_eq!(vm.step().fault, Some(Fault::ProgramComplete));
}

#[test]
fn test_counted_loop() {
    let source = r#"
        PUSH 5
        LDC             ; counter = 4
        POP
        PUSH 0
    loop:
        STC
        ADD             ; acc += counter
        STC
        JZ done
        DECC
        JMP loop
    done:
        HALT
    "#;
    let mut vm = load(source);
    let report = vm.run();
    assert!(report.completed(), "{:?}", report.fault);
    // 4 + 3 + 2 + 1 + 0
    assert_eq!(report.state.stack, vec![10]);
    assert_eq!(report.state.counter, 0);
    assert!(report.steps < 1000);
}

#[test]
fn test_infinite_loop_hits_limit() {
    let mut vm = load("top: JMP top");
    let report = vm.execute_remaining(1000);
    assert_eq!(report.fault, Some(Fault::StepLimitExceeded { limit: 1000 }));
    assert_eq!(report.steps, 1000);
}

#[test]
fn test_resume_after_limit() {
    let mut vm = load("PUSH 3\ntop: DEC\nDUP\nJNZ top\nHALT");
    let first = vm.execute_remaining(4);
    assert!(matches!(first.fault, Some(Fault::StepLimitExceeded { .. })));

    let rest = vm.execute_remaining(1000);
    assert!(rest.completed());
    assert_eq!(rest.state.stack, vec![0]);
    assert_eq!(rest.history.len() as u64, first.steps + rest.steps);
}

#[test]
fn test_fault_mid_run() {
    let mut vm = load("PUSH 1\nPUSH 0\nDIV\nHALT");
    let report = vm.run();
    assert_eq!(report.fault, Some(Fault::DivisionByZero { pc: 2 }));
    assert_eq!(report.state.stack, vec![1, 0]);
    assert_eq!(report.state.pc, 2);
    assert_eq!(report.history.len(), 2);
}

#[test]
fn test_reset_idempotent() {
    let mut vm = load("PUSH 4\nWRITE [0x10]\nINCC\nHALT");
    vm.run();
    vm.reset();
    let once = vm.snapshot();
    vm.reset();
    let twice = vm.snapshot();
    assert_eq!(once, twice);
    assert_eq!(once.status, EngineStatus::Ready);
    assert!(once.memory.is_empty());
    assert!(vm.history().is_empty());

    // Same program runs identically after reset
    let report = vm.run();
    assert_eq!(report.state.counter, 1);
    assert_eq!(vm.snapshot().cell(0x10), 4);
}

#[test]
fn test_reload_clears_history() {
    let mut vm = load("PUSH 1\nHALT");
    vm.run();
    vm.load_program(assemble("PUSH 2").program);
    assert!(vm.history().is_empty());
    assert_eq!(vm.status(), EngineStatus::Ready);
}

#[test]
fn test_empty_program() {
    let mut vm = Engine::with_program(Program::default(), EngineConfig::default()).unwrap();
    assert_eq!(vm.step().fault, Some(Fault::ProgramComplete));
    assert!(vm.run().completed());
}

#[test]
fn test_trace_flag_runs_same() {
    let config = EngineConfig {
        trace: true,
        ..EngineConfig::default()
    };
    let mut vm = Engine::with_program(assemble("PUSH 1\nHALT").program, config).unwrap();
    assert!(vm.run().completed());
}

proptest! {
    #[test]
    fn prop_bounded_termination(limit in 1u64..200, start in 0i64..5) {
        // Never halts
        let source = format!("PUSH {}\ntop: DUP\nJMP top", start);
        let mut vm = load(&source);
        let report = vm.execute_remaining(limit);
        prop_assert!(report.steps <= limit);
        prop_assert!(report.fault.is_some());
    }

    #[test]
    fn prop_failed_step_changes_nothing(values in proptest::collection::vec(-100i64..100, 0..2)) {
        let pushes: String = values.iter().map(|v| format!("PUSH {}\n", v)).collect();
        let mut vm = load(&format!("{}ROR\nHALT", pushes));
        vm.execute_remaining(values.len() as u64);
        let before = vm.snapshot();
        let result = vm.step();
        let is_underflow = matches!(result.fault, Some(Fault::StackUnderflow { .. }));
        prop_assert!(is_underflow);
        prop_assert_eq!(vm.snapshot(), before);
    }
}
