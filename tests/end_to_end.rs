//! End-to-end tests for the stack VM toolchain
//!
//! Source text goes through the assembler, into the engine, and out as
//! snapshots and history.

use proptest::prelude::*;
use stackvm_assembler::{assemble, DiagnosticKind};
use stackvm_cli::Session;
use stackvm_runtime::{Engine, EngineConfig, EngineStatus, Fault};
use stackvm_spec::{InstructionTable, SpecError};

fn engine(source: &str) -> Engine {
    let assembly = assemble(source);
    assert!(assembly.is_clean(), "{:?}", assembly.diagnostics);
    Engine::with_program(assembly.program, EngineConfig::default()).unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_push_add_halt() {
    let mut vm = engine("PUSH 5\nPUSH 3\nADD\nHALT");
    for _ in 0..3 {
        assert!(vm.step().fault.is_none());
    }
    assert_eq!(vm.state().stack, vec![8]);
    assert!(!vm.state().flags.zero);
    assert!(!vm.state().halted);

    let result = vm.step();
    assert!(result.state.halted);
    assert_eq!(vm.status(), EngineStatus::Halted);
}

#[test]
fn test_jz_on_zero_branches() {
    let mut vm = engine("PUSH 0\nJZ skip\nPUSH 99\nskip: PUSH 1\nHALT");
    let report = vm.run();
    assert!(report.completed());
    assert_eq!(report.state.stack, vec![1]);

    let mut vm = engine("PUSH 0\nDEC\nHALT");
    assert_eq!(vm.run().state.stack, vec![-1]);
}

#[test]
fn test_pop_on_empty_stack() {
    let mut vm = engine("POP\nHALT");
    let before = vm.snapshot();
    let result = vm.step();
    assert!(matches!(result.fault, Some(Fault::StackUnderflow { pc: 0, .. })));
    assert_eq!(result.state.pc, 0);
    assert_eq!(vm.snapshot(), before);
}

#[test]
fn test_unknown_mnemonic_skipped() {
    let assembly = assemble("FOO 1\nPUSH 2\nHALT");
    assert_eq!(assembly.diagnostics.len(), 1);
    assert_eq!(assembly.diagnostics[0].line, 1);
    assert!(matches!(
        assembly.diagnostics[0].kind,
        DiagnosticKind::UnknownInstruction { .. }
    ));
    assert_eq!(assembly.program.len(), 2);
    assert_eq!(assembly.hex_lines(), vec!["01000002", "FF000000"]);
}

#[test]
fn test_duplicate_table_entry() {
    let mut table = InstructionTable::builtin();
    let before = table.lookup("PUSH").unwrap();
    assert!(matches!(
        table.add("PUSH", 1),
        Err(SpecError::DuplicateMnemonic(_))
    ));
    assert_eq!(table.lookup("PUSH").unwrap(), before);
    assert_eq!(table, InstructionTable::builtin());
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn test_counted_loop_with_counter() {
    let source = r#"
        PUSH 3
        LDC             ; counter = 2
        POP
    again:
        PUSH 7
        STC
        JNZ body
        JMP out
    body:
        DECC
        JMP again
    out:
        HALT
    "#;
    let report = engine(source).run();
    assert!(report.completed(), "{:?}", report.fault);
    assert_eq!(report.state.stack, vec![7, 7, 7]);
    assert_eq!(report.state.counter, 0);
}

#[test]
fn test_infinite_loop_stops_at_limit() {
    let mut vm = engine("again: PUSH 1\nPOP\nJMP again");
    let report = vm.run();
    assert_eq!(report.fault, Some(Fault::StepLimitExceeded { limit: 1000 }));
    assert_eq!(report.history.len(), 1000);
    assert_eq!(vm.status(), EngineStatus::Running);
}

#[test]
fn test_reset_idempotent_after_faults() {
    let mut vm = engine("PUSH 1\nPUSH 0\nDIV\nHALT");
    let first = vm.run();
    assert_eq!(first.fault, Some(Fault::DivisionByZero { pc: 2 }));

    vm.reset();
    let once = vm.snapshot();
    vm.reset();
    assert_eq!(vm.snapshot(), once);

    let second = vm.run();
    assert_eq!(second, first);
}

#[test]
fn test_memory_round_trip_program() {
    let source = r#"
        PUSH 11
        WRITE [0x40]
        PUSH 22
        PUSH 0x41
        WRITE
        READ 0x40
        READ [0x41]
        ADD
        HALT
    "#;
    let mut vm = engine(source);
    let report = vm.run();
    assert_eq!(report.state.stack, vec![33]);
    let snapshot = vm.snapshot();
    assert_eq!(snapshot.cell(0x40), 11);
    assert_eq!(snapshot.cell(0x41), 22);
    assert_eq!(snapshot.memory.len(), 2);
}

#[test]
fn test_rotations_and_compare() {
    let mut vm = engine("PUSH 1\nPUSH 2\nPUSH 3\nROR\nHALT");
    assert_eq!(vm.run().state.stack, vec![2, 3, 1]);

    let mut vm = engine("PUSH 1\nPUSH 2\nPUSH 3\nROL\nHALT");
    assert_eq!(vm.run().state.stack, vec![3, 1, 2]);

    let mut vm = engine("PUSH 4\nPUSH 9\nCMP\nPUSH -3\nCMP\nHALT");
    assert_eq!(vm.run().state.stack, vec![9]);
}

// ============================================================================
// Tasks
// ============================================================================

#[test]
fn test_catalogue_results() {
    let session = Session::new(EngineConfig::default()).unwrap();
    let expected = [(1, 280), (2, 50), (3, 89)];
    for (id, value) in expected {
        session.load_task(id).unwrap();
        let report = session.run();
        assert!(report.completed(), "task {}: {:?}", id, report.fault);
        let check = session.verify_task(id).unwrap();
        assert_eq!(check.actual, Some(value));
        assert!(check.passed);
    }
    assert_eq!(session.state().cell(0x120), 50);
}

proptest! {
    #[test]
    fn prop_hex_and_decimal_push_agree(value in 0i64..0x7F_FFFF) {
        let hex = assemble(&format!("PUSH 0x{:X}\nHALT", value));
        let dec = assemble(&format!("PUSH {}\nHALT", value));
        prop_assert_eq!(&hex.encoded, &dec.encoded);

        let mut vm = Engine::with_program(hex.program, EngineConfig::default()).unwrap();
        prop_assert_eq!(vm.run().state.stack, vec![value]);
    }

    #[test]
    fn prop_runs_are_bounded(limit in 1u64..500, body in prop::sample::select(vec!["DUP\nPOP", "INC", "PUSH 1\nADD"])) {
        let source = format!("PUSH 0\ntop:\n{}\nJMP top", body);
        let mut vm = engine(&source);
        let report = vm.execute_remaining(limit);
        prop_assert!(report.steps <= limit);
        prop_assert_eq!(report.fault, Some(Fault::StepLimitExceeded { limit }));
    }
}
