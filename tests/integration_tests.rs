// Cross-module behavioral tests: full programs driven through `Machine`
// end to end, plus a CLI-level smoke test via `assert_cmd`.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

use tomasulo_rust::config::Config;
use tomasulo_rust::instruction::{Instruction, Op, Operand};
use tomasulo_rust::machine::Machine;

fn ld(index: usize, dest: &str, imm: i64, config: &Config) -> Instruction {
    Instruction::new(index, Op::Ld, dest.into(), Operand::Immediate(imm), Operand::Immediate(0), config)
}

fn reg(index: usize, op: Op, dest: &str, op1: &str, op2: &str, config: &Config) -> Instruction {
    Instruction::new(
        index,
        op,
        dest.into(),
        Operand::Register(op1.into()),
        Operand::Register(op2.into()),
        config,
    )
}

#[test]
fn two_independent_loads_complete_without_contention() {
    let config = Config::default();
    let program = vec![ld(0, "F0", 1, &config), ld(1, "F2", 2, &config)];
    let mut machine = Machine::new(config);
    let outcome = machine.run(program, None, |_, _| {}).unwrap();
    assert!(!outcome.table.is_incomplete());
    assert!(!outcome.interrupted);
}

#[test]
fn divd_followed_by_multd_each_occupy_the_mult_unit_in_turn() {
    let config = Config::default();
    let program = vec![
        reg(0, Op::Divd, "F0", "F2", "F4", &config),
        reg(1, Op::Multd, "F6", "F8", "F10", &config),
    ];
    let mut machine = Machine::new(config);
    let outcome = machine.run(program, None, |_, _| {}).unwrap();
    let rows = outcome.table.rows();
    // Both issue immediately (two mult stations), but the unit serializes them.
    assert_eq!(rows[0].issue, Some(1));
    assert_eq!(rows[1].issue, Some(2));
    assert!(rows[1].exec_start.unwrap() >= rows[0].exec_complete.unwrap());
}

#[test]
fn store_waits_for_its_source_register_like_any_consumer() {
    let config = Config::default();
    let program = vec![
        ld(0, "F0", 7, &config),
        reg(1, Op::Sd, "F0", "F0", "F2", &config),
    ];
    let mut machine = Machine::new(config);
    let outcome = machine.run(program, None, |_, _| {}).unwrap();
    let rows = outcome.table.rows();
    assert!(rows[1].exec_start.unwrap() >= rows[0].write_result.unwrap());
}

#[test]
fn full_program_with_every_opcode_terminates() {
    let config = Config::default();
    let program = vec![
        ld(0, "F0", 10, &config),
        ld(1, "F2", 20, &config),
        reg(2, Op::Addd, "F4", "F0", "F2", &config),
        reg(3, Op::Subd, "F6", "F4", "F0", &config),
        reg(4, Op::Multd, "F8", "F4", "F6", &config),
        reg(5, Op::Divd, "F10", "F8", "F2", &config),
        reg(6, Op::Sd, "F10", "F10", "F0", &config),
    ];
    let mut machine = Machine::new(config);
    let outcome = machine.run(program, None, |_, _| {}).unwrap();
    assert!(!outcome.table.is_incomplete());
    assert!(outcome.cycles > 0);
}

#[test]
fn cli_runs_a_program_from_a_file_and_prints_final_registers() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "LD F0 34 0").unwrap();
    writeln!(file, "LD F2 45 0").unwrap();
    writeln!(file, "ADDD F4 F0 F2").unwrap();

    Command::cargo_bin("tomasulo_rust")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished at Clock Cycle:"))
        .stdout(predicate::str::contains("Register F4:"));
}

#[test]
fn cli_reports_a_nonzero_exit_code_on_unknown_opcode() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "FOO F0 1+ 0+").unwrap();

    Command::cargo_bin("tomasulo_rust")
        .unwrap()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown opcode"));
}

#[test]
fn cli_reports_a_nonzero_exit_code_on_missing_file() {
    Command::cargo_bin("tomasulo_rust")
        .unwrap()
        .arg("/nonexistent/path/to/nowhere.txt")
        .assert()
        .failure();
}
