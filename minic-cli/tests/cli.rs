use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn host_compiler() -> Option<PathBuf> {
    ["gcc", "cc", "clang"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

fn minic_bin() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_minic-cli"));
    command.env_remove("RUST_LOG");
    command
}

fn minic(dir: &Path, program: &str) -> Command {
    let input_path = dir.join("input.txt");
    fs::write(&input_path, program).expect("write input");

    let mut command = minic_bin();
    command
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(dir.join("output.c"))
        .arg("--exe")
        .arg(dir.join("program"))
        .arg("--results")
        .arg(dir.join("result.txt"));
    command
}

#[test]
fn compiles_and_runs_program() {
    let Some(cc) = host_compiler() else {
        return;
    };
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "int x = 2 * 8; print(x);")
        .arg("--cc")
        .arg(&cc)
        .assert()
        .success()
        .stdout(predicate::str::contains("--- VISUAL PARSE TREE ---"))
        .stdout(predicate::str::contains("--- EXECUTION RESULTS ---\n16\n"))
        .stdout(predicate::str::contains("(Output saved to"));

    let results = fs::read_to_string(dir.path().join("result.txt")).expect("read results");
    assert_eq!(results, "16\n");
}

#[test]
fn writes_c_source_without_running() {
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "int x = 2 * 8; print(x);")
        .arg("--no-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("|-- DECL (x)"))
        .stdout(predicate::str::contains("EXECUTION RESULTS").not());

    let c_source = fs::read_to_string(dir.path().join("output.c")).expect("read C");
    assert!(c_source.contains("int main() {"));
    assert!(c_source.contains("int x = (2 * 8);"));
    assert!(!dir.path().join("program").exists());
}

#[test]
fn no_tree_suppresses_dump() {
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "print(\"hi\");")
        .arg("--no-run")
        .arg("--no-tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("VISUAL PARSE TREE").not());
}

#[test]
fn reports_undeclared_variable() {
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "print(y);")
        .assert()
        .failure()
        .stdout(predicate::str::contains("VISUAL PARSE TREE").not())
        .stderr(predicate::str::contains("variable 'y' used but not declared"));

    assert!(!dir.path().join("output.c").exists());
}

#[test]
fn reports_duplicate_declaration() {
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "int x; int x;")
        .assert()
        .failure()
        .stderr(predicate::str::contains("variable 'x' is already declared"));

    assert!(!dir.path().join("output.c").exists());
}

#[test]
fn reports_syntax_error_with_position() {
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "int x = ;")
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error at 1:9"));
}

#[test]
fn reports_deep_nesting_without_crashing() {
    let dir = tempdir().expect("tempdir");
    let program = format!("print({}1{});", "(".repeat(100_000), ")".repeat(100_000));

    minic(dir.path(), &program)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nesting too deep"));

    assert!(!dir.path().join("output.c").exists());
}

#[test]
fn rejects_c_keyword_as_variable() {
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "int while = 1;")
        .assert()
        .failure()
        .stderr(predicate::str::contains("lex error at 1:5"))
        .stderr(predicate::str::contains("'while' is reserved"));

    assert!(!dir.path().join("output.c").exists());
}

#[test]
fn reports_missing_input_once() {
    let dir = tempdir().expect("tempdir");

    minic_bin()
        .arg("--input")
        .arg(dir.path().join("missing.txt"))
        .arg("--output")
        .arg(dir.path().join("output.c"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.txt"))
        .stderr(predicate::str::contains("Caused by").not());
}

#[cfg(unix)]
#[test]
fn compiler_failure_is_reported_but_not_fatal() {
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "print(1);")
        .arg("--cc")
        .arg("false")
        .assert()
        .success()
        .stderr(predicate::str::contains("compilation failed with exit code 1"));

    assert!(!dir.path().join("result.txt").exists());
}

#[test]
fn missing_compiler_is_reported_but_not_fatal() {
    let dir = tempdir().expect("tempdir");

    minic(dir.path(), "print(1);")
        .arg("--cc")
        .arg("minic-no-such-cc")
        .assert()
        .success()
        .stderr(predicate::str::contains("'minic-no-such-cc' was not found"));
}
