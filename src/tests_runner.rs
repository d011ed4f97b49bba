//! Optional test-suite pre-step.
//!
//! Runs pytest with coverage so a fresh `coverage.xml` exists before the
//! coverage gate reads it. Reported as a fifth "Tests" result appended
//! after the four canonical gates.

use std::path::Path;
use std::time::Duration;

use crate::models::GateResult;
use crate::runner::run_tool;

const GATE_NAME: &str = "Tests";

/// Run `pytest --cov` in `repo_root` and fold the outcome into a
/// GateResult. Tool misbehavior (pytest missing, timeout) fails the
/// result, never the run.
pub fn run_pytest_with_coverage(repo_root: &Path, timeout: Duration) -> GateResult {
    let cmd: Vec<String> = [
        "python3",
        "-m",
        "pytest",
        "-q",
        "--cov=src",
        "--cov-report=xml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    run_test_command(repo_root, &cmd, timeout)
}

/// Testable core: run an arbitrary test command and classify its exit.
pub fn run_test_command(repo_root: &Path, cmd: &[String], timeout: Duration) -> GateResult {
    match run_tool(cmd, Some(repo_root), timeout) {
        Ok(out) if out.exit_code == 0 => GateResult::new(GATE_NAME, true, "All tests passed"),
        Ok(out) => GateResult::new(
            GATE_NAME,
            false,
            format!("pytest exited with code {}", out.exit_code),
        ),
        Err(err) => GateResult::new(GATE_NAME, false, err.to_string()),
    }
}
