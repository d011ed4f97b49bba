//! Gate evaluation: run one checker, normalize its output, decide
//! pass/fail.
//!
//! The three subprocess gates share one state machine:
//! RUN TOOL → (absent | timeout | tool error | parse findings) →
//! GateResult + findings. Tool misbehavior is recovered here into failing
//! results with distinct one-line messages; nothing above this boundary
//! sees an error for expected misbehavior. The only exceptions are the
//! empty-command programming error and, under strict subprocess mode,
//! execution errors promoted to hard failures.

use std::path::Path;
use std::time::Duration;

use crate::coverage::{default_report_path, CoverageCache};
use crate::models::{Finding, GateKind, GateResult};
use crate::parsers::parser_for;
use crate::rules::RuleIdPolicy;
use crate::runner::{run_tool, ToolError};

/// What one subprocess gate runs. Tests substitute `cmd` to simulate
/// tool behavior without the real checkers installed.
#[derive(Debug, Clone)]
pub struct GateSpec {
    pub kind: GateKind,
    pub cmd: Vec<String>,
}

impl GateSpec {
    /// flake8 over the changed files, or the conventional trees when the
    /// scope is empty.
    pub fn lint(files: &[String]) -> Self {
        let mut cmd = vec!["flake8".to_string()];
        if files.is_empty() {
            cmd.extend(["src".to_string(), "tests".to_string()]);
        } else {
            cmd.extend(files.iter().cloned());
        }
        Self {
            kind: GateKind::Lint,
            cmd,
        }
    }

    /// mypy with machine-readable diagnostics. Scoped to `src/` files
    /// when a changed-file list is available.
    pub fn typecheck(files: &[String]) -> Self {
        let mut cmd = vec![
            "mypy".to_string(),
            "--show-error-codes".to_string(),
            "--no-color-output".to_string(),
            "--no-error-summary".to_string(),
        ];
        let scoped: Vec<_> = files
            .iter()
            .filter(|p| p.starts_with("src/"))
            .cloned()
            .collect();
        if scoped.is_empty() {
            cmd.push("src".to_string());
        } else {
            cmd.extend(scoped);
        }
        Self {
            kind: GateKind::Typecheck,
            cmd,
        }
    }

    /// bandit in JSON mode over the source tree. B101 (assert used) is
    /// noise in projects with tests and is skipped, as is the tests tree.
    pub fn security() -> Self {
        let cmd = ["bandit", "-r", "src", "-x", "tests", "-s", "B101", "-f", "json", "-q"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self {
            kind: GateKind::Security,
            cmd,
        }
    }
}

/// Per-gate evaluation settings, resolved by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub repo_root: &'a Path,
    pub timeout: Duration,
    pub policy: RuleIdPolicy,
    pub strict_subprocess: bool,
    /// When false a would-be failure is reported as passing
    /// (non-blocking), so the exit-code rule stays "0 iff all passed".
    pub fail_on: bool,
}

/// Run one subprocess gate. The first finding in the returned list is the
/// representative one for single-finding consumers.
pub fn evaluate_tool_gate(
    ctx: &GateContext<'_>,
    spec: &GateSpec,
) -> Result<(GateResult, Vec<Finding>), ToolError> {
    let name = spec.kind.display_name();
    let tool = spec.kind.tool();

    match run_tool(&spec.cmd, Some(ctx.repo_root), ctx.timeout) {
        Ok(out) => {
            let parser =
                parser_for(spec.kind, ctx.policy).expect("subprocess gate has a parser");
            let findings = parser.parse(&out.output);
            let (passed, details) = classify(out.exit_code, &out.output, findings.len());
            Ok((gate_result(ctx, name, passed, details), findings))
        }
        Err(ToolError::ToolAbsent { .. }) => Ok((
            gate_result(ctx, name, false, format!("{} not found", tool)),
            Vec::new(),
        )),
        Err(ToolError::Timeout { secs, .. }) => Ok((
            gate_result(ctx, name, false, format!("{} timed out after {}s", tool, secs)),
            Vec::new(),
        )),
        Err(err @ ToolError::EmptyCommand) => Err(err),
        Err(err) => {
            // EmptyOutput / Io: the tool itself could not run.
            if ctx.strict_subprocess {
                Err(err)
            } else {
                Ok((gate_result(ctx, name, false, err.to_string()), Vec::new()))
            }
        }
    }
}

fn classify(exit_code: i32, output: &str, finding_count: usize) -> (bool, String) {
    if finding_count > 0 {
        return (false, format!("{} issue(s)", finding_count));
    }
    if exit_code == 0 {
        return (true, "No issues".to_string());
    }
    // Non-zero exit, nothing parseable: surface the tool's own words.
    let diagnostic = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("exit code {}", exit_code));
    (false, diagnostic)
}

fn gate_result(ctx: &GateContext<'_>, name: &str, passed: bool, details: String) -> GateResult {
    if !passed && !ctx.fail_on {
        return GateResult::new(name, true, format!("{} (non-blocking)", details));
    }
    GateResult::new(name, passed, details)
}

/// Evaluate the coverage gate. No subprocess: reads the report produced
/// by an earlier test run (or handed in via `explicit`).
pub fn evaluate_coverage_gate(
    repo_root: &Path,
    minimum: Option<u32>,
    cache: &CoverageCache,
    explicit: Option<&Path>,
) -> GateResult {
    let name = GateKind::Coverage.display_name();
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| default_report_path(repo_root));
    let pct = path.as_deref().and_then(|p| cache.percent(p));

    match (minimum, pct) {
        (None, Some(p)) => GateResult::new(name, true, format!("{}% (no minimum set)", p)),
        (None, None) => GateResult::new(name, true, "No coverage data (no minimum set)"),
        (Some(_), None) => GateResult::new(name, false, "No coverage data"),
        // Same detail string for pass and fail; callers must read
        // `passed`.
        (Some(min), Some(p)) => GateResult::new(name, p >= min, format!("{}% >= {}%", p, min)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sh_spec(kind: GateKind, script: &str) -> GateSpec {
        GateSpec {
            kind,
            cmd: vec!["sh".into(), "-c".into(), script.into()],
        }
    }

    fn ctx(root: &Path) -> GateContext<'_> {
        GateContext {
            repo_root: root,
            timeout: Duration::from_secs(10),
            policy: RuleIdPolicy::default(),
            strict_subprocess: false,
            fail_on: true,
        }
    }

    #[test]
    fn test_clean_run_passes_with_no_issues() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(GateKind::Lint, "exit 0");
        let (result, findings) = evaluate_tool_gate(&ctx(dir.path()), &spec).unwrap();
        assert!(result.passed);
        assert_eq!(result.details, "No issues");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_findings_fail_the_gate() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(
            GateKind::Lint,
            "echo 'src/test.py:10:5: E501 line too long (80 > 79 characters)'; exit 1",
        );
        let (result, findings) = evaluate_tool_gate(&ctx(dir.path()), &spec).unwrap();
        assert!(!result.passed);
        assert_eq!(result.details, "1 issue(s)");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "E501");
    }

    #[test]
    fn test_first_finding_is_representative() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(
            GateKind::Typecheck,
            "printf 'a.py:1: error: first [one]\\na.py:2: error: second [two]\\n'; exit 1",
        );
        let (_, findings) = evaluate_tool_gate(&ctx(dir.path()), &spec).unwrap();
        assert_eq!(findings[0].rule_id, "one");
        assert_eq!(findings[1].rule_id, "two");
    }

    #[test]
    fn test_tool_not_found_details() {
        let dir = tempdir().unwrap();
        let spec = GateSpec {
            kind: GateKind::Lint,
            cmd: vec!["gatera-no-such-tool".into()],
        };
        let (result, findings) = evaluate_tool_gate(&ctx(dir.path()), &spec).unwrap();
        assert!(!result.passed);
        assert_eq!(result.details, "flake8 not found");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_timeout_details_are_distinct_from_not_found() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(GateKind::Typecheck, "sleep 5");
        let mut c = ctx(dir.path());
        c.timeout = Duration::from_millis(200);
        let (result, _) = evaluate_tool_gate(&c, &spec).unwrap();
        assert!(!result.passed);
        assert!(result.details.contains("timed out"));
        assert!(!result.details.contains("not found"));
    }

    #[test]
    fn test_unparseable_error_output_fails_with_raw_text() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(
            GateKind::Security,
            "echo 'bandit: error: unknown option' 1>&2; exit 2",
        );
        let (result, findings) = evaluate_tool_gate(&ctx(dir.path()), &spec).unwrap();
        assert!(!result.passed);
        assert_eq!(result.details, "bandit: error: unknown option");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_empty_output_failure_is_recovered_by_default() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(GateKind::Lint, "exit 3");
        let (result, _) = evaluate_tool_gate(&ctx(dir.path()), &spec).unwrap();
        assert!(!result.passed);
        assert!(result.details.contains("no output"));
    }

    #[test]
    fn test_strict_mode_promotes_execution_errors() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(GateKind::Lint, "exit 3");
        let mut c = ctx(dir.path());
        c.strict_subprocess = true;
        assert!(matches!(
            evaluate_tool_gate(&c, &spec),
            Err(ToolError::EmptyOutput { .. })
        ));
    }

    #[test]
    fn test_empty_command_always_propagates() {
        let dir = tempdir().unwrap();
        let spec = GateSpec {
            kind: GateKind::Lint,
            cmd: Vec::new(),
        };
        assert!(matches!(
            evaluate_tool_gate(&ctx(dir.path()), &spec),
            Err(ToolError::EmptyCommand)
        ));
    }

    #[test]
    fn test_non_blocking_gate_reports_passed() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(GateKind::Lint, "echo 'a.py:1:1: E501 too long'; exit 1");
        let mut c = ctx(dir.path());
        c.fail_on = false;
        let (result, findings) = evaluate_tool_gate(&c, &spec).unwrap();
        assert!(result.passed);
        assert!(result.details.ends_with("(non-blocking)"));
        // Findings are still reported for the record.
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_coverage_gate_pass_and_fail_share_detail_format() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("coverage.xml"),
            r#"<coverage line-rate="0.85"/>"#,
        )
        .unwrap();
        let cache = CoverageCache::new();
        let pass = evaluate_coverage_gate(dir.path(), Some(80), &cache, None);
        assert!(pass.passed);
        assert_eq!(pass.details, "85% >= 80%");

        let fail = evaluate_coverage_gate(dir.path(), Some(90), &cache, None);
        assert!(!fail.passed);
        assert_eq!(fail.details, "85% >= 90%");
    }

    #[test]
    fn test_coverage_gate_monotonic_around_threshold() {
        let dir = tempdir().unwrap();
        let report = dir.path().join("coverage.xml");
        for (rate, expect_pass) in [("0.79", false), ("0.80", true), ("0.81", true)] {
            fs::write(&report, format!(r#"<coverage line-rate="{}"/>"#, rate)).unwrap();
            // Fresh cache per write: mtime granularity must not mask the
            // rewritten report.
            let result = evaluate_coverage_gate(dir.path(), Some(80), &CoverageCache::new(), None);
            assert_eq!(result.passed, expect_pass, "rate {}", rate);
        }
    }

    #[test]
    fn test_coverage_gate_absent_data() {
        let dir = tempdir().unwrap();
        let cache = CoverageCache::new();
        let result = evaluate_coverage_gate(dir.path(), Some(80), &cache, None);
        assert!(!result.passed);
        assert_eq!(result.details, "No coverage data");
    }

    #[test]
    fn test_coverage_gate_without_minimum_always_passes() {
        let dir = tempdir().unwrap();
        let cache = CoverageCache::new();
        let absent = evaluate_coverage_gate(dir.path(), None, &cache, None);
        assert!(absent.passed);
        assert_eq!(absent.details, "No coverage data (no minimum set)");

        fs::write(
            dir.path().join("coverage.xml"),
            r#"<coverage line-rate="0.10"/>"#,
        )
        .unwrap();
        let present = evaluate_coverage_gate(dir.path(), None, &CoverageCache::new(), None);
        assert!(present.passed);
        assert_eq!(present.details, "10% (no minimum set)");
    }

    #[test]
    fn test_coverage_gate_explicit_path() {
        let dir = tempdir().unwrap();
        let report = dir.path().join("custom").join("cov.xml");
        fs::create_dir_all(report.parent().unwrap()).unwrap();
        fs::write(&report, r#"<coverage line-rate="0.95"/>"#).unwrap();
        let cache = CoverageCache::new();
        let result = evaluate_coverage_gate(dir.path(), Some(90), &cache, Some(&report));
        assert!(result.passed);
        assert_eq!(result.details, "95% >= 90%");
    }

    #[test]
    fn test_security_gate_parses_json_payload() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(
            GateKind::Security,
            r#"echo '{"results":[{"filename":"t.py","line_number":10,"issue_text":"x","test_id":"B101"}]}'; exit 1"#,
        );
        let (result, findings) = evaluate_tool_gate(&ctx(dir.path()), &spec).unwrap();
        assert!(!result.passed);
        assert_eq!(findings[0].rule_id, "B101");
    }

    #[test]
    fn test_default_specs_scope_files() {
        let files = vec!["src/a.py".to_string(), "docs/b.py".to_string()];
        let lint = GateSpec::lint(&files);
        assert_eq!(&lint.cmd[1..], ["src/a.py", "docs/b.py"]);
        let lint_all = GateSpec::lint(&[]);
        assert_eq!(&lint_all.cmd[1..], ["src", "tests"]);

        let ty = GateSpec::typecheck(&files);
        assert_eq!(ty.cmd.last().unwrap(), "src/a.py");
        let ty_all = GateSpec::typecheck(&[]);
        assert_eq!(ty_all.cmd.last().unwrap(), "src");
    }
}
