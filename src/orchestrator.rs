//! Runs the gates and aggregates the run outcome.
//!
//! The three subprocess gates are independent (distinct tools, no shared
//! mutable state) and run concurrently on a bounded worker pool. The
//! coverage gate reads a file and runs inline. GateResults always come
//! back in declaration order (lint, type, security, coverage) regardless
//! of completion order; there is no cross-gate cancellation, so one
//! report reflects every gate's true state.

use std::path::Path;

use rayon::prelude::*;

use crate::config::{Effective, RunOptions};
use crate::coverage::CoverageCache;
use crate::gates::{evaluate_coverage_gate, evaluate_tool_gate, GateContext, GateSpec};
use crate::models::{Finding, GateResult};
use crate::rules::RuleIdPolicy;
use crate::runner::ToolError;

/// Everything downstream consumers need: ordered gate results for the
/// summary printer, ordered findings for the report writers.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub gates: Vec<GateResult>,
    pub findings: Vec<Finding>,
}

/// Run the subprocess gates described by `jobs` (spec plus its blocking
/// flag), preserving job order in the output.
pub fn run_gates(
    jobs: &[(GateSpec, bool)],
    eff: &Effective,
    opts: &RunOptions,
    parallel: bool,
) -> Result<RunOutcome, ToolError> {
    let policy = RuleIdPolicy::new(opts.rule_style);
    let run_one = |(spec, fail_on): &(GateSpec, bool)| {
        let ctx = GateContext {
            repo_root: &eff.repo_root,
            timeout: eff.timeout,
            policy,
            strict_subprocess: opts.strict_subprocess,
            fail_on: *fail_on,
        };
        evaluate_tool_gate(&ctx, spec)
    };

    // Indexed collect keeps declaration order even when a later gate
    // finishes first.
    let evaluated: Vec<Result<(GateResult, Vec<Finding>), ToolError>> = if parallel {
        jobs.par_iter().map(run_one).collect()
    } else {
        jobs.iter().map(run_one).collect()
    };

    let mut outcome = RunOutcome::default();
    for item in evaluated {
        let (gate, findings) = item?;
        outcome.gates.push(gate);
        outcome.findings.extend(findings);
    }
    Ok(outcome)
}

/// Run all four canonical gates over `files` and aggregate the outcome.
pub fn run_all(
    files: &[String],
    eff: &Effective,
    opts: &RunOptions,
    coverage_xml: Option<&Path>,
    parallel: bool,
) -> Result<RunOutcome, ToolError> {
    let jobs = vec![
        (GateSpec::lint(files), eff.fail_on_lint),
        (GateSpec::typecheck(files), eff.fail_on_type),
        (GateSpec::security(), eff.fail_on_security),
    ];
    let mut outcome = run_gates(&jobs, eff, opts, parallel)?;

    let cache = CoverageCache::new();
    outcome.gates.push(evaluate_coverage_gate(
        &eff.repo_root,
        eff.min_coverage,
        &cache,
        coverage_xml,
    ));
    Ok(outcome)
}

/// `0` iff every gate passed, otherwise `1`. No partial-success codes.
pub fn exit_code(gates: &[GateResult]) -> i32 {
    if gates.iter().all(|g| g.passed) {
        0
    } else {
        1
    }
}
