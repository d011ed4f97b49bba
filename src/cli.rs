//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gatera",
    version,
    about = "Gatera — CI quality gates for Python projects",
    long_about = "Gatera runs flake8, mypy and bandit, reads the coverage report, and \
folds everything into pass/fail gates with one exit code.\n\nConfiguration precedence: CLI > gatera.toml > defaults.",
    after_help = "Examples:\n  gatera check\n  gatera check --min-cov 90 --output json\n  gatera check --diff origin/main...HEAD --sarif gatera.sarif\n  gatera check --run-tests --report report.json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current gatera version.")]
    Version,
    /// Run the quality gates
    #[command(
        about = "Run the quality gates",
        long_about = "Run the lint, type, security and coverage gates and exit 0 only when every gate passes.",
        after_help = "Examples:\n  gatera check --min-cov 85\n  gatera check --diff origin/main...HEAD --output json"
    )]
    Check {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Minimum coverage percentage (default: 80)")]
        min_cov: Option<u32>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Disable the coverage minimum entirely")]
        no_min_cov: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Per-tool timeout in seconds (default: 900)")]
        timeout_secs: Option<u64>,
        #[arg(long, help = "Scope gates to a git range, e.g. origin/main...HEAD")]
        diff: Option<String>,
        #[arg(long, help = "Coverage XML path (default: coverage.xml lookup)")]
        coverage_xml: Option<String>,
        #[arg(long, help = "Write a SARIF report to this path")]
        sarif: Option<String>,
        #[arg(long, help = "Write a JSON report to this path")]
        report: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Run pytest with coverage before the gates")]
        run_tests: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Run the subprocess gates sequentially")]
        no_parallel: bool,
    },
}
