//! Shared data models for findings and gate outcomes.

use serde::Serialize;

/// Severity of a normalized finding, in SARIF vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Note,
    Warning,
    Error,
}

/// A file/line/column reference as reported by the tool.
///
/// The path is kept repo-relative as the tool printed it and is not
/// re-validated against the filesystem. Line and column are optional;
/// a missing column stays `None`, never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
}

impl Location {
    pub fn new(uri: impl Into<String>, line: Option<u32>, column: Option<u32>) -> Self {
        Self {
            uri: uri.into(),
            start_line: line,
            start_column: column,
        }
    }
}

/// One normalized issue extracted from a tool's raw output.
///
/// Built immutably from a single line (or JSON object) of tool output.
/// `rule_id` is never empty: when a tool emits no code, the tool name is
/// used instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub rule_id: String,
    pub message: String,
    pub level: Level,
    pub locations: Vec<Location>,
}

/// One gate's pass/fail outcome with a one-line human summary.
#[derive(Debug, Clone, Serialize)]
pub struct GateResult {
    pub name: String,
    pub passed: bool,
    pub details: String,
}

impl GateResult {
    pub fn new(name: impl Into<String>, passed: bool, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            details: details.into(),
        }
    }
}

/// The four canonical gates, in their fixed reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    Lint,
    Typecheck,
    Security,
    Coverage,
}

impl GateKind {
    /// Display name used in summaries and reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            GateKind::Lint => "Lint (flake8)",
            GateKind::Typecheck => "Static types (mypy)",
            GateKind::Security => "Security (bandit)",
            GateKind::Coverage => "Coverage",
        }
    }

    /// The external tool behind the gate, if any.
    pub fn tool(&self) -> &'static str {
        match self {
            GateKind::Lint => "flake8",
            GateKind::Typecheck => "mypy",
            GateKind::Security => "bandit",
            GateKind::Coverage => "coverage",
        }
    }
}
