//! Parser for mypy's diagnostic lines.
//!
//! Grammar per line: `path:line[:col]: severity: message [code]`. The
//! column and the bracketed code are both optional. Only `error` and
//! `warning` severities become findings; `note`/`info` lines are dropped,
//! not downgraded, since the gate only acts on error/warning levels.

use regex::Regex;

use crate::models::{Finding, Level, Location};
use crate::rules::RuleIdPolicy;

use super::OutputParser;

/// Raw code used when mypy prints no bracketed code.
const FALLBACK_CODE: &str = "mypy-error";

pub struct TypecheckParser {
    line_re: Regex,
    policy: RuleIdPolicy,
}

impl TypecheckParser {
    pub fn new(policy: RuleIdPolicy) -> Self {
        let line_re = Regex::new(
            r"^(?P<file>.*?):(?P<line>\d+)(?::(?P<col>\d+))?: (?P<level>error|warning): (?P<msg>.*?)(?: \[(?P<code>[^\]]+)\])?$",
        )
        .expect("typecheck line regex");
        Self { line_re, policy }
    }
}

impl OutputParser for TypecheckParser {
    fn parse(&self, raw: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for line in raw.lines() {
            let caps = match self.line_re.captures(line.trim()) {
                Some(c) => c,
                None => continue,
            };
            let level = match &caps["level"] {
                "error" => Level::Error,
                "warning" => Level::Warning,
                // Unreachable given the pattern; kept exhaustive.
                _ => continue,
            };
            let raw_code = caps
                .name("code")
                .map(|m| m.as_str())
                .unwrap_or(FALLBACK_CODE);
            let start_line = caps["line"].parse::<u32>().ok();
            let start_column = caps
                .name("col")
                .and_then(|m| m.as_str().parse::<u32>().ok());
            findings.push(Finding {
                rule_id: self.policy.make_rule_id("mypy", Some(raw_code)),
                message: caps["msg"].to_string(),
                level,
                locations: vec![Location::new(&caps["file"], start_line, start_column)],
            });
        }
        findings
    }
}
