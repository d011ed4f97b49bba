//! Parser for flake8's aligned-column output.
//!
//! Grammar per line: `path:line:col: CODE message`, e.g.
//! `src/app.py:10:5: E501 line too long (80 > 79 characters)`.

use regex::Regex;

use crate::models::{Finding, Level, Location};
use crate::rules::RuleIdPolicy;

use super::OutputParser;

pub struct LintParser {
    line_re: Regex,
    policy: RuleIdPolicy,
}

impl LintParser {
    pub fn new(policy: RuleIdPolicy) -> Self {
        // Codes are a letter plus 3-4 digits (E501, C901, W6031).
        let line_re = Regex::new(
            r"^(?P<file>.*?):(?P<line>\d+):(?P<col>\d+): (?P<code>[A-Z]\d{3,4}) (?P<msg>.*)$",
        )
        .expect("lint line regex");
        Self { line_re, policy }
    }
}

impl OutputParser for LintParser {
    fn parse(&self, raw: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for line in raw.lines() {
            let caps = match self.line_re.captures(line.trim()) {
                Some(c) => c,
                // Banners and summary lines are not findings.
                None => continue,
            };
            let start_line = caps["line"].parse::<u32>().ok();
            let start_column = caps["col"].parse::<u32>().ok();
            findings.push(Finding {
                rule_id: self.policy.make_rule_id("flake8", Some(&caps["code"])),
                message: caps["msg"].to_string(),
                level: Level::Warning,
                locations: vec![Location::new(&caps["file"], start_line, start_column)],
            });
        }
        findings
    }
}
