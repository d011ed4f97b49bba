//! Parser for bandit's JSON report.
//!
//! Expected shape: `{"results": [{"filename", "line_number", "issue_text",
//! "test_id"}, ...]}`. The invocation path may hand over raw text or an
//! already-parsed document, so the input is an explicit sum type rather
//! than a runtime type probe.

use serde_json::Value;

use crate::models::{Finding, Level, Location};
use crate::rules::RuleIdPolicy;

use super::OutputParser;

/// Security-report payload before normalization.
pub enum RawPayload {
    Text(String),
    Parsed(Value),
}

impl RawPayload {
    fn into_value(self) -> Option<Value> {
        match self {
            RawPayload::Text(s) => serde_json::from_str(&s).ok(),
            RawPayload::Parsed(v) => Some(v),
        }
    }
}

pub struct SecurityParser {
    policy: RuleIdPolicy,
}

impl SecurityParser {
    pub fn new(policy: RuleIdPolicy) -> Self {
        Self { policy }
    }

    /// Parse a payload in either form. Malformed JSON or a missing
    /// `results` array yields no findings; a non-JSON error message from
    /// the tool is the runner's empty-output path, not a parse concern.
    pub fn parse_payload(&self, payload: RawPayload) -> Vec<Finding> {
        let value = match payload.into_value() {
            Some(v) => v,
            None => return Vec::new(),
        };
        let results = match value.get("results").and_then(Value::as_array) {
            Some(r) => r,
            None => return Vec::new(),
        };

        results
            .iter()
            .map(|issue| {
                // Partial records are still reported; missing fields
                // default rather than dropping the whole record.
                let filename = issue
                    .get("filename")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let line = issue
                    .get("line_number")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok());
                let message = issue
                    .get("issue_text")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let test_id = issue
                    .get("test_id")
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty());
                Finding {
                    rule_id: self.policy.make_rule_id("bandit", test_id),
                    message: message.to_string(),
                    // The gate is binary pass/fail, so bandit's own
                    // severity scale is flattened to warning.
                    level: Level::Warning,
                    locations: vec![Location::new(filename, line, None)],
                }
            })
            .collect()
    }
}

impl OutputParser for SecurityParser {
    fn parse(&self, raw: &str) -> Vec<Finding> {
        self.parse_payload(RawPayload::Text(raw.to_string()))
    }
}
