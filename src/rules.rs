//! Canonical rule-id construction and normalization.
//!
//! Tools disagree on how rule codes look (`E501`, `name-defined`, `B101`)
//! and whether reports want them tool-prefixed. The policy here is chosen
//! once per process (see `RunOptions`) and threaded into the parsers.

/// How rule ids are rendered in findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleIdStyle {
    /// The tool's own code, unchanged (default).
    #[default]
    Bare,
    /// `tool:code`, so mixed-tool reports stay unambiguous.
    Tool,
}

impl RuleIdStyle {
    /// Parse the style from its environment-variable form.
    /// Anything other than `tool` (case-insensitive) is `Bare`.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("tool") => RuleIdStyle::Tool,
            _ => RuleIdStyle::Bare,
        }
    }
}

/// Pure mapping from (tool, raw code) to the canonical rule id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleIdPolicy {
    pub style: RuleIdStyle,
}

impl RuleIdPolicy {
    pub fn new(style: RuleIdStyle) -> Self {
        Self { style }
    }

    /// Build a rule id from a tool name and an optional raw code.
    ///
    /// A missing or blank code falls back to the tool name alone, so the
    /// result is never empty.
    pub fn make_rule_id(&self, tool: &str, raw: Option<&str>) -> String {
        let code = raw.map(str::trim).filter(|c| !c.is_empty());
        match (code, self.style) {
            (None, _) => tool.to_string(),
            (Some(c), RuleIdStyle::Bare) => c.to_string(),
            (Some(c), RuleIdStyle::Tool) => format!("{}:{}", tool, c),
        }
    }
}

/// Strip a leading `tool:` prefix from a rule id, if present.
///
/// Only the first colon is significant; codes that themselves contain
/// colons keep everything after it. Input without a colon is returned
/// unchanged. Used to compare rule ids that may already be prefixed.
pub fn normalize_rule_id(raw: &str) -> &str {
    match raw.split_once(':') {
        Some((_, rest)) => rest,
        None => raw,
    }
}
