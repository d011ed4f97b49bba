//! Per-tool output parsers behind one interface.
//!
//! Every parser is total: any input string (empty, garbage, random
//! unicode) yields a possibly-empty `Vec<Finding>` and never panics.
//! Lines that do not match a tool's grammar are skipped silently, since
//! tools interleave banners and summary lines with their findings.

pub mod lint;
pub mod security;
pub mod typecheck;

use crate::models::{Finding, GateKind};
use crate::rules::RuleIdPolicy;

pub use lint::LintParser;
pub use security::{RawPayload, SecurityParser};
pub use typecheck::TypecheckParser;

/// Converts one tool's raw output into ordered findings.
pub trait OutputParser: Send + Sync {
    fn parse(&self, raw: &str) -> Vec<Finding>;
}

/// Map a gate kind to its parser. The coverage gate reads an XML report
/// instead of tool output and has no parser.
pub fn parser_for(kind: GateKind, policy: RuleIdPolicy) -> Option<Box<dyn OutputParser>> {
    match kind {
        GateKind::Lint => Some(Box::new(LintParser::new(policy))),
        GateKind::Typecheck => Some(Box::new(TypecheckParser::new(policy))),
        GateKind::Security => Some(Box::new(SecurityParser::new(policy))),
        GateKind::Coverage => None,
    }
}
