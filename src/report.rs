//! Report writers: a JSON summary and a minimal SARIF v2.1.0 run.
//!
//! Composition is split from writing (pure functions returning
//! `serde_json::Value`) so tests and the console printer can share the
//! exact document shape.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::models::{Finding, GateResult, Location};

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";
const TOOL_NAME: &str = "gatera";

/// Compose the JSON report document.
pub fn compose_json_report(gates: &[GateResult], findings: &[Finding]) -> Value {
    json!({
        "version": "1.0",
        "summary": {
            "passed": gates.iter().all(|g| g.passed),
            "gates": gates,
        },
        "findings": findings,
    })
}

/// Write the JSON report to `path`.
pub fn write_json_report(
    path: &Path,
    gates: &[GateResult],
    findings: &[Finding],
) -> io::Result<()> {
    let doc = compose_json_report(gates, findings);
    fs::write(path, format!("{:#}", doc))
}

/// Compose a SARIF run carrying the findings plus one pseudo-result per
/// gate (level `note` when passed, `error` when failed) so a SARIF viewer
/// shows the gate decisions alongside the diagnostics.
pub fn compose_sarif(gates: &[GateResult], findings: &[Finding]) -> Value {
    let mut results: Vec<Value> = findings.iter().map(finding_json).collect();
    results.extend(gates.iter().map(|g| {
        let level = if g.passed { "note" } else { "error" };
        let text = if g.details.is_empty() {
            &g.name
        } else {
            &g.details
        };
        json!({
            "ruleId": format!("gate:{}", g.name),
            "level": level,
            "message": {"text": text},
        })
    }));
    json!({
        "version": SARIF_VERSION,
        "$schema": SARIF_SCHEMA,
        "runs": [{
            "tool": {"driver": {"name": TOOL_NAME}},
            "results": results,
        }],
    })
}

/// Write the SARIF report to `path`.
pub fn write_sarif(path: &Path, gates: &[GateResult], findings: &[Finding]) -> io::Result<()> {
    let doc = compose_sarif(gates, findings);
    fs::write(path, format!("{:#}", doc))
}

fn finding_json(finding: &Finding) -> Value {
    let mut result = Map::new();
    result.insert("ruleId".into(), json!(finding.rule_id));
    result.insert(
        "level".into(),
        serde_json::to_value(finding.level).expect("level serializes"),
    );
    result.insert("message".into(), json!({"text": finding.message}));
    if !finding.locations.is_empty() {
        let locations: Vec<Value> = finding.locations.iter().map(location_json).collect();
        result.insert("locations".into(), Value::Array(locations));
    }
    Value::Object(result)
}

fn location_json(loc: &Location) -> Value {
    // Forward slashes regardless of platform, for viewer compatibility.
    let uri = loc.uri.replace('\\', "/");
    let mut physical = Map::new();
    physical.insert("artifactLocation".into(), json!({"uri": uri}));
    let mut region = Map::new();
    if let Some(line) = loc.start_line {
        region.insert("startLine".into(), json!(line));
    }
    if let Some(col) = loc.start_column {
        region.insert("startColumn".into(), json!(col));
    }
    if !region.is_empty() {
        physical.insert("region".into(), Value::Object(region));
    }
    json!({"physicalLocation": Value::Object(physical)})
}
