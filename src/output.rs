//! Console rendering of a run outcome.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is the
//! same document the JSON report writer produces, so piping stdout and
//! writing `--report` agree byte-for-byte on shape.

use owo_colors::OwoColorize;

use crate::models::{Finding, GateResult, Level};
use crate::orchestrator::RunOutcome;
use crate::report::compose_json_report;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print findings and the gate summary in the requested format.
pub fn print_summary(outcome: &RunOutcome, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_json_report(
                &outcome.gates,
                &outcome.findings
            ))
            .unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for finding in &outcome.findings {
                println!("{}", render_finding(finding, color));
            }
            for gate in &outcome.gates {
                println!("{}", render_gate(gate, color));
            }
            let failed = outcome.gates.iter().filter(|g| !g.passed).count();
            let summary = if failed > 0 {
                format!("— Summary — {} gate(s) failed", failed)
            } else {
                "— Summary — all gates passed".to_string()
            };
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

fn render_finding(finding: &Finding, color: bool) -> String {
    let (icon, tag) = match finding.level {
        Level::Error => (
            if color { "✖".red().to_string() } else { "✖".into() },
            if color {
                "⟦error⟧".red().bold().to_string()
            } else {
                "⟦error⟧".into()
            },
        ),
        Level::Warning => (
            if color { "▲".yellow().to_string() } else { "▲".into() },
            if color {
                "⟦warn⟧".yellow().bold().to_string()
            } else {
                "⟦warn⟧".into()
            },
        ),
        Level::Note => (
            if color { "◆".blue().to_string() } else { "◆".into() },
            if color {
                "⟦note⟧".blue().bold().to_string()
            } else {
                "⟦note⟧".into()
            },
        ),
    };
    let place = finding
        .locations
        .first()
        .map(|loc| {
            let mut s = loc.uri.clone();
            if let Some(line) = loc.start_line {
                s.push_str(&format!(":{}", line));
                if let Some(col) = loc.start_column {
                    s.push_str(&format!(":{}", col));
                }
            }
            s
        })
        .unwrap_or_default();
    let place = if color {
        place.bold().to_string()
    } else {
        place
    };
    format!(
        "{} {} {} ❲{}❳ — {}",
        icon, tag, place, finding.rule_id, finding.message
    )
}

fn render_gate(gate: &GateResult, color: bool) -> String {
    let (icon, status) = if gate.passed {
        (
            if color { "✔".green().to_string() } else { "✔".into() },
            if color {
                "PASSED".green().bold().to_string()
            } else {
                "PASSED".into()
            },
        )
    } else {
        (
            if color { "✖".red().to_string() } else { "✖".into() },
            if color {
                "FAILED".red().bold().to_string()
            } else {
                "FAILED".into()
            },
        )
    };
    let name = if color {
        gate.name.clone().bold().to_string()
    } else {
        gate.name.clone()
    };
    if gate.details.is_empty() {
        format!("{} {}: {}", icon, name, status)
    } else {
        format!("{} {}: {} — {}", icon, name, status, gate.details)
    }
}
