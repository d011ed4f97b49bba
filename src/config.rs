//! Configuration discovery and effective settings resolution.
//!
//! Gatera reads `gatera.toml|yaml|yml` from the repository root (or the
//! closest ancestor) and merges it with CLI flags to produce an
//! `Effective` config. Defaults:
//! - `min_coverage`: 80
//! - `output`: `human`
//! - `timeout_secs`: 900
//! - `gates.fail_on_lint|fail_on_type|fail_on_security`: true
//!
//! Overrides precedence: CLI > config file > defaults.
//!
//! Process-environment switches are separate from file config: they are
//! read exactly once, in `main`, into `RunOptions` and passed down
//! explicitly. Nothing below the entry point touches the environment.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::rules::RuleIdStyle;
use crate::runner::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_MIN_COVERAGE: u32 = 80;

/// Per-gate blocking switches under `[gates]`.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct GatesCfg {
    pub fail_on_lint: Option<bool>,
    pub fail_on_type: Option<bool>,
    pub fail_on_security: Option<bool>,
}

/// Root configuration loaded from `gatera.toml|yaml|yml`.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct GateraConfig {
    pub min_coverage: Option<u32>,
    pub output: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub gates: Option<GatesCfg>,
}

/// Fully-resolved configuration used by the run after applying precedence.
#[derive(Debug, Clone)]
pub struct Effective {
    pub repo_root: PathBuf,
    /// `None` means no minimum: the coverage gate always passes.
    pub min_coverage: Option<u32>,
    pub output: String,
    pub timeout: Duration,
    pub fail_on_lint: bool,
    pub fail_on_type: bool,
    pub fail_on_security: bool,
}

/// Per-process switches read from the environment at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub rule_style: RuleIdStyle,
    /// When set, tool-execution errors abort the run (exit 2) instead of
    /// failing the affected gate.
    pub strict_subprocess: bool,
}

impl RunOptions {
    /// Read `GATERA_RULE_ID_STYLE` and `GATERA_STRICT_SUBPROCESS_ERRORS`.
    /// Call this once from the entry point only.
    pub fn from_env() -> Self {
        let style = std::env::var("GATERA_RULE_ID_STYLE").ok();
        let strict = std::env::var("GATERA_STRICT_SUBPROCESS_ERRORS")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        Self {
            rule_style: RuleIdStyle::from_env_value(style.as_deref()),
            strict_subprocess: strict,
        }
    }
}

/// Recognized truthy forms: `1`, `true`, `yes`, `on` (case-insensitive).
/// Anything else is falsy.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `gatera.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("gatera.toml").exists()
            || cur.join("gatera.yaml").exists()
            || cur.join("gatera.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `GateraConfig` from `gatera.toml` or `gatera.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<GateraConfig> {
    let toml_path = root.join("gatera.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: GateraConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["gatera.yaml", "gatera.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: GateraConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_min_cov: Option<u32>,
    cli_no_min_cov: bool,
    cli_output: Option<&str>,
    cli_timeout_secs: Option<u64>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let min_coverage = if cli_no_min_cov {
        None
    } else {
        Some(
            cli_min_cov
                .or(cfg.min_coverage)
                .unwrap_or(DEFAULT_MIN_COVERAGE),
        )
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let timeout_secs = cli_timeout_secs
        .or(cfg.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let gates = cfg.gates.unwrap_or_default();
    Effective {
        repo_root,
        min_coverage,
        output,
        timeout: Duration::from_secs(timeout_secs),
        fail_on_lint: gates.fail_on_lint.unwrap_or(true),
        fail_on_type: gates.fail_on_type.unwrap_or(true),
        fail_on_security: gates.fail_on_security.unwrap_or(true),
    }
}
