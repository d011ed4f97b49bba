//! Changed-file discovery through git.
//!
//! Scoping the lint and type gates to the files a change actually touched
//! keeps CI fast on large trees. Any git failure (not a repository, git
//! missing, unknown refs) degrades to an empty list so the gates fall
//! back to their whole-tree defaults; discovery never fails a run.

use std::path::Path;
use std::time::Duration;

use crate::runner::run_tool;

const GIT_TIMEOUT: Duration = Duration::from_secs(60);

/// A `base...head` revision range from the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRange {
    pub base: String,
    pub head: String,
}

impl DiffRange {
    /// Parse the CLI form `base...head`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (base, head) = raw.split_once("...")?;
        if base.trim().is_empty() || head.trim().is_empty() {
            return None;
        }
        Some(Self {
            base: base.trim().to_string(),
            head: head.trim().to_string(),
        })
    }
}

/// List changed Python files: the diff of `range` when given, otherwise
/// every tracked file.
pub fn changed_python_files(repo_root: &Path, range: Option<&DiffRange>) -> Vec<String> {
    let all = match range {
        Some(r) => git_lines(
            repo_root,
            &[
                "git".to_string(),
                "diff".to_string(),
                "--name-only".to_string(),
                // Three-dot: changes since the merge base, matching what
                // a PR review shows.
                format!("{}...{}", r.base, r.head),
            ],
        ),
        None => git_lines(
            repo_root,
            &["git".to_string(), "ls-files".to_string()],
        ),
    };
    all.into_iter().filter(|p| p.ends_with(".py")).collect()
}

fn git_lines(repo_root: &Path, cmd: &[String]) -> Vec<String> {
    match run_tool(cmd, Some(repo_root), GIT_TIMEOUT) {
        Ok(out) if out.exit_code == 0 => out
            .output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
