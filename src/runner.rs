//! Subprocess invocation for external checkers.
//!
//! Dev tools routinely signal "findings present" through a non-zero exit
//! code, so a non-zero exit is data, not an error. Only the cases where the
//! tool itself could not run (missing binary, timeout, non-zero exit with
//! nothing on either stream) surface as `ToolError` variants, each with a
//! distinct rendering so gates can report them differently.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Default per-tool timeout. Generous: a full mypy pass on a large tree
/// can take minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 900;

/// Shell convention for "command not found".
const EXIT_NOT_FOUND: i32 = 127;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit_code: i32,
    /// stdout and stderr merged; bytes decoded with replacement on error.
    pub output: String,
}

/// Ways a tool invocation can fail without producing parseable output.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Programming error: callers must never pass an empty argv.
    #[error("empty command vector")]
    EmptyCommand,
    #[error("{tool} not found")]
    ToolAbsent { tool: String },
    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },
    #[error("{tool} exited with code {exit_code} and no output")]
    EmptyOutput { tool: String, exit_code: i32 },
    #[error("failed to run {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `cmd` and return its exit code plus merged output.
///
/// The child is killed once `timeout` elapses. Exit code 127 and a
/// spawn-time `NotFound` both map to `ToolError::ToolAbsent`; a non-zero
/// exit with whitespace-only output maps to `ToolError::EmptyOutput`.
pub fn run_tool(
    cmd: &[String],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ToolOutput, ToolError> {
    let (program, args) = match cmd.split_first() {
        Some(split) => split,
        None => return Err(ToolError::EmptyCommand),
    };
    let tool = program.clone();

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::ToolAbsent { tool: tool.clone() }
        } else {
            ToolError::Io {
                tool: tool.clone(),
                source: e,
            }
        }
    })?;

    // Drain both pipes off-thread so a chatty child cannot deadlock
    // against a full pipe buffer while we poll for exit.
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_reader = thread::spawn(move || read_all(stdout));
    let err_reader = thread::spawn(move || read_all(stderr));

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Let the readers observe EOF before dropping them.
                    let _ = out_reader.join();
                    let _ = err_reader.join();
                    return Err(ToolError::Timeout {
                        tool,
                        secs: timeout.as_secs(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolError::Io { tool, source: e });
            }
        }
    };

    let out_bytes = out_reader.join().unwrap_or_default();
    let err_bytes = err_reader.join().unwrap_or_default();
    let output = merge_streams(&out_bytes, &err_bytes);

    let exit_code = status.code().unwrap_or(-1);
    if exit_code == EXIT_NOT_FOUND {
        return Err(ToolError::ToolAbsent { tool });
    }
    if exit_code != 0 && output.trim().is_empty() {
        return Err(ToolError::EmptyOutput { tool, exit_code });
    }
    Ok(ToolOutput { exit_code, output })
}

fn read_all(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

/// Merge stdout and stderr into one parseable text stream, decoding
/// invalid bytes with replacement characters.
fn merge_streams(stdout: &[u8], stderr: &[u8]) -> String {
    let out = String::from_utf8_lossy(stdout);
    let err = String::from_utf8_lossy(stderr);
    if out.is_empty() {
        err.into_owned()
    } else if err.is_empty() {
        out.into_owned()
    } else {
        format!("{}\n{}", out.trim_end_matches('\n'), err)
    }
}
