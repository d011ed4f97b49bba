//! Supporting helpers: colored stderr prefixes and path display.

use std::path::Path;

use owo_colors::OwoColorize;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Prefix for fatal messages on stderr.
pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

/// Prefix for friendly notes on stderr.
pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".blue().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Prefix for informational messages on stderr.
pub fn info_prefix() -> String {
    if colors_enabled() {
        "info:".cyan().bold().to_string()
    } else {
        "info:".to_string()
    }
}

/// Render `path` relative to the current working directory when possible,
/// with forward slashes for stable display.
pub fn rel_to_wd(path: &Path) -> String {
    let rel = std::env::current_dir()
        .ok()
        .and_then(|wd| pathdiff::diff_paths(path, wd))
        .unwrap_or_else(|| path.to_path_buf());
    rel.to_string_lossy().replace('\\', "/")
}
