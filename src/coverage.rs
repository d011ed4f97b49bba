//! Coverage report reading.
//!
//! Extracts a single integer percentage from a coverage XML file. Two
//! schema families are supported, tried in order:
//!
//! 1. a fractional `line-rate` attribute on the root element
//!    (cobertura-style aggregate),
//! 2. `<counter type="LINE" covered=".." missed=".."/>` elements summed
//!    across the document (jacoco-style line counters).
//!
//! Everything here is defensive: a missing file, unparsable XML, or a
//! malformed/out-of-range value yields `None`, never an error. Values are
//! dropped, not clamped, when they fall outside [0, 100].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Conventional report locations, relative to the repo root.
const DEFAULT_REPORT_PATHS: [&str; 2] = ["coverage.xml", "../coverage.xml"];

/// Find the coverage report under `base` using the conventional names.
/// The first existing candidate wins; none found means no coverage data.
pub fn default_report_path(base: &Path) -> Option<PathBuf> {
    DEFAULT_REPORT_PATHS
        .iter()
        .map(|name| base.join(name))
        .find(|p| p.is_file())
}

/// Read a coverage percentage from the report at `path`.
pub fn coverage_percent(path: &Path) -> Option<u32> {
    let xml = fs::read_to_string(path).ok()?;
    percent_from_str(&xml)
}

/// Extract the percentage from report text. Public for tests and for
/// callers that already hold the document in memory.
pub fn percent_from_str(xml: &str) -> Option<u32> {
    let mut reader = Reader::from_str(xml);
    let mut saw_root = false;
    let mut covered_total: u64 = 0;
    let mut missed_total: u64 = 0;
    let mut saw_line_counter = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if !saw_root {
                    saw_root = true;
                    // Schema 1: an aggregate rate on the root element is
                    // authoritative when present, valid or not.
                    if let Some(rate) = attr_value(&e, b"line-rate") {
                        return percent_from_line_rate(&rate);
                    }
                }
                if e.name().as_ref() == b"counter"
                    && attr_value(&e, b"type").as_deref() == Some("LINE")
                {
                    let covered = attr_value(&e, b"covered").and_then(|v| v.parse::<u64>().ok());
                    let missed = attr_value(&e, b"missed").and_then(|v| v.parse::<u64>().ok());
                    if let (Some(c), Some(m)) = (covered, missed) {
                        covered_total += c;
                        missed_total += m;
                        saw_line_counter = true;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    if !saw_line_counter {
        return None;
    }
    let total = covered_total + missed_total;
    if total == 0 {
        return None;
    }
    // Integer division truncates, matching the line-rate conversion.
    Some((covered_total * 100 / total) as u32)
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn percent_from_line_rate(raw: &str) -> Option<u32> {
    let rate: f64 = raw.trim().parse().ok()?;
    if !rate.is_finite() {
        return None;
    }
    let pct = (rate * 100.0).trunc();
    if !(0.0..=100.0).contains(&pct) {
        return None;
    }
    Some(pct as u32)
}

/// Read-through memo of report parses, keyed by path and mtime.
///
/// Owned by a single run and shared across the gate workers; nothing
/// survives the run.
#[derive(Default)]
pub struct CoverageCache {
    entries: Mutex<HashMap<PathBuf, (Option<SystemTime>, Option<u32>)>>,
}

impl CoverageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`coverage_percent`], but repeated lookups of an unchanged
    /// file are served from the cache.
    pub fn percent(&self, path: &Path) -> Option<u32> {
        let mtime = fs::metadata(path).and_then(|m| m.modified()).ok();
        let mut entries = self.entries.lock().expect("coverage cache poisoned");
        if let Some((cached_mtime, cached)) = entries.get(path) {
            if *cached_mtime == mtime {
                return *cached;
            }
        }
        let computed = coverage_percent(path);
        entries.insert(path.to_path_buf(), (mtime, computed));
        computed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_line_rate_schema() {
        let xml = r#"<?xml version="1.0"?><coverage line-rate="0.85"></coverage>"#;
        assert_eq!(percent_from_str(xml), Some(85));
    }

    #[test]
    fn test_line_rate_truncates() {
        let xml = r#"<coverage line-rate="0.856"/>"#;
        assert_eq!(percent_from_str(xml), Some(85));
    }

    #[test]
    fn test_line_rate_invalid_is_absent() {
        assert_eq!(percent_from_str(r#"<coverage line-rate="oops"/>"#), None);
        assert_eq!(percent_from_str(r#"<coverage line-rate="NaN"/>"#), None);
    }

    #[test]
    fn test_line_rate_out_of_range_is_dropped_not_clamped() {
        assert_eq!(percent_from_str(r#"<coverage line-rate="1.5"/>"#), None);
        assert_eq!(percent_from_str(r#"<coverage line-rate="-0.2"/>"#), None);
    }

    #[test]
    fn test_counter_schema_sums_line_counters() {
        let xml = r#"<report>
            <counter type="LINE" covered="50" missed="30"/>
            <counter type="BRANCH" covered="9" missed="9"/>
            <counter type="LINE" covered="20" missed="10"/>
        </report>"#;
        // (50+20) / (50+30+20+10) = 63.6..., truncated.
        assert_eq!(percent_from_str(xml), Some(63));
    }

    #[test]
    fn test_counter_schema_ignores_non_line_counters() {
        let xml = r#"<report><counter type="BRANCH" covered="5" missed="5"/></report>"#;
        assert_eq!(percent_from_str(xml), None);
    }

    #[test]
    fn test_counter_schema_zero_total_is_absent() {
        let xml = r#"<report><counter type="LINE" covered="0" missed="0"/></report>"#;
        assert_eq!(percent_from_str(xml), None);
    }

    #[test]
    fn test_counter_with_bad_numbers_is_skipped() {
        let xml = r#"<report>
            <counter type="LINE" covered="x" missed="y"/>
            <counter type="LINE" covered="3" missed="1"/>
        </report>"#;
        assert_eq!(percent_from_str(xml), Some(75));
    }

    #[test]
    fn test_unparsable_xml_is_absent() {
        assert_eq!(percent_from_str("not xml at all <<<"), None);
        assert_eq!(percent_from_str(""), None);
    }

    #[test]
    fn test_result_always_in_bounds() {
        for xml in [
            r#"<coverage line-rate="0.0"/>"#,
            r#"<coverage line-rate="1.0"/>"#,
            r#"<r><counter type="LINE" covered="1" missed="999"/></r>"#,
        ] {
            if let Some(pct) = percent_from_str(xml) {
                assert!(pct <= 100);
            }
        }
    }

    #[test]
    fn test_missing_file_is_absent() {
        assert_eq!(coverage_percent(Path::new("no/such/coverage.xml")), None);
    }

    #[test]
    fn test_default_path_discovery() {
        let dir = tempdir().unwrap();
        assert_eq!(default_report_path(dir.path()), None);
        let mut f = fs::File::create(dir.path().join("coverage.xml")).unwrap();
        writeln!(f, r#"<coverage line-rate="0.5"/>"#).unwrap();
        let found = default_report_path(dir.path()).unwrap();
        assert_eq!(coverage_percent(&found), Some(50));
    }

    #[test]
    fn test_cache_serves_unchanged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coverage.xml");
        fs::write(&path, r#"<coverage line-rate="0.40"/>"#).unwrap();
        let cache = CoverageCache::new();
        assert_eq!(cache.percent(&path), Some(40));
        // Unchanged mtime: second read comes from the cache.
        assert_eq!(cache.percent(&path), Some(40));
        assert_eq!(cache.percent(Path::new("missing.xml")), None);
    }
}
