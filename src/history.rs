//! Capture history, usage counters, and the persisted error log.
//!
//! The dispatcher only ever appends to these stores; readers live
//! elsewhere. Append failures are logged and swallowed upstream so
//! they never block a successful clipboard write.

use crate::dispatch::error::{DispatchError, ErrorLogEntry};
use crate::mode::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Oldest entries are evicted past this count.
pub const MAX_HISTORY: usize = 100;
/// Error-log ring size.
pub const MAX_ERROR_LOG: usize = 50;
/// Preview truncation bound, in characters.
pub const PREVIEW_CHARS: usize = 300;

/// One completed capture: the transform output plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    /// Human-readable category label ("Slug", "CSV", ...).
    pub kind: String,
    /// Truncated prefix of `data`, never longer than [`PREVIEW_CHARS`].
    pub preview: String,
    /// The full payload; the only thing actually copied or stored.
    pub data: String,
    pub source_url: String,
    pub timestamp: DateTime<Utc>,
}

impl Capture {
    /// Builds a capture, deriving the preview from the payload.
    pub fn new(kind: impl Into<String>, data: impl Into<String>, source_url: impl Into<String>) -> Self {
        let data = data.into();
        let preview: String = data.chars().take(PREVIEW_CHARS).collect();
        Self {
            kind: kind.into(),
            preview,
            data,
            source_url: source_url.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only store of past captures.
pub trait HistorySink: Send + Sync {
    fn append(&self, capture: &Capture) -> Result<(), DispatchError>;
}

/// Per-mode usage counters backing the quick-launch list.
pub trait UsageStore: Send + Sync {
    fn increment(&self, mode: Mode) -> Result<(), DispatchError>;
    /// Top `n` modes by descending count. Falls back to a fixed
    /// ordering when no usage has been recorded yet.
    fn top_n(&self, n: usize) -> Vec<Mode>;
}

/// Capped ring of recorded dispatch failures.
pub trait ErrorLog: Send + Sync {
    fn record(&self, entry: &ErrorLogEntry) -> Result<(), DispatchError>;
}

/// Quick-launch ordering used until real usage data accumulates.
pub const FALLBACK_QUICK_LAUNCH: [Mode; 5] = [
    Mode::CleanCopy,
    Mode::TextStatistics,
    Mode::Base64Encode,
    Mode::ColorPicker,
    Mode::Text,
];

fn read_json_vec<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<Vec<T>, DispatchError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| DispatchError::Storage(format!("read {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| DispatchError::Storage(format!("parse {}: {}", path.display(), e)))
}

fn write_json<T: Serialize>(path: &PathBuf, value: &T) -> Result<(), DispatchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DispatchError::Storage(format!("create {}: {}", parent.display(), e)))?;
    }
    let raw = serde_json::to_string_pretty(value)
        .map_err(|e| DispatchError::Storage(format!("serialize: {}", e)))?;
    fs::write(path, raw)
        .map_err(|e| DispatchError::Storage(format!("write {}: {}", path.display(), e)))
}

/// History persisted as a JSON array, newest first.
#[derive(Debug, Clone)]
pub struct JsonHistorySink {
    path: PathBuf,
}

impl JsonHistorySink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn entries(&self) -> Result<Vec<Capture>, DispatchError> {
        read_json_vec(&self.path)
    }
}

impl HistorySink for JsonHistorySink {
    fn append(&self, capture: &Capture) -> Result<(), DispatchError> {
        let mut entries: Vec<Capture> = read_json_vec(&self.path)?;
        entries.insert(0, capture.clone());
        entries.truncate(MAX_HISTORY);
        write_json(&self.path, &entries)?;
        log::debug!("Appended {} capture to history", capture.kind);
        Ok(())
    }
}

/// Usage counters persisted as a JSON object of mode name to count.
#[derive(Debug, Clone)]
pub struct JsonUsageStore {
    path: PathBuf,
}

impl JsonUsageStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn counts(&self) -> Result<HashMap<String, u64>, DispatchError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| DispatchError::Storage(format!("read {}: {}", self.path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| DispatchError::Storage(format!("parse {}: {}", self.path.display(), e)))
    }
}

impl UsageStore for JsonUsageStore {
    fn increment(&self, mode: Mode) -> Result<(), DispatchError> {
        let mut counts = self.counts()?;
        *counts.entry(mode.wire_name()).or_insert(0) += 1;
        write_json(&self.path, &counts)
    }

    fn top_n(&self, n: usize) -> Vec<Mode> {
        let counts = match self.counts() {
            Ok(counts) => counts,
            Err(err) => {
                log::warn!("Failed to read usage counters: {}", err);
                HashMap::new()
            }
        };
        let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let top: Vec<Mode> = entries
            .into_iter()
            .take(n)
            .map(|(name, _)| Mode::parse(&name))
            .collect();
        if top.is_empty() {
            FALLBACK_QUICK_LAUNCH.iter().copied().take(n).collect()
        } else {
            top
        }
    }
}

/// Error log persisted as a JSON array, newest first, capped.
#[derive(Debug, Clone)]
pub struct JsonErrorLog {
    path: PathBuf,
}

impl JsonErrorLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn entries(&self) -> Result<Vec<ErrorLogEntry>, DispatchError> {
        read_json_vec(&self.path)
    }
}

impl ErrorLog for JsonErrorLog {
    fn record(&self, entry: &ErrorLogEntry) -> Result<(), DispatchError> {
        let mut entries: Vec<ErrorLogEntry> = read_json_vec(&self.path)?;
        entries.insert(0, entry.clone());
        entries.truncate(MAX_ERROR_LOG);
        write_json(&self.path, &entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn preview_is_a_bounded_prefix_of_data() {
        let long = "x".repeat(1000);
        let capture = Capture::new("Text", long.clone(), "https://a.test");
        assert_eq!(capture.preview.chars().count(), PREVIEW_CHARS);
        assert!(long.starts_with(&capture.preview));
        assert_eq!(capture.data, long);

        let short = Capture::new("Text", "abc", "https://a.test");
        assert_eq!(short.preview, "abc");
    }

    #[test]
    fn preview_respects_multibyte_boundaries() {
        let data = "é".repeat(400);
        let capture = Capture::new("Text", data, "https://a.test");
        assert_eq!(capture.preview.chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn history_appends_newest_first_and_caps() {
        let dir = tempdir().unwrap();
        let sink = JsonHistorySink::new(dir.path().join("history.json"));
        for i in 0..(MAX_HISTORY + 5) {
            sink.append(&Capture::new("Text", format!("entry {}", i), "u"))
                .unwrap();
        }
        let entries = sink.entries().unwrap();
        assert_eq!(entries.len(), MAX_HISTORY);
        assert_eq!(entries[0].data, format!("entry {}", MAX_HISTORY + 4));
    }

    #[test]
    fn usage_counts_order_top_n() {
        let dir = tempdir().unwrap();
        let store = JsonUsageStore::new(dir.path().join("usage.json"));
        for _ in 0..3 {
            store.increment(Mode::Slugify).unwrap();
        }
        store.increment(Mode::Text).unwrap();
        let top = store.top_n(2);
        assert_eq!(top, vec![Mode::Slugify, Mode::Text]);
    }

    #[test]
    fn empty_usage_falls_back_to_fixed_ordering() {
        let dir = tempdir().unwrap();
        let store = JsonUsageStore::new(dir.path().join("usage.json"));
        assert_eq!(store.top_n(5), FALLBACK_QUICK_LAUNCH.to_vec());
    }

    #[test]
    fn error_log_is_a_capped_ring() {
        let dir = tempdir().unwrap();
        let log = JsonErrorLog::new(dir.path().join("errors.json"));
        for i in 0..(MAX_ERROR_LOG + 3) {
            log.record(&ErrorLogEntry::new(
                &DispatchError::Storage(format!("failure {}", i)),
                "dispatch",
                "https://a.test",
            ))
            .unwrap();
        }
        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), MAX_ERROR_LOG);
        assert!(entries[0]
            .message
            .contains(&format!("failure {}", MAX_ERROR_LOG + 2)));
    }
}
