//! User Action Log
//!
//! Append-only audit trail of every RPC call and its outcome, meant to ease
//! user support.
//!
//! Storage layout (file sink):
//! ```text
//! userActionLogs.log   # one JSON entry per line, oldest first
//! ```
//!
//! Reads are newest-first: index 0 is the most recent entry. A malformed
//! line (e.g. a torn trailing write) is skipped, never fatal.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::types::Kwargs;

/// Entries returned by a read when the caller does not say
pub const DEFAULT_NUM_LOGS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActionLogEntry {
    pub level: LogLevel,
    /// Method name of the call
    pub event: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default)]
    pub kwargs: Kwargs,
    /// Only present on errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl UserActionLogEntry {
    pub fn info(event: &str, message: &str, kwargs: Kwargs, result: Value) -> Self {
        Self {
            level: LogLevel::Info,
            event: event.to_string(),
            message: message.to_string(),
            result: Some(result),
            kwargs,
            stack: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn error(event: &str, message: &str, kwargs: Kwargs, stack: Option<String>) -> Self {
        Self {
            level: LogLevel::Error,
            event: event.to_string(),
            message: message.to_string(),
            result: None,
            kwargs,
            stack,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Storage for user action logs
///
/// `record` must be atomic per entry under concurrent callers.
pub trait UserActionLogSink: Send + Sync {
    fn record(&self, entry: &UserActionLogEntry) -> anyhow::Result<()>;

    /// `num_entries` entries starting at `from_index`, newest first
    fn read(&self, from_index: usize, num_entries: usize) -> anyhow::Result<Vec<UserActionLogEntry>>;
}

/// Parse newline-delimited entries, skipping lines that do not parse
///
/// Returns entries in file order (oldest first).
pub fn parse_lines(text: &str) -> Vec<UserActionLogEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(op = "rpc.user_log.parse_skip", error = %e, "Skipping malformed log line");
                None
            }
        })
        .collect()
}

/// Newest-first window over an oldest-first list
fn window(entries: &[UserActionLogEntry], from_index: usize, num_entries: usize) -> Vec<UserActionLogEntry> {
    entries
        .iter()
        .rev()
        .skip(from_index)
        .take(num_entries)
        .cloned()
        .collect()
}

// =============================================================================
// File sink
// =============================================================================

/// NDJSON file sink
pub struct FileUserActionLog {
    path: PathBuf,
    /// Single-writer discipline around appends
    writer: Mutex<()>,
}

impl FileUserActionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        Ok(())
    }
}

impl UserActionLogSink for FileUserActionLog {
    fn record(&self, entry: &UserActionLogEntry) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("user action log writer lock poisoned"))?;

        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;

        // One write per entry so readers never see half of two lines
        file.write_all(line.as_bytes())?;
        file.flush()?;

        tracing::debug!(
            op = "rpc.user_log.append",
            event = %entry.event,
            level = ?entry.level,
            "User action logged"
        );

        Ok(())
    }

    fn read(&self, from_index: usize, num_entries: usize) -> anyhow::Result<Vec<UserActionLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Ok(window(&parse_lines(&text), from_index, num_entries))
    }
}

// =============================================================================
// In-memory sink
// =============================================================================

/// Sink kept in memory (tests, embedded UIs without a writable disk)
#[derive(Default)]
pub struct MemoryUserActionLog {
    entries: RwLock<Vec<UserActionLogEntry>>,
}

impl MemoryUserActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, oldest first
    pub fn entries(&self) -> Vec<UserActionLogEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }
}

impl UserActionLogSink for MemoryUserActionLog {
    fn record(&self, entry: &UserActionLogEntry) -> anyhow::Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow::anyhow!("user action log lock poisoned"))?
            .push(entry.clone());
        Ok(())
    }

    fn read(&self, from_index: usize, num_entries: usize) -> anyhow::Result<Vec<UserActionLogEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("user action log lock poisoned"))?;
        Ok(window(&entries, from_index, num_entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(n: usize) -> UserActionLogEntry {
        UserActionLogEntry::info(&format!("call{}", n), "ok", Kwargs::new(), json!(n))
    }

    #[test]
    fn test_newest_first() {
        let temp = TempDir::new().unwrap();
        let log = FileUserActionLog::new(temp.path().join("userActionLogs.log"));
        for n in 0..5 {
            log.record(&entry(n)).unwrap();
        }

        let all = log.read(0, DEFAULT_NUM_LOGS).unwrap();
        let events: Vec<_> = all.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(events, ["call4", "call3", "call2", "call1", "call0"]);

        let page = log.read(1, 2).unwrap();
        let events: Vec<_> = page.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(events, ["call3", "call2"]);
    }

    #[test]
    fn test_out_of_bounds_is_empty() {
        let temp = TempDir::new().unwrap();
        let log = FileUserActionLog::new(temp.path().join("userActionLogs.log"));
        assert!(log.read(0, 50).unwrap().is_empty());

        log.record(&entry(0)).unwrap();
        assert!(log.read(1, 50).unwrap().is_empty());
        assert!(log.read(100, 50).unwrap().is_empty());
        assert!(log.read(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_reads_identical() {
        let log = MemoryUserActionLog::new();
        for n in 0..3 {
            log.record(&entry(n)).unwrap();
        }
        assert_eq!(log.read(0, 50).unwrap(), log.read(0, 50).unwrap());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("userActionLogs.log");
        let log = FileUserActionLog::new(&path);
        log.record(&entry(0)).unwrap();
        log.record(&entry(1)).unwrap();

        // Torn trailing write
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"level":"info","event":"cut"#).unwrap();

        let all = log.read(0, 50).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].event, "call1");
    }

    #[test]
    fn test_creates_parent_dir() {
        let temp = TempDir::new().unwrap();
        let log = FileUserActionLog::new(temp.path().join("logs").join("userActionLogs.log"));
        log.record(&entry(0)).unwrap();
        assert_eq!(log.read(0, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_entry_wire_format() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("id".to_string(), json!("dnpName"));
        let e = UserActionLogEntry::error("installPackage", "No such DNP", kwargs, Some("at x".into()));
        let value = serde_json::to_value(&e).unwrap();

        assert_eq!(value["level"], "error");
        assert_eq!(value["event"], "installPackage");
        assert_eq!(value["kwargs"], json!({ "id": "dnpName" }));
        assert_eq!(value["stack"], "at x");
        assert!(value.get("result").is_none());
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_concurrent_appends() {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(FileUserActionLog::new(temp.path().join("userActionLogs.log")));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for n in 0..25 {
                        log.record(&entry(t * 100 + n)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let all = log.read(0, 1000).unwrap();
        assert_eq!(all.len(), 200);
        let mut events: Vec<_> = all.into_iter().map(|e| e.event).collect();
        events.sort();
        events.dedup();
        assert_eq!(events.len(), 200);
    }
}
