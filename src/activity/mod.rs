use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activity log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the API activity log (`~/.lifetrack/activity.jsonl`).
///
/// One line per gateway call. Read back by `lifetrack health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    /// Endpoint path without query string, e.g. `/measurements`.
    pub endpoint: String,
    /// HTTP status, absent when the request never got a response.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    pub success: bool,
    pub latency_ms: u64,
}

/// Summary of the activity log over a window.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActivitySummary {
    pub calls: usize,
    pub failures: usize,
    pub avg_latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Appends activity entries to a JSONL file. Best-effort: I/O failures are
/// reported through `tracing` and never fail the API call being logged.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    /// Log to the default location (`~/.lifetrack/activity.jsonl`).
    pub fn default_location() -> Self {
        Self {
            path: activity_log_path(),
        }
    }

    /// Log to an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record one API call.
    pub fn record(&self, method: &str, endpoint: &str, status: Option<u16>, latency_ms: u64) {
        let Some(path) = &self.path else {
            return;
        };

        let entry = ActivityEntry {
            timestamp: Utc::now(),
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            status,
            success: status.is_some_and(|s| (200..300).contains(&s)),
            latency_ms,
        };

        if let Err(e) = append_entry(path, &entry) {
            tracing::debug!(error = %e, "failed to append activity entry");
        }
    }
}

fn append_entry(path: &Path, entry: &ActivityEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read all entries from `path`, skipping malformed lines. A missing file
/// yields an empty list.
pub fn read_entries(path: &Path) -> Vec<ActivityEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
        .collect()
}

/// Entries newer than `days` days. `None` returns everything.
pub fn read_entries_since_days(path: &Path, days: Option<u32>) -> Vec<ActivityEntry> {
    let entries = read_entries(path);

    let Some(days) = days else {
        return entries;
    };

    let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
    entries
        .into_iter()
        .filter(|e| e.timestamp >= cutoff)
        .collect()
}

/// Aggregate call counts and latency.
pub fn summarize(entries: &[ActivityEntry]) -> ActivitySummary {
    if entries.is_empty() {
        return ActivitySummary::default();
    }

    let failures = entries.iter().filter(|e| !e.success).count();
    let total_latency: u64 = entries.iter().map(|e| e.latency_ms).sum();

    ActivitySummary {
        calls: entries.len(),
        failures,
        avg_latency_ms: total_latency / entries.len() as u64,
    }
}

/// Return the path to the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".lifetrack").join("activity.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
