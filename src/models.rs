//! Data models module
//!
//! Defines core data structures:
//! - AuditEntry: Fields decoded from one BSM record
//! - WatchFilter: Predicates a record must satisfy to be printed
//! - WatchConfiguration: Everything the watch loop needs to start
//! - WatchStats: Counters reported when watching stops

use std::path::PathBuf;
use std::time::SystemTime;

/// Fields extracted from a single audit record.
///
/// Every field starts out absent (zero or empty). When a record carries
/// more than one header or subject token, the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditEntry {
    /// Path from the record's path token, empty if there was none
    pub path: String,
    /// Subject process id, 0 if the record had no subject token
    pub process_id: u32,
    /// Subject real user id
    pub user_id: u32,
    /// Event type from the record header
    pub event_type: u16,
    /// Time the record was generated, from the record header
    pub timestamp: Option<SystemTime>,
}

/// Process constraint given with `-p`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessFilter {
    /// Exact process id
    Pid(u32),
    /// Substring of the cached executable path
    Name(String),
}

/// Filter criteria for watched records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchFilter {
    /// Substring the record path must contain
    pub path: String,
    /// Optional process constraint
    pub process: Option<ProcessFilter>,
    /// Optional event type constraint
    pub event_type: Option<u16>,
}

/// Output style for matched records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Where records are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Live audit pipe device, configured before streaming
    Device(PathBuf),
    /// Recorded trail file, replayed as is
    Trail(PathBuf),
}

/// Configuration for the watch loop
#[derive(Debug, Clone)]
pub struct WatchConfiguration {
    pub filter: WatchFilter,
    pub source: SourceSpec,
    pub event_database: PathBuf,
    pub output: OutputFormat,
    /// Suppress the startup banner
    pub quiet_mode: bool,
    pub log_level: log::LevelFilter,
}

/// Summary statistics for a watch session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchStats {
    /// Records read from the source
    pub records: u64,
    /// Records that matched the filter and were printed
    pub matched: u64,
    /// Records whose token walk stopped before the end
    pub partial: u64,
}

/// Convert raw bytes to a string of at most `max` bytes.
///
/// The input is cut at the first NUL, truncated and then decoded lossily.
pub(crate) fn bounded_string(bytes: &[u8], max: usize) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end.min(max)];
    String::from_utf8_lossy(bytes).into_owned()
}
