//! Output formatting module
//!
//! Handles:
//! - Building the canonical MatchEvent for a matching record
//! - Human-readable single line output
//! - JSON lines output
//! - The event list printed by `-l`

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use time::OffsetDateTime;

use crate::constants::UNKNOWN_NAME;
use crate::models::AuditEntry;
use crate::tables::EventNameTable;

/// Canonical structure for a record that passed the filter.
/// Both output formats are rendered from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEvent {
    /// ISO 8601 time from the record header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub path: String,
    pub event_type: u16,
    pub event_name: Option<String>,
    pub pid: u32,
    pub uid: u32,
    /// Cached executable path of the subject process
    pub process: Option<String>,
}

/// Create a MatchEvent from a decoded entry and its resolved names
pub fn create_match_event(
    entry: &AuditEntry,
    event_name: Option<&str>,
    process_name: Option<&str>,
) -> Result<MatchEvent> {
    let timestamp = match entry.timestamp {
        Some(t) => Some(
            OffsetDateTime::from(t).format(&time::format_description::well_known::Iso8601::DEFAULT)?,
        ),
        None => None,
    };

    Ok(MatchEvent {
        timestamp,
        path: entry.path.clone(),
        event_type: entry.event_type,
        event_name: event_name.map(str::to_string),
        pid: entry.process_id,
        uid: entry.user_id,
        process: process_name.map(str::to_string),
    })
}

/// Format a match as `path:<path> event:<name>(<id>) process:<path>(<pid>)`
pub fn format_event_human(event: &MatchEvent) -> String {
    format!(
        "path:{} event:{}({}) process:{}({})",
        event.path,
        event.event_name.as_deref().unwrap_or(UNKNOWN_NAME),
        event.event_type,
        event.process.as_deref().unwrap_or(UNKNOWN_NAME),
        event.pid
    )
}

/// Format a match as a single JSON object
pub fn format_event_json(event: &MatchEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

/// Print every known event as `id:name`, ordered by id
pub fn write_event_list<W: Write>(out: &mut W, events: &EventNameTable) -> Result<()> {
    for (id, name) in events.iter() {
        writeln!(out, "{}:{}", id, name)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, UNIX_EPOCH};

    fn entry() -> AuditEntry {
        AuditEntry {
            path: "/etc/passwd".to_string(),
            process_id: 42,
            user_id: 501,
            event_type: 72,
            timestamp: Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
        }
    }

    #[test]
    fn test_human_format_with_names() {
        let event = create_match_event(&entry(), Some("AUE_OPEN_R"), Some("/usr/sbin/sshd")).unwrap();
        assert_eq!(
            format_event_human(&event),
            "path:/etc/passwd event:AUE_OPEN_R(72) process:/usr/sbin/sshd(42)"
        );
    }

    #[test]
    fn test_human_format_falls_back_for_unknown_names() {
        let event = create_match_event(&entry(), None, None).unwrap();
        assert_eq!(
            format_event_human(&event),
            "path:/etc/passwd event:unknown(72) process:unknown(42)"
        );
    }

    #[test]
    fn test_json_format_fields() {
        let event = create_match_event(&entry(), Some("AUE_OPEN_R"), None).unwrap();
        let json: serde_json::Value = serde_json::from_str(&format_event_json(&event).unwrap()).unwrap();

        assert_eq!(json["path"], "/etc/passwd");
        assert_eq!(json["event_type"], 72);
        assert_eq!(json["event_name"], "AUE_OPEN_R");
        assert_eq!(json["pid"], 42);
        assert_eq!(json["uid"], 501);
        assert!(json["process"].is_null());
        assert!(json["timestamp"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn test_json_omits_missing_timestamp() {
        let no_time = AuditEntry {
            timestamp: None,
            ..entry()
        };
        let event = create_match_event(&no_time, None, None).unwrap();
        let json: serde_json::Value = serde_json::from_str(&format_event_json(&event).unwrap()).unwrap();
        assert!(json.get("timestamp").is_none());
    }

    #[test]
    fn test_event_list() {
        let events = EventNameTable::from_reader(Cursor::new(b"72:AUE_OPEN_R:x\n1:AUE_EXIT:y\n".to_vec()));
        let mut out = Vec::new();
        write_event_list(&mut out, &events).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1:AUE_EXIT\n72:AUE_OPEN_R\n");
    }
}
