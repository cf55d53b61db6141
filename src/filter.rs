//! Record filtering
//!
//! A record is shown when its path contains the configured substring and
//! every optional constraint holds. A pid or event type of 0 counts as
//! "not configured". A process name constraint fails when no executable
//! path is cached for the record's pid.

use crate::models::{AuditEntry, ProcessFilter, WatchFilter};
use crate::tables::{PathResolver, ProcessNameTable};

/// Check whether `entry` satisfies every configured constraint
pub fn matches<R: PathResolver>(
    entry: &AuditEntry,
    filter: &WatchFilter,
    processes: &ProcessNameTable<R>,
) -> bool {
    if !entry.path.contains(filter.path.as_str()) {
        return false;
    }

    if let Some(event_type) = filter.event_type {
        if event_type != 0 && entry.event_type != event_type {
            return false;
        }
    }

    match &filter.process {
        Some(ProcessFilter::Pid(pid)) if *pid != 0 => entry.process_id == *pid,
        // pid 0 means the record had no subject
        Some(ProcessFilter::Name(name)) => {
            entry.process_id != 0
                && processes
                    .lookup(entry.process_id)
                    .map_or(false, |path| path.contains(name.as_str()))
        }
        _ => true,
    }
}
