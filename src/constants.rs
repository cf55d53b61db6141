//! Global constants for auditwatch
//!
//! Centralized location for application-wide constants

/// Application subsystem identifier for macOS Unified Logging System
pub const APP_SUBSYSTEM: &str = "com.microsoft.sysinternals.auditwatch";

/// Audit pipe device delivering live BSM records
pub const DEFAULT_AUDIT_PIPE: &str = "/dev/auditpipe";

/// Event id to event name database shipped with OpenBSM
pub const DEFAULT_EVENT_DATABASE: &str = "/etc/security/audit_event";

/// MAXPATHLEN, including the terminating NUL
pub const MAX_PATH_LEN: usize = 1024;

/// PROC_PIDPATHINFO_MAXSIZE, including the terminating NUL
pub const MAX_PROC_PATH_LEN: usize = 4096;

/// Longest event name kept from the event database
pub const MAX_EVENT_NAME_LEN: usize = 127;

/// Upper bound on a single record's declared byte count
pub const MAX_RECORD_LEN: usize = 1 << 20;

/// Text shown in place of a name that could not be resolved
pub const UNKNOWN_NAME: &str = "unknown";
