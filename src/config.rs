//! Settings file
//!
//! Optional TOML file supplying defaults for options that are not given on
//! the command line. Every key may be omitted:
//!
//! ```toml
//! device = "/dev/auditpipe"
//! event_database = "/etc/security/audit_event"
//! json = false
//! log_level = "warn"
//! ```

use crate::constants::{DEFAULT_AUDIT_PIPE, DEFAULT_EVENT_DATABASE};
use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults applied beneath command line options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSettings {
    /// Audit pipe device to read from
    pub device: PathBuf,
    /// Event id to name database
    pub event_database: PathBuf,
    /// Print matches as JSON lines
    pub json: bool,
    /// One of off, error, warn, info, debug, trace
    pub log_level: String,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_AUDIT_PIPE),
            event_database: PathBuf::from(DEFAULT_EVENT_DATABASE),
            json: false,
            log_level: "warn".to_string(),
        }
    }
}

impl WatchSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.level_filter()?;
        Ok(settings)
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| anyhow!("Unknown log level '{}'", self.log_level))
    }
}
