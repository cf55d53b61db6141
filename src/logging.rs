//! Diagnostic logging
//!
//! Messages go to stderr so stdout carries nothing but matches. On macOS
//! they are also sent to the unified logging system under the
//! application subsystem.

use anyhow::{anyhow, Result};
use log::{LevelFilter, Log, Metadata, Record};
use simple_logger::SimpleLogger;

struct Logger {
    stderr: SimpleLogger,
    #[cfg(target_os = "macos")]
    unified: oslog::OsLogger,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.stderr.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.stderr.log(record);
        #[cfg(target_os = "macos")]
        self.unified.log(record);
    }

    fn flush(&self) {
        self.stderr.flush();
        #[cfg(target_os = "macos")]
        self.unified.flush();
    }
}

/// Install the process wide logger at `level`
pub fn init_logger(level: LevelFilter) -> Result<()> {
    let logger = Logger {
        stderr: SimpleLogger::new().with_level(level),
        #[cfg(target_os = "macos")]
        unified: oslog::OsLogger::new(crate::constants::APP_SUBSYSTEM).level_filter(level),
    };

    log::set_boxed_logger(Box::new(logger)).map_err(|e| anyhow!("Failed to install logger: {}", e))?;
    log::set_max_level(level);
    Ok(())
}
