//! Process id to executable path cache
//!
//! Entries are written through on every successful resolution and never
//! evicted. A failed resolution leaves any earlier entry in place, so a
//! process that has exited keeps its last known path. Pid reuse is not
//! detected: the newest successful resolution wins.

use crate::constants::MAX_PROC_PATH_LEN;
use crate::models::bounded_string;
use log::trace;
use std::collections::HashMap;
use std::os::unix::ffi::OsStrExt;
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};

/// Resolves a process id to its current executable path
pub trait PathResolver {
    /// `None` if the process is gone or its path cannot be read
    fn resolve(&mut self, pid: u32) -> Option<String>;
}

/// Resolver backed by `sysinfo`, refreshing one process at a time
pub struct SysinfoResolver {
    system: System,
}

impl SysinfoResolver {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PathResolver for SysinfoResolver {
    fn resolve(&mut self, pid: u32) -> Option<String> {
        let pid = Pid::from_u32(pid);
        if !self.system.refresh_process(pid) {
            return None;
        }

        let exe = self.system.process(pid)?.exe();
        if exe.as_os_str().is_empty() {
            return None;
        }
        Some(bounded_string(exe.as_os_str().as_bytes(), MAX_PROC_PATH_LEN - 1))
    }
}

/// Write-through cache of executable paths keyed by pid
pub struct ProcessNameTable<R> {
    resolver: R,
    paths: HashMap<u32, String>,
}

impl ProcessNameTable<SysinfoResolver> {
    pub fn new() -> Self {
        Self::with_resolver(SysinfoResolver::new())
    }
}

impl Default for ProcessNameTable<SysinfoResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PathResolver> ProcessNameTable<R> {
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            paths: HashMap::new(),
        }
    }

    /// Resolve `pid` again and store the result if there is one
    pub fn refresh(&mut self, pid: u32) {
        match self.resolver.resolve(pid) {
            Some(path) => {
                self.paths.insert(pid, path);
            }
            None => trace!("No executable path for pid {}", pid),
        }
    }

    pub fn lookup(&self, pid: u32) -> Option<&str> {
        self.paths.get(&pid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
