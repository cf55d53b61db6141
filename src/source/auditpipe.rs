//! Live audit pipe device
//!
//! The device delivers a copy of every audit record the kernel commits.
//! Before streaming it is switched to local preselection with all event
//! classes selected, for both attributable and non-attributable events,
//! and its queue is raised to the largest length the kernel allows.

// ioctl wrappers are unsafe by construction
#![allow(unsafe_code)]

use super::{RecordSource, SourceError};
use crate::bsm::RecordReader;
use log::{debug, warn};
use nix::libc::{c_int, c_uint};
use std::fs::File;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

/// AUDITPIPE_PRESELECT_MODE_LOCAL
const PRESELECT_MODE_LOCAL: c_int = 2;

/// Success and failure class masks, as `au_mask_t`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuMask {
    pub am_success: c_uint,
    pub am_failure: c_uint,
}

impl AuMask {
    /// Every event class, successful or not
    pub const ALL: AuMask = AuMask {
        am_success: c_uint::MAX,
        am_failure: c_uint::MAX,
    };
}

mod ioctl {
    use super::AuMask;
    use nix::libc::{c_int, c_uint};

    nix::ioctl_write_ptr!(set_qlimit, b'A', 3, c_uint);
    nix::ioctl_read!(get_qlimit_max, b'A', 5, c_uint);
    nix::ioctl_write_ptr!(set_preselect_flags, b'A', 7, AuMask);
    nix::ioctl_write_ptr!(set_preselect_naflags, b'A', 9, AuMask);
    nix::ioctl_write_ptr!(set_preselect_mode, b'A', 15, c_int);
}

pub struct AuditPipe {
    path: PathBuf,
    reader: RecordReader<File>,
}

impl AuditPipe {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened audit pipe {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            reader: RecordReader::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply preselection and queue settings, returning how many steps failed
    pub fn configure(&self) -> usize {
        let fd = self.reader.get_ref().as_raw_fd();
        let mut failed = 0;
        let mut check = |step: &str, result: nix::Result<c_int>| match result {
            Ok(_) => debug!("{} succeeded", step),
            Err(e) => {
                warn!("{} failed on {}: {}", step, self.path.display(), e);
                failed += 1;
            }
        };

        let mode = PRESELECT_MODE_LOCAL;
        // SAFETY: fd is open for the lifetime of self and the argument matches the request type
        check("AUDITPIPE_SET_PRESELECT_MODE", unsafe { ioctl::set_preselect_mode(fd, &mode) });

        match query_qlimit_max(fd) {
            Ok(qlimit) => {
                // SAFETY: as above
                check("AUDITPIPE_SET_QLIMIT", unsafe { ioctl::set_qlimit(fd, &qlimit) });
            }
            Err(e) => check("AUDITPIPE_GET_QLIMIT_MAX", Err(e)),
        }

        let mask = AuMask::ALL;
        // SAFETY: as above
        check("AUDITPIPE_SET_PRESELECT_FLAGS", unsafe { ioctl::set_preselect_flags(fd, &mask) });
        // SAFETY: as above
        check("AUDITPIPE_SET_PRESELECT_NAFLAGS", unsafe { ioctl::set_preselect_naflags(fd, &mask) });

        failed
    }
}

fn query_qlimit_max(fd: RawFd) -> nix::Result<c_uint> {
    let mut qlimit: c_uint = 0;
    // SAFETY: fd is a live descriptor and qlimit outlives the call
    unsafe { ioctl::get_qlimit_max(fd, &mut qlimit) }?;
    debug!("Audit pipe queue limit max is {}", qlimit);
    Ok(qlimit)
}

impl RecordSource for AuditPipe {
    fn next_record(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        self.reader.next_record()
    }
}
