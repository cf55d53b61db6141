//! Record sources
//!
//! A source hands out raw BSM records one at a time. The live audit pipe
//! and recorded trail files share the same framing, so both are thin
//! wrappers over `RecordReader`.

pub mod auditpipe;

use crate::bsm::RecordReader;
use crate::models::SourceSpec;
use log::{debug, warn};
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use auditpipe::AuditPipe;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open {}: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read audit record: {0}")]
    Read(#[from] io::Error),
}

/// Anything that yields raw audit records
pub trait RecordSource {
    /// Next raw record, `Ok(None)` once the source is exhausted
    fn next_record(&mut self) -> Result<Option<Vec<u8>>, SourceError>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn next_record(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        (**self).next_record()
    }
}

impl<R: Read> RecordSource for RecordReader<R> {
    fn next_record(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        match self.read_next() {
            // A record cut short by the end of the stream ends it
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                warn!("Audit stream ended inside a record: {}", e);
                Ok(None)
            }
            other => Ok(other?),
        }
    }
}

/// Open a recorded trail file for replay
pub fn open_trail(path: &Path) -> Result<RecordReader<File>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Replaying audit trail {}", path.display());
    Ok(RecordReader::new(file))
}

/// Open and prepare the source described by `spec`.
///
/// A device is put into local preselection mode before it is returned.
/// Failing configuration steps are logged and otherwise ignored.
pub fn open_source(spec: &SourceSpec) -> Result<Box<dyn RecordSource>, SourceError> {
    match spec {
        SourceSpec::Device(path) => {
            let pipe = AuditPipe::open(path)?;
            let failed = pipe.configure();
            if failed > 0 {
                warn!("{} audit pipe configuration step(s) failed", failed);
            }
            Ok(Box::new(pipe))
        }
        SourceSpec::Trail(path) => Ok(Box::new(open_trail(path)?)),
    }
}
