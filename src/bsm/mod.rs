//! OpenBSM record decoding
//!
//! Walks the token sequence of a single audit record and extracts the
//! fields used for filtering and display:
//! - header tokens provide the event type and time
//! - subject tokens provide the acting pid and real uid
//! - path tokens provide the referenced file path
//!
//! Decoding is best effort. A malformed or unknown token ends the walk
//! and whatever was decoded before it is kept.

pub mod record;
pub mod tokens;

use crate::constants::MAX_PATH_LEN;
use crate::models::{bounded_string, AuditEntry};
use log::debug;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub use record::{read_record, RecordReader};
pub use tokens::{Header, Subject, Token};

/// Reasons a token walk stops before the end of the record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown token id {id:#04x} at offset {offset}")]
    UnknownToken { id: u8, offset: usize },
    #[error("token {id:#04x} at offset {offset} is truncated")]
    Truncated { id: u8, offset: usize },
    #[error("token {id:#04x} at offset {offset} is malformed")]
    Malformed { id: u8, offset: usize },
}

/// A token together with its position in the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    pub offset: usize,
    /// Encoded length including the id byte
    pub len: usize,
    pub token: Token<'a>,
}

/// Lazy iterator over the tokens of one record.
///
/// Yields at most one error, after which it is exhausted.
pub struct TokenReader<'a> {
    record: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> TokenReader<'a> {
    pub fn new(record: &'a [u8]) -> Self {
        Self {
            record,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for TokenReader<'a> {
    type Item = Result<ParsedToken<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.record.len() {
            return None;
        }

        let offset = self.offset;
        let input = &self.record[offset..];
        let id = input[0];

        match tokens::token_body(id, &input[1..]) {
            Ok((rest, token)) => {
                let len = input.len() - rest.len();
                self.offset += len;
                Some(Ok(ParsedToken { offset, len, token }))
            }
            Err(e) => {
                self.failed = true;
                let kind = match e {
                    nom::Err::Error(e) | nom::Err::Failure(e) => e.code,
                    nom::Err::Incomplete(_) => nom::error::ErrorKind::Eof,
                };
                Some(Err(match kind {
                    nom::error::ErrorKind::Tag => DecodeError::UnknownToken { id, offset },
                    nom::error::ErrorKind::Eof => DecodeError::Truncated { id, offset },
                    _ => DecodeError::Malformed { id, offset },
                }))
            }
        }
    }
}

/// Decode one record into an `AuditEntry`.
///
/// `on_subject` is called with the pid of every subject token, in record
/// order, so callers can refresh cached process information.
pub fn decode_record<F: FnMut(u32)>(record: &[u8], on_subject: F) -> AuditEntry {
    decode_record_checked(record, on_subject).0
}

/// Like `decode_record`, also reporting why the walk stopped early
pub fn decode_record_checked<F: FnMut(u32)>(
    record: &[u8],
    mut on_subject: F,
) -> (AuditEntry, Option<DecodeError>) {
    let mut entry = AuditEntry::default();

    for parsed in TokenReader::new(record) {
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Stopped decoding record of {} bytes: {}", record.len(), e);
                return (entry, Some(e));
            }
        };

        match parsed.token {
            Token::Header(header) => {
                entry.event_type = header.event_type;
                entry.timestamp = header_time(&header);
            }
            Token::Subject(subject) => {
                entry.process_id = subject.pid;
                entry.user_id = subject.ruid;
                on_subject(subject.pid);
            }
            Token::Path(path) => {
                entry.path = bounded_string(path, MAX_PATH_LEN - 1);
            }
            Token::Other(_) => {}
        }
    }

    (entry, None)
}

fn header_time(header: &Header) -> Option<SystemTime> {
    let millis = Duration::from_millis(header.millis.min(999));
    UNIX_EPOCH
        .checked_add(Duration::from_secs(header.seconds))?
        .checked_add(millis)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::tokens::*;
    use super::*;

    /// Builds BSM records token by token for tests
    #[derive(Default)]
    pub(crate) struct RecordBuilder {
        body: Vec<u8>,
    }

    impl RecordBuilder {
        pub fn subject32(mut self, pid: u32, ruid: u32) -> Self {
            self.body.push(AUT_SUBJECT32);
            for v in [ruid, ruid, 20, ruid, 20, pid, 100_001, 0] {
                self.body.extend_from_slice(&v.to_be_bytes());
            }
            self.body.extend_from_slice(&[0, 0, 0, 0]);
            self
        }

        pub fn path(mut self, path: &[u8]) -> Self {
            self.body.push(AUT_PATH);
            self.body.extend_from_slice(&((path.len() + 1) as u16).to_be_bytes());
            self.body.extend_from_slice(path);
            self.body.push(0);
            self
        }

        pub fn return32(mut self) -> Self {
            self.body.extend_from_slice(&[AUT_RETURN32, 0, 0, 0, 0, 3]);
            self
        }

        pub fn raw(mut self, bytes: &[u8]) -> Self {
            self.body.extend_from_slice(bytes);
            self
        }

        /// Prefix a 32-bit header and append a trailer
        pub fn build(self, event_type: u16) -> Vec<u8> {
            let total = 18 + self.body.len() + 7;
            let mut record = vec![AUT_HEADER32];
            record.extend_from_slice(&(total as u32).to_be_bytes());
            record.push(11);
            record.extend_from_slice(&event_type.to_be_bytes());
            record.extend_from_slice(&0u16.to_be_bytes());
            record.extend_from_slice(&1_700_000_000u32.to_be_bytes());
            record.extend_from_slice(&125u32.to_be_bytes());
            record.extend_from_slice(&self.body);
            record.push(AUT_TRAILER);
            record.extend_from_slice(&0xb105u16.to_be_bytes());
            record.extend_from_slice(&(total as u32).to_be_bytes());
            record
        }
    }

    #[test]
    fn test_decode_full_record() {
        let record = RecordBuilder::default()
            .path(b"/etc/passwd")
            .subject32(42, 501)
            .return32()
            .build(72);

        let mut refreshed = Vec::new();
        let entry = decode_record(&record, |pid| refreshed.push(pid));

        assert_eq!(entry.path, "/etc/passwd");
        assert_eq!(entry.process_id, 42);
        assert_eq!(entry.user_id, 501);
        assert_eq!(entry.event_type, 72);
        assert_eq!(
            entry.timestamp,
            Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000) + Duration::from_millis(125))
        );
        assert_eq!(refreshed, vec![42]);
    }

    #[test]
    fn test_record_without_subject_has_no_pid() {
        let record = RecordBuilder::default().path(b"/tmp/x").build(1);
        let mut called = false;
        let entry = decode_record(&record, |_| called = true);

        assert_eq!(entry.process_id, 0);
        assert!(!called);
    }

    #[test]
    fn test_record_without_path_has_empty_path() {
        let record = RecordBuilder::default().subject32(7, 0).build(1);
        let entry = decode_record(&record, |_| {});
        assert_eq!(entry.path, "");
    }

    #[test]
    fn test_empty_record_decodes_to_defaults() {
        assert_eq!(decode_record(&[], |_| {}), AuditEntry::default());
    }

    #[test]
    fn test_later_subject_overwrites_earlier() {
        let record = RecordBuilder::default()
            .subject32(10, 1)
            .subject32(20, 2)
            .build(5);

        let mut refreshed = Vec::new();
        let entry = decode_record(&record, |pid| refreshed.push(pid));

        assert_eq!(entry.process_id, 20);
        assert_eq!(entry.user_id, 2);
        assert_eq!(refreshed, vec![10, 20]);
    }

    #[test]
    fn test_unknown_token_keeps_earlier_fields() {
        let record = RecordBuilder::default()
            .subject32(42, 0)
            .raw(&[0xfe, 1, 2, 3])
            .path(b"/never/seen")
            .build(9);

        let (entry, err) = decode_record_checked(&record, |_| {});
        assert_eq!(entry.process_id, 42);
        assert_eq!(entry.event_type, 9);
        assert_eq!(entry.path, "");
        assert!(matches!(err, Some(DecodeError::UnknownToken { id: 0xfe, .. })));
    }

    #[test]
    fn test_identity_token_does_not_disturb_fields() {
        let mut cdhash = vec![AUT_HEADER32, 0, 0, 0, 0x40, 0x0b, 0xde, 0xad];
        cdhash.resize(20, 0x5a);
        let mut identity = vec![AUT_IDENTITY];
        identity.extend(super::tokens::tests::identity_body(&cdhash));

        let record = RecordBuilder::default()
            .path(b"/bin/ls")
            .subject32(42, 501)
            .raw(&identity)
            .build(23);

        let (entry, err) = decode_record_checked(&record, |_| {});
        assert_eq!(err, None);
        assert_eq!(entry.event_type, 23);
        assert_eq!(entry.process_id, 42);
        assert_eq!(entry.path, "/bin/ls");
    }

    #[test]
    fn test_every_truncation_is_safe() {
        let record = RecordBuilder::default()
            .subject32(42, 501)
            .path(b"/etc/passwd")
            .build(72);

        for cut in 0..record.len() {
            let entry = decode_record(&record[..cut], |_| {});
            // Fields only appear once their token is complete
            if cut < 18 {
                assert_eq!(entry, AuditEntry::default());
            }
            if cut < 18 + 37 {
                assert_eq!(entry.process_id, 0);
            }
            if entry.path.is_empty() {
                continue;
            }
            assert_eq!(entry.path, "/etc/passwd");
        }
    }

    #[test]
    fn test_truncation_reports_truncated_token() {
        let record = RecordBuilder::default().path(b"/etc/passwd").build(72);
        let (entry, err) = decode_record_checked(&record[..24], |_| {});
        assert_eq!(entry.event_type, 72);
        assert_eq!(err, Some(DecodeError::Truncated { id: AUT_PATH, offset: 18 }));
    }

    #[test]
    fn test_long_path_is_truncated() {
        let long = vec![b'a'; 3000];
        let record = RecordBuilder::default().path(&long).build(72);
        let entry = decode_record(&record, |_| {});
        assert_eq!(entry.path.len(), MAX_PATH_LEN - 1);
    }

    #[test]
    fn test_token_reader_reports_offsets_and_lengths() {
        let record = RecordBuilder::default().subject32(1, 1).build(3);
        let tokens: Vec<_> = TokenReader::new(&record).collect::<Result<_, _>>().unwrap();

        assert_eq!(tokens.len(), 3);
        assert_eq!((tokens[0].offset, tokens[0].len), (0, 18));
        assert_eq!((tokens[1].offset, tokens[1].len), (18, 37));
        assert_eq!((tokens[2].offset, tokens[2].len), (55, 7));
        assert_eq!(tokens[2].token, Token::Other(AUT_TRAILER));
    }

    #[test]
    fn test_token_reader_stops_after_error() {
        let mut reader = TokenReader::new(&[0xfe, 0, 0]);
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }
}
