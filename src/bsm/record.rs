//! Record framing for BSM byte streams
//!
//! A stream from the audit pipe or a trail file is a plain concatenation of
//! records. Each record starts with a header token whose second field is
//! the byte count of the whole record. Trail files may additionally carry
//! file tokens marking where one trail ends and the next begins.

use super::tokens::{is_header, AUT_OTHER_FILE32};
use crate::constants::MAX_RECORD_LEN;
use std::io::{self, BufReader, ErrorKind, Read};

/// id (1) + record byte count (4)
const MIN_RECORD_LEN: usize = 5;

/// id (1) + seconds (4) + milliseconds (4) + name length (2)
const FILE_TOKEN_FIXED_LEN: usize = 11;

/// Read one raw record.
///
/// Returns `Ok(None)` on a clean end of stream. A stream that ends inside a
/// record fails with `UnexpectedEof`; a record that does not start with a
/// header or file token fails with `InvalidData`.
pub fn read_record<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut id = [0u8; 1];
    loop {
        match reader.read(&mut id) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let id = id[0];
    if is_header(id) {
        let mut size = [0u8; 4];
        reader.read_exact(&mut size)?;
        let record_len = u32::from_be_bytes(size) as usize;
        if !(MIN_RECORD_LEN..=MAX_RECORD_LEN).contains(&record_len) {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("record declares invalid length {}", record_len),
            ));
        }

        let mut record = Vec::with_capacity(record_len);
        record.push(id);
        record.extend_from_slice(&size);
        record.resize(record_len, 0);
        reader.read_exact(&mut record[MIN_RECORD_LEN..])?;
        Ok(Some(record))
    } else if id == AUT_OTHER_FILE32 {
        let mut record = vec![0u8; FILE_TOKEN_FIXED_LEN];
        record[0] = id;
        reader.read_exact(&mut record[1..])?;
        let name_len = u16::from_be_bytes([record[9], record[10]]) as usize;
        record.resize(FILE_TOKEN_FIXED_LEN + name_len, 0);
        reader.read_exact(&mut record[FILE_TOKEN_FIXED_LEN..])?;
        Ok(Some(record))
    } else {
        Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("record starts with unexpected token id {:#04x}", id),
        ))
    }
}

/// Buffered record reader over any byte stream
pub struct RecordReader<R> {
    inner: BufReader<R>,
}

impl<R: Read> RecordReader<R> {
    /// Large enough to hold typical records in a single device read
    const BUFFER_SIZE: usize = 64 * 1024;

    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::with_capacity(Self::BUFFER_SIZE, inner),
        }
    }

    /// Next raw record, `None` at end of stream
    pub fn read_next(&mut self) -> io::Result<Option<Vec<u8>>> {
        read_record(&mut self.inner)
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }
}
