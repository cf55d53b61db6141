//! Shared fixtures for command line tests
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const AUT_HEADER32: u8 = 0x14;
const AUT_TRAILER: u8 = 0x13;
const AUT_SUBJECT32: u8 = 0x24;
const AUT_PATH: u8 = 0x23;
const AUT_RETURN32: u8 = 0x27;

/// Encode one BSM record: header, optional subject and path, return, trailer
pub fn record(event_type: u16, pid: Option<u32>, path: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(pid) = pid {
        body.push(AUT_SUBJECT32);
        for v in [501u32, 501, 20, 501, 20, pid, 100_001, 0, 0] {
            body.extend_from_slice(&v.to_be_bytes());
        }
    }
    if let Some(path) = path {
        body.push(AUT_PATH);
        body.extend_from_slice(&((path.len() + 1) as u16).to_be_bytes());
        body.extend_from_slice(path.as_bytes());
        body.push(0);
    }
    body.extend_from_slice(&[AUT_RETURN32, 0, 0, 0, 0, 0]);

    let total = 18 + body.len() + 7;
    let mut record = vec![AUT_HEADER32];
    record.extend_from_slice(&(total as u32).to_be_bytes());
    record.push(11);
    record.extend_from_slice(&event_type.to_be_bytes());
    record.extend_from_slice(&0u16.to_be_bytes());
    record.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    record.extend_from_slice(&0u32.to_be_bytes());
    record.extend_from_slice(&body);
    record.push(AUT_TRAILER);
    record.extend_from_slice(&0xb105u16.to_be_bytes());
    record.extend_from_slice(&(total as u32).to_be_bytes());
    record
}

/// Temporary directory holding a trail file and an event database
pub struct TrailFixture {
    pub temp_dir: TempDir,
}

impl TrailFixture {
    pub fn new(records: &[Vec<u8>]) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("trail"), records.concat()).unwrap();
        fs::write(
            temp_dir.path().join("audit_event"),
            "0:AUE_NULL:indir system call:no\n72:AUE_OPEN_R:open(2) - read:fr\n5:AUE_OPEN_RC:open(2) - read,creat:fc,fr,fa\n",
        )
        .unwrap();
        Self { temp_dir }
    }

    pub fn trail(&self) -> PathBuf {
        self.temp_dir.path().join("trail")
    }

    pub fn event_db(&self) -> PathBuf {
        self.temp_dir.path().join("audit_event")
    }
}
