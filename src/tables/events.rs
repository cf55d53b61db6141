//! Event id to event name table
//!
//! Loaded once from the OpenBSM `audit_event` database, whose lines look
//! like `72:AUE_OPEN_R:open(2) - read:fr`. Only the first two fields are
//! used. Malformed lines are skipped and a missing database simply yields
//! an empty table.

use crate::constants::MAX_EVENT_NAME_LEN;
use crate::models::bounded_string;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct EventNameTable {
    names: BTreeMap<u16, String>,
}

impl EventNameTable {
    /// Load the database at `path`, tolerating its absence
    pub fn load(path: &Path) -> Self {
        match File::open(path) {
            Ok(file) => {
                let table = Self::from_reader(BufReader::new(file));
                debug!("Loaded {} event names from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                debug!("Event database {} unavailable: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Build a table from database lines
    pub fn from_reader<R: BufRead>(reader: R) -> Self {
        let mut names = BTreeMap::new();

        for line in reader.split(b'\n') {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Stopped reading event database: {}", e);
                    break;
                }
            };
            let line = String::from_utf8_lossy(&line);

            if let Some((id, name)) = parse_line(&line) {
                names.entry(id).or_insert(name);
            }
        }

        Self { names }
    }

    pub fn lookup(&self, id: u16) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// All entries in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Split `id:name:...` into its id and a bounded name
fn parse_line(line: &str) -> Option<(u16, String)> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split(':');
    let id = fields.next()?.trim().parse::<u16>().ok()?;
    let name = fields.next()?.trim();
    if name.is_empty() {
        return None;
    }
    Some((id, bounded_string(name.as_bytes(), MAX_EVENT_NAME_LEN)))
}
