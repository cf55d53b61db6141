//! Watch loop
//!
//! Reads records from a source, decodes them, applies the filter and prints
//! every match. The loop moves through these states:
//!
//! `Idle` -> `Configuring` -> `Streaming` -> `Closed` | `Fatal`
//!
//! `Closed` is reached when the source runs dry or a stop is requested,
//! `Fatal` when the source or the output fails.

use crate::bsm::{self, tokens::is_header};
use crate::filter;
use crate::models::{OutputFormat, WatchConfiguration, WatchFilter, WatchStats};
use crate::output::{create_match_event, format_event_human, format_event_json};
use crate::source::{self, RecordSource};
use crate::tables::{EventNameTable, PathResolver, ProcessNameTable};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Configuring,
    Streaming,
    Closed,
    Fatal,
}

/// Open the configured source and print matches to stdout until it closes
/// or `interrupted` is raised
pub fn start_watching(config: &WatchConfiguration, interrupted: Arc<AtomicBool>) -> Result<WatchStats> {
    let events = EventNameTable::load(&config.event_database);

    if !config.quiet_mode {
        println!("Watching:{}", config.filter.path);
    }

    debug!("Watch state: {:?}", WatchState::Configuring);
    let source = source::open_source(&config.source).context("Could not open audit source")?;

    let stdout = io::stdout();
    let mut watcher = Watcher::new(
        source,
        events,
        ProcessNameTable::new(),
        config.filter.clone(),
        config.output,
        stdout.lock(),
    )
    .with_interrupt(interrupted);

    let stats = watcher.run()?;
    info!(
        "Watch stopped: {} records read, {} matched, {} partially decoded",
        stats.records, stats.matched, stats.partial
    );
    Ok(stats)
}

/// Drives one source through decode, filter and output
pub struct Watcher<S, R, W> {
    source: S,
    events: EventNameTable,
    processes: ProcessNameTable<R>,
    filter: WatchFilter,
    output: OutputFormat,
    out: W,
    interrupted: Arc<AtomicBool>,
    state: WatchState,
    stats: WatchStats,
}

impl<S: RecordSource, R: PathResolver, W: Write> Watcher<S, R, W> {
    pub fn new(
        source: S,
        events: EventNameTable,
        processes: ProcessNameTable<R>,
        filter: WatchFilter,
        output: OutputFormat,
        out: W,
    ) -> Self {
        Self {
            source,
            events,
            processes,
            filter,
            output,
            out,
            interrupted: Arc::new(AtomicBool::new(false)),
            state: WatchState::Idle,
            stats: WatchStats::default(),
        }
    }

    /// Stop before reading the next record once `interrupted` is set
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn stats(&self) -> &WatchStats {
        &self.stats
    }

    pub fn processes(&self) -> &ProcessNameTable<R> {
        &self.processes
    }

    /// Stream records until the source closes, a stop is requested or an
    /// error occurs
    pub fn run(&mut self) -> Result<WatchStats> {
        self.state = WatchState::Streaming;

        while !self.interrupted.load(Ordering::SeqCst) {
            let record = match self.source.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => {
                    debug!("Audit source closed");
                    break;
                }
                Err(e) => {
                    self.state = WatchState::Fatal;
                    return Err(e).context("Reading audit records failed");
                }
            };

            if let Err(e) = self.process_record(&record) {
                self.state = WatchState::Fatal;
                return Err(e);
            }
        }

        self.state = WatchState::Closed;
        Ok(self.stats.clone())
    }

    /// Handle one raw record, returning whether it was printed
    pub fn process_record(&mut self, record: &[u8]) -> Result<bool> {
        match record.first() {
            Some(id) if is_header(*id) => {}
            _ => {
                debug!("Skipping {} byte non-record token", record.len());
                return Ok(false);
            }
        }
        self.stats.records += 1;

        let processes = &mut self.processes;
        let (entry, stopped) = bsm::decode_record_checked(record, |pid| processes.refresh(pid));
        if let Some(reason) = stopped {
            self.stats.partial += 1;
            if reason_is_unexpected(&reason) {
                warn!("Partially decoded audit record: {}", reason);
            }
        }

        if !filter::matches(&entry, &self.filter, &self.processes) {
            return Ok(false);
        }

        let event = create_match_event(
            &entry,
            self.events.lookup(entry.event_type),
            self.processes.lookup(entry.process_id),
        )?;
        let line = match self.output {
            OutputFormat::Human => format_event_human(&event),
            OutputFormat::Json => format_event_json(&event)?,
        };

        writeln!(self.out, "{}", line).context("Failed to write match")?;
        self.out.flush().context("Failed to flush output")?;
        self.stats.matched += 1;
        Ok(true)
    }
}

/// Unknown tokens are routine on newer kernels; broken ones are not
fn reason_is_unexpected(reason: &bsm::DecodeError) -> bool {
    !matches!(reason, bsm::DecodeError::UnknownToken { .. })
}
