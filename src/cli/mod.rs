//! CLI argument parsing and validation module
//!
//! Handles command-line interface using clap, including:
//! - The path filter and the optional process and event constraints
//! - Listing the event database with `-l`
//! - Record source selection (audit pipe device or trail file)
//! - Output format, quiet and verbose modes
//! - Merging an optional settings file beneath the flags

use crate::config::WatchSettings;
use crate::models::{OutputFormat, ProcessFilter, SourceSpec, WatchConfiguration, WatchFilter};
use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

/// What the command line asks for
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Print the event database and exit
    ListEvents { event_database: PathBuf },
    /// Watch records matching the configuration
    Watch(WatchConfiguration),
}

/// Command line mistakes, reported together with the usage text
#[derive(Debug, Error)]
pub enum UsageError {
    /// Rendered by clap, usage included
    #[error("{0}")]
    Rejected(String),
    #[error("invalid process '{0}': expected a pid or a name")]
    InvalidProcess(String),
    #[error("invalid event id '{0}': expected a number from 0 to 65535")]
    InvalidEvent(String),
}

impl UsageError {
    /// Message followed by the usage line
    pub fn render(&self) -> String {
        match self {
            UsageError::Rejected(message) => message.trim_end().to_string(),
            other => format!("error: {}\n\n{}", other, build_command().render_usage()),
        }
    }
}

pub fn build_command() -> Command {
    Command::new("auditwatch")
        .version(env!("AUDITWATCH_VERSION"))
        .long_version(concat!(env!("AUDITWATCH_VERSION"), " (", env!("GIT_HASH"), ")"))
        .about("Watch audited file access on macOS")
        .long_about(
            "Streams OpenBSM audit records from the audit pipe and prints every record \
             whose file path contains FILTER, optionally restricted to one process or event type.",
        )
        .arg(
            Arg::new("filter")
                .value_name("FILTER")
                .help("Substring the audited file path must contain")
                .required_unless_present("list"),
        )
        .arg(
            Arg::new("process")
                .short('p')
                .long("process")
                .value_name("PID|NAME")
                .help("Only records from this pid, or from processes whose path contains NAME"),
        )
        .arg(
            Arg::new("event")
                .short('e')
                .long("event")
                .value_name("EVENT_ID")
                .help("Only records of this event type"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List known events as id:name and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Output in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Do not print the startup banner")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log diagnostics to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML settings file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .value_name("PATH")
                .help("Audit pipe device [default: /dev/auditpipe]")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("trail")
                .long("trail")
                .value_name("FILE")
                .help("Replay a recorded audit trail instead of the live device")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("event_db")
                .long("event-db")
                .value_name("FILE")
                .help("Event name database [default: /etc/security/audit_event]")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

/// Parse the process arguments
pub fn parse_args() -> Result<Invocation> {
    parse_args_from(std::env::args_os())
}

/// Parse `args`, the first item being the program name.
///
/// Help and version requests print and exit here. Other clap failures
/// and invalid values come back as `UsageError`.
pub fn parse_args_from<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match build_command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => return Err(UsageError::Rejected(e.to_string()).into()),
    };

    if matches.get_flag("list") {
        // Nothing but the database location matters when listing
        let event_database = matches
            .get_one::<PathBuf>("event_db")
            .cloned()
            .unwrap_or_else(|| WatchSettings::default().event_database);
        return Ok(Invocation::ListEvents { event_database });
    }

    let filter = WatchFilter {
        path: matches.get_one::<String>("filter").cloned().unwrap_or_default(),
        process: matches.get_one::<String>("process").map(|s| parse_process(s)).transpose()?,
        event_type: matches.get_one::<String>("event").map(|s| parse_event(s)).transpose()?,
    };

    let settings = match matches.get_one::<PathBuf>("config") {
        Some(path) => WatchSettings::load(path)?,
        None => WatchSettings::default(),
    };

    Ok(Invocation::Watch(build_configuration(&matches, filter, settings)?))
}

fn build_configuration(matches: &ArgMatches, filter: WatchFilter, settings: WatchSettings) -> Result<WatchConfiguration> {
    let source = match matches.get_one::<PathBuf>("trail") {
        Some(trail) => SourceSpec::Trail(trail.clone()),
        None => SourceSpec::Device(matches.get_one::<PathBuf>("device").cloned().unwrap_or(settings.device.clone())),
    };

    let output = if matches.get_flag("json") || settings.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        settings.level_filter()?
    };

    Ok(WatchConfiguration {
        filter,
        source,
        event_database: matches.get_one::<PathBuf>("event_db").cloned().unwrap_or(settings.event_database),
        output,
        quiet_mode: matches.get_flag("quiet"),
        log_level,
    })
}

/// A number is a pid, anything else part of an executable path
fn parse_process(value: &str) -> Result<ProcessFilter, UsageError> {
    if value.is_empty() {
        return Err(UsageError::InvalidProcess(value.to_string()));
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<u32>()
            .map(ProcessFilter::Pid)
            .map_err(|_| UsageError::InvalidProcess(value.to_string()));
    }
    Ok(ProcessFilter::Name(value.to_string()))
}

fn parse_event(value: &str) -> Result<u16, UsageError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| UsageError::InvalidEvent(value.to_string()))
}
