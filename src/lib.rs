//! auditwatch - OpenBSM audit record watcher
//!
//! This library exposes record decoding, the lookup tables, filtering and
//! the watch loop used by the `auditwatch` binary.

#![deny(unsafe_code)]

pub mod bsm;
pub mod cli;
pub mod config;
pub mod constants;
pub mod filter;
pub mod logging;
pub mod models;
pub mod output;
pub mod source;
pub mod tables;
pub mod watch;
