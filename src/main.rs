#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use auditwatch::cli::{self, Invocation, UsageError};
use auditwatch::tables::EventNameTable;
use auditwatch::{logging, output, watch};
use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn main() -> Result<()> {
    let invocation = match cli::parse_args() {
        Ok(invocation) => invocation,
        Err(e) => match e.downcast_ref::<UsageError>() {
            Some(usage) => {
                println!("{}", usage.render());
                std::process::exit(1);
            }
            None => return Err(e),
        },
    };

    match invocation {
        Invocation::ListEvents { event_database } => {
            let events = EventNameTable::load(&event_database);
            let stdout = io::stdout();
            output::write_event_list(&mut stdout.lock(), &events)
        }
        Invocation::Watch(config) => {
            // Graceful degradation if logging fails
            let _ = logging::init_logger(config.log_level);

            // Set up interrupt handling; a second signal exits at once with status 0
            let interrupted = Arc::new(AtomicBool::new(false));
            for signal in signal_hook::consts::TERM_SIGNALS {
                signal_hook::flag::register_conditional_shutdown(*signal, 0, Arc::clone(&interrupted))
                    .context("Failed to register signal handler")?;
                signal_hook::flag::register(*signal, Arc::clone(&interrupted))
                    .context("Failed to register signal handler")?;
            }

            watch::start_watching(&config, interrupted)?;
            Ok(())
        }
    }
}
