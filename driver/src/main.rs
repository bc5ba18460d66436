use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use bounded_buffer::{BufferError, Coordinator, Event, EventSink};

pub mod cli;

use cli::Args;

/// Prints one line per event, the only thing that goes to stdout.
struct StdoutSink;

impl EventSink for StdoutSink {
    fn record(&self, event: Event) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{event}");
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // wrong arity or non-numeric arguments print usage and exit with status 2
    let args = Args::parse();

    let mut coordinator = match Coordinator::new(args.config()) {
        Ok(coordinator) => coordinator,
        Err(e @ BufferError::InvalidConfig { .. }) => {
            error!("{e}");
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    coordinator.run(&StdoutSink)?;
    Ok(ExitCode::SUCCESS)
}
