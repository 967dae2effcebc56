//! `fit2txt` - CLI for converting FIT files into text reports
//!
//! Exits with status 0 when every file converted, 1 otherwise.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use fit2txt::cli::{Cli, Console};
use fit2txt::{init_logging, spawn_batch, BatchSummary, Config, Error, FitDecoder};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(&cli) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "conversion aborted");
            eprintln!("Errore: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> fit2txt::Result<BatchSummary> {
    if !cli.input.exists() {
        return Err(Error::input_not_found(&cli.input));
    }

    let config = Config::load_from(cli.config.clone())?;
    let batch = cli.batch_config(&config);

    let mut console = Console::new(io::stdout().lock(), cli.json);
    console.banner()?;

    let mut handle = spawn_batch(batch, FitDecoder::new())?;
    while let Some(event) = handle.next_event_blocking() {
        console.handle(&event)?;
    }
    let summary = handle.join()?;

    console.summary(&summary)?;
    Ok(summary)
}
