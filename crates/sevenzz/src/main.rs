use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::app::{App, Commands};

mod cli;

/// Environment variable holding the log filter, e.g. `sevenzz_archive=debug`.
const LOG_ENV: &str = "SEVENZZ_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let app = App::parse();
    init_logging(app.verbose);

    let result = match app.cmd {
        Some(Commands::Version(args)) => args.run().map(|()| 0),
        Some(Commands::Info(args)) => args.run().map(|()| 0),
        Some(Commands::External(args)) => cli::passthrough::run(&args),
        None => cli::passthrough::run(&[]),
    };

    match result {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("sevenzz error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
