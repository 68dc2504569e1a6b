pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

use clap::Parser;
use cli::Quip;
use commands::handle_command;
use context::AppContext;
use std::process;
use tracing_subscriber::EnvFilter;

/// Send tracing output to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the quip CLI application
pub fn run_main() {
    init_logging();

    let args = Quip::parse();
    let result = AppContext::load().and_then(|mut ctx| handle_command(&mut ctx, args.commands));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
