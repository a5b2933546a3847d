//! `wagtail` entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();

    if let Err(e) = cli.execute(&mut stdout) {
        eprintln!("Error [{}]: {}", e.code(), e);
        std::process::exit(1);
    }
}
