use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Command};

const DEFAULT_FILTER: &str =
    "ember_launcher=info,ember_runtime=info,ember_hwprof=info,ember_migrate=info";

fn main() -> Result<()> {
    // stdout carries command output, logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Select(args) => commands::select(&args, &mut out),
        Command::Env(args) => commands::env(&args, &mut out),
        Command::Migrate(args) => commands::migrate(&args, &mut out),
        Command::Report(args) => commands::report(&args, &mut out),
    }
}
