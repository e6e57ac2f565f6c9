use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ember-launcher", version, about = "Pick and prepare the local inference server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose the server build and print it as JSON
    Select(SelectArgs),
    /// Print the environment the server should be started with
    Env(SelectArgs),
    /// Sync bundled themes into the data folder if the app version changed
    Migrate(MigrateArgs),
    /// Print the cached gpu report
    Report(ReportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SelectArgs {
    /// Host OS (darwin|win32|linux|macos|windows); defaults to this machine
    #[arg(long)]
    pub platform: Option<String>,

    /// CPU architecture (arm64|x64|...); defaults to this machine
    #[arg(long)]
    pub arch: Option<String>,

    /// GPU report JSON written by the hardware probe
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Folder holding one sub-folder per server build
    #[arg(long)]
    pub bin_root: Option<PathBuf>,

    /// Where runtime.json is kept
    #[arg(long)]
    pub runtime_root: Option<PathBuf>,

    /// Only compute the selection, do not touch runtime.json
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct MigrateArgs {
    /// Version of the running app; defaults to this binary's version
    #[arg(long)]
    pub app_version: Option<String>,

    /// Bundled resources folder (contains themes/)
    #[arg(long)]
    pub resources: Option<PathBuf>,

    /// User data folder (receives themes/)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// App key/value store holding migrated_version
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip EMBER_FORCE_RUN_MODE / EMBER_DISABLE_* overrides
    #[arg(long)]
    pub raw: bool,
}
