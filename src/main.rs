//! CLI entry point for the session-jar tool.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app_config;
mod cli;
mod commands;

use app_config::{effective_jar_config, load_default_file_config};
use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let loaded = load_default_file_config()?;
    let config = effective_jar_config(args.storage_dir.as_deref(), loaded.config.as_ref())?;
    debug!(
        storage_root = %config.storage_root().display(),
        config_file = loaded.loaded_from_file(),
        "Resolved configuration"
    );

    match &args.command {
        Command::Path(account) => commands::run_path_command(&account.account, &config),
        Command::List(list) => commands::run_list_command(list, &config),
        Command::Set(set) => commands::run_set_command(set, &config),
        Command::Delete(delete) => commands::run_delete_command(delete, &config),
        Command::PurgeSince(purge) => commands::run_purge_since_command(purge, &config),
        Command::Clear(clear) => commands::run_clear_command(clear.include_protected, &config),
        Command::Fetch(fetch) => {
            commands::run_fetch_command(&fetch.account.account, &fetch.url, &config).await
        }
        Command::Config => commands::run_config_show_command(&loaded, &config),
    }
}
