//! DirScope -- folder size explorer for the terminal.
//!
//! Thin binary entry point. All logic lives in the `dirscope-core`
//! and `dirscope-cli` crates.

use anyhow::Context;
use clap::Parser;
use dirscope_core::config::SessionConfig;
use std::path::PathBuf;

/// Browse a directory tree with cumulative folder sizes.
#[derive(Debug, Parser)]
#[command(name = "dirscope", version, about)]
struct Args {
    /// JSON session config; defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Folder to open on start.
    path: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never interleave with listings on stdout.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let config = match args.config {
        Some(path) => SessionConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    tracing::info!("DirScope starting");
    dirscope_cli::run(config, args.path)
}
