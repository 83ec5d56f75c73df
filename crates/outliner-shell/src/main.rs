//! Outliner shell binary.
//!
//! ## Usage
//!
//! ```bash
//! # Start with a fresh outline
//! outliner
//!
//! # Start from a dump, with an explicit config file
//! outliner --load notes.json --config ./shell.ron
//! ```
//!
//! Commands are read one per line from stdin; `help` lists them.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use outliner_shell::{Shell, ShellConfig};

/// Navigate and edit an outline one level at a time.
#[derive(Parser, Debug)]
#[command(name = "outliner")]
#[command(about = "Line-driven outliner shell")]
struct Args {
    /// Config file (default: ~/.config/outliner/shell.ron)
    #[arg(long)]
    config: Option<PathBuf>,

    /// State dump to load at startup
    #[arg(long)]
    load: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_path) = ShellConfig::load(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match &config_path {
        Some(path) => tracing::info!(path = %path.display(), "config loaded"),
        None => tracing::info!("no config file, using defaults"),
    }

    let mut shell = Shell::new(config, io::stdout())?;
    if let Some(path) = &args.load {
        shell
            .load_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
    }

    shell.run(io::stdin().lock())?;
    Ok(())
}
