// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bayan - a bilingual conversational assistant over the company data
//! warehouse.
//!
//! This is the binary entry point for the Bayan assistant.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Bayan - ask your data warehouse questions in English or Arabic.
#[derive(Parser, Debug)]
#[command(name = "bayan", version, about, long_about = None)]
struct Cli {
    /// Path to a bayan.toml config file (default: XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch an interactive chat session.
    Shell,
    /// Ask a single question and print the answer.
    Ask {
        /// The question, in English or Arabic.
        question: String,
    },
    /// Show credential pool and warehouse diagnostics.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => bayan_config::load_config_from_path(path)
            .map_err(bayan_config::diagnostic::figment_to_config_errors)
            .and_then(|config| {
                bayan_config::validation::validate_config(&config)?;
                Ok(config)
            }),
        None => bayan_config::load_and_validate(),
    };

    let config = match config {
        Ok(config) => config,
        Err(errors) => {
            bayan_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_new(&config.agent.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Some(Commands::Shell) | None => shell::run_shell(config).await,
        Some(Commands::Ask { question }) => shell::run_ask(config, &question).await,
        Some(Commands::Status) => shell::run_status(config).await,
    };

    if let Err(e) = result {
        eprintln!("bayan: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config = bayan_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.agent.name, "bayan");
    }
}
