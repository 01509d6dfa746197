// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `nodeflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nodeflow",
    version,
    about = "Execute a workflow graph of dependent nodes and report the run.",
    long_about = None
)]
pub struct CliArgs {
    /// Graph file: JSON `{ "nodes": [...], "edges": [...] }`, or TOML when
    /// the extension is `.toml`.
    #[arg(long, value_name = "PATH")]
    pub graph: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// Default: `Nodeflow.toml` in the current working directory if present,
    /// otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `NODEFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Seed for the simulated executor's delays and failures.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Parse + validate, print the graph plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
