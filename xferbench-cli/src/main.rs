// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! xferbench CLI
//!
//! Command-line interface for correlating and summarizing file-transfer
//! benchmark logs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

/// xferbench - Offline correlation of MQTT, CoAP and HTTP transfer logs
#[derive(Parser)]
#[command(name = "xferbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ./xferbench.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Correlate logs and write events/summary tables
    Aggregate {
        /// Root directory holding <protocol>/<role>.csv logs
        #[arg(short, long)]
        logs: Option<PathBuf>,

        /// Output directory for result tables
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// File name prefix for result tables
        #[arg(short, long)]
        prefix: Option<String>,

        /// Group summaries by transfer mode as well
        #[arg(long)]
        split_by_mode: bool,

        /// Restrict to these protocols (repeatable)
        #[arg(long = "protocol", value_name = "PROTOCOL")]
        protocols: Vec<String>,

        /// Skip the JSON run report
        #[arg(long)]
        no_json: bool,

        /// Also write a <prefix>.xlsx workbook
        #[arg(long)]
        xlsx: bool,
    },

    /// List discovered log files
    List {
        /// Root directory holding <protocol>/<role>.csv logs
        #[arg(short, long)]
        logs: Option<PathBuf>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Aggregate {
            logs,
            out,
            prefix,
            split_by_mode,
            protocols,
            no_json,
            xlsx,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let overrides = commands::aggregate::Overrides {
                logs,
                out,
                prefix,
                split_by_mode,
                protocols,
                no_json,
                xlsx,
            };
            commands::aggregate::execute(config, overrides)
        }
        Commands::List { logs } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::list::execute(&config, logs)
        }
        Commands::Validate { file } => commands::validate::execute(&file),
    }
}
