// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `xferbench list` command - List discovered log files.

use std::path::PathBuf;

use xferbench_core::loader::load_file;
use xferbench_core::{Config, EventLoader};

pub fn execute(config: &Config, logs: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let root = logs.unwrap_or_else(|| config.log_dir.clone());
    let discovery = EventLoader::new(&root).protocols(&config.protocols).discover();

    println!("Log directory: {}", root.display());
    println!();

    if discovery.files.is_empty() {
        println!("No log files found.");
    } else {
        println!("{:<8} {:<12} {:>8} {:>8}  PATH", "PROTOCOL", "ROLE", "ROWS", "SKIPPED");
        for file in &discovery.files {
            let role = file
                .role_hint
                .map(|r| r.to_string())
                .unwrap_or_else(|| "?".to_string());
            match load_file(file) {
                Ok(load) => println!(
                    "{:<8} {:<12} {:>8} {:>8}  {}",
                    file.protocol,
                    role,
                    load.records.len(),
                    load.rows_skipped,
                    file.path.display()
                ),
                Err(e) => println!(
                    "{:<8} {:<12} {:>8} {:>8}  {} ({})",
                    file.protocol,
                    role,
                    "-",
                    "-",
                    file.path.display(),
                    e
                ),
            }
        }
    }

    for protocol in &discovery.missing {
        println!("{}: no log directory", protocol);
    }
    for failure in &discovery.failures {
        eprintln!("✗ {}", failure);
    }

    println!();
    println!("Total: {} file(s)", discovery.files.len());

    Ok(())
}
