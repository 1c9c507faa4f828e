// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `xferbench validate` command - Validate configuration file.

use std::path::Path;

use xferbench_core::ConfigLoader;

pub fn execute(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file.display(), "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("  Log Directory:    {}", config.log_dir.display());
            println!("  Output Directory: {}", config.output.dir.display());
            println!("  Prefix:           {}", config.output.prefix);
            println!("  JSON Report:      {}", config.output.json_report);
            println!("  Workbook:         {}", config.output.xlsx);
            println!("  Split By Mode:    {}", config.aggregation.split_by_mode);
            let protocols: Vec<&str> = config.protocols.iter().map(|p| p.as_str()).collect();
            println!("  Protocols:        {}", protocols.join(", "));
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
