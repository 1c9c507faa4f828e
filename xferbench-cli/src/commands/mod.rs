// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

use std::path::Path;

use xferbench_core::{Config, ConfigLoader, XferResult};

pub mod aggregate;
pub mod list;
pub mod validate;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "xferbench.yaml";

/// Load the explicit config, else the default file if present, else defaults.
pub fn load_config(path: Option<&Path>) -> XferResult<Config> {
    match path {
        Some(path) => ConfigLoader::load_file(path),
        None if Path::new(DEFAULT_CONFIG).exists() => ConfigLoader::load_file(DEFAULT_CONFIG),
        None => Ok(Config::default()),
    }
}
