// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Every field is optional and defaulted, so a run works with no config file
//! at all. Invalid values are rejected before any log is read.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::aggregator::AggregationOptions;
use crate::error::{ConfigError, XferError, XferResult};
use crate::types::Protocol;

/// Raw output configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutputConfig {
    #[serde(default = "default_output_dir")]
    dir: String,
    #[serde(default = "default_prefix")]
    prefix: String,
    #[serde(default = "default_json_report")]
    json_report: bool,
    #[serde(default)]
    xlsx: bool,
}

fn default_output_dir() -> String {
    "results".to_string()
}

fn default_prefix() -> String {
    "results".to_string()
}

fn default_json_report() -> bool {
    true
}

impl Default for RawOutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            prefix: default_prefix(),
            json_report: default_json_report(),
            xlsx: false,
        }
    }
}

/// Raw aggregation configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAggregationConfig {
    #[serde(default)]
    split_by_mode: bool,
    #[serde(default = "default_protocols")]
    protocols: Vec<String>,
}

fn default_protocols() -> Vec<String> {
    Protocol::ALL.iter().map(|p| p.to_string()).collect()
}

impl Default for RawAggregationConfig {
    fn default() -> Self {
        Self {
            split_by_mode: false,
            protocols: default_protocols(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_log_dir")]
    log_dir: String,
    #[serde(default)]
    output: RawOutputConfig,
    #[serde(default)]
    aggregation: RawAggregationConfig,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

/// Validated output configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// File name prefix for every emitted table.
    pub prefix: String,
    pub json_report: bool,
    /// Also write the tables as one `<prefix>.xlsx` workbook.
    pub xlsx: bool,
}

/// Complete validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_dir: PathBuf,
    pub output: OutputConfig,
    pub aggregation: AggregationOptions,
    pub protocols: Vec<Protocol>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(default_log_dir()),
            output: OutputConfig {
                dir: PathBuf::from(default_output_dir()),
                prefix: default_prefix(),
                json_report: default_json_report(),
                xlsx: false,
            },
            aggregation: AggregationOptions::default(),
            protocols: Protocol::ALL.to_vec(),
        }
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> XferResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(XferError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| XferError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> XferResult<Config> {
        // An empty document means "all defaults".
        if content.trim().is_empty() {
            return Ok(Config::default());
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| XferError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> XferResult<Config> {
        if raw.log_dir.trim().is_empty() {
            return Err(ConfigError::InvalidFieldValue {
                field: "log_dir",
                value: raw.log_dir,
                reason: "Log directory cannot be empty".to_string(),
            }
            .into());
        }

        let output = Self::validate_output(raw.output)?;
        let protocols = Self::validate_protocols(raw.aggregation.protocols)?;

        Ok(Config {
            log_dir: PathBuf::from(raw.log_dir),
            output,
            aggregation: AggregationOptions {
                split_by_mode: raw.aggregation.split_by_mode,
            },
            protocols,
        })
    }

    fn validate_output(raw: RawOutputConfig) -> XferResult<OutputConfig> {
        if raw.dir.trim().is_empty() {
            return Err(ConfigError::InvalidFieldValue {
                field: "output.dir",
                value: raw.dir,
                reason: "Output directory cannot be empty".to_string(),
            }
            .into());
        }

        validate_prefix(&raw.prefix)?;

        Ok(OutputConfig {
            dir: PathBuf::from(raw.dir),
            prefix: raw.prefix,
            json_report: raw.json_report,
            xlsx: raw.xlsx,
        })
    }

    fn validate_protocols(raw: Vec<String>) -> XferResult<Vec<Protocol>> {
        if raw.is_empty() {
            return Err(ConfigError::MissingRequiredField {
                field: "protocols",
                context: "aggregation".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        let mut protocols = Vec::with_capacity(raw.len());
        for value in raw {
            let protocol: Protocol =
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidFieldValue {
                        field: "aggregation.protocols",
                        value: value.clone(),
                        reason: "Expected one of mqtt, coap, http".to_string(),
                    })?;

            if !seen.insert(protocol) {
                return Err(ConfigError::DuplicateProtocol { protocol }.into());
            }
            protocols.push(protocol);
        }

        Ok(protocols)
    }
}

/// Table prefixes become file names, so they must be a single path component.
pub fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() {
        return Err(ConfigError::InvalidFieldValue {
            field: "output.prefix",
            value: prefix.to_string(),
            reason: "Prefix cannot be empty".to_string(),
        });
    }

    if !prefix
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        || prefix.starts_with('.')
    {
        return Err(ConfigError::InvalidFieldValue {
            field: "output.prefix",
            value: prefix.to_string(),
            reason: "Prefix must contain only alphanumeric characters, '-', '_' and '.' and must not start with '.'".to_string(),
        });
    }

    Ok(())
}
