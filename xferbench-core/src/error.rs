// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for xferbench.
//!
//! Explicit enum error types throughout the library crates.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Protocol;

/// Top-level error type for the correlation engine.
#[derive(Debug, Error)]
pub enum XferError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Event Log Errors - Scoped to a Single File
    // =========================================================================
    #[error("Event log error: {0}")]
    LogFile(#[from] LogFileError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {context} - {source}")]
    Csv {
        context: &'static str,
        #[source]
        source: csv::Error,
    },
}

/// Configuration validation errors.
/// Raised before any log is touched so a bad run never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Duplicate protocol: {protocol}")]
    DuplicateProtocol { protocol: Protocol },
}

/// A single row that could not be turned into an event record.
/// Rows are skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Invalid field value: {field} = {value:?} - {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Row does not match the log schema: {reason}")]
    Schema { reason: String },

    #[error("Row protocol {found} does not belong in the {expected} log directory")]
    ProtocolMismatch { expected: Protocol, found: Protocol },
}

/// Structural failure of one event log file.
/// Aborts that file only; the rest of the run continues.
#[derive(Debug, Error)]
pub enum LogFileError {
    #[error("Failed to read {path} ({protocol}/{role}): {source}")]
    Read {
        path: PathBuf,
        protocol: Protocol,
        role: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing column '{column}' in {path} ({protocol}/{role})")]
    MissingColumn {
        path: PathBuf,
        protocol: Protocol,
        role: String,
        column: &'static str,
    },

    #[error("Unreadable header in {path} ({protocol}/{role}): {reason}")]
    Header {
        path: PathBuf,
        protocol: Protocol,
        role: String,
        reason: String,
    },
}

impl LogFileError {
    /// Path of the log file that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            LogFileError::Read { path, .. }
            | LogFileError::MissingColumn { path, .. }
            | LogFileError::Header { path, .. } => path,
        }
    }
}

/// Result type alias using XferError.
pub type XferResult<T> = Result<T, XferError>;
