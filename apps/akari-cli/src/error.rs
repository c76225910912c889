//! # CLI Error Type
//!
//! Everything a command can fail with, rendered as JSON on stderr.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in akari                                  │
//! │                                                                         │
//! │  config load ─── ConfigError ──────────────┐                            │
//! │                                             │                           │
//! │  command ─────── PosError ──┬── code() ─────┼──► CliError ──► stderr    │
//! │                             │               │     { code, message }     │
//! │  output ──────── serde_json ┘               │     exit status ≠ 0       │
//! │                                             │                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use akari_db::{DbError, ErrorCode, PosError};

/// Failure while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the application data directory")]
    NoDataDir,
}

/// Codes that only exist at the process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CliCode {
    ConfigError,
    Internal,
}

/// Either a service error code or a CLI-only one. Serializes as the bare
/// code string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Code {
    Pos(ErrorCode),
    Cli(CliCode),
}

/// Error printed by the `akari` binary.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for product ...", "retryable": false }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    pub code: Code,
    pub message: String,
    pub retryable: bool,
}

impl CliError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(Code::Cli(CliCode::Internal), message)
    }

    /// Process exit status: 2 for configuration problems, 75 (`EX_TEMPFAIL`)
    /// for retryable conflicts, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.code {
            Code::Cli(CliCode::ConfigError) => 2,
            _ if self.retryable => 75,
            _ => 1,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<PosError> for CliError {
    fn from(err: PosError) -> Self {
        CliError {
            code: Code::Pos(err.code()),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        PosError::from(err).into()
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(Code::Cli(CliCode::ConfigError), err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(format!("Failed to serialize output: {}", err))
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
