//! Error types for configuration operations.

use std::path::PathBuf;
use strata_effects::eq::EqError;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Failed to read or write a JSON flat record
    #[error("flat record JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Preset not found
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// Flat record key that names no parameter
    #[error("unknown parameter key: {0}")]
    UnknownKey(String),

    /// Flat record value that cannot be used for its key
    #[error("invalid value {value} for '{key}': {reason}")]
    InvalidValue {
        /// Key of the offending entry.
        key: String,
        /// The value found.
        value: f64,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// EQ rejected a band or setting
    #[error("equalizer: {0}")]
    Eq(#[from] EqError),

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(key: &str, value: f64, reason: &'static str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value,
            reason,
        }
    }
}
