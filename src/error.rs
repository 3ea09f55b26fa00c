//! Error types for the schema host layer
//!
//! The front end itself never fails: parse and check problems are
//! `Diagnostic`s. These errors cover the edges where the host touches the
//! outside world (reading files, loading configuration).

use std::path::PathBuf;

use schema_core::FsError;
use thiserror::Error;

/// Main error type for the host layer
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Search-root configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid project file '{}': {message}", .path.display())]
    InvalidProjectFile { path: PathBuf, message: String },

    #[error("Search root '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl SchemaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SchemaError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
