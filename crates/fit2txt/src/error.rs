//! Error types for fit2txt.
//!
//! Two classes of failure are kept apart: [`Error`] covers setup problems
//! that abort a whole run (missing input, bad configuration, unusable output
//! directory), while [`ConversionError`] covers a single file and never stops
//! the batch.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for fit2txt operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// The input path does not exist.
    #[error("{path} does not exist")]
    InputNotFound {
        /// The path given on the command line.
        path: PathBuf,
    },

    /// Failed to enumerate a directory while looking for input files.
    #[error("failed to scan {path}: {source}")]
    Scan {
        /// Directory being scanned.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create the output directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for fit2txt operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new input-not-found error.
    #[must_use]
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create a new configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the input path is missing.
    #[must_use]
    pub fn is_input_not_found(&self) -> bool {
        matches!(self, Self::InputNotFound { .. })
    }
}

/// Failure to convert one input file.
///
/// Reported per file; the batch counts it and moves on.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The decoder could not read the input file.
    #[error("failed to decode {path}: {message}")]
    Decode {
        /// The input file.
        path: PathBuf,
        /// What the decoder reported.
        message: String,
    },

    /// The report could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The output file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The report text could not be produced.
    #[error("failed to render report for {path}")]
    Render {
        /// The input file.
        path: PathBuf,
    },
}

/// Result type for a single file conversion.
pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

impl ConversionError {
    /// Create a decode error for the given input file.
    #[must_use]
    pub fn decode(path: &Path, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a write error for the given output file.
    #[must_use]
    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a render error for the given input file.
    #[must_use]
    pub fn render(path: &Path) -> Self {
        Self::Render {
            path: path.to_path_buf(),
        }
    }

    /// Check if the failure happened while decoding.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if the failure happened while writing.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}
