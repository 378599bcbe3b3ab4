//! Error types for the ROM unit test runner
//!
//! Only configuration problems are errors. A test whose emulator exits
//! with a nonzero status is a normal outcome and never surfaces here.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the runner
#[derive(Error, Debug)]
pub enum Error {
    // === Manifest Errors ===
    #[error("Failed to read unit test manifest '{path}': {source}")]
    ManifestRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid unit test manifest '{path}': {reason}")]
    ManifestParse { path: String, reason: String },

    // === Emulator Errors ===
    #[error("Emulator '{name}' not found. Pass a path with --emulator or set emulator.path in the config file")]
    EmulatorNotFound { name: String },

    #[error("Failed to run emulator '{program}': {source}")]
    EmulatorSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    // === Report Errors ===
    #[error("Failed to write report '{path}': {source}")]
    ReportWrite {
        path: String,
        #[source]
        source: io::Error,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a manifest parse error for the given manifest file
    pub fn manifest_parse(path: &Path, reason: impl Into<String>) -> Self {
        Self::ManifestParse {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Create a report write error for the given output file
    pub fn report_write(path: &Path, source: io::Error) -> Self {
        Self::ReportWrite {
            path: path.display().to_string(),
            source,
        }
    }

    /// Map an emulator launch failure, separating "not found" from other IO errors
    pub fn emulator_spawn(program: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::EmulatorNotFound {
                name: program.display().to_string(),
            }
        } else {
            Self::EmulatorSpawn {
                program: program.display().to_string(),
                source,
            }
        }
    }
}
