//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Emulator settings
    #[serde(default)]
    pub emulator: EmulatorConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Configuration for the emulator under test
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EmulatorConfig {
    /// Emulator executable used when `--emulator` is not given
    pub path: Option<PathBuf>,

    /// Arguments appended after the unit test arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Report output settings
#[derive(Debug, Deserialize, Default)]
pub struct ReportConfig {
    /// Results directory used when `--results_dir` is not given
    pub results_dir: Option<PathBuf>,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Default)]
pub struct Timeouts {
    /// Per-test limit; unset means wait for the emulator indefinitely
    pub test_secs: Option<u64>,
}

impl Timeouts {
    pub fn test_timeout(&self) -> Option<Duration> {
        self.test_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// read if present, otherwise the default configuration is returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
