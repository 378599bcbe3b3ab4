//! CLI argument definitions
//!
//! Defines the clap arguments for `run_unittest`. The underscore flag
//! spellings are the primary names; kebab-case aliases are accepted.

use clap::Parser;
use std::path::PathBuf;

/// Run emulator ROM unit tests from a JSON manifest
#[derive(Parser, Debug)]
#[command(name = "run_unittest", about = "Run emulator ROM unit tests")]
#[command(version, long_about = None)]
pub struct Args {
    /// The emulator executable to run the unit tests with
    /// (default: emulator.path from the config file)
    #[arg(long)]
    pub emulator: Option<PathBuf>,

    /// Unit test manifest (JSON)
    #[arg(long = "unit_test_filename", alias = "unit-test-filename")]
    pub unit_test_filename: PathBuf,

    /// Directory for per-platform JUnit reports (<dir>/<platform>/results.xml)
    #[arg(long = "results_dir", alias = "results-dir")]
    pub results_dir: Option<PathBuf>,

    /// Kill an emulator run after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Discard emulator stdout/stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with status 1 if any test fails
    #[arg(long)]
    pub strict: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
