//! ROM unit test runner
//!
//! Runs an emulator once per ROM declared in a JSON manifest, classifies
//! each test by the emulator's exit status, and optionally writes a
//! JUnit XML report per platform.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{Manifest, TestEntry, TestStatus};
