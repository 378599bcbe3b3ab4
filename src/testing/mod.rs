//! ROM unit test runner
//!
//! Loads a JSON manifest, runs each declared ROM through the emulator,
//! and writes JUnit reports grouped by platform.

pub mod emulator;
pub mod manifest;
pub mod report;
pub mod runner;

pub use emulator::{Emulator, Invocation, ProcessEmulator, TestStatus};
pub use manifest::{AbortPc, Manifest, ManifestKind, TestEntry, TestGroup};
pub use report::{TestCase, TestSuite};
pub use runner::{run_manifest, RunOptions, RunSummary};
