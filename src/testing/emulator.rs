//! Emulator process invocation
//!
//! The emulator is an opaque executable. It is started once per test as
//!
//! ```text
//! <emulator> -u -p <abort_pc> -c <checksum> -r <rom_path> [extra args...]
//! ```
//!
//! and its exit status is the only result consumed. Arguments are passed
//! as a discrete argv, never through a shell.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use crate::common::{Error, Result};

use super::manifest::TestEntry;

/// How an emulator run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    /// The process exited with this code
    Exited(i32),
    /// The process was terminated by a signal and has no exit code
    Signaled,
    /// The configured timeout elapsed and the process was killed
    TimedOut,
}

impl TestStatus {
    /// A test passes only when the emulator exits with code 0
    pub fn passed(&self) -> bool {
        matches!(self, TestStatus::Exited(0))
    }

    /// Raw exit code, if the process produced one
    pub fn code(&self) -> Option<i32> {
        match self {
            TestStatus::Exited(code) => Some(*code),
            TestStatus::Signaled | TestStatus::TimedOut => None,
        }
    }
}

/// A fully built emulator command line
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Build the unit test command line for one manifest entry
    pub fn unit_test(
        program: &Path,
        entry: &TestEntry,
        rom_path: &Path,
        extra_args: &[String],
    ) -> Self {
        let mut args: Vec<OsString> = vec![
            "-u".into(),
            "-p".into(),
            entry.abort_pc.to_string().into(),
            "-c".into(),
            entry.checksum.clone().into(),
            "-r".into(),
            rom_path.as_os_str().to_owned(),
        ];
        args.extend(extra_args.iter().map(OsString::from));

        Self {
            program: program.to_path_buf(),
            args,
        }
    }

    /// Human-readable command line for logs
    pub fn display(&self) -> String {
        let mut out = format!("{:?}", self.program);
        for arg in &self.args {
            let _ = write!(out, " {:?}", arg);
        }
        out
    }
}

/// Something that can run a unit test invocation
#[async_trait]
pub trait Emulator: Send + Sync {
    /// Run the invocation to completion and report how it ended
    async fn run(&self, invocation: &Invocation) -> Result<TestStatus>;
}

/// Runs the emulator as a child process
#[derive(Debug, Clone, Default)]
pub struct ProcessEmulator {
    /// Kill the emulator after this long; `None` waits forever
    pub timeout: Option<Duration>,
    /// Discard the emulator's stdout/stderr instead of inheriting them
    pub quiet: bool,
}

impl ProcessEmulator {
    fn output(&self) -> Stdio {
        if self.quiet {
            Stdio::null()
        } else {
            Stdio::inherit()
        }
    }
}

#[async_trait]
impl Emulator for ProcessEmulator {
    async fn run(&self, invocation: &Invocation) -> Result<TestStatus> {
        tracing::debug!(command = %invocation.display(), "Starting emulator");

        let mut child = TokioCommand::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(self.output())
            .stderr(self.output())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::emulator_spawn(&invocation.program, e))?;

        let status = match self.timeout {
            None => child.wait().await?,
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status?,
                    Err(_) => {
                        tracing::warn!(
                            command = %invocation.display(),
                            timeout_secs = limit.as_secs(),
                            "Emulator timed out, killing it"
                        );
                        child.kill().await?;
                        return Ok(TestStatus::TimedOut);
                    }
                }
            }
        };

        match status.code() {
            Some(code) => Ok(TestStatus::Exited(code)),
            None => {
                tracing::warn!(command = %invocation.display(), "Emulator terminated by signal");
                Ok(TestStatus::Signaled)
            }
        }
    }
}
