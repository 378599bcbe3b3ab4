//! Test runner implementation
//!
//! Runs every manifest entry through the emulator in manifest order,
//! prints the result of each one, and collects a report suite per
//! platform.

use std::path::PathBuf;
use std::time::Instant;

use colored::Colorize;

use crate::common::Result;

use super::emulator::{Emulator, Invocation};
use super::manifest::{Manifest, ManifestKind, TestGroup};
use super::report::{TestCase, TestSuite};

/// Options for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Emulator executable
    pub emulator: PathBuf,
    /// Arguments appended to every invocation
    pub extra_args: Vec<String>,
    /// Where to write per-platform reports; `None` writes nothing
    pub results_dir: Option<PathBuf>,
}

/// Result of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub suites: Vec<TestSuite>,
    /// Reports written, in platform order
    pub reports: Vec<PathBuf>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.total() - self.failed()
    }

    pub fn failed(&self) -> usize {
        self.suites.iter().map(TestSuite::failures).sum()
    }

    pub fn total(&self) -> usize {
        self.suites.iter().map(|s| s.cases.len()).sum()
    }
}

/// Run every test in the manifest
///
/// Each platform's report is written as soon as that platform finishes.
pub async fn run_manifest(
    manifest: &Manifest,
    emulator: &dyn Emulator,
    options: &RunOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for group in &manifest.groups {
        if manifest.kind == ManifestKind::Platforms {
            println!("{} {}", "Platform:".blue().bold(), group.platform.white().bold());
        }

        let suite = run_group(manifest, group, emulator, options).await?;

        if let Some(results_dir) = &options.results_dir {
            summary.reports.push(suite.write(results_dir)?);
        }
        summary.suites.push(suite);
    }

    Ok(summary)
}

async fn run_group(
    manifest: &Manifest,
    group: &TestGroup,
    emulator: &dyn Emulator,
    options: &RunOptions,
) -> Result<TestSuite> {
    let mut suite = TestSuite::new(group.platform.clone());

    for entry in &group.entries {
        println!("Running unit test: {}", entry.filename.display());

        let rom_path = manifest.rom_path(entry);
        let invocation =
            Invocation::unit_test(&options.emulator, entry, &rom_path, &options.extra_args);

        let started = Instant::now();
        let status = emulator.run(&invocation).await?;
        let elapsed = started.elapsed();

        if status.passed() {
            println!("{}", "Test Passed".green());
        } else {
            println!("{}", "Test Failed".red());
        }

        tracing::debug!(
            test = %entry.filename.display(),
            ?status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Unit test finished"
        );

        suite.cases.push(TestCase {
            name: entry.test_name(),
            elapsed,
            status,
        });
    }

    Ok(suite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::testing::emulator::TestStatus;
    use crate::testing::manifest::{AbortPc, TestEntry};
    use async_trait::async_trait;
    use std::ffi::OsString;
    use std::sync::Mutex;

    /// Emulator double that records invocations and fails ROMs named `*fail*`
    #[derive(Default)]
    struct RecordingEmulator {
        calls: Mutex<Vec<Invocation>>,
    }

    impl RecordingEmulator {
        fn roms(&self) -> Vec<OsString> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|inv| inv.args[6].clone())
                .collect()
        }
    }

    #[async_trait]
    impl Emulator for RecordingEmulator {
        async fn run(&self, invocation: &Invocation) -> Result<TestStatus> {
            self.calls.lock().unwrap().push(invocation.clone());
            let rom = invocation.args[6].to_string_lossy().into_owned();
            Ok(if rom.contains("fail") {
                TestStatus::Exited(1)
            } else {
                TestStatus::Exited(0)
            })
        }
    }

    struct BrokenEmulator;

    #[async_trait]
    impl Emulator for BrokenEmulator {
        async fn run(&self, invocation: &Invocation) -> Result<TestStatus> {
            Err(Error::EmulatorNotFound {
                name: invocation.program.display().to_string(),
            })
        }
    }

    fn entry(filename: &str) -> TestEntry {
        TestEntry {
            filename: PathBuf::from(filename),
            abort_pc: AbortPc::Text("0x100".to_string()),
            checksum: "0".to_string(),
        }
    }

    fn manifest(kind: ManifestKind, groups: Vec<(&str, Vec<&str>)>) -> Manifest {
        Manifest {
            kind,
            base_dir: PathBuf::from("/roms"),
            groups: groups
                .into_iter()
                .map(|(platform, files)| TestGroup {
                    platform: platform.to_string(),
                    entries: files.into_iter().map(entry).collect(),
                })
                .collect(),
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            emulator: PathBuf::from("emu"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_runs_each_entry_once_in_order() {
        let manifest = manifest(
            ManifestKind::Flat,
            vec![("unit", vec!["a.rom", "b_fail.rom", "c.rom"])],
        );
        let emulator = RecordingEmulator::default();

        let summary = run_manifest(&manifest, &emulator, &options()).await.unwrap();

        assert_eq!(
            emulator.roms(),
            vec![
                OsString::from("/roms/a.rom"),
                OsString::from("/roms/b_fail.rom"),
                OsString::from("/roms/c.rom"),
            ]
        );
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.failed(), 1);
        assert!(summary.reports.is_empty());

        let names: Vec<_> = summary.suites[0].cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b_fail", "c"]);
    }

    #[tokio::test]
    async fn test_writes_one_report_per_platform() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = manifest(
            ManifestKind::Platforms,
            vec![("X", vec!["x/one.v1.rom"]), ("Y", vec!["y/two_fail.rom"])],
        );
        let emulator = RecordingEmulator::default();
        let options = RunOptions {
            results_dir: Some(dir.path().to_path_buf()),
            ..options()
        };

        let summary = run_manifest(&manifest, &emulator, &options).await.unwrap();

        assert_eq!(
            summary.reports,
            vec![
                dir.path().join("X").join("results.xml"),
                dir.path().join("Y").join("results.xml"),
            ]
        );
        let x = std::fs::read_to_string(&summary.reports[0]).unwrap();
        let y = std::fs::read_to_string(&summary.reports[1]).unwrap();
        assert_eq!(x.matches("<testcase ").count(), 1);
        assert!(x.contains("name=\"one\" status=\"0\""));
        assert_eq!(y.matches("<testcase ").count(), 1);
        assert!(y.contains("name=\"two_fail\" status=\"1\""));
    }

    #[tokio::test]
    async fn test_emulator_error_aborts_run_without_reports() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = manifest(ManifestKind::Platforms, vec![("X", vec!["a.rom"])]);
        let options = RunOptions {
            results_dir: Some(dir.path().to_path_buf()),
            ..options()
        };

        let err = run_manifest(&manifest, &BrokenEmulator, &options).await.unwrap_err();

        assert!(matches!(err, Error::EmulatorNotFound { .. }));
        assert!(!dir.path().join("X").exists());
    }
}
