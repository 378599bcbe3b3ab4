//! CLI command handling
//!
//! Merges arguments with the config file, runs the manifest, and prints
//! the run summary.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;

use crate::commands::Args;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::testing::{run_manifest, Manifest, ProcessEmulator, RunOptions, RunSummary};

/// Run the unit tests described by `args`
///
/// Returns the process exit status: 0, or 1 when `--strict` is set and a
/// test failed.
pub async fn dispatch(args: Args) -> Result<i32> {
    let config = Config::load(args.config.as_deref())?;

    let manifest = Manifest::load(&args.unit_test_filename)?;
    tracing::debug!(
        manifest = %args.unit_test_filename.display(),
        base_dir = %manifest.base_dir.display(),
        tests = manifest.test_count(),
        "Manifest loaded"
    );

    let emulator = resolve_emulator(args.emulator.or(config.emulator.path))?;
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .or_else(|| config.timeouts.test_timeout());

    let options = RunOptions {
        emulator,
        extra_args: config.emulator.extra_args,
        results_dir: args.results_dir.or(config.report.results_dir),
    };
    let process = ProcessEmulator {
        timeout,
        quiet: args.quiet,
    };

    let summary = run_manifest(&manifest, &process, &options).await?;
    print_summary(&summary);

    Ok(if args.strict && summary.failed() > 0 { 1 } else { 0 })
}

/// Turn off console colors when stdout is piped, unless `CLICOLOR_FORCE` is set
pub fn init_color() {
    let forced = std::env::var_os("CLICOLOR_FORCE").is_some_and(|v| v != "0");
    if !use_color(std::io::stdout().is_terminal(), forced) {
        colored::control::set_override(false);
    }
}

fn use_color(stdout_is_terminal: bool, forced: bool) -> bool {
    forced || stdout_is_terminal
}

/// Locate the emulator executable, searching PATH for bare names
fn resolve_emulator(emulator: Option<PathBuf>) -> Result<PathBuf> {
    let emulator = emulator.ok_or_else(|| {
        Error::Config(
            "No emulator given. Pass --emulator or set emulator.path in the config file"
                .to_string(),
        )
    })?;

    which::which(&emulator).map_err(|_| Error::EmulatorNotFound {
        name: emulator.display().to_string(),
    })
}

fn print_summary(summary: &RunSummary) {
    let passed = format!("{} passed", summary.passed());
    let failed = format!("{} failed", summary.failed());
    let failed = if summary.failed() > 0 {
        failed.red().bold()
    } else {
        failed.normal()
    };
    println!("\n{}, {}", passed.green(), failed);

    for report in &summary.reports {
        println!("  Report: {}", report.display().to_string().dimmed());
    }
}
