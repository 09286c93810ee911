//! `pckinject run`: install the bundle for one or all platforms.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use pckinject_core::Platform;
use pckinject_sync::{pipeline, PlatformScope, RunReport, StageOutcome};

/// Arguments for `pckinject run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Root of the host project (the directory holding `assets/`, `android/`
    /// and `ios/`).
    pub project_root: PathBuf,

    /// Platform pipelines to run.
    #[arg(long, value_enum, default_value_t = PlatformArg::All)]
    pub platform: PlatformArg,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Android,
    Ios,
    All,
}

impl From<PlatformArg> for PlatformScope {
    fn from(p: PlatformArg) -> Self {
        match p {
            PlatformArg::Android => PlatformScope::Only(Platform::Android),
            PlatformArg::Ios => PlatformScope::Only(Platform::Ios),
            PlatformArg::All => PlatformScope::All,
        }
    }
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        tracing::debug!(root = %self.project_root.display(), platform = ?self.platform, "starting run");
        let report = pipeline::run(&self.project_root, self.platform.into()).with_context(|| {
            format!(
                "bundle install failed for '{}'",
                self.project_root.display()
            )
        })?;

        if self.json {
            println!(
                "{}",
                report.to_json().context("failed to serialize run report")?
            );
            return Ok(());
        }

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    for event in &report.events {
        let line = match &event.outcome {
            StageOutcome::SourceMissing { path } => format!(
                "{} {}: no bundle at {}",
                "-".yellow(),
                event.platform,
                path.display()
            ),
            StageOutcome::Mirrored {
                destination, files, ..
            } => format!(
                "{} {}: mirrored {files} file(s) into {}",
                "✓".green(),
                event.platform,
                destination.display()
            ),
            StageOutcome::Copied { destination, bytes } => format!(
                "{} {}: copied {bytes} bytes to {}",
                "✓".green(),
                event.platform,
                destination.display()
            ),
            StageOutcome::AlreadyRegistered { descriptor, .. } => format!(
                "{} {}: already registered in {}",
                "✓".green(),
                event.platform,
                descriptor.display()
            ),
            StageOutcome::Registered {
                descriptor,
                file_ref,
                ..
            } => format!(
                "{} {}: registered as {file_ref} in {}",
                "✓".green(),
                event.platform,
                descriptor.display()
            ),
        };
        println!("{line}");
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "done in {}ms ({} stage(s))",
        elapsed.num_milliseconds(),
        report.events.len()
    );
}
