//! `pckinject status`: read-only install visibility.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use pckinject_sync::status::{self, BundleStatus, Registration, StatusReport};

/// Arguments for `pckinject status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Root of the host project.
    pub project_root: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let report = status::inspect(&self.project_root).with_context(|| {
            format!("failed to inspect '{}'", self.project_root.display())
        })?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&report);
        Ok(())
    }
}

#[derive(Tabled)]
struct BundleRow {
    #[tabled(rename = "platform")]
    platform: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "installed")]
    installed: String,
}

fn print_table(report: &StatusReport) {
    println!(
        "pckinject v{} | {}",
        env!("CARGO_PKG_VERSION"),
        report.project_root.display()
    );

    let rows: Vec<BundleRow> = report.bundles.iter().map(bundle_row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let line = match &report.registration {
        Registration::NoDescriptor => format!("{} no Xcode project found", "■".bright_black()),
        Registration::Unregistered { descriptor } => format!(
            "{} bundle not registered in {}",
            "■".yellow(),
            descriptor.display()
        ),
        Registration::Registered {
            descriptor,
            file_ref,
        } => format!(
            "{} registered as {file_ref} in {}",
            "■".green(),
            descriptor.display()
        ),
        Registration::Invalid { descriptor, reason } => format!(
            "{} {}: {reason}",
            "■".red(),
            descriptor.display()
        ),
    };
    println!("ios descriptor: {line}");
}

fn bundle_row(bundle: &BundleStatus) -> BundleRow {
    BundleRow {
        platform: bundle.platform.to_string(),
        source: presence(bundle.source_exists, &bundle.source),
        installed: presence(bundle.destination_exists, &bundle.destination),
    }
}

fn presence(exists: bool, path: &std::path::Path) -> String {
    if exists {
        format!("{} {}", "yes".green(), path.display())
    } else {
        format!("{} {}", "no".bright_black(), path.display())
    }
}
