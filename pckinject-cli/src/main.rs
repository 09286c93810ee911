//! pckinject: install an exported game bundle into native mobile projects.
//!
//! Meant to be exec'd by a host build tool as a lifecycle hook after it has
//! generated the `android/` and `ios/` trees.
//!
//! # Usage
//!
//! ```text
//! pckinject run <project-root> [--platform android|ios|all] [--json]
//! pckinject status <project-root> [--json]
//! ```
//!
//! Logs go to stderr. `RUST_LOG` sets the filter (default `info`);
//! `--log-format json` switches to JSON lines.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use commands::{run::RunArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "pckinject",
    version,
    about = "Install an exported game bundle into Android and iOS projects",
    long_about = None,
)]
struct Cli {
    /// Log line format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the install pipelines against a project root.
    Run(RunArgs),

    /// Show what is installed under a project root without changing it.
    Status(StatusArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
