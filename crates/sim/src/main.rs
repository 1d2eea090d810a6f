//! Headless combat simulator
//!
//! Run with: `combat-sim <command>`

mod commands;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use commands::{Generate, Run};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Headless combat simulator
#[derive(Parser)]
#[command(name = "combat-sim")]
#[command(about = "Run and generate combat scenarios", long_about = None)]
#[command(version)]
struct Cli {
    /// Also write logs to `combat-sim.log` in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run a scenario to its outcome and print JSON result records
    Run(Run),

    /// Generate a random 2v2 scenario
    Generate(Generate),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for RUST_LOG and friends)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_dir.as_deref())?;

    match cli.command {
        Command::Run(cmd) => cmd.execute(),
        Command::Generate(cmd) => cmd.execute(),
    }
}

/// Log to stderr, and to a file when a log directory is given.
///
/// The returned guard flushes the file writer when dropped.
fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::never(dir, "combat-sim.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}/combat-sim.log", dir.display());
    Ok(Some(guard))
}
