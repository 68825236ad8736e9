//! liquify
//!
//! Runs Liquibase, downloading and unpacking a release first if needed.
//! Diagnostics go to stderr; Liquibase's own output passes straight through.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use liquify_core::config::load_manifest;
use liquify_core::{LaunchError, Launcher};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "liquify=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let manifest = load_manifest(cli.manifest.as_deref()).context("failed to load release manifest")?;
    let settings = cli.settings(&manifest);
    tracing::debug!(?settings, "Launching liquify v{}", liquify_core::VERSION);

    let launcher = Launcher::new(settings, manifest);
    let status = finish(runtime.block_on(launcher.run(cli.args)))?;
    Ok(ExitCode::from(status))
}

/// Turns a launch result into the process exit status.
///
/// When Liquibase itself fails its exit code is kept; every other failure is
/// returned as an error for `main` to report.
fn finish(result: Result<(), LaunchError>) -> Result<u8> {
    match result {
        Ok(()) => Ok(0),
        Err(e) if e.is_tool_failure() => {
            tracing::error!("{}", e);
            Ok(exit_status(e.exit_code()))
        }
        Err(e @ LaunchError::Execution(_)) => Err(e).context("failed to run Liquibase"),
        Err(e) => Err(e.into()),
    }
}

/// Maps a failed child's exit code onto the range a process can return.
fn exit_status(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(0) | Err(_) => 1,
        Ok(code) => code,
    }
}
