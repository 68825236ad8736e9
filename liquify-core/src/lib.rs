//! liquify Core Library
//!
//! This crate provides everything the `liquify` launcher needs to run
//! Liquibase without a manual install:
//!
//! - Release manifest describing where archives and extensions live
//! - Provisioning (download, extraction, extension jars, install marker)
//! - Command-line assembly for Liquibase's `--key=value` flag syntax
//! - Subprocess invocation with pass-through output and exit codes
//! - An observer seam that reports progress events (logged via `tracing`)

pub mod config;
pub mod launch;
pub mod observer;
pub mod paths;
pub mod provision;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

// Re-export configuration
pub use config::{ConfigError, LaunchSettings, DEFAULT_DEFAULTS_FILE, DEFAULT_HUB_MODE};

// Re-export provisioning
pub use provision::{
    CatalogError, DownloadError, ExtensionOutcome, ExtensionStatus, ExtractionError, Fetcher,
    HttpFetcher, InstallCheck, ProvisionConfig, ProvisionError, Provisioned, Provisioner,
    ReleaseManifest, ToolLocation, ToolVersion, DEFAULT_LIQUIBASE_VERSION,
};

// Re-export launching
pub use launch::{
    assemble, CommandOptions, ExecutionError, InvocationArgs, Invoker, LaunchError, Launcher,
    MigrationCommand,
};

// Re-export observers
pub use observer::{LaunchEvent, Observer, TracingObserver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
