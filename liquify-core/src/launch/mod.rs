//! Running Liquibase.
//!
//! # Architecture
//!
//! - `command` - renders global options as `--key=value` tokens
//! - `invoker` - spawns the launcher script with pass-through I/O
//! - `launcher` - ties settings, provisioning, and invocation together
//!
//! # Example
//!
//! ```ignore
//! use liquify_core::{LaunchSettings, Launcher, ProvisionConfig, ReleaseManifest};
//!
//! let provision = ProvisionConfig::new("/opt/liquify", "4.21.1");
//! let launcher = Launcher::new(LaunchSettings::new(provision), ReleaseManifest::default());
//!
//! if let Err(e) = launcher.run(["update"]).await {
//!     std::process::exit(e.exit_code());
//! }
//! ```

mod command;
mod invoker;
mod launcher;

pub use command::{assemble, CommandOptions, InvocationArgs, MigrationCommand};
pub use invoker::{ExecutionError, Invoker};
pub use launcher::{LaunchError, Launcher};
