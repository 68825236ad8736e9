//! Configuration module for liquify.
//!
//! Turns launcher flags into Liquibase global options and provisioning
//! settings, and checks them before anything is downloaded.

mod settings;

pub use settings::{
    load_manifest, ConfigError, LaunchSettings, DEFAULT_DEFAULTS_FILE, DEFAULT_HUB_MODE,
};
