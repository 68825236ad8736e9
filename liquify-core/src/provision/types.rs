//! Core types for provisioning.
//!
//! This module defines what the provisioner is asked to do
//! ([`ProvisionConfig`]), where the tool ended up ([`ToolLocation`]), and how
//! each best-effort extension download went ([`ExtensionOutcome`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::paths;

/// Name of the Liquibase launcher script inside an installation.
#[cfg(windows)]
pub const EXECUTABLE_NAME: &str = "liquibase.bat";

/// Name of the Liquibase launcher script inside an installation.
#[cfg(not(windows))]
pub const EXECUTABLE_NAME: &str = "liquibase";

/// Library subdirectory that extension jars are downloaded into.
pub const LIB_DIR_NAME: &str = "lib";

// ============================================================================
// Provision Config
// ============================================================================

/// How an existing release directory is judged to be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallCheck {
    /// The directory existing is enough. Its contents are not inspected.
    #[default]
    Exists,
    /// The directory must hold an install marker recording the same version.
    Marker,
}

/// What to provision and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Directory that release directories are created under.
    pub install_root: PathBuf,
    /// Liquibase release to install.
    pub version: String,
    /// Pre-existing installation. When set, nothing is downloaded.
    pub user_installation: Option<PathBuf>,
    /// Extension names to fetch into the library directory.
    pub extensions: Vec<String>,
    /// How an existing release directory is validated.
    pub install_check: InstallCheck,
}

impl ProvisionConfig {
    /// Creates a config for a release under `install_root` with no extensions.
    pub fn new(install_root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            install_root: install_root.into(),
            version: version.into(),
            user_installation: None,
            extensions: Vec::new(),
            install_check: InstallCheck::default(),
        }
    }

    pub fn with_user_installation(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_installation = Some(path.into());
        self
    }

    pub fn with_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_install_check(mut self, check: InstallCheck) -> Self {
        self.install_check = check;
        self
    }

    /// Directory the configured release is unpacked into.
    pub fn release_dir(&self) -> PathBuf {
        paths::release_dir(&self.install_root, &self.version)
    }
}

// ============================================================================
// Tool Location
// ============================================================================

/// Version of a provisioned installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolVersion {
    /// A release installed (or found) under the install root.
    Release(String),
    /// A user-supplied installation whose version is never checked.
    UserProvided,
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release(version) => write!(f, "{}", version),
            Self::UserProvided => write!(f, "user-provided"),
        }
    }
}

/// Where a usable Liquibase installation lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLocation {
    root: PathBuf,
    version: ToolVersion,
}

impl ToolLocation {
    pub fn new(root: impl Into<PathBuf>, version: ToolVersion) -> Self {
        Self {
            root: root.into(),
            version,
        }
    }

    /// Installation root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version(&self) -> &ToolVersion {
        &self.version
    }

    /// Path to the Liquibase launcher script.
    pub fn executable(&self) -> PathBuf {
        self.root.join(EXECUTABLE_NAME)
    }

    /// Directory extension jars are placed in.
    pub fn lib_dir(&self) -> PathBuf {
        self.root.join(LIB_DIR_NAME)
    }
}

// ============================================================================
// Provisioning Results
// ============================================================================

/// How fetching a single extension went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionStatus {
    /// Downloaded into the library directory.
    Downloaded { bytes: u64 },
    /// A file with the same name was already there.
    AlreadyPresent,
    /// Could not be fetched. Never fatal.
    Failed { error: String },
}

/// Result of one best-effort extension download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionOutcome {
    pub name: String,
    pub url: String,
    /// Target file, if the URL named one.
    pub path: Option<PathBuf>,
    pub status: ExtensionStatus,
}

impl ExtensionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ExtensionStatus::Failed { .. })
    }
}

/// A successful provisioning run.
///
/// The mandatory release step succeeded; `extensions` carries the
/// best-effort results for the caller to report.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub location: ToolLocation,
    /// True when this run downloaded and extracted the release.
    pub installed: bool,
    pub extensions: Vec<ExtensionOutcome>,
}

impl Provisioned {
    /// Extensions that could not be fetched.
    pub fn failed_extensions(&self) -> impl Iterator<Item = &ExtensionOutcome> {
        self.extensions.iter().filter(|outcome| outcome.is_failure())
    }
}
