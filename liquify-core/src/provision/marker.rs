//! Install marker persistence.
//!
//! After a release is fully extracted, a small JSON record is written into its
//! directory. The marker is what lets `InstallCheck::Marker` tell a complete
//! install from a directory left behind by an interrupted extraction.
//!
//! The marker is stored at `{release_dir}/.liquify-install.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the marker inside a release directory.
pub const MARKER_FILE_NAME: &str = ".liquify-install.json";

/// Current schema version for the marker file.
const SCHEMA_VERSION: u32 = 1;

/// What was installed into a release directory, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Installed Liquibase version.
    pub version: String,
    /// Archive the release was extracted from.
    pub archive_url: String,
    /// When the extraction finished.
    pub installed_at: DateTime<Utc>,
    /// Size of the downloaded archive in bytes.
    pub size_bytes: u64,
}

impl InstallRecord {
    pub fn new(version: impl Into<String>, archive_url: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: version.into(),
            archive_url: archive_url.into(),
            installed_at: Utc::now(),
            size_bytes,
        }
    }
}

/// Returns the marker path for a release directory.
pub fn marker_path(release_dir: &Path) -> PathBuf {
    release_dir.join(MARKER_FILE_NAME)
}

/// Loads the install marker from a release directory.
///
/// A missing, unreadable, or corrupted marker reads as `None`.
pub fn load_marker(release_dir: &Path) -> Option<InstallRecord> {
    let path = marker_path(release_dir);
    if !path.exists() {
        debug!("Install marker not found at {}", path.display());
        return None;
    }

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read install marker at {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<InstallRecord>(&content) {
        Ok(record) => {
            if record.schema_version != SCHEMA_VERSION {
                info!(
                    "Install marker schema version {} differs from current {}",
                    record.schema_version, SCHEMA_VERSION
                );
            }
            Some(record)
        }
        Err(e) => {
            warn!(
                "Failed to parse install marker at {}: {}. Treating as absent.",
                path.display(),
                e
            );
            None
        }
    }
}

/// Writes the install marker into a release directory.
pub fn save_marker(release_dir: &Path, record: &InstallRecord) -> io::Result<()> {
    let path = marker_path(release_dir);
    let content = serde_json::to_string_pretty(record)?;
    fs::write(&path, content)?;

    debug!("Install marker saved to {}", path.display());
    Ok(())
}
