//! Release manifest for Liquibase archives and extensions.
//!
//! The manifest maps a Liquibase version to its release archive and an
//! extension name to its jar URL. It is injected into the provisioner rather
//! than compiled into it, so tests and air-gapped mirrors can supply their own
//! (see `--manifest` on the CLI).
//!
//! Templates substitute `{version}` and `{name}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

// ============================================================================
// Liquibase Defaults
// ============================================================================

/// Known-good Liquibase release used when no version is requested.
pub const DEFAULT_LIQUIBASE_VERSION: &str = "4.21.1";

const LIQUIBASE_ARCHIVE_URL: &str =
    "https://github.com/liquibase/liquibase/releases/download/v{version}/liquibase-{version}.zip";

const LIQUIBASE_EXTENSION_URL: &str =
    "https://github.com/liquibase/{name}/releases/download/v{version}/{name}-{version}.jar";

const LIQUIBASE_EXTENSIONS: &[&str] = &["liquibase-bigquery", "liquibase-redshift"];

// ============================================================================
// Manifest Data Structures
// ============================================================================

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read release manifest {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse release manifest {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An explicitly pinned release archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub url: String,
    /// Expected SHA256 of the archive (lowercase hex), or None to skip verification.
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Where Liquibase releases and extension jars are downloaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Archive URL for versions without an explicit entry in `releases`.
    #[serde(default)]
    pub archive_url_template: Option<String>,
    /// Explicit archives keyed by version. These win over the template.
    #[serde(default)]
    pub releases: BTreeMap<String, ReleaseEntry>,
    /// Jar URL for an extension.
    pub extension_url_template: String,
    /// Extensions fetched when the caller does not choose any.
    #[serde(default)]
    pub default_extensions: Vec<String>,
}

impl Default for ReleaseManifest {
    fn default() -> Self {
        Self::liquibase()
    }
}

impl ReleaseManifest {
    /// The upstream GitHub release layout.
    pub fn liquibase() -> Self {
        Self {
            archive_url_template: Some(LIQUIBASE_ARCHIVE_URL.to_string()),
            releases: BTreeMap::new(),
            extension_url_template: LIQUIBASE_EXTENSION_URL.to_string(),
            default_extensions: LIQUIBASE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Pins an explicit archive for `version`.
    pub fn with_release(
        mut self,
        version: impl Into<String>,
        url: impl Into<String>,
        sha256: Option<&str>,
    ) -> Self {
        self.releases.insert(
            version.into(),
            ReleaseEntry {
                url: url.into(),
                sha256: sha256.map(str::to_lowercase),
            },
        );
        self
    }

    /// Returns the archive URL for a version, if the manifest knows one.
    pub fn archive_url(&self, version: &str) -> Option<String> {
        if let Some(entry) = self.releases.get(version) {
            return Some(entry.url.clone());
        }

        self.archive_url_template
            .as_deref()
            .map(|template| render(template, &[("version", version)]))
    }

    /// Returns the pinned SHA256 for a version's archive.
    pub fn checksum(&self, version: &str) -> Option<&str> {
        self.releases
            .get(version)
            .and_then(|entry| entry.sha256.as_deref())
    }

    /// Returns the jar URL for an extension built against `version`.
    pub fn extension_url(&self, name: &str, version: &str) -> String {
        render(
            &self.extension_url_template,
            &[("name", name), ("version", version)],
        )
    }

    /// Loads a manifest from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let manifest =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Release manifest loaded from {}", path.display());
        Ok(manifest)
    }
}

fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_archive_url() {
        let manifest = ReleaseManifest::default();
        assert_eq!(
            manifest.archive_url("4.21.1").as_deref(),
            Some("https://github.com/liquibase/liquibase/releases/download/v4.21.1/liquibase-4.21.1.zip")
        );
    }

    #[test]
    fn test_extension_url_substitutes_name_and_version() {
        let manifest = ReleaseManifest::default();
        assert_eq!(
            manifest.extension_url("liquibase-redshift", "4.21.1"),
            "https://github.com/liquibase/liquibase-redshift/releases/download/v4.21.1/liquibase-redshift-4.21.1.jar"
        );
    }

    #[test]
    fn test_pinned_release_wins_over_template() {
        let manifest = ReleaseManifest::default().with_release(
            "4.21.1",
            "https://mirror.internal/lb.zip",
            Some("ABCDEF"),
        );

        assert_eq!(
            manifest.archive_url("4.21.1").as_deref(),
            Some("https://mirror.internal/lb.zip")
        );
        assert_eq!(manifest.checksum("4.21.1"), Some("abcdef"));
        assert_eq!(manifest.checksum("4.20.0"), None);
    }

    #[test]
    fn test_unknown_version_without_template() {
        let manifest = ReleaseManifest {
            archive_url_template: None,
            ..ReleaseManifest::default()
        };
        assert!(manifest.archive_url("4.21.1").is_none());
    }

    #[test]
    fn test_default_extensions() {
        let manifest = ReleaseManifest::default();
        assert_eq!(
            manifest.default_extensions,
            vec!["liquibase-bigquery", "liquibase-redshift"]
        );
    }

    #[test]
    fn test_load_from_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.json");
        fs::write(
            &path,
            r#"{
                "releases": {
                    "4.21.1": { "url": "https://mirror.internal/liquibase-4.21.1.zip" }
                },
                "extension_url_template": "https://mirror.internal/{name}-{version}.jar"
            }"#,
        )
        .unwrap();

        let manifest = ReleaseManifest::load_from(&path).unwrap();
        assert!(manifest.archive_url_template.is_none());
        assert!(manifest.default_extensions.is_empty());
        assert_eq!(
            manifest.archive_url("4.21.1").as_deref(),
            Some("https://mirror.internal/liquibase-4.21.1.zip")
        );
        assert_eq!(
            manifest.extension_url("ext", "1.0"),
            "https://mirror.internal/ext-1.0.jar"
        );
    }

    #[test]
    fn test_load_from_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.json");
        fs::write(&path, "not valid json {{{{").unwrap();

        assert!(matches!(
            ReleaseManifest::load_from(&path),
            Err(CatalogError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.json");

        assert!(matches!(
            ReleaseManifest::load_from(&path),
            Err(CatalogError::Read { .. })
        ));
    }
}
