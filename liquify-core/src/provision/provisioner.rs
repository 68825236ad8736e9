//! Provisioner coordinating downloads, extraction, and extensions.
//!
//! The `Provisioner` is the main entry point for making Liquibase available.
//! It coordinates between the release manifest, fetcher, extractor, and
//! install marker, and reports what it does to an [`Observer`].

use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use super::catalog::ReleaseManifest;
use super::downloader::{DownloadError, Fetcher, HttpFetcher};
use super::extractor::{extract_zip, make_executable, ExtractionError};
use super::marker::{load_marker, save_marker, InstallRecord};
use super::types::{
    ExtensionOutcome, ExtensionStatus, InstallCheck, ProvisionConfig, Provisioned, ToolLocation,
    ToolVersion, EXECUTABLE_NAME,
};
use crate::observer::{LaunchEvent, Observer, TracingObserver};
use crate::paths;

/// Failure of the mandatory release step.
///
/// Extension downloads never produce this; see [`ExtensionOutcome`].
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("No release archive is known for Liquibase {0}")]
    UnknownVersion(String),
    #[error("Failed to download Liquibase {version}")]
    Download {
        version: String,
        #[source]
        source: DownloadError,
    },
    #[error("Failed to extract Liquibase {version}")]
    Extraction {
        version: String,
        #[source]
        source: ExtractionError,
    },
    #[error("Failed to prepare {}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Provisioner
// ============================================================================

/// Makes a Liquibase installation available, downloading it if needed.
pub struct Provisioner {
    /// Where archives and extensions are downloaded from.
    manifest: ReleaseManifest,
    fetcher: Arc<dyn Fetcher>,
    observer: Arc<dyn Observer>,
    /// Where the release archive is staged before extraction.
    staging_dir: PathBuf,
}

impl Provisioner {
    /// Creates a provisioner that downloads over HTTP and logs via `tracing`.
    pub fn new(manifest: ReleaseManifest) -> Self {
        Self {
            manifest,
            fetcher: Arc::new(HttpFetcher::new()),
            observer: Arc::new(TracingObserver),
            staging_dir: std::env::temp_dir(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_staging_dir(mut self, staging_dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    pub fn manifest(&self) -> &ReleaseManifest {
        &self.manifest
    }

    /// Ensures the configured release is installed, then fetches extensions.
    ///
    /// A user-supplied installation is returned as-is without touching the
    /// network. Otherwise an existing release directory counts as installed
    /// (subject to `config.install_check`); a missing one is downloaded and
    /// extracted. Extension failures are reported in the result, not as errors.
    pub async fn provision(&self, config: &ProvisionConfig) -> Result<Provisioned, ProvisionError> {
        if let Some(path) = &config.user_installation {
            self.observer.notify(&LaunchEvent::UsingUserInstallation { path: path.clone() });
            return Ok(Provisioned {
                location: ToolLocation::new(path.clone(), ToolVersion::UserProvided),
                installed: false,
                extensions: Vec::new(),
            });
        }

        let release_dir = config.release_dir();
        let installed = if self.accept_existing(&release_dir, config).await? {
            false
        } else {
            self.install_release(&config.version, &release_dir).await?;
            true
        };

        let location = ToolLocation::new(release_dir, ToolVersion::Release(config.version.clone()));
        let extensions = self
            .fetch_extensions(&location, &config.version, &config.extensions)
            .await;

        Ok(Provisioned {
            location,
            installed,
            extensions,
        })
    }

    // ========================================================================
    // Release Installation
    // ========================================================================

    /// Returns true if an existing release directory can be used as-is.
    async fn accept_existing(
        &self,
        release_dir: &Path,
        config: &ProvisionConfig,
    ) -> Result<bool, ProvisionError> {
        if !release_dir.exists() {
            return Ok(false);
        }

        if config.install_check == InstallCheck::Marker {
            let complete = load_marker(release_dir)
                .is_some_and(|record| record.version == config.version);

            if !complete {
                self.observer.notify(&LaunchEvent::StaleInstallation {
                    path: release_dir.to_path_buf(),
                });

                // Clean up the previous partial install
                tokio::fs::remove_dir_all(release_dir)
                    .await
                    .map_err(|source| ProvisionError::Filesystem {
                        path: release_dir.to_path_buf(),
                        source,
                    })?;
                return Ok(false);
            }
        }

        self.observer.notify(&LaunchEvent::AlreadyInstalled {
            version: config.version.clone(),
            path: release_dir.to_path_buf(),
        });
        Ok(true)
    }

    async fn install_release(&self, version: &str, release_dir: &Path) -> Result<(), ProvisionError> {
        let url = self
            .manifest
            .archive_url(version)
            .ok_or_else(|| ProvisionError::UnknownVersion(version.to_string()))?;
        let archive_path = paths::staged_archive_path(&self.staging_dir, version);

        self.observer.notify(&LaunchEvent::DownloadStarted {
            url: url.clone(),
            dest: archive_path.clone(),
        });

        let bytes = self
            .fetcher
            .fetch(&url, &archive_path, self.manifest.checksum(version))
            .await
            .map_err(|source| ProvisionError::Download {
                version: version.to_string(),
                source,
            })?;

        self.observer.notify(&LaunchEvent::DownloadFinished {
            url: url.clone(),
            bytes,
        });

        self.observer.notify(&LaunchEvent::ExtractionStarted {
            archive: archive_path.clone(),
            dest: release_dir.to_path_buf(),
        });

        let summary = extract_zip(&archive_path, release_dir).map_err(|source| {
            ProvisionError::Extraction {
                version: version.to_string(),
                source,
            }
        })?;

        self.observer.notify(&LaunchEvent::ExtractionFinished {
            dest: release_dir.to_path_buf(),
            files: summary.files,
        });
        for name in summary.skipped {
            self.observer.notify(&LaunchEvent::EntrySkipped {
                archive: archive_path.clone(),
                name,
            });
        }

        let executable = release_dir.join(EXECUTABLE_NAME);
        if executable.is_file() {
            make_executable(&executable).map_err(|source| ProvisionError::Filesystem {
                path: executable.clone(),
                source,
            })?;
        } else {
            self.observer
                .notify(&LaunchEvent::EntryPointMissing { path: executable });
        }

        let record = InstallRecord::new(version, url, bytes);
        if let Err(e) = save_marker(release_dir, &record) {
            self.observer.notify(&LaunchEvent::MarkerWriteFailed {
                path: release_dir.to_path_buf(),
                error: e.to_string(),
            });
        }

        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            self.observer.notify(&LaunchEvent::ArchiveCleanupFailed {
                path: archive_path,
                error: e.to_string(),
            });
        }

        self.observer.notify(&LaunchEvent::Installed {
            version: version.to_string(),
            path: release_dir.to_path_buf(),
        });
        Ok(())
    }

    // ========================================================================
    // Extensions
    // ========================================================================

    async fn fetch_extensions(
        &self,
        location: &ToolLocation,
        version: &str,
        names: &[String],
    ) -> Vec<ExtensionOutcome> {
        let lib_dir = location.lib_dir();
        let mut outcomes = Vec::with_capacity(names.len());

        for name in names {
            let url = self.manifest.extension_url(name, version);
            let outcome = self.fetch_extension(name, url, &lib_dir).await;

            if let ExtensionStatus::Failed { error } = &outcome.status {
                self.observer.notify(&LaunchEvent::ExtensionFailed {
                    name: name.clone(),
                    error: error.clone(),
                });
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn fetch_extension(&self, name: &str, url: String, lib_dir: &Path) -> ExtensionOutcome {
        let file_name = match extension_file_name(&url) {
            Ok(file_name) => file_name,
            Err(error) => {
                return ExtensionOutcome {
                    name: name.to_string(),
                    url,
                    path: None,
                    status: ExtensionStatus::Failed { error },
                }
            }
        };

        let dest = lib_dir.join(file_name);

        let status = if dest.is_file() {
            self.observer.notify(&LaunchEvent::ExtensionPresent {
                name: name.to_string(),
                path: dest.clone(),
            });
            ExtensionStatus::AlreadyPresent
        } else {
            self.observer.notify(&LaunchEvent::DownloadStarted {
                url: url.clone(),
                dest: dest.clone(),
            });

            match self.fetcher.fetch(&url, &dest, None).await {
                Ok(bytes) => {
                    self.observer.notify(&LaunchEvent::DownloadFinished {
                        url: url.clone(),
                        bytes,
                    });
                    ExtensionStatus::Downloaded { bytes }
                }
                Err(e) => ExtensionStatus::Failed {
                    error: error_chain(&e),
                },
            }
        };

        ExtensionOutcome {
            name: name.to_string(),
            url,
            path: Some(dest),
            status,
        }
    }
}

/// Renders an error and its sources as one `a: b: c` line.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Returns the file name an extension URL downloads to.
///
/// The name is the last path segment and must end in `.jar` or `.zip`.
pub fn extension_file_name(url: &str) -> Result<String, String> {
    let parsed = Url::parse(url).map_err(|e| format!("Invalid extension URL {}: {}", url, e))?;

    let file_name = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| format!("Extension URL has no file name: {}", url))?;

    if !file_name.ends_with(".jar") && !file_name.ends_with(".zip") {
        return Err(format!(
            "Unexpected extension URL {}. Expecting a link to a .jar or .zip file",
            url
        ));
    }

    Ok(file_name.to_string())
}
