//! Event reporting for provisioning and invocation.
//!
//! The provisioner and invoker never write to the terminal themselves. They
//! report [`LaunchEvent`]s to an injected [`Observer`]; the default
//! [`TracingObserver`] turns those into `tracing` records.

use std::path::PathBuf;

use tracing::{debug, info, warn};

/// Something that happened while provisioning or running Liquibase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    /// A user-supplied installation is used as-is.
    UsingUserInstallation { path: PathBuf },
    /// The release directory already exists, so nothing is downloaded.
    AlreadyInstalled { version: String, path: PathBuf },
    /// The release directory exists but lacks a matching install marker.
    StaleInstallation { path: PathBuf },
    DownloadStarted { url: String, dest: PathBuf },
    DownloadFinished { url: String, bytes: u64 },
    ExtractionStarted { archive: PathBuf, dest: PathBuf },
    ExtractionFinished { dest: PathBuf, files: usize },
    /// An archive entry was not written because its path escapes the destination.
    EntrySkipped { archive: PathBuf, name: String },
    /// The extracted release has no launcher script at the expected path.
    EntryPointMissing { path: PathBuf },
    /// The install marker could not be written. The release is still usable.
    MarkerWriteFailed { path: PathBuf, error: String },
    /// The staged archive could not be removed after extraction.
    ArchiveCleanupFailed { path: PathBuf, error: String },
    /// The release is unpacked and ready to run.
    Installed { version: String, path: PathBuf },
    /// An extension jar is already in the library directory.
    ExtensionPresent { name: String, path: PathBuf },
    /// An extension jar could not be fetched. Provisioning carries on.
    ExtensionFailed { name: String, error: String },
    ProcessStarted { program: PathBuf, args: Vec<String> },
    /// The child exited. `code` is `None` when it was killed by a signal.
    ProcessExited { code: Option<i32> },
}

/// Receives [`LaunchEvent`]s.
pub trait Observer: Send + Sync {
    fn notify(&self, event: &LaunchEvent);
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, event: &LaunchEvent) {
        match event {
            LaunchEvent::UsingUserInstallation { path } => {
                info!(path = %path.display(), "Using user-provided Liquibase installation");
            }
            LaunchEvent::AlreadyInstalled { version, path } => {
                info!(
                    version = %version,
                    path = %path.display(),
                    "Liquibase already installed, skipping download"
                );
            }
            LaunchEvent::StaleInstallation { path } => {
                warn!(
                    path = %path.display(),
                    "Liquibase directory has no matching install marker, reinstalling"
                );
            }
            LaunchEvent::DownloadStarted { url, dest } => {
                info!("Downloading {} to {}", url, dest.display());
            }
            LaunchEvent::DownloadFinished { url, bytes } => {
                debug!(url = %url, bytes, "Download complete");
            }
            LaunchEvent::ExtractionStarted { archive, dest } => {
                info!("Extracting {} to {}", archive.display(), dest.display());
            }
            LaunchEvent::ExtractionFinished { dest, files } => {
                debug!(dest = %dest.display(), files, "Extraction complete");
            }
            LaunchEvent::EntrySkipped { archive, name } => {
                warn!(archive = %archive.display(), "Skipping unsafe path in zip: {}", name);
            }
            LaunchEvent::Installed { version, path } => {
                debug!(version = %version, path = %path.display(), "Liquibase installed");
            }
            LaunchEvent::EntryPointMissing { path } => {
                warn!("No Liquibase launcher found at {}", path.display());
            }
            LaunchEvent::MarkerWriteFailed { path, error } => {
                warn!("Failed to write install marker in {}: {}", path.display(), error);
            }
            LaunchEvent::ArchiveCleanupFailed { path, error } => {
                warn!("Failed to clean up archive {}: {}", path.display(), error);
            }
            LaunchEvent::ExtensionPresent { name, path } => {
                info!(
                    extension = %name,
                    path = %path.display(),
                    "Extension already available, skipping download"
                );
            }
            LaunchEvent::ExtensionFailed { name, error } => {
                warn!(extension = %name, "Failed to download Liquibase extension: {}", error);
            }
            LaunchEvent::ProcessStarted { program, args } => {
                info!("Executing {} {}", program.display(), args.join(" "));
            }
            LaunchEvent::ProcessExited { code } => {
                debug!(?code, "Liquibase exited");
            }
        }
    }
}
