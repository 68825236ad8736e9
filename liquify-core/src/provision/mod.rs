//! Liquibase provisioning.
//!
//! Liquibase is downloaded on first use and unpacked under the install root
//! (see [`crate::paths`]), so the launcher binary itself stays small.
//!
//! # Architecture
//!
//! - `types`: Core types (ProvisionConfig, ToolLocation, extension outcomes)
//! - `catalog`: Release manifest with archive and extension URL templates
//! - `downloader`: Async HTTP download behind the `Fetcher` trait
//! - `extractor`: Zip extraction preserving unix permissions
//! - `marker`: JSON install marker written after a complete extraction
//! - `provisioner`: High-level "install if missing, then fetch extensions"
//!
//! # Example
//!
//! ```ignore
//! use liquify_core::{ProvisionConfig, Provisioner, ReleaseManifest};
//!
//! let provisioner = Provisioner::new(ReleaseManifest::default());
//! let config = ProvisionConfig::new("/opt/liquify", "4.21.1");
//!
//! let provisioned = provisioner.provision(&config).await?;
//! println!("Liquibase at {}", provisioned.location.executable().display());
//!
//! for failed in provisioned.failed_extensions() {
//!     eprintln!("warning: extension {} unavailable", failed.name);
//! }
//! ```

pub mod catalog;
pub mod downloader;
pub mod extractor;
pub mod marker;
pub mod provisioner;
pub mod types;

// Re-export commonly used types
pub use catalog::{CatalogError, ReleaseEntry, ReleaseManifest, DEFAULT_LIQUIBASE_VERSION};
pub use downloader::{DownloadError, Fetcher, HttpFetcher};
pub use extractor::{extract_zip, make_executable, ArchiveEntry, ExtractionError, ExtractionSummary};
pub use marker::{load_marker, save_marker, InstallRecord, MARKER_FILE_NAME};
pub use provisioner::{extension_file_name, ProvisionError, Provisioner};
pub use types::{
    ExtensionOutcome, ExtensionStatus, InstallCheck, ProvisionConfig, Provisioned, ToolLocation,
    ToolVersion, EXECUTABLE_NAME, LIB_DIR_NAME,
};
