//! Zip extraction for downloaded Liquibase releases.
//!
//! Entries are written in archive order. Parent directories are created on
//! demand, so archives that list files before their directories still
//! extract. Unix permission bits recorded in the archive are restored.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to open archive {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read zip {}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("Failed to create directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to set permissions on {}", .path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One archive member, as seen while extracting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the extraction root.
    pub path: PathBuf,
    pub is_dir: bool,
    /// Unix permission bits, when the archive recorded them.
    pub mode: Option<u32>,
}

/// What an extraction wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub files: usize,
    pub directories: usize,
    /// Raw names of entries skipped because their path would escape the destination.
    pub skipped: Vec<String>,
}

// ============================================================================
// ZIP Extraction
// ============================================================================

/// Extracts a zip archive into `dest_dir`.
///
/// A failure part-way through leaves whatever was already written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<ExtractionSummary, ExtractionError> {
    debug!(
        "Extracting {} to {}",
        archive_path.display(),
        dest_dir.display()
    );

    let archive_err = |source| ExtractionError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path).map_err(|source| ExtractionError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut archive = zip::ZipArchive::new(file).map_err(archive_err)?;

    create_dir(dest_dir)?;

    let mut summary = ExtractionSummary::default();

    for i in 0..archive.len() {
        let mut member = archive.by_index(i).map_err(archive_err)?;

        let entry = match member.enclosed_name() {
            Some(path) => ArchiveEntry {
                path: path.to_path_buf(),
                is_dir: member.is_dir(),
                mode: member.unix_mode(),
            },
            None => {
                summary.skipped.push(member.name().to_string());
                continue;
            }
        };

        let dest_path = dest_dir.join(&entry.path);

        if entry.is_dir {
            create_dir(&dest_path)?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            create_dir(parent)?;
        }

        let write_err = |source| ExtractionError::Write {
            path: dest_path.clone(),
            source,
        };

        let mut outfile = File::create(&dest_path).map_err(write_err)?;
        io::copy(&mut member, &mut outfile).map_err(write_err)?;

        #[cfg(unix)]
        apply_unix_mode(&dest_path, entry.mode)?;

        summary.files += 1;
    }

    debug!(
        files = summary.files,
        directories = summary.directories,
        skipped = summary.skipped.len(),
        "ZIP extraction complete"
    );
    Ok(summary)
}

/// Lists the entries of a zip archive without extracting it.
pub fn list_entries(archive_path: &Path) -> Result<Vec<ArchiveEntry>, ExtractionError> {
    let file = File::open(archive_path).map_err(|source| ExtractionError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let archive_err = |source| ExtractionError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };

    let mut archive = zip::ZipArchive::new(file).map_err(archive_err)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let member = archive.by_index_raw(i).map_err(archive_err)?;
        if let Some(path) = member.enclosed_name() {
            entries.push(ArchiveEntry {
                path: path.to_path_buf(),
                is_dir: member.is_dir(),
                mode: member.unix_mode(),
            });
        }
    }

    Ok(entries)
}

fn create_dir(path: &Path) -> Result<(), ExtractionError> {
    fs::create_dir_all(path).map_err(|source| ExtractionError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Unix Permissions
// ============================================================================

#[cfg(unix)]
fn apply_unix_mode(path: &Path, mode: Option<u32>) -> Result<(), ExtractionError> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        // rwx bits only; setuid, setgid and sticky are dropped.
        let permissions = fs::Permissions::from_mode(mode & 0o777);
        fs::set_permissions(path, permissions).map_err(|source| {
            ExtractionError::Permissions {
                path: path.to_path_buf(),
                source,
            }
        })?;
    }

    Ok(())
}

/// Sets executable permission on a file (Unix only).
///
/// On Windows, this is a no-op.
#[allow(unused_variables)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(permissions.mode() | 0o755);
        fs::set_permissions(path, permissions)?;

        debug!("Set executable permission on {}", path.display());
    }

    Ok(())
}
