//! Path resolution for provisioned Liquibase releases.
//!
//! Releases are unpacked under a per-user install root:
//!
//! - Linux: `~/.cache/liquify/`
//! - macOS: `~/Library/Caches/liquify/`
//! - Windows: `C:\Users\<User>\AppData\Local\liquify\`
//!
//! If the platform has no cache directory, the OS temp folder is used instead.

use std::path::{Path, PathBuf};

/// Subdirectory name under the cache (or temp) folder.
const LIQUIFY_DIR: &str = "liquify";

/// Returns the default install root.
///
/// e.g., `~/.cache/liquify/` on Linux, `/tmp/liquify/` when no cache dir exists
pub fn default_install_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(LIQUIFY_DIR)
}

/// Returns the directory a release is unpacked into.
///
/// Path: `{root}/liquibase-{version}/`
pub fn release_dir(install_root: &Path, version: &str) -> PathBuf {
    install_root.join(format!("liquibase-{version}"))
}

/// Returns where the release archive is staged before extraction.
///
/// Path: `{temp}/liquibase-{version}.zip`
pub fn staged_archive_path(temp_dir: &Path, version: &str) -> PathBuf {
    temp_dir.join(format!("liquibase-{version}.zip"))
}

/// Returns the path-list separator used when joining classpath entries.
#[inline]
pub fn path_list_separator() -> &'static str {
    #[cfg(windows)]
    {
        ";"
    }
    #[cfg(not(windows))]
    {
        ":"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_install_root_ends_with_liquify() {
        assert!(default_install_root().ends_with(LIQUIFY_DIR));
    }

    #[test]
    fn test_release_dir_includes_version() {
        let dir = release_dir(Path::new("/opt/tools"), "4.21.1");
        assert_eq!(dir, PathBuf::from("/opt/tools/liquibase-4.21.1"));
    }

    #[test]
    fn test_staged_archive_path() {
        let path = staged_archive_path(Path::new("/tmp"), "4.21.1");
        assert_eq!(path, PathBuf::from("/tmp/liquibase-4.21.1.zip"));
    }
}
