//! Launcher settings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::launch::CommandOptions;
use crate::paths;
use crate::provision::{CatalogError, ProvisionConfig, ReleaseManifest};

/// Properties file Liquibase reads when none is given.
pub const DEFAULT_DEFAULTS_FILE: &str = "liquibase.properties";

/// Liquibase Hub is disabled unless asked for.
pub const DEFAULT_HUB_MODE: &str = "off";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Defaults file {} does not exist or is not a file", .0.display())]
    DefaultsFileMissing(PathBuf),
    #[error("Failed to read JDBC drivers directory {}", .path.display())]
    DriversDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Manifest(#[from] CatalogError),
}

// =============================================================================
// Launch Settings
// =============================================================================

/// Everything needed to provision and run Liquibase once.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSettings {
    /// Passed as `--defaults-file`. Must exist when set.
    pub defaults_file: Option<PathBuf>,
    /// Passed as `--hub-mode`.
    pub hub_mode: Option<String>,
    /// Passed as `--log-level`.
    pub log_level: Option<String>,
    /// Every `*.jar` in here is added to `--classpath`.
    pub jdbc_drivers_dir: Option<PathBuf>,
    /// Prepended to `--classpath` as given.
    pub additional_classpath: Option<String>,
    pub provision: ProvisionConfig,
}

impl LaunchSettings {
    /// Settings with the stock defaults file and hub mode.
    pub fn new(provision: ProvisionConfig) -> Self {
        Self {
            defaults_file: Some(PathBuf::from(DEFAULT_DEFAULTS_FILE)),
            hub_mode: Some(DEFAULT_HUB_MODE.to_string()),
            log_level: None,
            jdbc_drivers_dir: None,
            additional_classpath: None,
            provision,
        }
    }

    pub fn with_defaults_file(mut self, path: Option<PathBuf>) -> Self {
        self.defaults_file = path.filter(|p| !p.as_os_str().is_empty());
        self
    }

    pub fn with_hub_mode(mut self, mode: Option<String>) -> Self {
        self.hub_mode = mode;
        self
    }

    pub fn with_log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_jdbc_drivers_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.jdbc_drivers_dir = dir.filter(|p| !p.as_os_str().is_empty());
        self
    }

    pub fn with_additional_classpath(mut self, classpath: Option<String>) -> Self {
        self.additional_classpath = classpath;
        self
    }

    /// Fails if the defaults file is configured but is not a regular file.
    pub fn preflight(&self) -> Result<(), ConfigError> {
        match &self.defaults_file {
            Some(path) if !path.as_os_str().is_empty() && !path.is_file() => {
                Err(ConfigError::DefaultsFileMissing(path.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Builds the Liquibase global options, expanding the drivers directory.
    pub fn command_options(&self) -> Result<CommandOptions, ConfigError> {
        Ok(CommandOptions {
            defaults_file: self
                .defaults_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            hub_mode: self.hub_mode.clone(),
            log_level: self.log_level.clone(),
            classpath: self.classpath()?,
            extra: Vec::new(),
        })
    }

    fn classpath(&self) -> Result<Option<String>, ConfigError> {
        let mut entries: Vec<String> = self
            .additional_classpath
            .iter()
            .filter(|cp| !cp.is_empty())
            .cloned()
            .collect();

        if let Some(dir) = &self.jdbc_drivers_dir {
            entries.extend(
                driver_jars(dir)?
                    .into_iter()
                    .map(|jar| jar.to_string_lossy().into_owned()),
            );
        }

        if entries.is_empty() {
            Ok(None)
        } else {
            Ok(Some(entries.join(paths::path_list_separator())))
        }
    }
}

/// Lists `*.jar` files directly inside `dir`, sorted by path.
fn driver_jars(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let read_err = |source| ConfigError::DriversDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut jars = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_jar = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"));

        if is_jar && path.is_file() {
            jars.push(path);
        }
    }

    jars.sort();
    debug!(dir = %dir.display(), count = jars.len(), "Found JDBC driver jars");
    Ok(jars)
}

/// Loads a release manifest from JSON, or the built-in one when `path` is `None`.
pub fn load_manifest(path: Option<&Path>) -> Result<ReleaseManifest, ConfigError> {
    match path {
        Some(path) => Ok(ReleaseManifest::load_from(path)?),
        None => Ok(ReleaseManifest::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings() -> LaunchSettings {
        LaunchSettings::new(ProvisionConfig::new("/opt/liquify", "4.21.1"))
    }

    #[test]
    fn test_defaults() {
        let settings = settings();
        assert_eq!(
            settings.defaults_file.as_deref(),
            Some(Path::new("liquibase.properties"))
        );
        assert_eq!(settings.hub_mode.as_deref(), Some("off"));
        assert!(settings.log_level.is_none());
    }

    #[test]
    fn test_preflight_missing_defaults_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.properties");

        let err = settings()
            .with_defaults_file(Some(missing.clone()))
            .preflight()
            .unwrap_err();

        assert!(matches!(err, ConfigError::DefaultsFileMissing(path) if path == missing));
    }

    #[test]
    fn test_preflight_rejects_directory_as_defaults_file() {
        let temp_dir = TempDir::new().unwrap();

        let err = settings()
            .with_defaults_file(Some(temp_dir.path().to_path_buf()))
            .preflight()
            .unwrap_err();

        assert!(matches!(err, ConfigError::DefaultsFileMissing(_)));
    }

    #[test]
    fn test_drivers_dir_error_message_names_cause_once() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("drivers");
        let err = settings()
            .with_jdbc_drivers_dir(Some(dir.clone()))
            .command_options()
            .unwrap_err();

        let message = err.to_string();
        assert_eq!(
            message,
            format!("Failed to read JDBC drivers directory {}", dir.display())
        );
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert!(!message.contains(&cause));
    }

    #[test]
    fn test_preflight_existing_or_unset_defaults_file() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("db.properties");
        fs::write(&present, "url=jdbc:h2:mem:test\n").unwrap();

        assert!(settings().with_defaults_file(Some(present)).preflight().is_ok());
        assert!(settings().with_defaults_file(None).preflight().is_ok());
        assert!(settings()
            .with_defaults_file(Some(PathBuf::new()))
            .preflight()
            .is_ok());
    }

    #[test]
    fn test_command_options_without_classpath() {
        let options = settings()
            .with_log_level(Some("debug".into()))
            .command_options()
            .unwrap();

        assert_eq!(options.defaults_file.as_deref(), Some("liquibase.properties"));
        assert_eq!(options.hub_mode.as_deref(), Some("off"));
        assert_eq!(options.log_level.as_deref(), Some("debug"));
        assert!(options.classpath.is_none());
    }

    #[test]
    fn test_drivers_dir_lists_sorted_jars_only() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("postgresql.jar"), b"pg").unwrap();
        fs::write(dir.join("mysql.JAR"), b"my").unwrap();
        fs::write(dir.join("README.md"), b"docs").unwrap();
        fs::create_dir(dir.join("nested.jar")).unwrap();

        let options = settings()
            .with_additional_classpath(Some("/extra/classes".into()))
            .with_jdbc_drivers_dir(Some(dir.to_path_buf()))
            .command_options()
            .unwrap();

        let sep = paths::path_list_separator();
        let expected = [
            "/extra/classes".to_string(),
            dir.join("mysql.JAR").to_string_lossy().into_owned(),
            dir.join("postgresql.jar").to_string_lossy().into_owned(),
        ]
        .join(sep);

        assert_eq!(options.classpath.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_missing_drivers_dir_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = settings()
            .with_jdbc_drivers_dir(Some(temp_dir.path().join("drivers")))
            .command_options()
            .unwrap_err();

        assert!(matches!(err, ConfigError::DriversDir { .. }));
    }

    #[test]
    fn test_load_manifest_default_and_file() {
        let builtin = load_manifest(None).unwrap();
        assert_eq!(builtin, ReleaseManifest::default());

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_manifest(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Manifest(CatalogError::Parse { .. })));
    }
}
