//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use liquify_core::paths::default_install_root;
use liquify_core::{
    InstallCheck, LaunchSettings, ProvisionConfig, ReleaseManifest, DEFAULT_DEFAULTS_FILE,
    DEFAULT_HUB_MODE, DEFAULT_LIQUIBASE_VERSION,
};

#[derive(Debug, Parser)]
#[command(name = "liquify")]
#[command(about = "Download Liquibase on demand and run it")]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Liquibase properties file
    #[arg(short = 'd', long, env = "LIQUIFY_DEFAULTS_FILE", default_value = DEFAULT_DEFAULTS_FILE)]
    pub defaults_file: String,

    /// Liquibase Hub mode
    #[arg(short = 'm', long, env = "LIQUIFY_HUB_MODE", default_value = DEFAULT_HUB_MODE)]
    pub hub_mode: String,

    /// Liquibase log level
    #[arg(short = 'l', long, env = "LIQUIFY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Use an existing Liquibase installation instead of downloading one
    #[arg(short = 'D', long, env = "LIQUIFY_LIQUIBASE_DIR")]
    pub liquibase_dir: Option<PathBuf>,

    /// Directory whose *.jar files are added to the classpath
    #[arg(short = 'j', long, env = "LIQUIFY_JDBC_DRIVERS_DIR")]
    pub jdbc_drivers_dir: Option<PathBuf>,

    /// Extra classpath entries, placed before the JDBC drivers
    #[arg(short = 'a', long, env = "LIQUIFY_ADDITIONAL_CLASSPATH")]
    pub additional_classpath: Option<String>,

    /// Liquibase release to download
    #[arg(short = 'v', long = "version", env = "LIQUIFY_VERSION", default_value = DEFAULT_LIQUIBASE_VERSION)]
    pub liquibase_version: String,

    /// Directory releases are installed under
    #[arg(long, env = "LIQUIFY_INSTALL_ROOT")]
    pub install_root: Option<PathBuf>,

    /// JSON release manifest overriding the built-in download locations
    #[arg(long, env = "LIQUIFY_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Extension to fetch into lib/ (repeatable, replaces the defaults)
    #[arg(long = "extension", env = "LIQUIFY_EXTENSIONS", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Skip extension downloads
    #[arg(long, env = "LIQUIFY_NO_EXTENSIONS", conflicts_with = "extensions")]
    pub no_extensions: bool,

    /// Reinstall when the release directory has no matching install marker
    #[arg(long, env = "LIQUIFY_VERIFY_INSTALL")]
    pub verify_install: bool,

    /// Liquibase command and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Builds launch settings, taking default extensions from `manifest`.
    pub fn settings(&self, manifest: &ReleaseManifest) -> LaunchSettings {
        let install_root = self
            .install_root
            .clone()
            .unwrap_or_else(default_install_root);

        let extensions = if self.no_extensions {
            Vec::new()
        } else if self.extensions.is_empty() {
            manifest.default_extensions.clone()
        } else {
            self.extensions.clone()
        };

        let install_check = if self.verify_install {
            InstallCheck::Marker
        } else {
            InstallCheck::Exists
        };

        let mut provision = ProvisionConfig::new(install_root, &self.liquibase_version)
            .with_extensions(extensions)
            .with_install_check(install_check);
        if let Some(dir) = &self.liquibase_dir {
            provision = provision.with_user_installation(dir);
        }

        LaunchSettings::new(provision)
            .with_defaults_file(non_empty(&self.defaults_file).map(PathBuf::from))
            .with_hub_mode(non_empty(&self.hub_mode))
            .with_log_level(self.log_level.as_deref().and_then(non_empty))
            .with_jdbc_drivers_dir(self.jdbc_drivers_dir.clone())
            .with_additional_classpath(self.additional_classpath.as_deref().and_then(non_empty))
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
