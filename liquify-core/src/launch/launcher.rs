//! End-to-end launch: check settings, provision, assemble, invoke.

use std::sync::Arc;

use thiserror::Error;

use super::command::{assemble, MigrationCommand};
use super::invoker::{ExecutionError, Invoker};
use crate::config::{ConfigError, LaunchSettings};
use crate::observer::Observer;
use crate::provision::{ProvisionError, Provisioned, Provisioner, ReleaseManifest};

/// Any failure of a launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl LaunchError {
    /// Exit code the launcher should finish with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Execution(e) => e.exit_code(),
            _ => 1,
        }
    }

    /// True when Liquibase ran and reported failure itself.
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Failed { .. }))
    }
}

/// Runs Liquibase for one set of settings.
pub struct Launcher {
    settings: LaunchSettings,
    provisioner: Provisioner,
    invoker: Invoker,
}

impl Launcher {
    /// Launcher that downloads over HTTP and logs via `tracing`.
    pub fn new(settings: LaunchSettings, manifest: ReleaseManifest) -> Self {
        Self::from_parts(settings, Provisioner::new(manifest), Invoker::new())
    }

    pub fn from_parts(settings: LaunchSettings, provisioner: Provisioner, invoker: Invoker) -> Self {
        Self {
            settings,
            provisioner,
            invoker,
        }
    }

    /// Routes provisioning and process events to `observer`.
    pub fn with_observer(self, observer: Arc<dyn Observer>) -> Self {
        Self {
            settings: self.settings,
            provisioner: self.provisioner.with_observer(observer.clone()),
            invoker: self.invoker.with_observer(observer),
        }
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    /// Checks the settings and makes Liquibase available without running it.
    pub async fn prepare(&self) -> Result<Provisioned, LaunchError> {
        self.settings.preflight()?;
        Ok(self.provisioner.provision(&self.settings.provision).await?)
    }

    /// Runs Liquibase with the configured options followed by `trailing`.
    pub async fn run<I, S>(&self, trailing: I) -> Result<(), LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = self.settings.command_options()?;
        let provisioned = self.prepare().await?;

        let args = assemble(&options, trailing);
        self.invoker
            .invoke(&provisioned.location.executable(), &args)
            .await?;

        Ok(())
    }

    /// Runs one of the common Liquibase subcommands.
    pub async fn run_command(&self, command: MigrationCommand) -> Result<(), LaunchError> {
        self.run(command.into_args()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::LaunchEvent;
    use crate::provision::ProvisionConfig;
    use crate::test_support::{release_archive, test_manifest, RecordingObserver, StaticFetcher};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const ARCHIVE_URL: &str = "https://releases.test/liquibase-4.21.1.zip";

    /// Script that records its arguments one per line, then exits with `code`.
    fn recording_script(out: &Path, code: i32) -> String {
        format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nexit {}\n",
            out.display(),
            code
        )
    }

    struct Fixture {
        temp_dir: TempDir,
        fetcher: Arc<StaticFetcher>,
        observer: Arc<RecordingObserver>,
    }

    impl Fixture {
        fn new(archive: Vec<u8>) -> Self {
            Self {
                temp_dir: TempDir::new().unwrap(),
                fetcher: Arc::new(StaticFetcher::new().with_response(ARCHIVE_URL, archive)),
                observer: Arc::new(RecordingObserver::new()),
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.temp_dir.path().join(name)
        }

        fn defaults_file(&self) -> PathBuf {
            let path = self.path("liquibase.properties");
            fs::write(&path, "changelog-file=changelog.xml\n").unwrap();
            path
        }

        fn launcher(&self, settings: LaunchSettings) -> Launcher {
            let provisioner = Provisioner::new(test_manifest())
                .with_fetcher(self.fetcher.clone())
                .with_staging_dir(self.path("staging"));

            Launcher::from_parts(settings, provisioner, Invoker::new())
                .with_observer(self.observer.clone())
        }

        fn settings(&self) -> LaunchSettings {
            LaunchSettings::new(ProvisionConfig::new(self.path("tools"), "4.21.1"))
                .with_defaults_file(Some(self.defaults_file()))
        }
    }

    #[test]
    fn test_launch_error_exit_codes() {
        let config: LaunchError =
            ConfigError::DefaultsFileMissing(PathBuf::from("liquibase.properties")).into();
        assert_eq!(config.exit_code(), 1);
        assert!(!config.is_tool_failure());

        let failed: LaunchError = ExecutionError::Failed {
            program: PathBuf::from("liquibase"),
            code: Some(7),
        }
        .into();
        assert_eq!(failed.exit_code(), 7);
        assert!(failed.is_tool_failure());
    }

    #[tokio::test]
    async fn test_missing_defaults_file_stops_before_download() {
        let fixture = Fixture::new(release_archive("#!/bin/sh\n"));
        let settings = LaunchSettings::new(ProvisionConfig::new(fixture.path("tools"), "4.21.1"))
            .with_defaults_file(Some(fixture.path("missing.properties")));

        let err = fixture.launcher(settings).run(["status"]).await.unwrap_err();

        assert!(matches!(
            err,
            LaunchError::Config(ConfigError::DefaultsFileMissing(_))
        ));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(fixture.fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_download_failure_is_provision_error() {
        let fixture = Fixture::new(Vec::new());
        let settings = fixture.settings();
        let settings = LaunchSettings {
            provision: ProvisionConfig::new(fixture.path("tools"), "9.9.9"),
            ..settings
        };

        let err = fixture.launcher(settings).run(["status"]).await.unwrap_err();

        assert!(matches!(
            err,
            LaunchError::Provision(ProvisionError::Download { .. })
        ));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_prepare_installs_without_running() {
        let fixture = Fixture::new(release_archive("#!/bin/sh\nexit 0\n"));
        let launcher = fixture.launcher(fixture.settings());

        let provisioned = launcher.prepare().await.unwrap();

        assert!(provisioned.installed);
        assert!(provisioned.location.executable().is_file());
        assert!(!fixture
            .observer
            .events()
            .iter()
            .any(|e| matches!(e, LaunchEvent::ProcessStarted { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_forwards_args_and_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("args.txt");
        let fixture = Fixture::new(release_archive(&recording_script(&out, 4)));
        let defaults_file = fixture.defaults_file();

        let launcher = fixture.launcher(fixture.settings());
        let err = launcher.run(["rollback", "v2"]).await.unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert!(err.is_tool_failure());

        let recorded = fs::read_to_string(&out).unwrap();
        let recorded: Vec<&str> = recorded.lines().collect();
        assert_eq!(
            recorded,
            vec![
                format!("--defaults-file={}", defaults_file.display()).as_str(),
                "--hub-mode=off",
                "rollback",
                "v2",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_extension_does_not_fail_run() {
        let out = TempDir::new().unwrap();
        let args_file = out.path().join("args.txt");
        let fixture = Fixture::new(release_archive(&recording_script(&args_file, 0)));

        let settings = fixture.settings();
        let settings = LaunchSettings {
            provision: settings
                .provision
                .clone()
                .with_extensions(["liquibase-redshift"]),
            ..settings
        };

        fixture.launcher(settings).run(["status"]).await.unwrap();

        assert!(args_file.is_file());
        assert!(fixture
            .fetcher
            .requests()
            .contains(&"https://releases.test/liquibase-redshift-4.21.1.jar".to_string()));
        assert!(fixture.observer.events().iter().any(|e| matches!(
            e,
            LaunchEvent::ExtensionFailed { name, .. } if name == "liquibase-redshift"
        )));
        assert!(fixture
            .observer
            .events()
            .contains(&LaunchEvent::ProcessExited { code: Some(0) }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_against_user_installation() {
        use crate::provision::{make_executable, EXECUTABLE_NAME};

        let fixture = Fixture::new(Vec::new());
        let install = fixture.path("my-liquibase");
        let out = fixture.path("args.txt");
        fs::create_dir_all(&install).unwrap();
        let executable = install.join(EXECUTABLE_NAME);
        fs::write(&executable, recording_script(&out, 0)).unwrap();
        make_executable(&executable).unwrap();

        let settings = LaunchSettings {
            provision: ProvisionConfig::new(fixture.path("tools"), "4.21.1")
                .with_user_installation(&install)
                .with_extensions(["liquibase-redshift"]),
            ..fixture.settings()
        }
        .with_defaults_file(None)
        .with_hub_mode(None);

        fixture
            .launcher(settings)
            .run_command(MigrationCommand::Status)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "status\n");
        assert_eq!(fixture.fetcher.request_count(), 0);
        assert!(!fixture.path("tools").exists());
    }
}
