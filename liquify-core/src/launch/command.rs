//! Command-line assembly for Liquibase.
//!
//! Liquibase takes its global options as `--key=value` tokens ahead of the
//! subcommand. [`assemble`] renders the configured options in a fixed order
//! and appends the caller's trailing arguments untouched.

use std::fmt;

/// Global Liquibase options. Unset or empty values are left out entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// `--defaults-file`
    pub defaults_file: Option<String>,
    /// `--hub-mode`
    pub hub_mode: Option<String>,
    /// `--log-level`
    pub log_level: Option<String>,
    /// `--classpath`
    pub classpath: Option<String>,
    /// Any other `--key=value` pairs, in insertion order.
    pub extra: Vec<(String, String)>,
}

impl CommandOptions {
    /// Appends an arbitrary `--key=value` option.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        let named = [
            ("defaults-file", &self.defaults_file),
            ("hub-mode", &self.hub_mode),
            ("log-level", &self.log_level),
            ("classpath", &self.classpath),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)));

        let extra = self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str()));

        named.chain(extra).filter(|(_, value)| !value.is_empty())
    }
}

/// Ordered argument tokens passed to the Liquibase process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationArgs(Vec<String>);

impl InvocationArgs {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a InvocationArgs {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for InvocationArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// Builds the argument list: option tokens first, then `trailing` verbatim.
pub fn assemble<I, S>(options: &CommandOptions, trailing: I) -> InvocationArgs
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args: Vec<String> = options
        .pairs()
        .map(|(key, value)| format!("--{}={}", key, value))
        .collect();

    args.extend(trailing.into_iter().map(Into::into));
    InvocationArgs(args)
}

// ============================================================================
// Migration Commands
// ============================================================================

/// Common Liquibase subcommands with their positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationCommand {
    /// Deploy all pending changesets.
    Update,
    /// Print the SQL `update` would run.
    UpdateSql,
    /// Deploy changesets up to a tag.
    UpdateToTag(String),
    /// Check the changelog for errors.
    Validate,
    /// List undeployed changesets.
    Status,
    /// Roll back to a tag.
    Rollback(String),
    /// Roll back to a date/time (`YYYY-MM-DD HH:MM:SS`).
    RollbackToDate(String),
    /// Mark all undeployed changesets as executed.
    ChangelogSync,
    /// Mark undeployed changesets up to a tag as executed.
    ChangelogSyncToTag(String),
    /// Clear stored checksums.
    ClearChecksums,
    /// Release the database changelog lock.
    ReleaseLocks,
}

impl MigrationCommand {
    /// Liquibase subcommand name.
    pub fn subcommand(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::UpdateSql => "update-sql",
            Self::UpdateToTag(_) => "update-to-tag",
            Self::Validate => "validate",
            Self::Status => "status",
            Self::Rollback(_) => "rollback",
            Self::RollbackToDate(_) => "rollback-to-date",
            Self::ChangelogSync => "changelog-sync",
            Self::ChangelogSyncToTag(_) => "changelog-sync-to-tag",
            Self::ClearChecksums => "clear-checksums",
            Self::ReleaseLocks => "release-locks",
        }
    }

    /// Subcommand followed by its positional argument, if any.
    pub fn into_args(self) -> Vec<String> {
        let subcommand = self.subcommand().to_string();
        match self {
            Self::UpdateToTag(value)
            | Self::Rollback(value)
            | Self::RollbackToDate(value)
            | Self::ChangelogSyncToTag(value) => vec![subcommand, value],
            _ => vec![subcommand],
        }
    }
}

impl fmt::Display for MigrationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subcommand())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_omits_empty_options() {
        let options = CommandOptions {
            defaults_file: Some("db.properties".into()),
            log_level: Some(String::new()),
            ..Default::default()
        };

        let args = assemble(&options, ["rollback", "v2"]);
        assert_eq!(
            args.as_slice(),
            ["--defaults-file=db.properties", "rollback", "v2"]
        );
    }

    #[test]
    fn test_assemble_fixed_option_order() {
        let options = CommandOptions {
            classpath: Some("/drivers/pg.jar".into()),
            log_level: Some("info".into()),
            hub_mode: Some("off".into()),
            defaults_file: Some("liquibase.properties".into()),
            extra: Vec::new(),
        }
        .with_arg("changelog-file", "db/changelog.xml");

        let args = assemble(&options, ["status"]);
        assert_eq!(
            args.into_vec(),
            vec![
                "--defaults-file=liquibase.properties",
                "--hub-mode=off",
                "--log-level=info",
                "--classpath=/drivers/pg.jar",
                "--changelog-file=db/changelog.xml",
                "status",
            ]
        );
    }

    #[test]
    fn test_assemble_preserves_trailing_order() {
        let args = assemble(
            &CommandOptions::default(),
            vec!["rollback-to-date".to_string(), "2024-01-01 00:00:00".to_string()],
        );
        assert_eq!(args.as_slice(), ["rollback-to-date", "2024-01-01 00:00:00"]);
    }

    #[test]
    fn test_assemble_no_validation() {
        let options = CommandOptions {
            log_level: Some("not-a-level".into()),
            ..Default::default()
        };
        let args = assemble(&options, Vec::<String>::new());
        assert_eq!(args.to_string(), "--log-level=not-a-level");
    }

    #[test]
    fn test_migration_command_args() {
        assert_eq!(MigrationCommand::Status.into_args(), vec!["status"]);
        assert_eq!(MigrationCommand::UpdateSql.into_args(), vec!["update-sql"]);
        assert_eq!(
            MigrationCommand::Rollback("v2".into()).into_args(),
            vec!["rollback", "v2"]
        );
        assert_eq!(
            MigrationCommand::ChangelogSyncToTag("release-1".into()).into_args(),
            vec!["changelog-sync-to-tag", "release-1"]
        );
        assert_eq!(
            MigrationCommand::RollbackToDate("2024-01-01".into()).to_string(),
            "rollback-to-date"
        );
    }
}
