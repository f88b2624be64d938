use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Moodle plugin install - prepares a Moodle checkout for plugin CI
#[derive(Parser)]
#[command(name = "moodle-plugin-install")]
#[command(about = "Install Moodle and a plugin into a CI workspace")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install Moodle, the plugin, the database and config.php
    Install(InstallArgs),
}

/// Flags of the `install` command.
///
/// Every value is optional here; fallbacks to environment variables and
/// defaults happen in [`crate::config::ConfigResolver`].
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Clone Moodle to this directory (env: MOODLE_DIR)
    #[arg(long)]
    pub moodle: Option<PathBuf>,

    /// Plugin directory to install (env: PLUGIN_DIR)
    #[arg(long)]
    pub plugin: Option<PathBuf>,

    /// Directory for Moodle data (env: MOODLE_DATA_DIR)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Directory of extra plugins to install alongside (env: EXTRA_PLUGINS_DIR)
    #[arg(long)]
    pub extra_plugins: Option<PathBuf>,

    /// Moodle git repository to clone (env: MOODLE_REPO)
    #[arg(long)]
    pub repo: Option<String>,

    /// Moodle git branch to clone (env: MOODLE_BRANCH)
    #[arg(long)]
    pub branch: Option<String>,

    /// Database type: mysqli, mariadb, pgsql or sqlsrv (env: DB_TYPE)
    #[arg(long)]
    pub db_type: Option<String>,

    /// Database user (env: DB_USER)
    #[arg(long)]
    pub db_user: Option<String>,

    /// Database password (env: DB_PASS)
    #[arg(long)]
    pub db_pass: Option<String>,

    /// Database name (env: DB_NAME)
    #[arg(long)]
    pub db_name: Option<String>,

    /// Database host (env: DB_HOST)
    #[arg(long)]
    pub db_host: Option<String>,

    /// Database port (env: DB_PORT)
    #[arg(long)]
    pub db_port: Option<String>,

    /// Reuse the existing Moodle checkout instead of cloning
    #[arg(long)]
    pub no_clone: bool,

    /// Skip database creation; the plugin is assumed to be in place already
    #[arg(long)]
    pub db_create_skip: bool,

    /// Leave an existing config.php untouched
    #[arg(long)]
    pub no_config_rewrite: bool,

    /// CSV of file paths to exclude from lint tools (env: IGNORE_PATHS)
    #[arg(long)]
    pub not_paths: Option<String>,

    /// CSV of file names to exclude from lint tools (env: IGNORE_NAMES)
    #[arg(long)]
    pub not_names: Option<String>,

    /// Where to write the environment for follow-up commands
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["moodle-plugin-install"]).is_err());
    }

    #[test]
    fn test_cli_install_with_paths() {
        let cli = Cli::try_parse_from([
            "moodle-plugin-install",
            "install",
            "--moodle",
            "/ci/moodle",
            "--plugin",
            "/ci/plugin",
            "--db-type",
            "pgsql",
            "--branch",
            "MOODLE_29_STABLE",
        ])
        .unwrap();
        let Commands::Install(args) = cli.command;
        assert_eq!(args.moodle.unwrap().to_str().unwrap(), "/ci/moodle");
        assert_eq!(args.db_type.as_deref(), Some("pgsql"));
        assert_eq!(args.branch.as_deref(), Some("MOODLE_29_STABLE"));
        assert_eq!(args.env_file.to_str().unwrap(), ".env");
        assert!(!args.no_clone);
    }

    #[test]
    fn test_cli_install_skip_flags() {
        let cli = Cli::try_parse_from([
            "moodle-plugin-install",
            "install",
            "--no-clone",
            "--db-create-skip",
            "--no-config-rewrite",
            "--not-paths",
            "a,b",
        ])
        .unwrap();
        let Commands::Install(args) = cli.command;
        assert!(args.no_clone);
        assert!(args.db_create_skip);
        assert!(args.no_config_rewrite);
        assert_eq!(args.not_paths.as_deref(), Some("a,b"));
    }
}
