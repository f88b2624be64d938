//! Configuration resolution.
//!
//! Every install value comes from one of three places, in order of
//! precedence: an explicit CLI flag, an environment variable, a built-in
//! default. [`ConfigResolver`] applies that order as a pure function of the
//! parsed flags, an [`Environment`] snapshot and the working directory.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::InstallArgs;
use crate::error::{InstallError, Result};
use crate::types::DbType;

pub const DEFAULT_REPO: &str = "https://github.com/moodle/moodle.git";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_DB_NAME: &str = "moodle";
pub const DEFAULT_DB_HOST: &str = "localhost";

/// Split a comma separated value into trimmed, non-empty entries.
///
/// ```
/// use moodle_plugin_install::config::csv_to_array;
///
/// assert_eq!(csv_to_array(Some(" , foo , bar ")), vec!["foo", "bar"]);
/// assert!(csv_to_array(Some(" , ")).is_empty());
/// assert!(csv_to_array(None).is_empty());
/// ```
pub fn csv_to_array(value: Option<&str>) -> Vec<String> {
    value
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Snapshot of environment variables.
///
/// Captured once at startup; resolution never reads the process environment
/// directly. Empty values count as unset.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        std::env::vars().collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Final install parameters after flag/env/default precedence.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub moodle_dir: PathBuf,
    pub plugin_dir: PathBuf,
    pub data_dir: PathBuf,
    pub extra_plugins_dir: Option<PathBuf>,
    pub repo: String,
    pub branch: String,
    pub db_type: DbType,
    pub db_user: String,
    #[serde(skip_serializing)]
    pub db_pass: String,
    pub db_name: String,
    pub db_host: String,
    pub db_port: Option<u16>,
    pub create_db: bool,
    pub no_config_rewrite: bool,
    pub no_clone: bool,
    pub not_paths: Vec<String>,
    pub not_names: Vec<String>,
}

/// Merges CLI flags, environment and defaults into a [`ResolvedConfig`].
pub struct ConfigResolver<'a> {
    env: &'a Environment,
    base_dir: &'a Path,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(env: &'a Environment, base_dir: &'a Path) -> Self {
        Self { env, base_dir }
    }

    pub fn resolve(&self, args: &InstallArgs) -> Result<ResolvedConfig> {
        let db_type_raw = self
            .string(args.db_type.as_deref(), "DB_TYPE")
            .ok_or_else(|| InstallError::config("database type is required (--db-type or DB_TYPE)"))?;
        let db_type: DbType = db_type_raw
            .parse()
            .map_err(|_| InstallError::config(format!("unknown database type '{}'", db_type_raw)))?;

        let db_port = match self.string(args.db_port.as_deref(), "DB_PORT") {
            Some(port) => Some(
                port.parse::<u16>()
                    .map_err(|_| InstallError::config(format!("invalid database port '{}'", port)))?,
            ),
            None => None,
        };

        let db_name = self
            .string(args.db_name.as_deref(), "DB_NAME")
            .unwrap_or(DEFAULT_DB_NAME);
        if !db_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(InstallError::config(format!(
                "database name '{}' may only contain letters, digits and underscores",
                db_name
            )));
        }

        let config = ResolvedConfig {
            moodle_dir: self.path(args.moodle.as_deref(), "MOODLE_DIR", "moodle"),
            plugin_dir: self.path(args.plugin.as_deref(), "PLUGIN_DIR", ""),
            data_dir: self.path(args.data.as_deref(), "MOODLE_DATA_DIR", "moodledata"),
            extra_plugins_dir: self.optional_path(args.extra_plugins.as_deref(), "EXTRA_PLUGINS_DIR"),
            repo: self
                .string(args.repo.as_deref(), "MOODLE_REPO")
                .unwrap_or(DEFAULT_REPO)
                .to_string(),
            branch: self
                .string(args.branch.as_deref(), "MOODLE_BRANCH")
                .unwrap_or(DEFAULT_BRANCH)
                .to_string(),
            db_type,
            db_user: self
                .string(args.db_user.as_deref(), "DB_USER")
                .unwrap_or(db_type.default_user())
                .to_string(),
            db_pass: self
                .string(args.db_pass.as_deref(), "DB_PASS")
                .unwrap_or_default()
                .to_string(),
            db_name: db_name.to_string(),
            db_host: self
                .string(args.db_host.as_deref(), "DB_HOST")
                .unwrap_or(DEFAULT_DB_HOST)
                .to_string(),
            db_port,
            create_db: !args.db_create_skip,
            no_config_rewrite: args.no_config_rewrite,
            no_clone: args.no_clone,
            not_paths: self.not_paths(args),
            not_names: self.not_names(args),
        };

        debug!(
            moodle = %config.moodle_dir.display(),
            plugin = %config.plugin_dir.display(),
            db_type = %config.db_type,
            "Resolved install configuration"
        );
        Ok(config)
    }

    /// Global lint path exclusions (`--not-paths`, then `IGNORE_PATHS`)
    pub fn not_paths(&self, args: &InstallArgs) -> Vec<String> {
        csv_to_array(self.string(args.not_paths.as_deref(), "IGNORE_PATHS"))
    }

    /// Global lint file name exclusions (`--not-names`, then `IGNORE_NAMES`)
    pub fn not_names(&self, args: &InstallArgs) -> Vec<String> {
        csv_to_array(self.string(args.not_names.as_deref(), "IGNORE_NAMES"))
    }

    /// Flag, then environment. Blank flags are treated as absent.
    fn string<'v>(&'v self, flag: Option<&'v str>, env_key: &str) -> Option<&'v str> {
        flag.filter(|value| !value.trim().is_empty())
            .or_else(|| self.env.get(env_key))
    }

    fn optional_path(&self, flag: Option<&Path>, env_key: &str) -> Option<PathBuf> {
        flag.filter(|path| !path.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| self.env.get(env_key).map(PathBuf::from))
            .map(|path| self.absolute(&path))
    }

    fn path(&self, flag: Option<&Path>, env_key: &str, default: &str) -> PathBuf {
        self.optional_path(flag, env_key)
            .unwrap_or_else(|| self.absolute(Path::new(default)))
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if path.as_os_str().is_empty() {
            self.base_dir.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
