//! Builds the installer pipeline from resolved configuration.
//!
//! # Step order
//!
//! ```text
//! Moodle          clone, or reuse with --no-clone
//!     ↓
//! Plugin          copy, or no-copy with --db-create-skip
//!     ↓
//! Extra plugins   one step per plugin directory
//!     ↓
//! Database        omitted with --db-create-skip
//!     ↓
//! config.php      rewrite, or keep with --no-config-rewrite
//! ```
//!
//! The Moodle, plugin and config slots are always filled, so a step's
//! position does not depend on which flags were given.

use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use super::database::Database;
use super::{
    ConfigRewriteInstaller, ConfigRewriteNoOp, DatabaseInstaller, ExtraPluginInstaller,
    InstallerCollection, MoodleCloneInstaller, MoodleExistingInstaller, PluginInstaller,
    PluginInstallerNoCopy,
};
use crate::config::ResolvedConfig;
use crate::error::{InstallError, Result};
use crate::filter::ConfigDumper;
use crate::moodle::Moodle;

/// Decides which installer steps an install needs.
#[derive(Debug, Clone)]
pub struct InstallerFactory {
    pub moodle: Moodle,
    pub config: ResolvedConfig,
    pub dumper: ConfigDumper,
    /// False when `--db-create-skip` was given
    pub create_db: bool,
    pub no_config_rewrite: bool,
    /// Plugin directories found under the extra-plugins directory
    pub extra_plugins: Vec<PathBuf>,
}

impl InstallerFactory {
    pub fn new(config: ResolvedConfig, dumper: ConfigDumper) -> Result<Self> {
        let extra_plugins = match &config.extra_plugins_dir {
            Some(dir) => list_plugin_dirs(dir)?,
            None => Vec::new(),
        };

        Ok(Self {
            moodle: Moodle::new(config.moodle_dir.clone()),
            create_db: config.create_db,
            no_config_rewrite: config.no_config_rewrite,
            extra_plugins,
            dumper,
            config,
        })
    }

    /// Whether the plugin tree is left where a previous run put it.
    ///
    /// Tied to `--db-create-skip`: a kept database means a reused
    /// environment, and the plugin is already in place there.
    pub fn skip_plugin_copy(&self) -> bool {
        !self.create_db
    }

    /// Append the steps for this install, in execution order
    pub fn add_installers(&self, installers: &mut InstallerCollection) {
        let config = &self.config;

        if config.no_clone {
            installers.add(MoodleExistingInstaller {
                moodle: self.moodle.clone(),
            });
        } else {
            installers.add(MoodleCloneInstaller {
                moodle: self.moodle.clone(),
                repo: config.repo.clone(),
                branch: config.branch.clone(),
            });
        }

        if self.skip_plugin_copy() {
            installers.add(PluginInstallerNoCopy::new(
                self.moodle.clone(),
                config.plugin_dir.clone(),
                self.dumper.clone(),
            ));
        } else {
            installers.add(PluginInstaller::new(
                self.moodle.clone(),
                config.plugin_dir.clone(),
                self.dumper.clone(),
            ));
        }

        for plugin_dir in &self.extra_plugins {
            installers.add(ExtraPluginInstaller {
                moodle: self.moodle.clone(),
                plugin_dir: plugin_dir.clone(),
            });
        }

        if self.create_db {
            installers.add(DatabaseInstaller {
                database: Database {
                    db_type: config.db_type,
                    user: config.db_user.clone(),
                    pass: config.db_pass.clone(),
                    name: config.db_name.clone(),
                    host: config.db_host.clone(),
                    port: config.db_port,
                },
            });
        }

        if self.no_config_rewrite {
            installers.add(ConfigRewriteNoOp {
                moodle: self.moodle.clone(),
            });
        } else {
            installers.add(ConfigRewriteInstaller {
                moodle: self.moodle.clone(),
                config: config.clone(),
            });
        }

        info!("Planned steps: {:?}", installers.kinds());
    }
}

/// Sub-directories of `dir`, sorted by name. Hidden entries are ignored.
fn list_plugin_dirs(dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(InstallError::config(format!(
            "extra plugins directory {} does not exist",
            dir.display()
        )));
    }

    let mut plugins = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type()?.is_dir() && !hidden {
            plugins.push(entry.path());
        }
    }
    plugins.sort();
    debug!("Found {} extra plugin(s) in {}", plugins.len(), dir.display());
    Ok(plugins)
}
