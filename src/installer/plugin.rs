//! Plugin steps: copy the plugin under test (or leave it in place), and copy
//! any extra plugins it depends on.

use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{InstallOutput, Installer, StepKind};
use crate::error::{InstallError, Result};
use crate::filter::{ConfigDumper, PLUGIN_CONFIG_FILE};
use crate::moodle::{Moodle, MoodlePlugin};
use crate::process::Execute;

/// Copies the plugin under test into Moodle and writes its filter config.
#[derive(Debug)]
pub struct PluginInstaller {
    pub moodle: Moodle,
    pub plugin_dir: PathBuf,
    pub dumper: ConfigDumper,
    target: OnceCell<PathBuf>,
}

impl PluginInstaller {
    pub fn new(moodle: Moodle, plugin_dir: PathBuf, dumper: ConfigDumper) -> Self {
        Self {
            moodle,
            plugin_dir,
            dumper,
            target: OnceCell::new(),
        }
    }
}

impl Installer for PluginInstaller {
    fn kind(&self) -> StepKind {
        StepKind::PluginCopy
    }

    fn install(&self, _execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        let step = self.kind().to_string();
        let target = plugin_target(&self.moodle, &self.plugin_dir, &step)?;

        output.info(&format!(
            "Copying plugin {} to {}",
            self.plugin_dir.display(),
            target.display()
        ));
        copy_plugin(&self.plugin_dir, &target).map_err(|e| InstallError::step(&step, e.to_string()))?;
        self.dumper
            .dump(&target.join(PLUGIN_CONFIG_FILE))
            .map_err(|e| InstallError::step(&step, e.to_string()))?;

        let _ = self.target.set(target);
        Ok(())
    }

    fn env(&self) -> Vec<(String, String)> {
        plugin_env(self.target.get())
    }

    fn describe(&self) -> String {
        "Install plugin".to_string()
    }
}

/// Leaves an already installed plugin where it is.
///
/// Used when the environment is being reused: the plugin was copied by an
/// earlier run, so only the filter config is refreshed. `PLUGIN_DIR` is only
/// exported when that earlier copy is actually there.
#[derive(Debug)]
pub struct PluginInstallerNoCopy {
    pub moodle: Moodle,
    pub plugin_dir: PathBuf,
    pub dumper: ConfigDumper,
    target: OnceCell<PathBuf>,
}

impl PluginInstallerNoCopy {
    pub fn new(moodle: Moodle, plugin_dir: PathBuf, dumper: ConfigDumper) -> Self {
        Self {
            moodle,
            plugin_dir,
            dumper,
            target: OnceCell::new(),
        }
    }
}

impl Installer for PluginInstallerNoCopy {
    fn kind(&self) -> StepKind {
        StepKind::PluginNoCopy
    }

    fn install(&self, _execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        let step = self.kind().to_string();
        let target = plugin_target(&self.moodle, &self.plugin_dir, &step)?;

        if target.is_dir() {
            self.dumper
                .dump(&target.join(PLUGIN_CONFIG_FILE))
                .map_err(|e| InstallError::step(&step, e.to_string()))?;
            output.info(&format!("Plugin already installed at {}", target.display()));
            let _ = self.target.set(target);
        } else {
            // Nothing to point follow-up commands at, so PLUGIN_DIR stays unset
            warn!(
                "Skipping plugin copy, but {} does not exist yet",
                target.display()
            );
        }
        Ok(())
    }

    fn env(&self) -> Vec<(String, String)> {
        plugin_env(self.target.get())
    }

    fn describe(&self) -> String {
        "Install plugin (no copy)".to_string()
    }
}

/// Copies one additional plugin into Moodle.
#[derive(Debug, Clone)]
pub struct ExtraPluginInstaller {
    pub moodle: Moodle,
    pub plugin_dir: PathBuf,
}

impl Installer for ExtraPluginInstaller {
    fn kind(&self) -> StepKind {
        StepKind::ExtraPluginCopy
    }

    fn install(&self, _execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        let step = self.kind().to_string();
        let target = plugin_target(&self.moodle, &self.plugin_dir, &step)?;
        output.info(&format!("Copying extra plugin to {}", target.display()));
        copy_plugin(&self.plugin_dir, &target).map_err(|e| InstallError::step(&step, e.to_string()))
    }

    fn describe(&self) -> String {
        format!("Install extra plugin {}", self.plugin_dir.display())
    }
}

fn plugin_target(moodle: &Moodle, plugin_dir: &Path, step: &str) -> Result<PathBuf> {
    let plugin = MoodlePlugin::load(plugin_dir).map_err(|e| InstallError::step(step, e.to_string()))?;
    debug!(component = %plugin.component, "Detected plugin component");
    moodle
        .component_install_directory(&plugin.component)
        .map_err(|e| InstallError::step(step, e.to_string()))
}

fn plugin_env(target: Option<&PathBuf>) -> Vec<(String, String)> {
    target
        .map(|t| vec![("PLUGIN_DIR".to_string(), t.display().to_string())])
        .unwrap_or_default()
}

/// Replace `destination` with a copy of `source`, leaving out `.git`.
///
/// When `destination` lies inside `source` (a plugin checkout that also
/// holds the Moodle tree), the directories leading to it are not copied.
pub fn copy_plugin(source: &Path, destination: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(InstallError::config(format!(
            "plugin directory {} does not exist",
            source.display()
        )));
    }
    if destination.exists() {
        fs::remove_dir_all(destination)?;
    }
    fs::create_dir_all(destination)?;

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.file_name() != ".git" && !destination.starts_with(entry.path())
        });

    for entry in walker {
        let entry = entry.map_err(|e| InstallError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| InstallError::config(e.to_string()))?;
        let to = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&to)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &to)?;
        } else {
            debug!("Skipping non-regular file {}", entry.path().display());
        }
    }
    Ok(())
}
