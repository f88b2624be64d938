//! The `install` command.
//!
//! Wires configuration resolution, the filter document, the installer
//! factory and the pipeline run together, and turns the outcome into a
//! process exit status.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::cli::InstallArgs;
use crate::config::{csv_to_array, ConfigResolver, Environment};
use crate::error::Result;
use crate::filter::{tool_env_prefix, tool_scope, ConfigDumper, FilterKey, GLOBAL_SCOPE, LINT_TOOLS};
use crate::installer::{DefaultInstall, Install, InstallerCollection, InstallerFactory};
use crate::process::{Execute, ProcessExecutor};

/// Exit status for a successful install
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for any configuration or step failure
pub const EXIT_FAILURE: i32 = 1;

pub struct InstallCommand {
    env_file: PathBuf,
    environment: Environment,
    base_dir: PathBuf,
    install: Arc<dyn Install>,
    execute: Arc<dyn Execute>,
}

impl InstallCommand {
    /// `env_file` is where the environment for follow-up commands is written;
    /// relative paths resolve against `base_dir`.
    pub fn new(env_file: impl Into<PathBuf>, environment: Environment, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            env_file: env_file.into(),
            environment,
            base_dir: base_dir.into(),
            install: Arc::new(DefaultInstall),
            execute: Arc::new(ProcessExecutor),
        }
    }

    /// Replace the pipeline runner
    pub fn with_install(mut self, install: Arc<dyn Install>) -> Self {
        self.install = install;
        self
    }

    /// Replace the process runner handed to every step
    pub fn with_execute(mut self, execute: Arc<dyn Execute>) -> Self {
        self.execute = execute;
        self
    }

    pub fn env_file(&self) -> PathBuf {
        if self.env_file.is_absolute() {
            self.env_file.clone()
        } else {
            self.base_dir.join(&self.env_file)
        }
    }

    fn resolver(&self) -> ConfigResolver<'_> {
        ConfigResolver::new(&self.environment, &self.base_dir)
    }

    pub fn csv_to_array(&self, value: Option<&str>) -> Vec<String> {
        csv_to_array(value)
    }

    /// Resolve configuration and build the factory without running anything
    pub fn initialize_installer_factory(&self, args: &InstallArgs) -> Result<InstallerFactory> {
        let config = self.resolver().resolve(args)?;
        debug!("Resolved config: {}", serde_json::to_string(&config)?);
        let dumper = self.initialize_plugin_config_dumper(args);
        InstallerFactory::new(config, dumper)
    }

    /// Build the lint filter document.
    ///
    /// Global values always go under `filter`. A tool only gets its own
    /// section when its `<TOOL>_IGNORE_*` variables are set, and that section
    /// holds the tool's values alone.
    pub fn initialize_plugin_config_dumper(&self, args: &InstallArgs) -> ConfigDumper {
        let mut dumper = ConfigDumper::new();

        let resolver = self.resolver();
        dumper.add_section(GLOBAL_SCOPE, FilterKey::NotPaths, resolver.not_paths(args));
        dumper.add_section(GLOBAL_SCOPE, FilterKey::NotNames, resolver.not_names(args));

        for tool in LINT_TOOLS {
            let prefix = tool_env_prefix(tool);
            let scope = tool_scope(tool);
            let sources = [
                (FilterKey::NotPaths, format!("{}_IGNORE_PATHS", prefix)),
                (FilterKey::NotNames, format!("{}_IGNORE_NAMES", prefix)),
            ];
            for (key, var) in sources {
                let values = csv_to_array(self.environment.get(&var));
                if !values.is_empty() {
                    dumper.add_section(&scope, key, values);
                }
            }
        }

        dumper
    }

    /// Resolve, build and run the pipeline, then write the env file
    pub fn run(&self, args: &InstallArgs) -> Result<()> {
        let factory = self.initialize_installer_factory(args)?;
        let mut installers = InstallerCollection::new();
        factory.add_installers(&mut installers);

        self.install.run(&installers, self.execute.as_ref())?;

        let env_file = self.env_file();
        write_env_file(&env_file, &installers)?;
        info!("Wrote environment to {}", env_file.display());
        Ok(())
    }

    /// Run the command and map the outcome to an exit status
    pub fn execute(&self, args: &InstallArgs) -> i32 {
        match self.run(args) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                error!("Install failed: {}", e);
                eprintln!("✗ {}", e);
                EXIT_FAILURE
            }
        }
    }
}

/// `KEY=value` lines, sorted by key
fn write_env_file(path: &Path, installers: &InstallerCollection) -> Result<()> {
    let contents: String = installers
        .merged_env()
        .into_iter()
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(env: Environment) -> InstallCommand {
        InstallCommand::new(".env", env, "/ci")
    }

    #[test]
    fn test_env_file_resolves_against_base_dir() {
        assert_eq!(command(Environment::default()).env_file(), PathBuf::from("/ci/.env"));
        let cmd = InstallCommand::new("/tmp/x.env", Environment::default(), "/ci");
        assert_eq!(cmd.env_file(), PathBuf::from("/tmp/x.env"));
    }

    #[test]
    fn test_dumper_global_section_always_present() {
        let dumper = command(Environment::default()).initialize_plugin_config_dumper(&InstallArgs::default());
        assert_eq!(dumper.scopes(), vec!["filter"]);
        let global = dumper.section("filter").unwrap();
        assert_eq!(global.not_paths, Some(vec![]));
        assert_eq!(global.not_names, Some(vec![]));
    }

    #[test]
    fn test_dumper_global_env_fallback() {
        let env: Environment = [("IGNORE_NAMES", "a.php, b.php")].into_iter().collect();
        let dumper = command(env).initialize_plugin_config_dumper(&InstallArgs::default());
        assert_eq!(
            dumper.section("filter").unwrap().not_names,
            Some(vec!["a.php".to_string(), "b.php".to_string()])
        );
    }

    #[test]
    fn test_dumper_tool_section_only_has_set_keys() {
        let env: Environment = [("PHPMD_IGNORE_PATHS", "legacy"), ("GRUNT_IGNORE_NAMES", " , ")]
            .into_iter()
            .collect();
        let dumper = command(env).initialize_plugin_config_dumper(&InstallArgs::default());
        assert_eq!(dumper.scopes(), vec!["filter", "filter-phpmd"]);
        let phpmd = dumper.section("filter-phpmd").unwrap();
        assert_eq!(phpmd.not_paths, Some(vec!["legacy".to_string()]));
        assert_eq!(phpmd.not_names, None);
    }

    #[test]
    fn test_env_file_lines_sorted_by_key() {
        struct Exports;

        impl crate::installer::Installer for Exports {
            fn kind(&self) -> crate::installer::StepKind {
                crate::installer::StepKind::MoodleExisting
            }

            fn install(
                &self,
                _execute: &dyn Execute,
                _output: &mut crate::installer::InstallOutput,
            ) -> Result<()> {
                Ok(())
            }

            fn env(&self) -> Vec<(String, String)> {
                vec![
                    ("PLUGIN_DIR".to_string(), "/ci/moodle/local/ci".to_string()),
                    ("MOODLE_DIR".to_string(), "/ci/moodle".to_string()),
                ]
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/.env");
        let mut installers = InstallerCollection::new();
        installers.add(Exports);
        write_env_file(&path, &installers).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "MOODLE_DIR=/ci/moodle\nPLUGIN_DIR=/ci/moodle/local/ci\n"
        );
    }

    #[test]
    fn test_config_error_maps_to_failure_status() {
        let cmd = command(Environment::default());
        assert_eq!(cmd.execute(&InstallArgs::default()), EXIT_FAILURE);
    }
}
