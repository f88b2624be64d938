//! Moodle `config.php` step.

use std::fs;

use super::{InstallOutput, Installer, StepKind};
use crate::config::ResolvedConfig;
use crate::error::{InstallError, Result};
use crate::moodle::{config_php_contents, Moodle};
use crate::process::Execute;

/// Writes `config.php` and creates the data directories it points at.
#[derive(Debug, Clone)]
pub struct ConfigRewriteInstaller {
    pub moodle: Moodle,
    pub config: ResolvedConfig,
}

impl Installer for ConfigRewriteInstaller {
    fn kind(&self) -> StepKind {
        StepKind::ConfigRewrite
    }

    fn install(&self, _execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        let step = self.kind().to_string();
        if !self.moodle.directory.is_dir() {
            return Err(InstallError::step(
                &step,
                format!("Moodle directory {} does not exist", self.moodle.directory.display()),
            ));
        }

        let to_step_error = |e: std::io::Error| InstallError::step(&step, e.to_string());

        for dir in [
            self.config.data_dir.clone(),
            self.config.data_dir.join("phpu_moodledata"),
        ] {
            fs::create_dir_all(&dir).map_err(to_step_error)?;
        }

        let config_file = self.moodle.config_file();
        fs::write(&config_file, config_php_contents(&self.config)).map_err(to_step_error)?;
        output.info(&format!("Wrote {}", config_file.display()));
        Ok(())
    }

    fn describe(&self) -> String {
        "Write Moodle config.php".to_string()
    }
}

/// Keeps the existing `config.php`.
#[derive(Debug, Clone)]
pub struct ConfigRewriteNoOp {
    pub moodle: Moodle,
}

impl Installer for ConfigRewriteNoOp {
    fn kind(&self) -> StepKind {
        StepKind::ConfigRewriteNoOp
    }

    fn install(&self, _execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        output.info(&format!(
            "Leaving {} untouched",
            self.moodle.config_file().display()
        ));
        Ok(())
    }

    fn describe(&self) -> String {
        "Keep existing config.php".to_string()
    }
}
