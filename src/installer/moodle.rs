//! Moodle core step: fresh clone, or reuse of an existing checkout.

use std::path::Path;
use tracing::warn;

use super::{InstallOutput, Installer, StepKind};
use crate::error::{InstallError, Result};
use crate::moodle::Moodle;
use crate::process::{CommandLine, Execute};

/// Shallow-clones Moodle core into the target directory.
#[derive(Debug, Clone)]
pub struct MoodleCloneInstaller {
    pub moodle: Moodle,
    pub repo: String,
    pub branch: String,
}

impl MoodleCloneInstaller {
    pub fn clone_command(&self) -> CommandLine {
        CommandLine::new("git").args([
            "clone".to_string(),
            "--depth".to_string(),
            "1".to_string(),
            "--branch".to_string(),
            self.branch.clone(),
            self.repo.clone(),
            self.moodle.directory.display().to_string(),
        ])
    }
}

impl Installer for MoodleCloneInstaller {
    fn kind(&self) -> StepKind {
        StepKind::MoodleClone
    }

    fn install(&self, execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        let target = &self.moodle.directory;
        if target.exists() {
            return Err(InstallError::step(
                self.kind().to_string(),
                format!(
                    "{} already exists; use --no-clone to reuse it",
                    target.display()
                ),
            ));
        }

        output.info(&format!("Cloning Moodle {} from {}", self.branch, self.repo));
        execute
            .run(&self.clone_command())?
            .ensure_success(&self.kind().to_string(), "git clone")
    }

    fn env(&self) -> Vec<(String, String)> {
        moodle_env(&self.moodle.directory)
    }

    fn describe(&self) -> String {
        format!("Clone Moodle ({})", self.branch)
    }
}

/// Uses a Moodle checkout that is already on disk.
#[derive(Debug, Clone)]
pub struct MoodleExistingInstaller {
    pub moodle: Moodle,
}

impl Installer for MoodleExistingInstaller {
    fn kind(&self) -> StepKind {
        StepKind::MoodleExisting
    }

    fn install(&self, _execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        let target = &self.moodle.directory;
        if !target.is_dir() {
            return Err(InstallError::step(
                self.kind().to_string(),
                format!("Moodle directory {} does not exist", target.display()),
            ));
        }
        if !target.join("version.php").is_file() {
            warn!("{} has no version.php; is it a Moodle checkout?", target.display());
        }
        output.info(&format!("Reusing Moodle at {}", target.display()));
        Ok(())
    }

    fn env(&self) -> Vec<(String, String)> {
        moodle_env(&self.moodle.directory)
    }

    fn describe(&self) -> String {
        "Use existing Moodle checkout".to_string()
    }
}

fn moodle_env(directory: &Path) -> Vec<(String, String)> {
    vec![("MOODLE_DIR".to_string(), directory.display().to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::test_support::RecordingExecute;

    #[test]
    fn test_clone_runs_shallow_git_clone() {
        let dir = tempfile::tempdir().unwrap();
        let installer = MoodleCloneInstaller {
            moodle: Moodle::new(dir.path().join("moodle")),
            repo: "https://github.com/moodle/moodle.git".to_string(),
            branch: "MOODLE_29_STABLE".to_string(),
        };
        let execute = RecordingExecute::default();

        installer.install(&execute, &mut InstallOutput::new()).unwrap();

        let commands = execute.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].program, "git");
        assert_eq!(
            commands[0].args[..5],
            ["clone", "--depth", "1", "--branch", "MOODLE_29_STABLE"]
        );
        assert_eq!(
            installer.env(),
            vec![(
                "MOODLE_DIR".to_string(),
                dir.path().join("moodle").display().to_string()
            )]
        );
    }

    #[test]
    fn test_clone_failure_is_step_error() {
        let dir = tempfile::tempdir().unwrap();
        let installer = MoodleCloneInstaller {
            moodle: Moodle::new(dir.path().join("moodle")),
            repo: "repo".to_string(),
            branch: "nope".to_string(),
        };
        let execute = RecordingExecute::failing(128, "fatal: Remote branch nope not found");
        let err = installer.install(&execute, &mut InstallOutput::new()).unwrap_err();
        assert!(err.to_string().contains("exit code 128"));
    }

    #[test]
    fn test_clone_refuses_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let installer = MoodleCloneInstaller {
            moodle: Moodle::new(dir.path()),
            repo: "repo".to_string(),
            branch: "main".to_string(),
        };
        let execute = RecordingExecute::default();
        assert!(installer.install(&execute, &mut InstallOutput::new()).is_err());
        assert!(execute.commands.borrow().is_empty());
    }

    #[test]
    fn test_existing_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let execute = RecordingExecute::default();

        let present = MoodleExistingInstaller {
            moodle: Moodle::new(dir.path()),
        };
        assert!(present.install(&execute, &mut InstallOutput::new()).is_ok());

        let missing = MoodleExistingInstaller {
            moodle: Moodle::new(dir.path().join("missing")),
        };
        assert!(missing.install(&execute, &mut InstallOutput::new()).is_err());
        assert!(execute.commands.borrow().is_empty());
    }
}
