//! Installer pipeline
//!
//! An install is an ordered list of steps. Insertion order is execution
//! order, and the first failing step stops the run: later steps may rely on
//! files or databases the earlier ones created, and nothing is rolled back.
//!
//! Skipping work is decided when the pipeline is built, by adding a no-op
//! variant in place of the real step, never by a step inspecting flags at
//! run time.

pub mod config_rewrite;
pub mod database;
pub mod factory;
pub mod moodle;
pub mod plugin;

use std::collections::BTreeMap;
use strum::Display;
use tracing::{error, info};

use crate::error::Result;
use crate::process::Execute;

pub use config_rewrite::{ConfigRewriteInstaller, ConfigRewriteNoOp};
pub use database::DatabaseInstaller;
pub use factory::InstallerFactory;
pub use moodle::{MoodleCloneInstaller, MoodleExistingInstaller};
pub use plugin::{ExtraPluginInstaller, PluginInstaller, PluginInstallerNoCopy};

/// Identity of an installer step, used for logging and for checking
/// pipeline shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StepKind {
    MoodleClone,
    MoodleExisting,
    PluginCopy,
    PluginNoCopy,
    ExtraPluginCopy,
    DatabaseCreate,
    ConfigRewrite,
    ConfigRewriteNoOp,
}

/// A single unit of environment setup.
pub trait Installer {
    fn kind(&self) -> StepKind;

    /// Perform the step's side effects
    fn install(&self, execute: &dyn Execute, output: &mut InstallOutput) -> Result<()>;

    /// Environment variables this step exports to follow-up commands
    fn env(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Human readable line for progress output
    fn describe(&self) -> String {
        self.kind().to_string()
    }
}

/// Progress reporting for a pipeline run.
#[derive(Debug, Default)]
pub struct InstallOutput {
    total: usize,
    completed: usize,
}

impl InstallOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, total: usize) {
        self.total = total;
        self.completed = 0;
        info!("Starting install: {} step(s)", total);
    }

    pub fn step(&mut self, description: &str) {
        self.completed += 1;
        info!("[{}/{}] {}", self.completed, self.total, description);
    }

    pub fn info(&self, message: &str) {
        info!("{}", message);
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Ordered, append-only sequence of installer steps.
#[derive(Default)]
pub struct InstallerCollection {
    installers: Vec<Box<dyn Installer>>,
}

impl InstallerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, installer: impl Installer + 'static) {
        self.installers.push(Box::new(installer));
    }

    /// All steps in insertion order
    pub fn all(&self) -> &[Box<dyn Installer>] {
        &self.installers
    }

    pub fn kinds(&self) -> Vec<StepKind> {
        self.installers.iter().map(|i| i.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.installers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installers.is_empty()
    }

    /// Environment exported by every step; later steps win on key clashes
    pub fn merged_env(&self) -> BTreeMap<String, String> {
        self.installers
            .iter()
            .flat_map(|installer| installer.env())
            .collect()
    }

    /// Run every step in order, stopping at the first failure
    pub fn install(&self, execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        output.start(self.len());
        for installer in &self.installers {
            output.step(&installer.describe());
            if let Err(e) = installer.install(execute, output) {
                error!("Step {} failed: {}", installer.kind(), e);
                return Err(e);
            }
        }
        info!("Install complete");
        Ok(())
    }
}

/// Capability to run a built pipeline.
pub trait Install {
    fn run(&self, installers: &InstallerCollection, execute: &dyn Execute) -> Result<()>;
}

/// Runs every step of the pipeline for real.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInstall;

impl Install for DefaultInstall {
    fn run(&self, installers: &InstallerCollection, execute: &dyn Execute) -> Result<()> {
        let mut output = InstallOutput::new();
        installers.install(execute, &mut output)
    }
}
