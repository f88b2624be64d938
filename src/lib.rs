//! Moodle plugin install library
//!
//! Prepares a Moodle plugin development environment: clones Moodle core,
//! copies the plugin under test into place, creates the database and writes
//! `config.php`. The work is an ordered pipeline of installer steps built by
//! [`InstallerFactory`] from a [`ResolvedConfig`].

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod filter;
pub mod installer;
pub mod moodle;
pub mod process;
pub mod types;

// Re-export main types for convenience
pub use command::InstallCommand;
pub use config::{csv_to_array, ConfigResolver, Environment, ResolvedConfig};
pub use error::{InstallError, Result};
pub use filter::{ConfigDumper, FilterSection};
pub use installer::{
    DefaultInstall, Install, InstallOutput, Installer, InstallerCollection, InstallerFactory,
    StepKind,
};
pub use moodle::{Moodle, MoodlePlugin};
pub use process::{CommandLine, Execute, ProcessExecutor, ProcessOutput};
pub use types::DbType;
