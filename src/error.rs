//! Error handling module for the installer
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Configuration problems and step failures are kept apart so callers can tell
//! "nothing ran" from "the pipeline stopped halfway".

use thiserror::Error;

/// Main error type for the installer
#[derive(Error, Debug)]
pub enum InstallError {
    /// Invalid or missing configuration. Raised before any step runs.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A step's side effect failed (clone, copy, database create, config rewrite)
    #[error("Install step '{step}' failed: {message}")]
    Step { step: String, message: String },

    /// External process could not be spawned or waited on
    #[error("Process error: {0}")]
    Process(String),

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, InstallError>;

// Convenient error constructors
impl InstallError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a step error tagged with the failing step's name
    pub fn step(step: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            message: msg.into(),
        }
    }

    /// Create a process error
    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }

    /// Returns true if this error was raised while resolving configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
