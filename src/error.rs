// ABOUTME: Application-wide error types for reimage.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::runtime::RuntimeError;
use crate::update::{RestoreError, UpdateError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no container name given (use --all to update every running container)")]
    NoTarget,

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("restore failed: {0}")]
    Restore(#[from] RestoreError),

    /// Some containers failed; details were already reported.
    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
