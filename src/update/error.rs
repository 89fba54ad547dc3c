// ABOUTME: Failure taxonomy for replacing one container.
// ABOUTME: Every failure records the stage it happened in.

use crate::snapshot::ConfigurationSnapshot;
use crate::types::{ContainerId, ContainerName, ImageRef};
use std::fmt;
use std::path::PathBuf;

/// Where in the replacement sequence something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolve,
    StalenessCheck,
    Backup,
    Stop,
    Pull,
    Remove,
    Recreate,
    Start,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Resolve => "resolve",
            Stage::StalenessCheck => "staleness check",
            Stage::Backup => "backup",
            Stage::Stop => "stop",
            Stage::Pull => "pull",
            Stage::Remove => "remove",
            Stage::Recreate => "recreate",
            Stage::Start => "start",
        };
        f.write_str(s)
    }
}

/// Errors that end one container's replacement.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// No container by that name.
    #[error("container not found: {0}")]
    NotFound(ContainerName),

    /// The engine could not be reached. Later containers would fail the same way.
    #[error("container engine unavailable during {stage}: {message}")]
    RuntimeUnavailable { stage: Stage, message: String },

    /// The new image could not be pulled. The old container was not removed.
    #[error("failed to pull {image}: {message}")]
    PullFailed { image: ImageRef, message: String },

    /// The old container is gone and its replacement could not be created.
    #[error("failed to recreate container after removing the old one: {message}")]
    RecreationFailed {
        message: String,
        snapshot: Box<ConfigurationSnapshot>,
        backup: Option<PathBuf>,
        engine_unreachable: bool,
    },

    /// The replacement exists but did not start.
    #[error("container {} created but failed to start: {message}", container.short())]
    StartFailed {
        container: ContainerId,
        message: String,
        engine_unreachable: bool,
    },

    /// Any other engine refusal.
    #[error("{stage} failed: {message}")]
    Operation { stage: Stage, message: String },
}

impl UpdateError {
    /// Stage the failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            UpdateError::NotFound(_) => Stage::Resolve,
            UpdateError::RuntimeUnavailable { stage, .. } => *stage,
            UpdateError::PullFailed { .. } => Stage::Pull,
            UpdateError::RecreationFailed { .. } => Stage::Recreate,
            UpdateError::StartFailed { .. } => Stage::Start,
            UpdateError::Operation { stage, .. } => *stage,
        }
    }

    /// Whether the engine went away, so a batch should stop here.
    pub fn aborts_batch(&self) -> bool {
        match self {
            UpdateError::RuntimeUnavailable { .. } => true,
            UpdateError::RecreationFailed {
                engine_unreachable, ..
            }
            | UpdateError::StartFailed {
                engine_unreachable, ..
            } => *engine_unreachable,
            _ => false,
        }
    }

    /// Short machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateError::NotFound(_) => "not_found",
            UpdateError::RuntimeUnavailable { .. } => "runtime_unavailable",
            UpdateError::PullFailed { .. } => "pull_failed",
            UpdateError::RecreationFailed { .. } => "recreation_failed",
            UpdateError::StartFailed { .. } => "start_failed",
            UpdateError::Operation { .. } => "operation_failed",
        }
    }
}
