// ABOUTME: Per-container result of an update invocation.
// ABOUTME: Errors are converted here and never cross the per-container boundary.

use super::error::UpdateError;
use crate::oracle::Staleness;
use crate::types::{ContainerId, ContainerName, ImageDigest};
use std::path::PathBuf;

/// What happened to one container.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Running image matches the registry; nothing was touched.
    UpToDate,
    /// Replaced and running.
    Updated {
        container: ContainerId,
        digest: Option<ImageDigest>,
        backup: Option<PathBuf>,
    },
    /// Would have been replaced. `None` staleness means the check was forced off.
    DryRunPlanned { staleness: Option<Staleness> },
    Failed(UpdateError),
    NotFound(ContainerName),
}

impl UpdateOutcome {
    /// Whether this outcome makes the invocation fail.
    pub fn is_failure(&self) -> bool {
        matches!(self, UpdateOutcome::Failed(_) | UpdateOutcome::NotFound(_))
    }

    /// Short machine-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            UpdateOutcome::UpToDate => "up_to_date",
            UpdateOutcome::Updated { .. } => "updated",
            UpdateOutcome::DryRunPlanned { .. } => "dry_run_planned",
            UpdateOutcome::Failed(_) => "failed",
            UpdateOutcome::NotFound(_) => "not_found",
        }
    }
}

impl From<UpdateError> for UpdateOutcome {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::NotFound(name) => UpdateOutcome::NotFound(name),
            other => UpdateOutcome::Failed(other),
        }
    }
}
