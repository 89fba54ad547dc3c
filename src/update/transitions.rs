// ABOUTME: State transition methods for the replacement workflow.
// ABOUTME: Each method consumes self and returns the next state on success.

use super::error::{Stage, UpdateError};
use super::outcome::UpdateOutcome;
use super::replacement::Replacement;
use super::state::{
    BackedUp, HoldsOriginal, Idle, Pulled, Recreated, Removed, Resolved, StalenessChecked,
    Started, Stopped,
};
use crate::backup::BackupStore;
use crate::diagnostics::{Diagnostics, Warning};
use crate::oracle;
use crate::runtime::traits::{ContainerError, ContainerOps, ImageError, ImageOps};

/// Result type for transitions after which the original container must be
/// restarted on failure.
pub type TransitionResult<T, S> = Result<Replacement<T>, (Replacement<S>, UpdateError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

fn container_failure(stage: Stage, e: ContainerError) -> UpdateError {
    if e.is_unavailable() {
        UpdateError::RuntimeUnavailable {
            stage,
            message: e.to_string(),
        }
    } else {
        UpdateError::Operation {
            stage,
            message: e.to_string(),
        }
    }
}

fn image_failure(stage: Stage, e: ImageError) -> UpdateError {
    if e.is_unavailable() {
        UpdateError::RuntimeUnavailable {
            stage,
            message: e.to_string(),
        }
    } else {
        UpdateError::Operation {
            stage,
            message: e.to_string(),
        }
    }
}

impl<S: HoldsOriginal> Replacement<S> {
    /// Best-effort restart of the original container after an aborted update.
    ///
    /// Only restarts a container this run stopped. Failure is a warning.
    pub async fn restart_original<R>(&self, runtime: &R, diagnostics: &mut Diagnostics)
    where
        R: ContainerOps + ?Sized,
    {
        if !self.state.stopped_by_us() {
            return;
        }
        let original = self.state.original();
        tracing::debug!(container = %self.name, "restarting original container");
        if let Err(e) = runtime.start_container(&original.id).await {
            diagnostics.warn(Warning::restore_original_failed(
                &self.name,
                format!(
                    "original container {} could not be restarted: {}",
                    original.id.short(),
                    e
                ),
            ));
        }
    }
}

// =============================================================================
// Idle -> Resolved
// =============================================================================

impl Replacement<Idle> {
    /// Look the container up by name.
    ///
    /// # Errors
    ///
    /// `UpdateError::NotFound` if no container has that name. Nothing has been
    /// changed at this point.
    #[must_use = "replacement state must be used"]
    pub async fn resolve<R>(self, runtime: &R) -> Result<Replacement<Resolved>, UpdateError>
    where
        R: ContainerOps + ?Sized,
    {
        match runtime.resolve_container(&self.name).await {
            Ok(container) => Ok(self.transition(Resolved { container })),
            Err(ContainerError::NotFound(_)) => Err(UpdateError::NotFound(self.name)),
            Err(e) => Err(container_failure(Stage::Resolve, e)),
        }
    }
}

// =============================================================================
// Resolved -> StalenessChecked
// =============================================================================

impl Replacement<Resolved> {
    /// Compare the running image with the registry, unless forced.
    #[must_use = "replacement state must be used"]
    pub async fn check<R>(
        self,
        runtime: &R,
    ) -> Result<Replacement<StalenessChecked>, UpdateError>
    where
        R: ImageOps + ?Sized,
    {
        let report = if self.options.force {
            tracing::debug!(container = %self.name, "staleness check bypassed");
            None
        } else {
            let report = oracle::check(runtime, &self.state.container)
                .await
                .map_err(|e| image_failure(Stage::StalenessCheck, e))?;
            Some(report)
        };

        let container = self.state.container.clone();
        Ok(self.transition(StalenessChecked { container, report }))
    }
}

// =============================================================================
// StalenessChecked -> BackedUp
// =============================================================================

impl Replacement<StalenessChecked> {
    /// Capture the configuration and persist it, unless backups are skipped.
    ///
    /// A backup that cannot be captured or written is a warning; the update
    /// goes on. Only an unreachable engine stops it.
    #[must_use = "replacement state must be used"]
    pub async fn backup<R, B>(
        self,
        runtime: &R,
        store: &B,
        diagnostics: &mut Diagnostics,
    ) -> Result<Replacement<BackedUp>, UpdateError>
    where
        R: ContainerOps + ?Sized,
        B: BackupStore + ?Sized,
    {
        let container = self.state.container.clone();
        if self.options.skip_backup {
            return Ok(self.transition(BackedUp {
                container,
                snapshot: None,
                backup: None,
            }));
        }

        let snapshot = match runtime.inspect_config(&container).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) if e.is_unavailable() => return Err(container_failure(Stage::Backup, e)),
            Err(e) => {
                diagnostics.warn(Warning::backup_failed(
                    &self.name,
                    format!("could not capture configuration for backup: {}", e),
                ));
                None
            }
        };

        let backup = match &snapshot {
            Some(snapshot) => match store.save(&self.name, snapshot) {
                Ok(saved) => Some(saved.path),
                Err(e) => {
                    diagnostics.warn(Warning::backup_failed(
                        &self.name,
                        format!("backup not written, continuing without it: {}", e),
                    ));
                    None
                }
            },
            None => None,
        };

        Ok(self.transition(BackedUp {
            container,
            snapshot,
            backup,
        }))
    }
}

// =============================================================================
// BackedUp -> Stopped
// =============================================================================

impl Replacement<BackedUp> {
    /// Stop the running container. Engine refusals are tolerated.
    #[must_use = "replacement state must be used"]
    pub async fn stop<R>(
        self,
        runtime: &R,
        diagnostics: &mut Diagnostics,
    ) -> Result<Replacement<Stopped>, UpdateError>
    where
        R: ContainerOps + ?Sized,
    {
        let stopped_by_us = match runtime
            .stop_container(&self.state.container.id, self.options.stop_timeout)
            .await
        {
            Ok(()) => true,
            Err(e) if e.is_unavailable() => return Err(container_failure(Stage::Stop, e)),
            Err(e) => {
                diagnostics.warn(Warning::stop_tolerated(
                    &self.name,
                    format!("stop failed, continuing: {}", e),
                ));
                false
            }
        };

        let BackedUp {
            container,
            snapshot,
            backup,
        } = self.state.clone();
        Ok(self.transition(Stopped {
            container,
            snapshot,
            backup,
            stopped_by_us,
        }))
    }
}

// =============================================================================
// Stopped -> Pulled
// =============================================================================

impl Replacement<Stopped> {
    /// Pull the image the container runs.
    ///
    /// # Errors
    ///
    /// Returns the unchanged state together with `UpdateError::PullFailed` so
    /// the caller can restart the original. The old container is untouched.
    #[must_use = "replacement state must be used"]
    pub async fn pull<R>(self, runtime: &R) -> TransitionResult<Pulled, Stopped>
    where
        R: ImageOps + ?Sized,
    {
        let image = &self.state.container.image;
        let digest = match runtime.pull_image(image).await {
            Ok(digest) => digest,
            Err(e) if e.is_unavailable() => {
                let err = image_failure(Stage::Pull, e);
                return Err((self, err));
            }
            Err(e) => {
                let err = UpdateError::PullFailed {
                    image: image.clone(),
                    message: e.to_string(),
                };
                return Err((self, err));
            }
        };

        let Stopped {
            container,
            snapshot,
            backup,
            stopped_by_us,
        } = self.state.clone();
        Ok(self.transition(Pulled {
            container,
            snapshot,
            backup,
            stopped_by_us,
            digest,
        }))
    }
}

// =============================================================================
// Pulled -> Removed
// =============================================================================

impl Replacement<Pulled> {
    /// Capture the configuration (if not already held) and remove the old container.
    ///
    /// The capture always happens before the removal.
    #[must_use = "replacement state must be used"]
    pub async fn remove<R>(self, runtime: &R) -> TransitionResult<Removed, Pulled>
    where
        R: ContainerOps + ?Sized,
    {
        let held = self.state.snapshot.clone();
        let snapshot = match held {
            Some(snapshot) => snapshot,
            None => match runtime.inspect_config(&self.state.container).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    let err = container_failure(Stage::Remove, e);
                    return Err((self, err));
                }
            },
        };

        if let Err(e) = runtime
            .remove_container(&self.state.container.id, true)
            .await
        {
            let err = container_failure(Stage::Remove, e);
            return Err((self, err));
        }

        let Pulled {
            container,
            backup,
            digest,
            ..
        } = self.state.clone();
        Ok(self.transition(Removed {
            container,
            snapshot,
            backup,
            digest,
        }))
    }
}

// =============================================================================
// Removed -> Recreated
// =============================================================================

impl Replacement<Removed> {
    /// Create the replacement under the same name from the captured snapshot.
    ///
    /// # Errors
    ///
    /// `UpdateError::RecreationFailed`, carrying the snapshot and backup path,
    /// since at this point there is no container left under the name.
    #[must_use = "replacement state must be used"]
    pub async fn recreate<R>(self, runtime: &R) -> Result<Replacement<Recreated>, UpdateError>
    where
        R: ContainerOps + ?Sized,
    {
        let Removed {
            container,
            snapshot,
            backup,
            digest,
        } = self.state.clone();

        match runtime
            .create_container(&self.name, &container.image, &snapshot)
            .await
        {
            Ok(created) => Ok(self.transition(Recreated {
                container: created,
                backup,
                digest,
            })),
            Err(e) => Err(UpdateError::RecreationFailed {
                message: e.to_string(),
                engine_unreachable: e.is_unavailable(),
                snapshot: Box::new(snapshot),
                backup,
            }),
        }
    }
}

// =============================================================================
// Recreated -> Started
// =============================================================================

impl Replacement<Recreated> {
    /// Start the replacement. On failure it stays in place for a retry.
    #[must_use = "replacement state must be used"]
    pub async fn start<R>(self, runtime: &R) -> Result<Replacement<Started>, UpdateError>
    where
        R: ContainerOps + ?Sized,
    {
        if let Err(e) = runtime.start_container(&self.state.container.id).await {
            return Err(UpdateError::StartFailed {
                container: self.state.container.id.clone(),
                message: e.to_string(),
                engine_unreachable: e.is_unavailable(),
            });
        }

        let Recreated {
            container,
            backup,
            digest,
        } = self.state.clone();
        Ok(self.transition(Started {
            container,
            backup,
            digest,
        }))
    }
}

// =============================================================================
// Started -> Done
// =============================================================================

impl Replacement<Started> {
    /// Finish the replacement.
    pub fn finish(self) -> UpdateOutcome {
        tracing::debug!(container = %self.name, id = %self.state.container.id.short(), "update complete");
        UpdateOutcome::Updated {
            container: self.state.container.id,
            digest: self.state.digest,
            backup: self.state.backup,
        }
    }
}
