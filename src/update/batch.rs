// ABOUTME: Applies the replacement workflow to one or many containers in sequence.
// ABOUTME: Collects per-container outcomes; only an engine outage stops the batch.

use super::driver::Updater;
use super::error::{Stage, UpdateError};
use super::outcome::UpdateOutcome;
use crate::backup::BackupStore;
use crate::diagnostics::Diagnostics;
use crate::runtime::traits::{ContainerOps, ImageOps};
use crate::types::ContainerName;
use std::fmt;

/// Which containers to update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Single(ContainerName),
    /// Every container running when the batch starts.
    AllRunning,
}

/// Outcome for one container in a batch.
#[derive(Debug)]
pub struct ContainerResult {
    pub name: ContainerName,
    pub outcome: UpdateOutcome,
}

/// The batch stopped early because the engine went away.
#[derive(Debug, Clone)]
pub struct Aborted {
    /// Container whose failure stopped the batch.
    pub at: ContainerName,
    /// Containers never processed.
    pub skipped: Vec<ContainerName>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<ContainerResult>,
    pub aborted: Option<Aborted>,
}

impl BatchReport {
    /// True when every container reached a terminal success state.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && !self.results.iter().any(|r| r.outcome.is_failure())
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            skipped: self.aborted.as_ref().map_or(0, |a| a.skipped.len()),
            ..Default::default()
        };
        for result in &self.results {
            match result.outcome {
                UpdateOutcome::UpToDate => summary.up_to_date += 1,
                UpdateOutcome::Updated { .. } => summary.updated += 1,
                UpdateOutcome::DryRunPlanned { .. } => summary.planned += 1,
                UpdateOutcome::Failed(_) => summary.failed += 1,
                UpdateOutcome::NotFound(_) => summary.not_found += 1,
            }
        }
        summary
    }
}

/// Counts per outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub updated: usize,
    pub up_to_date: usize,
    pub planned: usize,
    pub failed: usize,
    pub not_found: usize,
    pub skipped: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} up to date",
            self.updated, self.up_to_date
        )?;
        for (count, label) in [
            (self.planned, "planned"),
            (self.failed, "failed"),
            (self.not_found, "not found"),
            (self.skipped, "not processed"),
        ] {
            if count > 0 {
                write!(f, ", {} {}", count, label)?;
            }
        }
        Ok(())
    }
}

/// Run the updater over `target`.
///
/// For [`Target::AllRunning`] the set of containers is read once, up front.
/// One container's failure does not affect the others unless the engine
/// became unreachable, in which case the rest are reported as not processed.
pub async fn run<R, B>(
    updater: &Updater<'_, R, B>,
    target: &Target,
    diagnostics: &mut Diagnostics,
) -> Result<BatchReport, UpdateError>
where
    R: ContainerOps + ImageOps + ?Sized,
    B: BackupStore + ?Sized,
{
    let names = match target {
        Target::Single(name) => vec![name.clone()],
        Target::AllRunning => updater
            .runtime()
            .list_running()
            .await
            .map_err(|e| {
                if e.is_unavailable() {
                    UpdateError::RuntimeUnavailable {
                        stage: Stage::Resolve,
                        message: e.to_string(),
                    }
                } else {
                    UpdateError::Operation {
                        stage: Stage::Resolve,
                        message: format!("listing running containers: {}", e),
                    }
                }
            })?
            .into_iter()
            .map(|c| c.name)
            .collect(),
    };
    tracing::debug!(count = names.len(), "starting batch");

    let mut report = BatchReport::default();
    let mut remaining = names.into_iter();
    while let Some(name) = remaining.next() {
        let outcome = updater.update(&name, diagnostics).await;
        let abort = matches!(&outcome, UpdateOutcome::Failed(e) if e.aborts_batch());
        report.results.push(ContainerResult {
            name: name.clone(),
            outcome,
        });
        if abort {
            report.aborted = Some(Aborted {
                at: name,
                skipped: remaining.collect(),
            });
            break;
        }
    }

    Ok(report)
}
