// ABOUTME: Update command implementation.
// ABOUTME: Runs the batch and reports each container's outcome, warnings and a summary.

use reimage::backup::FsBackupStore;
use reimage::config::Settings;
use reimage::diagnostics::Diagnostics;
use reimage::error::{Error, Result};
use reimage::oracle::Staleness;
use reimage::output::Output;
use reimage::runtime::BollardRuntime;
use reimage::types::ContainerName;
use reimage::update::{
    BatchReport, ContainerResult, Stage, Summary, Target, UpdateError, UpdateOptions,
    UpdateOutcome, Updater, run as run_batch,
};
use serde::Serialize;
use std::path::Path;

/// Update one container or every running container.
pub async fn update(
    runtime: &BollardRuntime,
    settings: &Settings,
    target: &Target,
    options: UpdateOptions,
    output: &Output,
) -> Result<()> {
    let backups = FsBackupStore::new(&settings.backup_dir);
    let updater = Updater::new(runtime, &backups, output, options);
    let mut diagnostics = Diagnostics::default();

    if options.dry_run {
        output.progress("Dry run: no containers will be changed.");
    }

    let report = run_batch(&updater, target, &mut diagnostics).await?;

    for result in &report.results {
        report_result(result, output);
    }

    if let Some(aborted) = &report.aborted {
        let skipped: Vec<&str> = aborted.skipped.iter().map(ContainerName::as_str).collect();
        output.error(&format!(
            "container engine became unavailable while updating {}; not processed: {}",
            aborted.at,
            if skipped.is_empty() {
                "none".to_string()
            } else {
                skipped.join(", ")
            }
        ));
    }

    for warning in diagnostics.warnings() {
        output.warning(&warning.to_string());
    }

    let summary = report.summary();
    if matches!(target, Target::AllRunning) || report.results.len() > 1 {
        output.record(&SummaryRecord {
            event: "summary",
            summary,
        });
        if report.is_success() {
            output.success(&format!("Done: {}", summary));
        }
    }

    finish(&report)
}

fn finish(report: &BatchReport) -> Result<()> {
    if report.is_success() {
        Ok(())
    } else {
        Err(Error::Failed(format!("update incomplete: {}", report.summary())))
    }
}

fn report_result(result: &ContainerResult, output: &Output) {
    output.record(&ResultRecord::from(result));

    let name = &result.name;
    match &result.outcome {
        UpdateOutcome::UpToDate => output.progress(&format!("{}: already up to date", name)),
        UpdateOutcome::Updated {
            container,
            digest,
            backup,
        } => {
            let version = digest
                .as_ref()
                .map_or_else(String::new, |d| format!(" to {}", d.short()));
            output.progress(&format!(
                "{}: updated{} (container {})",
                name,
                version,
                container.short()
            ));
            if let Some(path) = backup {
                output.progress(&format!("  backup: {}", path.display()));
            }
        }
        UpdateOutcome::DryRunPlanned { staleness } => {
            let why = match staleness {
                Some(Staleness::Stale) => "update available",
                Some(Staleness::Unknown) => "update status unknown",
                Some(Staleness::Current) | None => "forced",
            };
            output.progress(&format!("{}: would update ({})", name, why));
        }
        UpdateOutcome::NotFound(missing) => {
            output.error(&format!("container not found: {}", missing));
        }
        UpdateOutcome::Failed(err) => report_failure(name, err, output),
    }
}

fn report_failure(name: &ContainerName, err: &UpdateError, output: &Output) {
    output.error(&format!("{}: {}", name, err));

    if let UpdateError::RecreationFailed {
        snapshot, backup, ..
    } = err
    {
        output.error(&format!(
            "{}: the old container was removed. Recreate it with:\n  {}",
            name,
            snapshot.run_command(name)
        ));
        match backup {
            Some(path) => output.error(&format!(
                "{}: configuration saved at {} (restore with: reimage --restore {})",
                name,
                path.display(),
                path.display()
            )),
            None => output.error(&format!("{}: no configuration backup was written", name)),
        }
    }
}

#[derive(Serialize)]
struct SummaryRecord {
    event: &'static str,
    #[serde(flatten)]
    summary: Summary,
}

#[derive(Serialize)]
struct ResultRecord<'a> {
    event: &'static str,
    container: &'a ContainerName,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_container: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    staleness: Option<Staleness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recreate_command: Option<String>,
}

impl<'a> From<&'a ContainerResult> for ResultRecord<'a> {
    fn from(result: &'a ContainerResult) -> Self {
        let mut record = ResultRecord {
            event: "result",
            container: &result.name,
            outcome: result.outcome.label(),
            new_container: None,
            digest: None,
            backup: None,
            staleness: None,
            stage: None,
            error: None,
            recreate_command: None,
        };
        match &result.outcome {
            UpdateOutcome::Updated {
                container,
                digest,
                backup,
            } => {
                record.new_container = Some(container.as_str());
                record.digest = digest.as_ref().map(ToString::to_string);
                record.backup = backup.as_deref();
            }
            UpdateOutcome::DryRunPlanned { staleness } => record.staleness = *staleness,
            UpdateOutcome::Failed(err) => {
                record.stage = Some(err.stage());
                record.error = Some(err.to_string());
                if let UpdateError::RecreationFailed {
                    snapshot, backup, ..
                } = err
                {
                    record.recreate_command = Some(snapshot.run_command(&result.name));
                    record.backup = backup.as_deref();
                }
            }
            UpdateOutcome::NotFound(_) => {
                record.stage = Some(Stage::Resolve);
            }
            UpdateOutcome::UpToDate => {}
        }
        record
    }
}
