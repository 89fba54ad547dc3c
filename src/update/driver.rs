// ABOUTME: Drives one container through the replacement states.
// ABOUTME: Converts every failure into an UpdateOutcome at the container boundary.

use super::error::UpdateError;
use super::options::UpdateOptions;
use super::outcome::UpdateOutcome;
use super::replacement::{Replacement, Verdict};
use crate::backup::BackupStore;
use crate::diagnostics::{Diagnostics, Warning};
use crate::oracle::Staleness;
use crate::output::Output;
use crate::runtime::traits::{ContainerOps, ImageOps};
use crate::types::ContainerName;

/// Runs replacements with one set of options against one engine.
pub struct Updater<'a, R: ?Sized, B: ?Sized> {
    runtime: &'a R,
    backups: &'a B,
    output: &'a Output,
    options: UpdateOptions,
}

impl<'a, R, B> Updater<'a, R, B>
where
    R: ContainerOps + ImageOps + ?Sized,
    B: BackupStore + ?Sized,
{
    pub fn new(runtime: &'a R, backups: &'a B, output: &'a Output, options: UpdateOptions) -> Self {
        Self {
            runtime,
            backups,
            output,
            options,
        }
    }

    pub fn runtime(&self) -> &'a R {
        self.runtime
    }

    pub fn options(&self) -> UpdateOptions {
        self.options
    }

    /// Update one container. Never fails; failures become outcomes.
    pub async fn update(
        &self,
        name: &ContainerName,
        diagnostics: &mut Diagnostics,
    ) -> UpdateOutcome {
        match self.run(name, diagnostics).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(container = %name, stage = %e.stage(), error = %e, "update failed");
                e.into()
            }
        }
    }

    async fn run(
        &self,
        name: &ContainerName,
        diagnostics: &mut Diagnostics,
    ) -> Result<UpdateOutcome, UpdateError> {
        let runtime = self.runtime;
        let out = self.output;

        out.operation(&format!("inspect container {}", name));
        let resolved = Replacement::new(name.clone(), self.options)
            .resolve(runtime)
            .await?;
        let image = resolved.container().image.clone();

        if !self.options.force {
            out.operation(&format!("compare local and registry digests of {}", image));
        }
        let checked = resolved.check(runtime).await?;
        if let Some(report) = checked.report()
            && report.staleness == Staleness::Unknown
        {
            diagnostics.warn(Warning::staleness_unknown(
                name,
                format!(
                    "cannot tell whether {} is current ({}); treating it as stale",
                    image,
                    report.reason.as_deref().unwrap_or("no digest")
                ),
            ));
        }

        match checked.verdict() {
            Verdict::UpToDate => return Ok(UpdateOutcome::UpToDate),
            Verdict::DryRun(staleness) => return Ok(UpdateOutcome::DryRunPlanned { staleness }),
            Verdict::Proceed => {}
        }

        out.progress(&format!("Updating {} ({})", name, image));

        if !self.options.skip_backup {
            out.operation(&format!("back up configuration of {}", name));
        }
        let backed_up = checked.backup(runtime, self.backups, diagnostics).await?;

        out.operation(&format!(
            "stop {} (timeout {}s)",
            name,
            self.options.stop_timeout.as_secs()
        ));
        let stopped = backed_up.stop(runtime, diagnostics).await?;

        out.operation(&format!("pull {}", image));
        let pulled = match stopped.pull(runtime).await {
            Ok(pulled) => pulled,
            Err((stopped, err)) => {
                stopped.restart_original(runtime, diagnostics).await;
                return Err(err);
            }
        };

        out.operation(&format!("remove {}", name));
        let removed = match pulled.remove(runtime).await {
            Ok(removed) => removed,
            Err((pulled, err)) => {
                pulled.restart_original(runtime, diagnostics).await;
                return Err(err);
            }
        };

        out.operation(&removed.snapshot().run_command(name));
        let recreated = removed.recreate(runtime).await?;

        out.operation(&format!("start {}", name));
        let started = recreated.start(runtime).await?;

        Ok(started.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::FsBackupStore;
    use crate::diagnostics::WarningKind;
    use crate::output::OutputMode;
    use crate::runtime::fake::{Call, FakeEngine, digest};
    use crate::update::error::Stage;

    struct Harness {
        engine: FakeEngine,
        backups: FsBackupStore,
        output: Output,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(engine: FakeEngine) -> Self {
            let dir = tempfile::tempdir().unwrap();
            Self {
                engine,
                backups: FsBackupStore::new(dir.path().join("backups")),
                output: Output::new(OutputMode::Quiet),
                _dir: dir,
            }
        }

        async fn update(
            &self,
            name: &str,
            options: UpdateOptions,
        ) -> (UpdateOutcome, Diagnostics) {
            let mut diagnostics = Diagnostics::default();
            let updater = Updater::new(&self.engine, &self.backups, &self.output, options);
            let outcome = updater
                .update(&ContainerName::new(name).unwrap(), &mut diagnostics)
                .await;
            (outcome, diagnostics)
        }

        fn backup_count(&self) -> usize {
            std::fs::read_dir(self.backups.root())
                .map(|d| d.count())
                .unwrap_or(0)
        }
    }

    fn stale() -> FakeEngine {
        FakeEngine::new()
            .with_container("web", "nginx:1.25", digest('a'))
            .with_remote("nginx:1.25", digest('b'))
    }

    fn current() -> FakeEngine {
        FakeEngine::new()
            .with_container("web", "nginx:1.25", digest('a'))
            .with_remote("nginx:1.25", digest('a'))
    }

    fn forced() -> UpdateOptions {
        UpdateOptions {
            force: true,
            ..Default::default()
        }
    }

    fn dry_run(force: bool) -> UpdateOptions {
        UpdateOptions {
            force,
            dry_run: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn current_container_is_left_alone() {
        let h = Harness::new(current());

        let (outcome, _) = h.update("web", UpdateOptions::default()).await;

        assert!(matches!(outcome, UpdateOutcome::UpToDate));
        assert!(h.engine.mutations().is_empty());
        assert_eq!(h.backup_count(), 0);
    }

    #[tokio::test]
    async fn stale_container_is_replaced_in_order() {
        let h = Harness::new(stale());
        let old_id = h.engine.container("web").unwrap().id;

        let (outcome, diagnostics) = h.update("web", UpdateOptions::default()).await;

        let label = outcome.label();
        let UpdateOutcome::Updated {
            container,
            digest: pulled,
            backup,
        } = outcome
        else {
            panic!("expected Updated, got {}", label);
        };
        assert_ne!(container, old_id);
        assert_eq!(pulled, Some(digest('b')));
        assert!(backup.unwrap().exists());
        assert!(!diagnostics.has_warnings());

        let mutations = h.engine.mutations();
        assert_eq!(
            mutations,
            vec![
                Call::Stop(old_id.to_string()),
                Call::Pull("nginx:1.25".to_string()),
                Call::Remove(old_id.to_string()),
                Call::Create("web".to_string()),
                Call::Start(container.to_string()),
            ]
        );

        let new = h.engine.container("web").unwrap();
        assert!(new.running);
        assert_eq!(new.snapshot.environment, vec!["APP_NAME=web".to_string()]);
    }

    #[tokio::test]
    async fn capture_happens_before_remove() {
        let h = Harness::new(stale());

        h.update(
            "web",
            UpdateOptions {
                skip_backup: true,
                ..Default::default()
            },
        )
        .await;

        let calls = h.engine.calls();
        let inspect = calls
            .iter()
            .position(|c| matches!(c, Call::Inspect(_)))
            .unwrap();
        let remove = calls
            .iter()
            .position(|c| matches!(c, Call::Remove(_)))
            .unwrap();
        assert!(inspect < remove);
        assert_eq!(h.backup_count(), 0);
    }

    #[tokio::test]
    async fn force_skips_the_check_and_replaces_current_container() {
        let h = Harness::new(current());

        let (outcome, _) = h.update("web", forced()).await;

        assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
        assert!(
            !h.engine
                .calls()
                .iter()
                .any(|c| matches!(c, Call::RemoteDigest(_) | Call::LocalDigest(_)))
        );
        assert_eq!(h.engine.mutations().len(), 5);
    }

    #[tokio::test]
    async fn dry_run_never_mutates() {
        for (engine, force) in [(stale(), false), (current(), false), (stale(), true)] {
            let h = Harness::new(engine);

            let (outcome, _) = h.update("web", dry_run(force)).await;

            assert!(h.engine.mutations().is_empty(), "force={}", force);
            assert_eq!(h.backup_count(), 0);
            if force {
                assert!(matches!(
                    outcome,
                    UpdateOutcome::DryRunPlanned { staleness: None }
                ));
            }
        }
    }

    #[tokio::test]
    async fn dry_run_reports_stale_plan() {
        let h = Harness::new(stale());

        let (outcome, _) = h.update("web", dry_run(false)).await;

        assert!(matches!(
            outcome,
            UpdateOutcome::DryRunPlanned {
                staleness: Some(Staleness::Stale)
            }
        ));
    }

    #[tokio::test]
    async fn unknown_staleness_proceeds_with_warning() {
        let h = Harness::new(
            FakeEngine::new()
                .with_container("web", "nginx:1.25", digest('a'))
                .with_remote("nginx:1.25", digest('b'))
                .failing_registry(),
        );

        let (outcome, diagnostics) = h.update("web", UpdateOptions::default()).await;

        assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
        assert_eq!(diagnostics.warnings()[0].kind, WarningKind::StalenessUnknown);
    }

    #[tokio::test]
    async fn missing_container_is_not_found() {
        let h = Harness::new(stale());

        let (outcome, _) = h.update("ghost", UpdateOptions::default()).await;

        assert!(matches!(outcome, UpdateOutcome::NotFound(ref n) if n.as_str() == "ghost"));
        assert!(outcome.is_failure());
        assert!(h.engine.mutations().is_empty());
    }

    #[tokio::test]
    async fn pull_failure_keeps_original_and_restarts_it() {
        let h = Harness::new(stale().failing_pull("nginx:1.25"));
        let old_id = h.engine.container("web").unwrap().id;

        let (outcome, diagnostics) = h.update("web", UpdateOptions::default()).await;

        assert!(matches!(
            outcome,
            UpdateOutcome::Failed(UpdateError::PullFailed { .. })
        ));
        assert!(!h.engine.calls().iter().any(|c| matches!(c, Call::Remove(_))));

        let resolved = h
            .engine
            .resolve_container(&ContainerName::new("web").unwrap())
            .await
            .unwrap();
        assert_eq!(resolved.id, old_id);
        assert!(h.engine.container("web").unwrap().running);
        assert!(!diagnostics.has_warnings());
    }

    #[tokio::test]
    async fn recreation_failure_carries_snapshot_and_backup() {
        let h = Harness::new(stale().failing_create());

        let (outcome, _) = h.update("web", UpdateOptions::default()).await;

        let label = outcome.label();
        let UpdateOutcome::Failed(UpdateError::RecreationFailed {
            snapshot,
            backup,
            engine_unreachable,
            ..
        }) = outcome
        else {
            panic!("expected RecreationFailed, got {}", label);
        };
        assert_eq!(snapshot.environment, vec!["APP_NAME=web".to_string()]);
        assert!(backup.is_some());
        assert!(!engine_unreachable);
        assert!(h.engine.container("web").is_none());
    }

    #[tokio::test]
    async fn start_failure_leaves_new_container_in_place() {
        let h = Harness::new(stale().failing_start());

        let (outcome, _) = h.update("web", UpdateOptions::default()).await;

        let label = outcome.label();
        let UpdateOutcome::Failed(err) = outcome else {
            panic!("expected Failed, got {}", label);
        };
        assert_eq!(err.stage(), Stage::Start);
        let new = h.engine.container("web").unwrap();
        assert!(!new.running);
    }

    #[tokio::test]
    async fn stop_refusal_is_tolerated() {
        let h = Harness::new(stale().failing_stop());

        let (outcome, diagnostics) = h.update("web", UpdateOptions::default()).await;

        assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
        assert_eq!(diagnostics.warnings()[0].kind, WarningKind::StopTolerated);
    }

    #[tokio::test]
    async fn unwritable_backup_dir_warns_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let engine = stale();
        let backups = FsBackupStore::new(blocker.join("backups"));
        let output = Output::new(OutputMode::Quiet);
        let updater = Updater::new(&engine, &backups, &output, UpdateOptions::default());
        let mut diagnostics = Diagnostics::default();

        let outcome = updater
            .update(&ContainerName::new("web").unwrap(), &mut diagnostics)
            .await;

        assert!(matches!(outcome, UpdateOutcome::Updated { backup: None, .. }));
        assert_eq!(diagnostics.warnings()[0].kind, WarningKind::BackupFailed);
    }

    #[tokio::test]
    async fn repeated_updates_write_distinct_backups() {
        let h = Harness::new(stale());

        h.update("web", forced()).await;
        h.update("web", forced()).await;

        assert_eq!(h.backup_count(), 2);
    }

    #[tokio::test]
    async fn unreachable_engine_is_runtime_unavailable() {
        let h = Harness::new(stale().unavailable());

        let (outcome, _) = h.update("web", UpdateOptions::default()).await;

        let label = outcome.label();
        let UpdateOutcome::Failed(err) = outcome else {
            panic!("expected Failed, got {}", label);
        };
        assert!(err.aborts_batch());
        assert_eq!(err.stage(), Stage::Resolve);
    }
}
