// ABOUTME: Restore command implementation.
// ABOUTME: Recreates and starts a container from a saved backup file.

use reimage::backup::FsBackupStore;
use reimage::config::Settings;
use reimage::error::Result;
use reimage::output::Output;
use reimage::runtime::BollardRuntime;
use reimage::update;
use std::path::Path;

/// Recreate the container described by the backup at `path`.
pub async fn restore(
    runtime: &BollardRuntime,
    settings: &Settings,
    path: &Path,
    output: &Output,
) -> Result<()> {
    output.progress(&format!("Restoring from {}...", path.display()));
    let store = FsBackupStore::new(&settings.backup_dir);

    let (record, created) = update::restore(runtime, &store, path).await?;

    output.operation(&record.snapshot.run_command(&record.container_name));
    output.success(&format!(
        "Restored {} (container {}, captured {})",
        record.container_name,
        created.id.short(),
        record.captured_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(())
}
