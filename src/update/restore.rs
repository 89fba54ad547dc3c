// ABOUTME: Recreates a container from a backup record.
// ABOUTME: Refuses to touch a name that is already in use.

use crate::backup::{BackupError, BackupRecord, BackupStore};
use crate::runtime::traits::{ContainerError, ContainerOps, ContainerRef, ImageError, ImageOps};
use crate::types::ContainerName;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("a container named {0} already exists; remove it first")]
    NameInUse(ContainerName),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Create and start the container described by the backup at `path`.
///
/// The image is pulled only if the engine does not have it.
pub async fn restore<R, B>(
    runtime: &R,
    store: &B,
    path: &Path,
) -> Result<(BackupRecord, ContainerRef), RestoreError>
where
    R: ContainerOps + ImageOps + ?Sized,
    B: BackupStore + ?Sized,
{
    let record = store.load(path)?;
    let name = &record.container_name;
    let snapshot = &record.snapshot;

    match runtime.resolve_container(name).await {
        Ok(_) => return Err(RestoreError::NameInUse(name.clone())),
        Err(ContainerError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    tracing::debug!(container = %name, backup = %path.display(), "restoring from backup");
    let created = match runtime
        .create_container(name, &snapshot.image, snapshot)
        .await
    {
        Ok(created) => created,
        Err(ContainerError::ImageNotFound(_)) => {
            runtime.pull_image(&snapshot.image).await?;
            runtime
                .create_container(name, &snapshot.image, snapshot)
                .await?
        }
        Err(e) => return Err(e.into()),
    };

    runtime.start_container(&created.id).await?;
    Ok((record, created))
}
