// ABOUTME: Read-only status of every running container for --list.
// ABOUTME: Reports local and registry digests and whether an update is available.

use super::error::{Stage, UpdateError};
use crate::oracle::{self, Staleness};
use crate::runtime::traits::{ContainerError, ContainerOps, ImageOps};
use crate::types::{ContainerName, ImageDigest};
use serde::Serialize;

/// One line of the status table.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRow {
    pub name: ContainerName,
    pub image: String,
    pub current: Option<ImageDigest>,
    pub latest: Option<ImageDigest>,
    pub staleness: Staleness,
}

fn unavailable(stage: Stage, message: String) -> UpdateError {
    UpdateError::RuntimeUnavailable { stage, message }
}

/// Check every running container without changing anything.
///
/// Containers that cannot be checked (started from a bare image id, or gone
/// by the time they are inspected) are reported as `Unknown` or skipped.
pub async fn survey<R>(runtime: &R) -> Result<Vec<StatusRow>, UpdateError>
where
    R: ContainerOps + ImageOps + ?Sized,
{
    let running = runtime.list_running().await.map_err(|e| {
        if e.is_unavailable() {
            unavailable(Stage::Resolve, e.to_string())
        } else {
            UpdateError::Operation {
                stage: Stage::Resolve,
                message: e.to_string(),
            }
        }
    })?;

    let mut rows = Vec::with_capacity(running.len());
    for summary in running {
        let container = match runtime.resolve_container(&summary.name).await {
            Ok(container) => container,
            Err(ContainerError::NotFound(_)) => continue,
            Err(e) if e.is_unavailable() => return Err(unavailable(Stage::Resolve, e.to_string())),
            Err(e) => {
                tracing::debug!(container = %summary.name, error = %e, "cannot check container");
                rows.push(StatusRow {
                    name: summary.name,
                    image: summary.image,
                    current: None,
                    latest: None,
                    staleness: Staleness::Unknown,
                });
                continue;
            }
        };

        let report = oracle::check(runtime, &container)
            .await
            .map_err(|e| unavailable(Stage::StalenessCheck, e.to_string()))?;
        rows.push(StatusRow {
            name: summary.name,
            image: container.image.to_string(),
            current: report.local,
            latest: report.remote,
            staleness: report.staleness,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::fake::{FakeEngine, digest};

    #[tokio::test]
    async fn marks_each_container_by_digest_comparison() {
        let engine = FakeEngine::new()
            .with_container("app", "app:1.0", digest('a'))
            .with_remote("app:1.0", digest('b'))
            .with_container("db", "db:16", digest('c'))
            .with_remote("db:16", digest('c'));

        let rows = survey(&engine).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].staleness.to_string(), "Update available");
        assert_eq!(rows[0].current, Some(digest('a')));
        assert_eq!(rows[0].latest, Some(digest('b')));
        assert_eq!(rows[1].staleness.to_string(), "Up to date");
        assert!(engine.mutations().is_empty());
    }

    #[tokio::test]
    async fn unreachable_registry_is_unknown() {
        let engine = FakeEngine::new()
            .with_container("app", "app:1.0", digest('a'))
            .failing_registry();

        let rows = survey(&engine).await.unwrap();

        assert_eq!(rows[0].staleness, Staleness::Unknown);
        assert_eq!(rows[0].staleness.to_string(), "Unknown");
    }

    #[tokio::test]
    async fn uncheckable_container_is_unknown() {
        let engine = FakeEngine::new()
            .with_container("app", "app:1.0", digest('a'))
            .with_remote("app:1.0", digest('a'))
            .failing_lookup("app");

        let rows = survey(&engine).await.unwrap();

        assert_eq!(rows[0].staleness, Staleness::Unknown);
        assert_eq!(rows[0].image, "app:1.0");
    }
}
