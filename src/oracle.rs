// ABOUTME: Decides whether a container's running image is behind its registry.
// ABOUTME: Compares content digests only; tags are never trusted.

use crate::runtime::traits::{ContainerRef, ImageError, ImageOps};
use crate::types::ImageDigest;
use serde::Serialize;
use std::fmt;

/// Result of comparing the running image with the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    Stale,
    Current,
    /// One side's digest could not be obtained.
    Unknown,
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::Stale => write!(f, "Update available"),
            Staleness::Current => write!(f, "Up to date"),
            Staleness::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StalenessReport {
    pub local: Option<ImageDigest>,
    pub remote: Option<ImageDigest>,
    pub staleness: Staleness,
    /// Why the staleness is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Compare two digests. Missing on either side is `Unknown`.
pub fn compare(local: Option<&ImageDigest>, remote: Option<&ImageDigest>) -> Staleness {
    match (local, remote) {
        (Some(local), Some(remote)) if local == remote => Staleness::Current,
        (Some(_), Some(_)) => Staleness::Stale,
        _ => Staleness::Unknown,
    }
}

/// Check `container` against its registry.
///
/// Only an unreachable engine is an error; anything else that prevents a
/// digest from being read yields `Unknown`. Nothing is pulled and nothing is
/// cached.
pub async fn check<R>(runtime: &R, container: &ContainerRef) -> Result<StalenessReport, ImageError>
where
    R: ImageOps + ?Sized,
{
    let mut reasons = Vec::new();

    let local = match runtime
        .local_digest(&container.image, container.image_id.as_ref())
        .await
    {
        Ok(Some(digest)) => Some(digest),
        Ok(None) => {
            reasons.push("local image has no registry digest".to_string());
            None
        }
        Err(e) if e.is_unavailable() => return Err(e),
        Err(e) => {
            reasons.push(e.to_string());
            None
        }
    };

    let remote = match runtime.remote_digest(&container.image).await {
        Ok(Some(digest)) => Some(digest),
        Ok(None) => {
            reasons.push("registry returned no digest".to_string());
            None
        }
        Err(e) if e.is_unavailable() => return Err(e),
        Err(e) => {
            reasons.push(e.to_string());
            None
        }
    };

    let staleness = compare(local.as_ref(), remote.as_ref());
    tracing::debug!(
        container = %container.name,
        local = ?local.as_ref().map(ImageDigest::short),
        remote = ?remote.as_ref().map(ImageDigest::short),
        ?staleness,
        "checked staleness"
    );

    Ok(StalenessReport {
        local,
        remote,
        staleness,
        reason: (staleness == Staleness::Unknown).then(|| reasons.join("; ")),
    })
}
