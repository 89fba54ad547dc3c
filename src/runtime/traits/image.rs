// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Local and remote digest lookup, and pulls.

use super::sealed::Sealed;
use crate::types::{ImageDigest, ImageId, ImageRef};
use async_trait::async_trait;

/// Image operations: digest lookup and pull.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Digest of a local image as recorded by the registry it came from.
    ///
    /// Looks at `image_id` when given (the image a container actually runs),
    /// otherwise at whatever `image` currently points to locally. `None` when
    /// the image is local-only or absent.
    async fn local_digest(
        &self,
        image: &ImageRef,
        image_id: Option<&ImageId>,
    ) -> Result<Option<ImageDigest>, ImageError>;

    /// Digest the registry currently serves for `image`, without pulling layers.
    async fn remote_digest(&self, image: &ImageRef) -> Result<Option<ImageDigest>, ImageError>;

    /// Pull an image, returning its digest once present locally.
    async fn pull_image(&self, image: &ImageRef) -> Result<Option<ImageDigest>, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("authentication failed for registry: {0}")]
    AuthenticationFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("registry query failed: {0}")]
    Registry(String),

    #[error("container engine unreachable: {0}")]
    Unavailable(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ImageError {
    /// Whether the engine itself could not be reached (or did not answer in time).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ImageError::Unavailable(_))
    }
}
