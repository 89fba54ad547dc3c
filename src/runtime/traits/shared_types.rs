// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerRef, ContainerSummary and RuntimeMetadata.

use crate::types::{ContainerId, ContainerName, ImageId, ImageRef};

/// A container as resolved from the engine at the start of an operation.
///
/// Never cached across invocations: the engine is the source of truth and the
/// id changes on every recreate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    /// Engine-assigned id.
    pub id: ContainerId,
    /// Container name.
    pub name: ContainerName,
    /// Image reference the container was started from.
    pub image: ImageRef,
    /// Id of the image the container actually runs.
    pub image_id: Option<ImageId>,
}

/// Summary of a running container, as listed by the engine.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    /// Container ID.
    pub id: ContainerId,
    /// Container name.
    pub name: ContainerName,
    /// Image as the engine reports it (may be a bare image id).
    pub image: String,
}

/// Runtime metadata.
#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    /// Runtime name (e.g., "docker", "podman").
    pub name: String,
    /// Runtime version.
    pub version: String,
    /// API version.
    pub api_version: String,
    /// Operating system.
    pub os: String,
    /// Architecture.
    pub arch: String,
}
