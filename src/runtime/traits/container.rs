// ABOUTME: Container operations trait for container runtimes.
// ABOUTME: Resolve, inspect, list, stop, remove, create and start containers.

use super::sealed::Sealed;
use super::shared_types::{ContainerRef, ContainerSummary};
use crate::snapshot::ConfigurationSnapshot;
use crate::types::{ContainerId, ContainerName, ImageRef};
use async_trait::async_trait;
use std::time::Duration;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// Look up a container by name.
    async fn resolve_container(&self, name: &ContainerName)
    -> Result<ContainerRef, ContainerError>;

    /// Read the reproducible configuration of a container.
    async fn inspect_config(
        &self,
        container: &ContainerRef,
    ) -> Result<ConfigurationSnapshot, ContainerError>;

    /// List running containers.
    async fn list_running(&self) -> Result<Vec<ContainerSummary>, ContainerError>;

    /// Stop a running container, waiting up to `timeout` before it is killed.
    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError>;

    /// Remove a container.
    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError>;

    /// Create a container named `name` running `image` with the given configuration.
    ///
    /// Every field travels as a discrete parameter of the create request.
    async fn create_container(
        &self,
        name: &ContainerName,
        image: &ImageRef,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<ContainerRef, ContainerError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;
}

/// Errors from container operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("container already running: {0}")]
    AlreadyRunning(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("container engine unreachable: {0}")]
    Unavailable(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ContainerError {
    /// Whether the engine itself could not be reached (or did not answer in time).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ContainerError::Unavailable(_))
    }
}
