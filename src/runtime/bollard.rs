// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Supports both Docker and Podman via Docker-compatible API.

use super::convert::{container_ref_from_inspect, create_body, snapshot_from_inspect};
use super::types::{DetectedRuntime, RuntimeType};
use crate::config::Timeouts;
use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerError, ContainerOps, ContainerRef, ContainerSummary, ImageError, ImageOps,
    RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::snapshot::ConfigurationSnapshot;
use crate::types::{ContainerId, ContainerName, ImageDigest, ImageId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::errors::Error as EngineError;
use bollard::models::{EndpointSettings, ImageConfig, NetworkConnectRequest};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StopContainerOptions,
};
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

/// Transport-level failures: the engine never produced an answer.
///
/// Errors the engine reported itself, including an `errorDetail` inside a
/// progress stream, mean it is up and answering.
fn is_unreachable(e: &EngineError) -> bool {
    matches!(
        e,
        EngineError::IOError { .. }
            | EngineError::HyperResponseError { .. }
            | EngineError::HttpClientError { .. }
            | EngineError::HyperLegacyError { .. }
            | EngineError::SocketNotFoundError(_)
            | EngineError::RequestTimeoutError
    )
}

fn map_container_create_error(e: EngineError) -> ContainerError {
    match &e {
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 400 => ContainerError::InvalidConfig(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: EngineError) -> ContainerError {
    match &e {
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::AlreadyRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_stop_error(e: EngineError) -> ContainerError {
    match &e {
        // the grace period ran out on the engine side; the remove that follows uses force
        EngineError::RequestTimeoutError => ContainerError::Runtime("stop timed out".to_string()),
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::NotRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: EngineError) -> ContainerError {
    match &e {
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_image_pull_error(e: EngineError, image_name: &str) -> ImageError {
    match &e {
        EngineError::DockerStreamError { error } => {
            ImageError::PullFailed(format!("{}: {}", image_name, error))
        }
        // a slow registry, not a dead engine
        EngineError::RequestTimeoutError => {
            ImageError::PullFailed(format!("{}: pull timed out", image_name))
        }
        _ if is_unreachable(&e) => ImageError::Unavailable(e.to_string()),
        EngineError::DockerResponseServerError { status_code, .. }
            if *status_code == 401 || *status_code == 403 =>
        {
            ImageError::AuthenticationFailed(format!("{}: {}", image_name, e))
        }
        _ => ImageError::PullFailed(format!("{}: {}", image_name, e)),
    }
}

fn map_registry_error(e: EngineError, image_name: &str) -> ImageError {
    match &e {
        _ if is_unreachable(&e) => ImageError::Unavailable(e.to_string()),
        EngineError::DockerResponseServerError { status_code, .. }
            if *status_code == 401 || *status_code == 403 =>
        {
            ImageError::AuthenticationFailed(format!("{}: {}", image_name, e))
        }
        EngineError::DockerResponseServerError { status_code, .. } if *status_code == 404 => {
            ImageError::NotFound(image_name.to_string())
        }
        _ => ImageError::Registry(format!("{}: {}", image_name, e)),
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// Supports both Docker and Podman via Docker-compatible API. Every call is
/// bounded. A timed-out pull or stop counts against that operation; any other
/// call that gets no answer means the engine is unavailable.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
    operation_timeout: Duration,
    pull_timeout: Duration,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType, timeouts: &Timeouts) -> Self {
        Self {
            client,
            runtime_type,
            operation_timeout: timeouts.operation,
            pull_timeout: timeouts.pull,
        }
    }

    /// Connect to a container runtime using detected runtime info.
    ///
    /// Use with `detect_local()` to find the socket. Connecting is lazy; call
    /// [`RuntimeInfo::ping`] to find out whether the engine is actually there.
    pub fn connect(info: &DetectedRuntime, timeouts: &Timeouts) -> Result<Self, RuntimeInfoError> {
        // The client-side limit must outlast the longest bounded call (pulls).
        let client = Docker::connect_with_unix(
            &info.socket_path,
            timeouts.pull.as_secs().max(1),
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(Self::new(client, info.runtime_type, timeouts))
    }

    /// Get the runtime type (Docker or Podman).
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    async fn bounded<T, F>(&self, limit: Duration, call: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::RequestTimeoutError),
        }
    }

    /// Repo digests recorded for a local image, `None` if the image is absent.
    async fn repo_digests(&self, image: &str) -> Result<Option<Vec<String>>, ImageError> {
        match self
            .bounded(self.operation_timeout, self.client.inspect_image(image))
            .await
        {
            Ok(details) => Ok(Some(details.repo_digests.unwrap_or_default())),
            Err(EngineError::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(None),
            Err(e) if is_unreachable(&e) => Err(ImageError::Unavailable(e.to_string())),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {}: {}",
                image, e
            ))),
        }
    }

    /// Config baked into a local image. `None` when the image is gone, in
    /// which case nothing can be told apart from an override.
    async fn image_defaults(&self, image_id: &str) -> Result<Option<ImageConfig>, ContainerError> {
        match self
            .bounded(self.operation_timeout, self.client.inspect_image(image_id))
            .await
        {
            Ok(details) => Ok(details.config),
            Err(EngineError::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                tracing::debug!(image = %image_id, "image gone, capturing inherited values too");
                Ok(None)
            }
            Err(e) if is_unreachable(&e) => Err(ContainerError::Unavailable(e.to_string())),
            Err(e) => Err(ContainerError::Runtime(format!(
                "failed to inspect image {}: {}",
                image_id, e
            ))),
        }
    }

    async fn connect_secondary_networks(
        &self,
        id: &ContainerId,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<(), ContainerError> {
        for network in snapshot.secondary_networks() {
            tracing::debug!(container = %id.short(), network, "connecting network");
            let request = NetworkConnectRequest {
                container: id.to_string(),
                endpoint_config: Some(EndpointSettings::default()),
            };
            self.bounded(
                self.operation_timeout,
                self.client.connect_network(network, request),
            )
            .await
            .map_err(|e| match &e {
                _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
                _ => ContainerError::InvalidConfig(format!("network {}: {}", network, e)),
            })?;
        }
        Ok(())
    }
}

// Implement Sealed trait to allow runtime trait implementations
impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self
            .bounded(self.operation_timeout, self.client.info())
            .await
            .map_err(|e| {
                if is_unreachable(&e) {
                    RuntimeInfoError::ConnectionFailed(e.to_string())
                } else {
                    RuntimeInfoError::Runtime(e.to_string())
                }
            })?;

        let name = match self.runtime_type {
            RuntimeType::Docker => "Docker".to_string(),
            RuntimeType::Podman => "Podman".to_string(),
        };

        Ok(RuntimeMetadata {
            name,
            version: info.server_version.unwrap_or_default(),
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.bounded(self.operation_timeout, self.client.ping())
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn local_digest(
        &self,
        image: &ImageRef,
        image_id: Option<&ImageId>,
    ) -> Result<Option<ImageDigest>, ImageError> {
        let lookup = match image_id {
            Some(id) => id.to_string(),
            None => image.to_string(),
        };
        tracing::debug!(image = %image, lookup = %lookup, "reading local digest");

        let Some(entries) = self.repo_digests(&lookup).await? else {
            return Ok(None);
        };

        Ok(entries.iter().find_map(|entry| {
            let (repository, digest) = ImageDigest::parse_repo_digest(entry).ok()?;
            image.same_repository(repository).then_some(digest)
        }))
    }

    async fn remote_digest(&self, image: &ImageRef) -> Result<Option<ImageDigest>, ImageError> {
        if let Some(pinned) = image.digest() {
            return ImageDigest::parse(pinned)
                .map(Some)
                .map_err(|e| ImageError::Registry(format!("{}: {}", image, e)));
        }

        let image_name = image.to_string();
        tracing::debug!(image = %image_name, "querying registry digest");

        let distribution = self
            .bounded(
                self.operation_timeout,
                self.client.inspect_registry_image(&image_name, None),
            )
            .await
            .map_err(|e| map_registry_error(e, &image_name))?;

        Ok(distribution
            .descriptor
            .digest
            .as_deref()
            .and_then(|d| ImageDigest::parse(d).ok()))
    }

    async fn pull_image(&self, image: &ImageRef) -> Result<Option<ImageDigest>, ImageError> {
        let image_name = image.to_string();
        tracing::debug!(image = %image_name, "pulling image");

        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        // Pull returns a stream of progress updates - consume it
        let pull = async {
            let mut stream = self.client.create_image(Some(opts), None, None);
            while let Some(result) = stream.next().await {
                result?;
            }
            Ok::<(), EngineError>(())
        };
        self.bounded(self.pull_timeout, pull)
            .await
            .map_err(|e| map_image_pull_error(e, &image_name))?;

        self.local_digest(image, None).await
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn resolve_container(
        &self,
        name: &ContainerName,
    ) -> Result<ContainerRef, ContainerError> {
        tracing::debug!(container = %name, "resolving container");
        let details = self
            .bounded(
                self.operation_timeout,
                self.client
                    .inspect_container(name.as_str(), None::<InspectContainerOptions>),
            )
            .await
            .map_err(|e| match map_container_not_found_error(e) {
                ContainerError::NotFound(_) => ContainerError::NotFound(name.to_string()),
                other => other,
            })?;

        container_ref_from_inspect(&details)
    }

    async fn inspect_config(
        &self,
        container: &ContainerRef,
    ) -> Result<ConfigurationSnapshot, ContainerError> {
        tracing::debug!(container = %container.name, "capturing configuration");
        let details = self
            .bounded(
                self.operation_timeout,
                self.client
                    .inspect_container(container.id.as_str(), None::<InspectContainerOptions>),
            )
            .await
            .map_err(map_container_not_found_error)?;

        let image_defaults = match details.image.as_deref() {
            Some(image_id) => self.image_defaults(image_id).await?,
            None => None,
        };

        snapshot_from_inspect(&details, image_defaults.as_ref())
    }

    async fn list_running(&self) -> Result<Vec<ContainerSummary>, ContainerError> {
        let opts = ListContainersOptions {
            all: false,
            ..Default::default()
        };

        // Podman reports "stopping" as a container state during shutdown, but bollard
        // doesn't recognize it and fails deserialization. Retry after a short delay
        // since "stopping" is a transient state.
        let mut last_error = None;
        for attempt in 0..3 {
            match self
                .bounded(
                    self.operation_timeout,
                    self.client.list_containers(Some(opts.clone())),
                )
                .await
            {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .filter_map(|c| {
                            let raw = c.names.as_ref()?.first()?.clone();
                            let name = match ContainerName::new(&raw) {
                                Ok(name) => name,
                                Err(e) => {
                                    tracing::debug!(name = %raw, error = %e, "skipping container");
                                    return None;
                                }
                            };
                            Some(ContainerSummary {
                                id: ContainerId::new(c.id.unwrap_or_default()),
                                name,
                                image: c.image.unwrap_or_default(),
                            })
                        })
                        .collect());
                }
                Err(e) if is_unreachable(&e) => {
                    return Err(ContainerError::Unavailable(e.to_string()));
                }
                Err(e) => {
                    let err_str = e.to_string();
                    // Podman's "stopping"/"stopped" states cause deserialization failure
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        tracing::debug!(container = %id.short(), grace = ?timeout, "stopping container");
        let opts = StopContainerOptions {
            t: Some(i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX)),
            signal: None,
        };

        self.bounded(
            self.operation_timeout + timeout,
            self.client.stop_container(id.as_str(), Some(opts)),
        )
        .await
        .map_err(map_container_stop_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        tracing::debug!(container = %id.short(), force, "removing container");
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.bounded(
            self.operation_timeout,
            self.client.remove_container(id.as_str(), Some(opts)),
        )
        .await
        .map_err(map_container_not_found_error)
    }

    async fn create_container(
        &self,
        name: &ContainerName,
        image: &ImageRef,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<ContainerRef, ContainerError> {
        tracing::debug!(container = %name, image = %image, "creating container");
        let opts = CreateContainerOptions {
            name: Some(name.to_string()),
            ..Default::default()
        };

        let response = self
            .bounded(
                self.operation_timeout,
                self.client
                    .create_container(Some(opts), create_body(image, snapshot)),
            )
            .await
            .map_err(map_container_create_error)?;
        let id = ContainerId::new(response.id);

        if let Err(e) = self.connect_secondary_networks(&id, snapshot).await {
            // Leave nothing half-configured behind under the target name.
            if let Err(cleanup) = self.remove_container(&id, true).await {
                tracing::warn!(container = %name, error = %cleanup, "failed to remove partially created container");
            }
            return Err(e);
        }

        Ok(ContainerRef {
            id,
            name: name.clone(),
            image: image.clone(),
            image_id: None,
        })
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        tracing::debug!(container = %id.short(), "starting container");
        self.bounded(
            self.operation_timeout,
            self.client.start_container(
                id.as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            ),
        )
        .await
        .map_err(map_container_start_error)
    }
}
