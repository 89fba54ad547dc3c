// ABOUTME: In-memory engine double for unit tests.
// ABOUTME: Records every call and can be told to fail specific operations.

use super::traits::sealed::Sealed;
use super::traits::{
    ContainerError, ContainerOps, ContainerRef, ContainerSummary, ImageError, ImageOps,
    RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::snapshot::ConfigurationSnapshot;
use crate::types::{ContainerId, ContainerName, ImageDigest, ImageId, ImageRef};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

/// A digest made of one repeated hex character.
pub(crate) fn digest(seed: char) -> ImageDigest {
    ImageDigest::parse(&format!("sha256:{}", seed.to_string().repeat(64)))
        .expect("seed must be a hex character")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Resolve(String),
    Inspect(String),
    List,
    LocalDigest(String),
    RemoteDigest(String),
    Pull(String),
    Stop(String),
    Remove(String),
    Create(String),
    Start(String),
}

impl Call {
    /// Whether the call changes engine state.
    pub(crate) fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::Pull(_) | Call::Stop(_) | Call::Remove(_) | Call::Create(_) | Call::Start(_)
        )
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeContainer {
    pub id: ContainerId,
    pub image: ImageRef,
    pub image_id: ImageId,
    pub snapshot: ConfigurationSnapshot,
    pub running: bool,
}

#[derive(Default)]
struct State {
    containers: BTreeMap<String, FakeContainer>,
    /// image ref -> local image id
    tags: HashMap<String, String>,
    /// image id -> registry digest
    image_digests: HashMap<String, ImageDigest>,
    remote: HashMap<String, ImageDigest>,
    failing_pulls: HashSet<String>,
    failing_lookups: HashSet<String>,
    fail_create: bool,
    fail_start: bool,
    fail_stop: bool,
    fail_remote: bool,
    unavailable: bool,
    unavailable_on_resolve: Option<String>,
    calls: Vec<Call>,
    next_id: u32,
}

impl State {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{:04}", prefix, self.next_id)
    }

    fn tag(&mut self, image: &ImageRef, digest: ImageDigest) -> String {
        let image_id = self.fresh_id("sha256:img");
        self.tags.insert(image.to_string(), image_id.clone());
        self.image_digests.insert(image_id.clone(), digest);
        image_id
    }

    fn find_by_id(&mut self, id: &ContainerId) -> Option<&mut FakeContainer> {
        self.containers.values_mut().find(|c| c.id == *id)
    }
}

#[derive(Default)]
pub(crate) struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a running container whose image was pulled at `local`.
    pub(crate) fn with_container(self, name: &str, image: &str, local: ImageDigest) -> Self {
        let image = ImageRef::parse(image).expect("valid image");
        let mut snapshot = ConfigurationSnapshot::new(image.clone());
        snapshot.environment = vec![format!("APP_NAME={}", name)];
        snapshot.networks = ["bridge".to_string()].into();
        self.with_snapshot(name, snapshot, local)
    }

    pub(crate) fn with_snapshot(
        self,
        name: &str,
        snapshot: ConfigurationSnapshot,
        local: ImageDigest,
    ) -> Self {
        {
            let mut state = self.state.lock();
            let image = snapshot.image.clone();
            let image_id = state.tag(&image, local);
            let id = state.fresh_id("c0ffee");
            state.containers.insert(
                name.to_string(),
                FakeContainer {
                    id: ContainerId::new(id),
                    image,
                    image_id: ImageId::new(image_id),
                    snapshot,
                    running: true,
                },
            );
        }
        self
    }

    /// What the registry serves for `image`.
    pub(crate) fn with_remote(self, image: &str, remote: ImageDigest) -> Self {
        self.state.lock().remote.insert(image.to_string(), remote);
        self
    }

    pub(crate) fn failing_pull(self, image: &str) -> Self {
        self.state.lock().failing_pulls.insert(image.to_string());
        self
    }

    /// Resolving `name` fails with an engine error (not an outage).
    pub(crate) fn failing_lookup(self, name: &str) -> Self {
        self.state.lock().failing_lookups.insert(name.to_string());
        self
    }

    pub(crate) fn failing_create(self) -> Self {
        self.state.lock().fail_create = true;
        self
    }

    pub(crate) fn failing_start(self) -> Self {
        self.state.lock().fail_start = true;
        self
    }

    pub(crate) fn failing_stop(self) -> Self {
        self.state.lock().fail_stop = true;
        self
    }

    pub(crate) fn failing_registry(self) -> Self {
        self.state.lock().fail_remote = true;
        self
    }

    pub(crate) fn unavailable(self) -> Self {
        self.state.lock().unavailable = true;
        self
    }

    /// The engine goes away as soon as `name` is resolved.
    pub(crate) fn unavailable_after_resolving(self, name: &str) -> Self {
        self.state.lock().unavailable_on_resolve = Some(name.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub(crate) fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state.lock().containers.get(name).cloned()
    }

    fn record(&self, call: Call) -> Result<(), String> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.unavailable {
            return Err("engine socket closed".to_string());
        }
        Ok(())
    }
}

impl Sealed for FakeEngine {}

#[async_trait]
impl RuntimeInfo for FakeEngine {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        Ok(RuntimeMetadata {
            name: "Fake".to_string(),
            version: "0.0".to_string(),
            api_version: "1.0".to_string(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        if self.state.lock().unavailable {
            return Err(RuntimeInfoError::ConnectionFailed("engine socket closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ImageOps for FakeEngine {
    async fn local_digest(
        &self,
        image: &ImageRef,
        image_id: Option<&ImageId>,
    ) -> Result<Option<ImageDigest>, ImageError> {
        self.record(Call::LocalDigest(image.to_string()))
            .map_err(ImageError::Unavailable)?;
        let state = self.state.lock();
        let id = match image_id {
            Some(id) => Some(id.to_string()),
            None => state.tags.get(&image.to_string()).cloned(),
        };
        Ok(id.and_then(|id| state.image_digests.get(&id).cloned()))
    }

    async fn remote_digest(&self, image: &ImageRef) -> Result<Option<ImageDigest>, ImageError> {
        self.record(Call::RemoteDigest(image.to_string()))
            .map_err(ImageError::Unavailable)?;
        let state = self.state.lock();
        if state.fail_remote {
            return Err(ImageError::Registry(format!("{}: registry timeout", image)));
        }
        Ok(state.remote.get(&image.to_string()).cloned())
    }

    async fn pull_image(&self, image: &ImageRef) -> Result<Option<ImageDigest>, ImageError> {
        self.record(Call::Pull(image.to_string()))
            .map_err(ImageError::Unavailable)?;
        let mut state = self.state.lock();
        let key = image.to_string();
        if state.failing_pulls.contains(&key) {
            return Err(ImageError::PullFailed(format!("{}: manifest unknown", key)));
        }
        let Some(remote) = state.remote.get(&key).cloned() else {
            return Err(ImageError::NotFound(key));
        };
        state.tag(image, remote.clone());
        Ok(Some(remote))
    }
}

#[async_trait]
impl ContainerOps for FakeEngine {
    async fn resolve_container(
        &self,
        name: &ContainerName,
    ) -> Result<ContainerRef, ContainerError> {
        self.record(Call::Resolve(name.to_string()))
            .map_err(ContainerError::Unavailable)?;
        let mut state = self.state.lock();
        if state.unavailable_on_resolve.as_deref() == Some(name.as_str()) {
            state.unavailable = true;
        }
        if state.failing_lookups.contains(name.as_str()) {
            return Err(ContainerError::Runtime(format!("{}: inspect returned 500", name)));
        }
        let container = state
            .containers
            .get(name.as_str())
            .ok_or_else(|| ContainerError::NotFound(name.to_string()))?;
        Ok(ContainerRef {
            id: container.id.clone(),
            name: name.clone(),
            image: container.image.clone(),
            image_id: Some(container.image_id.clone()),
        })
    }

    async fn inspect_config(
        &self,
        container: &ContainerRef,
    ) -> Result<ConfigurationSnapshot, ContainerError> {
        self.record(Call::Inspect(container.name.to_string()))
            .map_err(ContainerError::Unavailable)?;
        let mut state = self.state.lock();
        state
            .find_by_id(&container.id)
            .map(|c| c.snapshot.clone())
            .ok_or_else(|| ContainerError::NotFound(container.name.to_string()))
    }

    async fn list_running(&self) -> Result<Vec<ContainerSummary>, ContainerError> {
        self.record(Call::List).map_err(ContainerError::Unavailable)?;
        let state = self.state.lock();
        Ok(state
            .containers
            .iter()
            .filter(|(_, c)| c.running)
            .map(|(name, c)| ContainerSummary {
                id: c.id.clone(),
                name: ContainerName::new(name).expect("fake names are valid"),
                image: c.image.to_string(),
            })
            .collect())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        self.record(Call::Stop(id.to_string()))
            .map_err(ContainerError::Unavailable)?;
        let mut state = self.state.lock();
        if state.fail_stop {
            return Err(ContainerError::Runtime("stop timed out".to_string()));
        }
        let container = state
            .find_by_id(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        container.running = false;
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, _force: bool) -> Result<(), ContainerError> {
        self.record(Call::Remove(id.to_string()))
            .map_err(ContainerError::Unavailable)?;
        let mut state = self.state.lock();
        let before = state.containers.len();
        state.containers.retain(|_, c| c.id != *id);
        if state.containers.len() == before {
            return Err(ContainerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn create_container(
        &self,
        name: &ContainerName,
        image: &ImageRef,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<ContainerRef, ContainerError> {
        self.record(Call::Create(name.to_string()))
            .map_err(ContainerError::Unavailable)?;
        let mut state = self.state.lock();
        if state.fail_create {
            return Err(ContainerError::InvalidConfig("port already allocated".to_string()));
        }
        if state.containers.contains_key(name.as_str()) {
            return Err(ContainerError::AlreadyExists(name.to_string()));
        }
        let image_id = state
            .tags
            .get(&image.to_string())
            .cloned()
            .ok_or_else(|| ContainerError::ImageNotFound(image.to_string()))?;
        let id = ContainerId::new(state.fresh_id("beef"));
        let mut snapshot = snapshot.clone();
        snapshot.image = image.clone();
        state.containers.insert(
            name.to_string(),
            FakeContainer {
                id: id.clone(),
                image: image.clone(),
                image_id: ImageId::new(image_id.clone()),
                snapshot,
                running: false,
            },
        );
        Ok(ContainerRef {
            id,
            name: name.clone(),
            image: image.clone(),
            image_id: Some(ImageId::new(image_id)),
        })
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.record(Call::Start(id.to_string()))
            .map_err(ContainerError::Unavailable)?;
        let mut state = self.state.lock();
        let fail = state.fail_start;
        let container = state
            .find_by_id(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        // A restart of the original always succeeds; only fresh containers fail.
        if fail && id.as_str().starts_with("beef") {
            return Err(ContainerError::Runtime("exec format error".to_string()));
        }
        container.running = true;
        Ok(())
    }
}
