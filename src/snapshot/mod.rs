// ABOUTME: Reproducible runtime configuration of a container.
// ABOUTME: Captured before destructive operations and used to recreate the container.

mod restart_policy;
mod run_command;

pub use restart_policy::RestartPolicy;

use crate::types::ImageRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Everything needed to recreate a container with the same externally
/// observable shape, minus the image content and the runtime id.
///
/// Fields the engine did not report are left at their zero value. Once
/// captured a snapshot is only ever read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationSnapshot {
    /// Image to run. Unchanged across an update; only its content moves.
    pub image: ImageRef,
    #[serde(default)]
    pub port_bindings: Vec<PortBinding>,
    #[serde(default)]
    pub mounts: Vec<MountSpec>,
    /// `KEY=VALUE` entries in engine order, duplicates kept.
    #[serde(default)]
    pub environment: Vec<String>,
    /// Network mode as reported by the engine (`bridge`, `host`, a network name...).
    #[serde(default)]
    pub network_mode: Option<String>,
    #[serde(default)]
    pub networks: BTreeSet<String>,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub entrypoint: Option<Vec<String>>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

impl ConfigurationSnapshot {
    /// An empty snapshot: no ports, no mounts, no environment.
    pub fn new(image: ImageRef) -> Self {
        Self {
            image,
            port_bindings: Vec::new(),
            mounts: Vec::new(),
            environment: Vec::new(),
            network_mode: None,
            networks: BTreeSet::new(),
            restart_policy: RestartPolicy::No,
            labels: BTreeMap::new(),
            command: None,
            entrypoint: None,
            working_dir: None,
            user: None,
        }
    }

    /// Whether the network mode allows attaching user networks.
    ///
    /// `host`, `none` and `container:<id>` share or disable the network stack.
    pub fn attaches_networks(&self) -> bool {
        match self.network_mode.as_deref() {
            Some("host") | Some("none") => false,
            Some(mode) => !mode.starts_with("container:"),
            None => true,
        }
    }

    /// Network joined at create time: the network mode when it names one of
    /// the attached networks, otherwise the first network in sorted order.
    pub fn primary_network(&self) -> Option<&str> {
        if !self.attaches_networks() {
            return None;
        }
        if let Some(mode) = self.network_mode.as_deref()
            && self.networks.contains(mode)
        {
            return Some(mode);
        }
        self.networks.iter().next().map(String::as_str)
    }

    /// Networks connected after create, in sorted order.
    pub fn secondary_networks(&self) -> impl Iterator<Item = &str> {
        let primary = self.primary_network();
        self.networks
            .iter()
            .map(String::as_str)
            .filter(move |n| primary.is_some() && Some(*n) != primary)
    }
}

/// A published port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortBinding {
    pub container_port: u16,
    #[serde(default)]
    pub protocol: Protocol,
    /// Host interface; `None` binds all interfaces.
    #[serde(default)]
    pub host_ip: Option<String>,
    /// Host port; `None` lets the engine pick one.
    #[serde(default)]
    pub host_port: Option<u16>,
}

impl PortBinding {
    /// The engine's port key, e.g. `80/tcp`.
    pub fn port_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

/// Transport protocol of a port binding.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            "sctp" => Some(Protocol::Sctp),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
            Protocol::Sctp => write!(f, "sctp"),
        }
    }
}

/// A mount attached to the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    pub kind: MountKind,
    /// Host path for binds, volume name for volumes, empty for tmpfs.
    #[serde(default)]
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub read_only: bool,
    /// `--tmpfs` option string such as `size=64m,mode=1777`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpfs_options: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountKind {
    Bind,
    Volume,
    Tmpfs,
}

impl fmt::Display for MountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountKind::Bind => write!(f, "bind"),
            MountKind::Volume => write!(f, "volume"),
            MountKind::Tmpfs => write!(f, "tmpfs"),
        }
    }
}
