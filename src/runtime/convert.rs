// ABOUTME: Mapping between engine inspection data and configuration snapshots.
// ABOUTME: Builds structured create requests; no command strings are ever assembled.

use crate::runtime::traits::{ContainerError, ContainerRef};
use crate::snapshot::{
    ConfigurationSnapshot, MountKind, MountSpec, PortBinding, Protocol, RestartPolicy,
};
use crate::types::{ContainerId, ContainerName, ImageId, ImageRef};
use bollard::models::{
    ContainerCreateBody, ContainerInspectResponse, EndpointSettings, HostConfig, ImageConfig,
    Mount, MountPointTypeEnum, MountTypeEnum, NetworkingConfig, PortBinding as EnginePortBinding,
    RestartPolicy as EngineRestartPolicy, RestartPolicyNameEnum,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

// =============================================================================
// Inspection -> ContainerRef
// =============================================================================

pub(crate) fn container_ref_from_inspect(
    details: &ContainerInspectResponse,
) -> Result<ContainerRef, ContainerError> {
    let id = details
        .id
        .clone()
        .ok_or_else(|| ContainerError::Runtime("inspection returned no container id".into()))?;

    let raw_name = details.name.clone().unwrap_or_default();
    let name = ContainerName::new(&raw_name)
        .map_err(|e| ContainerError::InvalidConfig(format!("{}: {}", raw_name, e)))?;

    Ok(ContainerRef {
        id: ContainerId::new(id),
        image: image_from_inspect(details, name.as_str())?,
        name,
        image_id: details.image.clone().map(ImageId::new),
    })
}

fn image_from_inspect(
    details: &ContainerInspectResponse,
    name: &str,
) -> Result<ImageRef, ContainerError> {
    let raw = details
        .config
        .as_ref()
        .and_then(|c| c.image.as_deref())
        .ok_or_else(|| ContainerError::InvalidConfig(format!("{} reports no image", name)))?;

    ImageRef::parse(raw).map_err(|e| ContainerError::InvalidConfig(format!("{}: {}", name, e)))
}

// =============================================================================
// Inspection -> ConfigurationSnapshot
// =============================================================================

/// Map engine inspection data to a snapshot.
///
/// Absent sections map to their zero value; only a missing or unusable image
/// reference is an error, since nothing could be recreated without one.
///
/// `image_defaults` is the config baked into the image the container runs.
/// Values the container merely inherited from it are left out so that the
/// updated image's own defaults apply on recreation.
pub(crate) fn snapshot_from_inspect(
    details: &ContainerInspectResponse,
    image_defaults: Option<&ImageConfig>,
) -> Result<ConfigurationSnapshot, ContainerError> {
    let name = details.name.as_deref().unwrap_or_default().trim_start_matches('/');
    let mut snapshot = ConfigurationSnapshot::new(image_from_inspect(details, name)?);

    if let Some(config) = &details.config {
        snapshot.environment = config.env.clone().unwrap_or_default();
        snapshot.labels = config
            .labels
            .as_ref()
            .map(|l| l.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        snapshot.command = config.cmd.clone().filter(|c| !c.is_empty());
        snapshot.entrypoint = config.entrypoint.clone().filter(|e| !e.is_empty());
        snapshot.working_dir = config.working_dir.clone().filter(|w| !w.is_empty());
        snapshot.user = config.user.clone().filter(|u| !u.is_empty());
    }

    if let Some(defaults) = image_defaults {
        strip_image_defaults(&mut snapshot, defaults);
    }

    if let Some(host_config) = &details.host_config {
        snapshot.port_bindings = port_bindings_from_host_config(host_config);
        snapshot.restart_policy = restart_policy_from_engine(host_config.restart_policy.as_ref());
        snapshot.network_mode = host_config.network_mode.clone().filter(|m| !m.is_empty());
    }

    snapshot.mounts = mounts_from_inspect(details);

    snapshot.networks = details
        .network_settings
        .as_ref()
        .and_then(|s| s.networks.as_ref())
        .map(|n| n.keys().cloned().collect::<BTreeSet<_>>())
        .unwrap_or_default();

    Ok(snapshot)
}

fn strip_image_defaults(snapshot: &mut ConfigurationSnapshot, image: &ImageConfig) {
    let inherited_env: HashSet<&str> = image.env.iter().flatten().map(String::as_str).collect();
    snapshot
        .environment
        .retain(|entry| !inherited_env.contains(entry.as_str()));

    if let Some(image_labels) = &image.labels {
        snapshot
            .labels
            .retain(|key, value| image_labels.get(key) != Some(&*value));
    }

    let image_entrypoint = image.entrypoint.clone().filter(|e| !e.is_empty());
    let entrypoint_inherited = snapshot.entrypoint == image_entrypoint;
    if entrypoint_inherited {
        snapshot.entrypoint = None;
        // an entrypoint override discards the image CMD, so CMD only counts
        // as inherited when the entrypoint was too
        if snapshot.command == image.cmd.clone().filter(|c| !c.is_empty()) {
            snapshot.command = None;
        }
    }

    if snapshot.working_dir.is_some() && snapshot.working_dir == image.working_dir {
        snapshot.working_dir = None;
    }
    if snapshot.user.is_some() && snapshot.user == image.user {
        snapshot.user = None;
    }
}

fn port_bindings_from_host_config(host_config: &HostConfig) -> Vec<PortBinding> {
    let mut bindings = Vec::new();
    let Some(map) = &host_config.port_bindings else {
        return bindings;
    };

    for (key, entries) in map {
        let Some((port, protocol)) = parse_port_key(key) else {
            tracing::debug!(port = %key, "skipping unparseable port key");
            continue;
        };
        for entry in entries.iter().flatten() {
            bindings.push(PortBinding {
                container_port: port,
                protocol,
                host_ip: entry.host_ip.clone().filter(|ip| !ip.is_empty()),
                host_port: entry
                    .host_port
                    .as_deref()
                    .and_then(|p| p.parse::<u16>().ok())
                    .filter(|p| *p != 0),
            });
        }
    }

    bindings.sort();
    bindings
}

fn parse_port_key(key: &str) -> Option<(u16, Protocol)> {
    let (port, protocol) = match key.split_once('/') {
        Some((port, proto)) => (port, Protocol::parse(proto)?),
        None => (key, Protocol::Tcp),
    };
    Some((port.parse().ok()?, protocol))
}

fn restart_policy_from_engine(policy: Option<&EngineRestartPolicy>) -> RestartPolicy {
    let Some(policy) = policy else {
        return RestartPolicy::No;
    };
    match policy.name {
        Some(RestartPolicyNameEnum::ALWAYS) => RestartPolicy::Always,
        Some(RestartPolicyNameEnum::UNLESS_STOPPED) => RestartPolicy::UnlessStopped,
        Some(RestartPolicyNameEnum::ON_FAILURE) => RestartPolicy::OnFailure {
            max_retries: policy
                .maximum_retry_count
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok()),
        },
        _ => RestartPolicy::No,
    }
}

fn mounts_from_inspect(details: &ContainerInspectResponse) -> Vec<MountSpec> {
    let mut mounts: Vec<MountSpec> = Vec::new();

    for point in details.mounts.iter().flatten() {
        let target = point.destination.clone().unwrap_or_default();
        if target.is_empty() {
            continue;
        }
        let read_only = !point.rw.unwrap_or(true);
        let spec = match point.typ {
            Some(MountPointTypeEnum::BIND) => MountSpec {
                kind: MountKind::Bind,
                source: point.source.clone().unwrap_or_default(),
                target,
                read_only,
                tmpfs_options: None,
            },
            Some(MountPointTypeEnum::VOLUME) => MountSpec {
                kind: MountKind::Volume,
                source: point.name.clone().unwrap_or_default(),
                target,
                read_only,
                tmpfs_options: None,
            },
            Some(MountPointTypeEnum::TMPFS) => MountSpec {
                kind: MountKind::Tmpfs,
                source: String::new(),
                target,
                read_only,
                tmpfs_options: None,
            },
            other => {
                tracing::debug!(target = %target, kind = ?other, "skipping unsupported mount");
                continue;
            }
        };
        mounts.push(spec);
    }

    // `--tmpfs` mounts only show up in HostConfig
    let tmpfs: BTreeMap<&String, &String> = details
        .host_config
        .as_ref()
        .and_then(|h| h.tmpfs.as_ref())
        .map(|t| t.iter().collect())
        .unwrap_or_default();
    for (target, options) in tmpfs {
        let options = Some(options.clone()).filter(|o| !o.is_empty());
        match mounts.iter_mut().find(|m| &m.target == target) {
            Some(existing) if existing.kind == MountKind::Tmpfs => {
                existing.tmpfs_options = options;
            }
            Some(_) => {}
            None => mounts.push(MountSpec {
                kind: MountKind::Tmpfs,
                source: String::new(),
                target: target.clone(),
                read_only: false,
                tmpfs_options: options,
            }),
        }
    }

    mounts
}

// =============================================================================
// ConfigurationSnapshot -> create request
// =============================================================================

/// Build the engine create request for `snapshot` running `image`.
///
/// Only the primary network is attached here; the engine joins further
/// networks through separate connect calls.
pub(crate) fn create_body(image: &ImageRef, snapshot: &ConfigurationSnapshot) -> ContainerCreateBody {
    let mut port_bindings: HashMap<String, Option<Vec<EnginePortBinding>>> = HashMap::new();
    let mut exposed_ports: Vec<String> = Vec::new();
    for port in &snapshot.port_bindings {
        let key = port.port_key();
        if !exposed_ports.contains(&key) {
            exposed_ports.push(key.clone());
        }
        port_bindings
            .entry(key)
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(EnginePortBinding {
                host_ip: Some(port.host_ip.clone().unwrap_or_default()),
                host_port: Some(port.host_port.map(|p| p.to_string()).unwrap_or_default()),
            });
    }

    // tmpfs options only have a string form in HostConfig.Tmpfs
    let tmpfs: HashMap<String, String> = snapshot
        .mounts
        .iter()
        .filter_map(|m| match (&m.kind, &m.tmpfs_options) {
            (MountKind::Tmpfs, Some(options)) => Some((m.target.clone(), options.clone())),
            _ => None,
        })
        .collect();

    let mounts: Vec<Mount> = snapshot
        .mounts
        .iter()
        .filter(|m| !tmpfs.contains_key(&m.target))
        .map(|m| Mount {
            typ: Some(match m.kind {
                MountKind::Bind => MountTypeEnum::BIND,
                MountKind::Volume => MountTypeEnum::VOLUME,
                MountKind::Tmpfs => MountTypeEnum::TMPFS,
            }),
            source: match m.kind {
                MountKind::Tmpfs => None,
                _ => Some(m.source.clone()),
            },
            target: Some(m.target.clone()),
            read_only: Some(m.read_only),
            ..Default::default()
        })
        .collect();

    let primary = snapshot.primary_network();
    let network_mode = match (snapshot.network_mode.as_deref(), primary) {
        (Some(mode), _) if !snapshot.attaches_networks() => Some(mode.to_string()),
        (Some(mode), Some(primary)) if mode != primary => Some(primary.to_string()),
        (mode, primary) => mode.or(primary).map(str::to_string),
    };

    let host_config = HostConfig {
        port_bindings: if port_bindings.is_empty() {
            None
        } else {
            Some(port_bindings)
        },
        mounts: if mounts.is_empty() { None } else { Some(mounts) },
        tmpfs: if tmpfs.is_empty() { None } else { Some(tmpfs) },
        restart_policy: Some(restart_policy_to_engine(&snapshot.restart_policy)),
        network_mode,
        ..Default::default()
    };

    let networking_config = primary.map(|network| {
        let mut endpoints: HashMap<String, EndpointSettings> = HashMap::new();
        endpoints.insert(network.to_string(), EndpointSettings::default());
        NetworkingConfig {
            endpoints_config: Some(endpoints),
        }
    });

    ContainerCreateBody {
        image: Some(image.as_written()),
        env: if snapshot.environment.is_empty() {
            None
        } else {
            Some(snapshot.environment.clone())
        },
        labels: if snapshot.labels.is_empty() {
            None
        } else {
            Some(snapshot.labels.clone().into_iter().collect())
        },
        cmd: snapshot.command.clone(),
        entrypoint: snapshot.entrypoint.clone(),
        working_dir: snapshot.working_dir.clone(),
        user: snapshot.user.clone(),
        exposed_ports: if exposed_ports.is_empty() {
            None
        } else {
            Some(exposed_ports)
        },
        host_config: Some(host_config),
        networking_config,
        ..Default::default()
    }
}

fn restart_policy_to_engine(policy: &RestartPolicy) -> EngineRestartPolicy {
    EngineRestartPolicy {
        name: Some(match policy {
            RestartPolicy::No => RestartPolicyNameEnum::NO,
            RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
            RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
            RestartPolicy::OnFailure { .. } => RestartPolicyNameEnum::ON_FAILURE,
        }),
        maximum_retry_count: match policy {
            RestartPolicy::OnFailure { max_retries } => max_retries.map(i64::from),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{ContainerConfig, MountPoint, NetworkSettings};

    /// What the engine reports back for a container created from `body`,
    /// after `extra_networks` were connected.
    fn engine_view(
        name: &str,
        body: &ContainerCreateBody,
        extra_networks: &[&str],
    ) -> ContainerInspectResponse {
        let host_config = body.host_config.clone().unwrap_or_default();

        let mounts = host_config
            .mounts
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|m| {
                let (typ, name, source) = match m.typ {
                    Some(MountTypeEnum::VOLUME) => {
                        (MountPointTypeEnum::VOLUME, m.source.clone(), None)
                    }
                    Some(MountTypeEnum::TMPFS) => (MountPointTypeEnum::TMPFS, None, None),
                    _ => (MountPointTypeEnum::BIND, None, m.source.clone()),
                };
                MountPoint {
                    typ: Some(typ),
                    name,
                    source,
                    destination: m.target.clone(),
                    rw: Some(!m.read_only.unwrap_or(false)),
                    ..Default::default()
                }
            })
            .collect();

        let mut networks: HashMap<String, EndpointSettings> = body
            .networking_config
            .as_ref()
            .and_then(|n| n.endpoints_config.clone())
            .unwrap_or_default();
        for network in extra_networks {
            networks.insert(network.to_string(), EndpointSettings::default());
        }

        ContainerInspectResponse {
            id: Some("f00dfeed".to_string()),
            name: Some(format!("/{}", name)),
            image: Some("sha256:1111".to_string()),
            config: Some(ContainerConfig {
                image: body.image.clone(),
                env: body.env.clone(),
                labels: body.labels.clone(),
                cmd: body.cmd.clone(),
                entrypoint: body.entrypoint.clone(),
                working_dir: body.working_dir.clone(),
                user: body.user.clone(),
                ..Default::default()
            }),
            host_config: Some(host_config),
            mounts: Some(mounts),
            network_settings: Some(NetworkSettings {
                networks: Some(networks),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn full_snapshot() -> ConfigurationSnapshot {
        let mut snap = ConfigurationSnapshot::new(ImageRef::parse("ghcr.io/acme/app:1.0").unwrap());
        snap.port_bindings = vec![
            PortBinding {
                container_port: 53,
                protocol: Protocol::Udp,
                host_ip: None,
                host_port: Some(5353),
            },
            PortBinding {
                container_port: 80,
                protocol: Protocol::Tcp,
                host_ip: Some("127.0.0.1".to_string()),
                host_port: Some(8080),
            },
            PortBinding {
                container_port: 80,
                protocol: Protocol::Tcp,
                host_ip: Some("::1".to_string()),
                host_port: Some(8080),
            },
        ];
        snap.mounts = vec![
            MountSpec {
                kind: MountKind::Bind,
                source: "/srv/app/config".to_string(),
                target: "/etc/app".to_string(),
                read_only: true,
                tmpfs_options: None,
            },
            MountSpec {
                kind: MountKind::Volume,
                source: "app-data".to_string(),
                target: "/var/lib/app".to_string(),
                read_only: false,
                tmpfs_options: None,
            },
            MountSpec {
                kind: MountKind::Tmpfs,
                source: String::new(),
                target: "/run/cache".to_string(),
                read_only: false,
                tmpfs_options: None,
            },
            MountSpec {
                kind: MountKind::Tmpfs,
                source: String::new(),
                target: "/run/scratch".to_string(),
                read_only: false,
                tmpfs_options: Some("size=64m,mode=1777".to_string()),
            },
        ];
        snap.environment = vec![
            "B=2".to_string(),
            "A=1".to_string(),
            "A=1".to_string(),
            "URL=http://x?a=b&c=d".to_string(),
        ];
        snap.network_mode = Some("frontend".to_string());
        snap.networks = ["backend".to_string(), "frontend".to_string()].into();
        snap.restart_policy = RestartPolicy::OnFailure {
            max_retries: Some(4),
        };
        snap.labels.insert("com.example.team".to_string(), "infra".to_string());
        snap.command = Some(vec!["serve".to_string(), "--port=80".to_string()]);
        snap.working_dir = Some("/srv".to_string());
        snap.user = Some("1000:1000".to_string());
        snap
    }

    #[test]
    fn capture_then_create_round_trips() {
        let original = full_snapshot();
        let body = create_body(&original.image, &original);
        let extra: Vec<&str> = original.secondary_networks().collect();

        let recaptured = snapshot_from_inspect(&engine_view("web", &body, &extra), None).unwrap();

        assert_eq!(recaptured, original);
    }

    #[test]
    fn missing_sections_map_to_zero_values() {
        let details = ContainerInspectResponse {
            id: Some("abc".to_string()),
            name: Some("/bare".to_string()),
            config: Some(ContainerConfig {
                image: Some("alpine".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let snap = snapshot_from_inspect(&details, None).unwrap();

        assert_eq!(snap, ConfigurationSnapshot::new(ImageRef::parse("alpine").unwrap()));
    }

    #[test]
    fn missing_image_is_an_error() {
        let details = ContainerInspectResponse {
            name: Some("/noimage".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            snapshot_from_inspect(&details, None),
            Err(ContainerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn keeps_protocol_and_read_only_flag() {
        let mut port_map = HashMap::new();
        port_map.insert(
            "514/udp".to_string(),
            Some(vec![EnginePortBinding {
                host_ip: Some(String::new()),
                host_port: Some("514".to_string()),
            }]),
        );
        let details = ContainerInspectResponse {
            id: Some("abc".to_string()),
            name: Some("/syslog".to_string()),
            config: Some(ContainerConfig {
                image: Some("syslog:2".to_string()),
                ..Default::default()
            }),
            host_config: Some(HostConfig {
                port_bindings: Some(port_map),
                ..Default::default()
            }),
            mounts: Some(vec![MountPoint {
                typ: Some(MountPointTypeEnum::BIND),
                source: Some("/var/log".to_string()),
                destination: Some("/logs".to_string()),
                rw: Some(false),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let snap = snapshot_from_inspect(&details, None).unwrap();

        assert_eq!(snap.port_bindings[0].protocol, Protocol::Udp);
        assert_eq!(snap.port_bindings[0].host_ip, None);
        assert_eq!(snap.port_bindings[0].host_port, Some(514));
        assert!(snap.mounts[0].read_only);
    }

    #[test]
    fn tmpfs_from_host_config_is_captured() {
        let mut tmpfs = HashMap::new();
        tmpfs.insert("/tmp".to_string(), "size=64m".to_string());
        let details = ContainerInspectResponse {
            id: Some("abc".to_string()),
            name: Some("/scratch".to_string()),
            config: Some(ContainerConfig {
                image: Some("alpine".to_string()),
                ..Default::default()
            }),
            host_config: Some(HostConfig {
                tmpfs: Some(tmpfs),
                ..Default::default()
            }),
            ..Default::default()
        };

        let snap = snapshot_from_inspect(&details, None).unwrap();

        assert_eq!(snap.mounts.len(), 1);
        assert_eq!(snap.mounts[0].kind, MountKind::Tmpfs);
        assert_eq!(snap.mounts[0].target, "/tmp");
        assert_eq!(snap.mounts[0].tmpfs_options.as_deref(), Some("size=64m"));
    }

    #[test]
    fn tmpfs_options_are_recreated_through_host_config() {
        let mut snap = ConfigurationSnapshot::new(ImageRef::parse("alpine").unwrap());
        snap.mounts.push(MountSpec {
            kind: MountKind::Tmpfs,
            source: String::new(),
            target: "/tmp".to_string(),
            read_only: false,
            tmpfs_options: Some("size=64m".to_string()),
        });

        let host_config = create_body(&snap.image, &snap).host_config.unwrap();

        assert_eq!(
            host_config.tmpfs.unwrap().get("/tmp").map(String::as_str),
            Some("size=64m")
        );
        assert!(host_config.mounts.is_none());
    }

    fn nginx_image_config() -> ImageConfig {
        ImageConfig {
            env: Some(vec![
                "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin".to_string(),
                "NGINX_VERSION=1.25.3".to_string(),
            ]),
            labels: Some(HashMap::from([(
                "org.opencontainers.image.version".to_string(),
                "1.25.3".to_string(),
            )])),
            cmd: Some(vec![
                "nginx".to_string(),
                "-g".to_string(),
                "daemon off;".to_string(),
            ]),
            entrypoint: Some(vec!["/docker-entrypoint.sh".to_string()]),
            working_dir: Some(String::new()),
            user: Some(String::new()),
            ..Default::default()
        }
    }

    #[test]
    fn values_inherited_from_the_image_are_not_captured() {
        let image = nginx_image_config();
        let mut labels = image.labels.clone().unwrap();
        labels.insert("com.example.team".to_string(), "web".to_string());
        let mut env = image.env.clone().unwrap();
        env.push("WORKERS=4".to_string());
        let details = ContainerInspectResponse {
            id: Some("abc".to_string()),
            name: Some("/web".to_string()),
            image: Some("sha256:1111".to_string()),
            config: Some(ContainerConfig {
                image: Some("nginx:1.25".to_string()),
                env: Some(env),
                labels: Some(labels),
                cmd: image.cmd.clone(),
                entrypoint: image.entrypoint.clone(),
                working_dir: Some(String::new()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let snap = snapshot_from_inspect(&details, Some(&image)).unwrap();

        assert_eq!(snap.environment, vec!["WORKERS=4".to_string()]);
        assert_eq!(
            snap.labels.into_iter().collect::<Vec<_>>(),
            vec![("com.example.team".to_string(), "web".to_string())]
        );
        assert_eq!(snap.command, None);
        assert_eq!(snap.entrypoint, None);
        assert_eq!(snap.working_dir, None);
        assert_eq!(snap.user, None);
    }

    #[test]
    fn overrides_of_image_defaults_are_kept() {
        let image = nginx_image_config();
        let details = ContainerInspectResponse {
            id: Some("abc".to_string()),
            name: Some("/web".to_string()),
            config: Some(ContainerConfig {
                image: Some("nginx:1.25".to_string()),
                env: Some(vec!["NGINX_VERSION=pinned".to_string()]),
                labels: Some(HashMap::from([(
                    "org.opencontainers.image.version".to_string(),
                    "custom".to_string(),
                )])),
                // same CMD as the image, but the entrypoint override dropped the image's
                cmd: image.cmd.clone(),
                entrypoint: Some(vec!["/bin/sh".to_string(), "-c".to_string()]),
                user: Some("101".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let snap = snapshot_from_inspect(&details, Some(&image)).unwrap();

        assert_eq!(snap.environment, vec!["NGINX_VERSION=pinned".to_string()]);
        assert_eq!(
            snap.labels.get("org.opencontainers.image.version").map(String::as_str),
            Some("custom")
        );
        assert_eq!(snap.command, image.cmd);
        assert_eq!(
            snap.entrypoint,
            Some(vec!["/bin/sh".to_string(), "-c".to_string()])
        );
        assert_eq!(snap.user.as_deref(), Some("101"));
    }

    #[test]
    fn create_body_keeps_the_reference_as_written() {
        let snap = ConfigurationSnapshot::new(ImageRef::parse("nginx").unwrap());

        let body = create_body(&snap.image, &snap);

        assert_eq!(body.image.as_deref(), Some("nginx"));
    }

    #[test]
    fn host_network_mode_is_passed_through() {
        let mut snap = ConfigurationSnapshot::new(ImageRef::parse("app").unwrap());
        snap.network_mode = Some("host".to_string());
        snap.networks = ["host".to_string()].into();

        let body = create_body(&snap.image, &snap);

        assert_eq!(
            body.host_config.unwrap().network_mode.as_deref(),
            Some("host")
        );
        assert!(body.networking_config.is_none());
    }

    #[test]
    fn container_ref_reads_name_image_and_ids() {
        let details = ContainerInspectResponse {
            id: Some("c0ffee".to_string()),
            name: Some("/web".to_string()),
            image: Some("sha256:beef".to_string()),
            config: Some(ContainerConfig {
                image: Some("nginx:1.25".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let container = container_ref_from_inspect(&details).unwrap();

        assert_eq!(container.id.as_str(), "c0ffee");
        assert_eq!(container.name.as_str(), "web");
        assert_eq!(container.image.to_string(), "nginx:1.25");
        assert_eq!(container.image_id.unwrap().as_str(), "sha256:beef");
    }

    #[test]
    fn container_started_from_image_id_is_rejected() {
        let details = ContainerInspectResponse {
            id: Some("c0ffee".to_string()),
            name: Some("/adhoc".to_string()),
            config: Some(ContainerConfig {
                image: Some("sha256:0123abcd".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert!(matches!(
            container_ref_from_inspect(&details),
            Err(ContainerError::InvalidConfig(_))
        ));
    }
}
