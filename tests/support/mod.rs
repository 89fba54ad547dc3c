// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and sample snapshots for integration tests.

use reimage::snapshot::{
    ConfigurationSnapshot, MountKind, MountSpec, PortBinding, Protocol, RestartPolicy,
};
use reimage::types::ImageRef;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("reimage=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A snapshot with one of everything.
#[allow(dead_code)]
pub fn sample_snapshot() -> ConfigurationSnapshot {
    let mut snapshot = ConfigurationSnapshot::new(ImageRef::parse("nginx:1.25").unwrap());
    snapshot.port_bindings.push(PortBinding {
        container_port: 80,
        protocol: Protocol::Tcp,
        host_ip: None,
        host_port: Some(8080),
    });
    snapshot.mounts.push(MountSpec {
        kind: MountKind::Volume,
        source: "web-data".to_string(),
        target: "/usr/share/nginx/html".to_string(),
        read_only: true,
        tmpfs_options: None,
    });
    snapshot.environment = vec!["A=1".to_string(), "A=2".to_string(), "EMPTY=".to_string()];
    snapshot.networks.insert("frontend".to_string());
    snapshot.network_mode = Some("frontend".to_string());
    snapshot.restart_policy = RestartPolicy::UnlessStopped;
    snapshot
        .labels
        .insert("com.example.team".to_string(), "web".to_string());
    snapshot
}
