// ABOUTME: Runtime detection logic for the local system.
// ABOUTME: Honors explicit config, otherwise checks Docker then Podman sockets.

use super::types::{DetectedRuntime, RuntimeConfig, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Docker and Podman sockets)")]
    NoRuntimeFound,

    #[error("configured socket does not exist: {0}")]
    SocketNotFound(String),
}

const DOCKER_SOCKET: &str = "/var/run/docker.sock";
const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";

/// Detect the container runtime on the local system.
///
/// Explicit `config` values take precedence. Otherwise the first existing
/// socket wins, in this order:
/// 1. Docker socket (`/var/run/docker.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
pub fn detect_local(config: &RuntimeConfig) -> Result<DetectedRuntime, DetectionError> {
    if let Some(socket) = config.socket.as_deref() {
        let socket_path = socket.trim_start_matches("unix://").to_string();
        if !Path::new(&socket_path).exists() {
            return Err(DetectionError::SocketNotFound(socket_path));
        }
        let runtime_type = config.runtime.unwrap_or_else(|| guess_type(&socket_path));
        return Ok(DetectedRuntime {
            runtime_type,
            socket_path,
        });
    }

    let candidates = candidate_sockets(get_uid().as_deref());
    let found = candidates
        .into_iter()
        .filter(|(runtime_type, _)| config.runtime.is_none_or(|want| want == *runtime_type))
        .find(|(_, path)| Path::new(path).exists());

    match found {
        Some((runtime_type, socket_path)) => {
            tracing::debug!(runtime = %runtime_type, socket = %socket_path, "detected runtime");
            Ok(DetectedRuntime {
                runtime_type,
                socket_path,
            })
        }
        None => Err(DetectionError::NoRuntimeFound),
    }
}

fn candidate_sockets(uid: Option<&str>) -> Vec<(RuntimeType, String)> {
    let mut sockets = vec![
        (RuntimeType::Docker, DOCKER_SOCKET.to_string()),
        (RuntimeType::Podman, ROOTFUL_PODMAN.to_string()),
    ];
    if let Some(uid) = uid {
        sockets.push((
            RuntimeType::Podman,
            format!("/run/user/{}/podman/podman.sock", uid),
        ));
    }
    sockets
}

fn guess_type(socket_path: &str) -> RuntimeType {
    if socket_path.contains("podman") {
        RuntimeType::Podman
    } else {
        RuntimeType::Docker
    }
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        // Fall back to reading /proc/self/status
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}
