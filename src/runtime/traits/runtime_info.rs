// ABOUTME: Engine reachability and version trait.
// ABOUTME: Checked once before any command does work against the engine.

use super::sealed::Sealed;
use super::shared_types::RuntimeMetadata;
use async_trait::async_trait;

/// Engine identity and reachability.
#[async_trait]
pub trait RuntimeInfo: Sealed + Send + Sync {
    /// Engine name, version and platform.
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError>;

    /// Succeeds only if the engine answers within the operation timeout.
    async fn ping(&self) -> Result<(), RuntimeInfoError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    /// Nothing answered on the socket.
    #[error("engine not reachable: {0}")]
    ConnectionFailed(String),

    /// The engine answered with an error.
    #[error("engine error: {0}")]
    Runtime(String),
}
