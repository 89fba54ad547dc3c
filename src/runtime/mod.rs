// ABOUTME: Container engine access for Docker and Podman.
// ABOUTME: Detection, capability traits and the bollard-backed implementation.

mod bollard;
mod convert;
mod detection;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use types::{DetectedRuntime, RuntimeConfig, RuntimeType};
