// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Container names, image references, content digests and engine ids.

mod container_name;
mod digest;
mod id;
mod image_ref;

pub use container_name::{ContainerName, ContainerNameError};
pub use digest::{ImageDigest, ParseDigestError};
pub use id::{ContainerId, ImageId};
pub use image_ref::{ImageRef, ParseImageRefError};
