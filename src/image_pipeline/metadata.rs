//! Capture metadata model and JSON sidecar loading

mod loader;
pub mod sidecar;
mod types;

pub use loader::{LoadedMetadata, MAX_BIT_DEPTH, MIN_BIT_DEPTH, MetadataLoader, resolve_black_level};
pub use types::{CaptureMetadata, Diagnostic};
