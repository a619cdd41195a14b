//! Image processing pipeline module
//!
//! Converts a headerless Bayer raw buffer plus a JSON sidecar into a DNG file
//! with a camera profile attached. `metadata` and `linearization` hold the
//! input model, `dng` builds and writes the container, and `conversions`
//! maps one onto the other and drives the run.

pub mod common;
pub mod conversions;
pub mod dng;
pub mod linearization;
pub mod metadata;

pub use common::{ConversionError, ErrorKind, Result};

pub use metadata::{CaptureMetadata, Diagnostic, MetadataLoader};

pub use conversions::{
    ConversionConfig, ConversionConfigBuilder, ConversionReport, ConversionRequest, DEFAULT_PROFILE_FILE,
    RawToDngPipeline,
};
