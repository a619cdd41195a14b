//! Common utilities module
//!
//! Error taxonomy and step timing shared across the pipeline.

pub mod error;
pub mod timing;

pub use error::{ConversionError, ErrorKind, Result};
pub use timing::{PipelineTimings, StepTiming, Timer};
