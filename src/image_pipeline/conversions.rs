//! Pipeline conversions module
//!
//! Field mapping, pixel staging and the orchestration of a raw capture into a
//! DNG file.

mod field_mapper;
mod pixel_stager;
mod raw_to_dng;
mod source;
mod types;


pub use field_mapper::{anti_alias_rational, as_shot_neutral, map_negative_fields};
pub use pixel_stager::stage_pixels;
pub use raw_to_dng::{ConversionReport, ConversionRequest, ConversionState, RawToDngPipeline};
pub use source::{FileRawSource, RawSource, derive_output_path};
pub use types::{ConversionConfig, ConversionConfigBuilder, DEFAULT_PROFILE_FILE};
