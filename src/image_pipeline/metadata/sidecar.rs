//! JSON sidecar schema
//!
//! ```json
//! {
//!   "basic_information": {
//!     "camera_maker": "Acme",
//!     "width": 4000,
//!     "ActiveArea": [0, 0, 3000, 4000],
//!     "BlackLevel": [64],
//!     "#note": "keys starting with '#' are comments"
//!   }
//! }
//! ```
//!
//! Each recognised key is decoded on its own, so a value of the wrong type is
//! reported against its key rather than as an unreadable document.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::image_pipeline::common::error::{ConversionError, Result};

pub const BASIC_INFORMATION: &str = "basic_information";

/// Keys starting with this marker are comments and never reported.
pub const COMMENT_MARKER: char = '#';

/// `BlackLevel` may be written as a bare number or as an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(u32),
    Many(Vec<u32>),
}

impl OneOrMany {
    pub fn as_slice(&self) -> &[u32] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(v) => v,
        }
    }
}

/// Recognised contents of the `basic_information` section.
#[derive(Debug, Default)]
pub struct BasicInformation {
    pub input_file: Option<String>,
    pub camera_maker: Option<String>,
    pub camera_model: Option<String>,
    pub profile_name: Option<String>,
    pub profile_copy_right: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub active_area: Option<Vec<u32>>,
    pub default_crop_origin: Option<Vec<u32>>,
    pub default_crop_size: Option<Vec<u32>>,
    pub cfa_layout: Option<u32>,
    pub bit_depth: Option<u32>,
    pub black_level: Option<OneOrMany>,
    pub white_level: Option<u32>,
    pub rgain: Option<f32>,
    pub bgain: Option<f32>,
    pub anti_alias_strength: Option<f32>,
    pub iso: Option<u32>,
    pub exposure_time: Option<f64>,
    pub lens_aperture: Option<f64>,
    pub focal_length: Option<f64>,
}

impl BasicInformation {
    /// Removes every recognised key from `section`; what is left over is unknown.
    pub fn take_from(section: &mut Map<String, Value>) -> Result<Self> {
        Ok(Self {
            input_file: take(section, "input_file")?,
            camera_maker: take(section, "camera_maker")?,
            camera_model: take(section, "camera_model")?,
            profile_name: take(section, "profile_name")?,
            profile_copy_right: take(section, "profile_copy_right")?,
            width: take(section, "width")?,
            height: take(section, "height")?,
            active_area: take(section, "ActiveArea")?,
            default_crop_origin: take(section, "DefaultCropOrigin")?,
            default_crop_size: take(section, "DefaultCropSize")?,
            cfa_layout: take(section, "CfaLayout")?,
            bit_depth: take(section, "bit_depth")?,
            black_level: take(section, "BlackLevel")?,
            white_level: take(section, "WhiteLevel")?,
            rgain: take(section, "rgain")?,
            bgain: take(section, "bgain")?,
            anti_alias_strength: take(section, "AntiAliasStrength")?,
            iso: take(section, "ISO")?,
            exposure_time: take(section, "exposure_time")?,
            lens_aperture: take(section, "lens_aperture")?,
            focal_length: take(section, "focal_length")?,
        })
    }
}

/// `null` counts as absent.
fn take<T: DeserializeOwned>(section: &mut Map<String, Value>, key: &'static str) -> Result<Option<T>> {
    match section.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ConversionError::InvalidField {
                field: key,
                reason: e.to_string(),
            }),
    }
}
