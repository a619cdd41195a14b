//! Capture metadata record and loader diagnostics

use std::fmt;
use std::path::PathBuf;

/// Everything the sidecar can describe about one capture.
///
/// Scalars default to zero or empty. Fields the mapper cannot substitute a
/// default for are `Option`s so absence stays distinguishable from zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureMetadata {
    /// Raw plane count; the mosaic is stored as one interleaved channel.
    pub color_planes: u32,

    pub input_file: String,
    pub camera_maker: String,
    pub camera_model: String,
    pub profile_name: String,
    pub profile_copy_right: String,

    pub width: u32,
    pub height: u32,
    /// Top, left, bottom, right.
    pub active_area: Option<[u32; 4]>,
    pub default_crop_origin: Option<[u32; 2]>,
    pub default_crop_size: Option<[u32; 2]>,
    pub cfa_layout: u32,

    pub bit_depth: Option<u32>,
    /// One value per CFA phase.
    pub black_level: Option<[u32; 4]>,
    pub white_level: u32,
    pub anti_alias_strength: f32,

    pub rgain: f32,
    pub bgain: f32,

    pub iso: u32,
    pub exposure_time: f64,
    pub lens_aperture: f64,
    pub focal_length: f64,

    pub raw_path: PathBuf,
    pub output_path: PathBuf,
    pub profile_path: PathBuf,
}

impl CaptureMetadata {
    /// Fills the fields the sidecar never supplies.
    pub fn apply_reserved(&mut self) {
        self.color_planes = 1;
    }
}

/// Non-fatal findings reported while loading a sidecar.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    UnknownKey { section: Option<String>, key: String },
    MalformedDocument { reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownKey { section: Some(section), key } => {
                write!(f, "unrecognized key '{}' in section '{}'", key, section)
            }
            Diagnostic::UnknownKey { section: None, key } => write!(f, "unrecognized section '{}'", key),
            Diagnostic::MalformedDocument { reason } => {
                write!(f, "malformed metadata document ignored: {}", reason)
            }
        }
    }
}
