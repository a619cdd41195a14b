//! Conversion configuration types

use std::path::PathBuf;

use crate::image_pipeline::dng::{DngCompression, DngVersion};

/// Calibration profile used when none is given on the command line.
pub const DEFAULT_PROFILE_FILE: &str = "Canon_EOS_550D.dcp";

/// Configuration for raw to DNG conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// DNGVersion written into the output
    pub dng_version: DngVersion,
    /// Compression of the stored raw image
    pub compression: DngCompression,
    /// Longest side of the embedded thumbnail, `None` to skip it
    pub thumbnail_size: Option<u32>,
    /// Reject zero width or height before building the image
    pub validate_dimensions: bool,
    /// Fail on an unparseable sidecar instead of treating it as empty
    pub strict_metadata: bool,
    pub default_profile: PathBuf,
    /// Value of the Software tag
    pub software: String,
    /// Refuse to build images with more samples than this
    pub max_image_samples: Option<u64>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dng_version: DngVersion::V1_4,
            compression: DngCompression::Uncompressed,
            thumbnail_size: Some(256),
            validate_dimensions: true,
            strict_metadata: true,
            default_profile: PathBuf::from(DEFAULT_PROFILE_FILE),
            software: concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).to_string(),
            max_image_samples: None,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    dng_version: Option<DngVersion>,
    compression: Option<DngCompression>,
    thumbnail_size: Option<Option<u32>>,
    validate_dimensions: Option<bool>,
    strict_metadata: Option<bool>,
    default_profile: Option<PathBuf>,
    software: Option<String>,
    max_image_samples: Option<Option<u64>>,
}

impl ConversionConfigBuilder {
    pub fn dng_version(mut self, version: DngVersion) -> Self {
        self.dng_version = Some(version);
        self
    }

    pub fn compression(mut self, compression: DngCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn thumbnail_size(mut self, size: Option<u32>) -> Self {
        self.thumbnail_size = Some(size);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn strict_metadata(mut self, strict: bool) -> Self {
        self.strict_metadata = Some(strict);
        self
    }

    pub fn default_profile(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_profile = Some(path.into());
        self
    }

    pub fn software(mut self, software: impl Into<String>) -> Self {
        self.software = Some(software.into());
        self
    }

    pub fn max_image_samples(mut self, limit: Option<u64>) -> Self {
        self.max_image_samples = Some(limit);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            dng_version: self.dng_version.unwrap_or(default.dng_version),
            compression: self.compression.unwrap_or(default.compression),
            thumbnail_size: self.thumbnail_size.unwrap_or(default.thumbnail_size),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            strict_metadata: self.strict_metadata.unwrap_or(default.strict_metadata),
            default_profile: self.default_profile.unwrap_or(default.default_profile),
            software: self.software.unwrap_or(default.software),
            max_image_samples: self.max_image_samples.unwrap_or(default.max_image_samples),
        }
    }
}
