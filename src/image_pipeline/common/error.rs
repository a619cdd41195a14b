use thiserror::Error;

use crate::image_pipeline::dng::error::{DNG_ERROR_UNKNOWN, DngError};

/// Which side of the failure boundary an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input: raw file, sidecar, or a metadata field.
    Input,
    /// Raised by the DNG container builder.
    Library,
    Unknown,
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to read metadata file {path}: {source}")]
    MetadataReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse metadata file {path}: {reason}")]
    MetadataParseError { path: String, reason: String },

    #[error("Missing required metadata field: {0}")]
    MissingField(&'static str),

    #[error("Invalid metadata field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid {channel} gain: {value}")]
    InvalidGain { channel: &'static str, value: f32 },

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("DNG error: {0}")]
    Dng(#[from] DngError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::Dng(_) => ErrorKind::Library,
            ConversionError::IoError(_) => ErrorKind::Unknown,
            _ => ErrorKind::Input,
        }
    }

    /// Numeric result for the process: the library's own code for container
    /// errors, the unknown-error sentinel for everything else.
    pub fn code(&self) -> i32 {
        match self {
            ConversionError::Dng(e) => e.code(),
            _ => DNG_ERROR_UNKNOWN,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::dng::error::DNG_ERROR_BAD_FORMAT;

    #[test]
    fn library_errors_keep_their_code() {
        let err = ConversionError::from(DngError::BadFormat("x".to_string()));
        assert_eq!(err.kind(), ErrorKind::Library);
        assert_eq!(err.code(), DNG_ERROR_BAD_FORMAT);
    }

    #[test]
    fn input_errors_map_to_sentinel() {
        let err = ConversionError::MissingField("ActiveArea");
        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(err.code(), DNG_ERROR_UNKNOWN);
    }
}
