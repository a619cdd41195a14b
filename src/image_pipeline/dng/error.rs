use thiserror::Error;

pub const DNG_ERROR_NONE: i32 = 0;
pub const DNG_ERROR_UNKNOWN: i32 = 100000;
pub const DNG_ERROR_NOT_YET_IMPLEMENTED: i32 = 100001;
pub const DNG_ERROR_MEMORY: i32 = 100005;
pub const DNG_ERROR_BAD_FORMAT: i32 = 100006;
pub const DNG_ERROR_OPEN_FILE: i32 = 100008;
pub const DNG_ERROR_READ_FILE: i32 = 100009;
pub const DNG_ERROR_WRITE_FILE: i32 = 100010;
pub const DNG_ERROR_END_OF_FILE: i32 = 100011;
pub const DNG_ERROR_IMAGE_TOO_BIG: i32 = 100013;

/// Failures raised by the DNG container builder.
///
/// Every variant carries a stable numeric code (see [`DngError::code`]) that
/// callers surface verbatim as the process result.
#[derive(Error, Debug)]
pub enum DngError {
    #[error("Not yet implemented: {0}")]
    NotYetImplemented(String),

    #[error("Unable to allocate {0} bytes")]
    Memory(usize),

    #[error("Bad format: {0}")]
    BadFormat(String),

    #[error("Unable to open {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to write: {0}")]
    WriteFile(#[source] std::io::Error),

    #[error("Unexpected end of file: {0}")]
    EndOfFile(String),

    #[error("Image too big: {width}x{height}x{planes}")]
    ImageTooBig { width: u32, height: u32, planes: u32 },

    #[error("TIFF encoding failed: {0}")]
    Encode(#[from] tiff::TiffError),
}

impl DngError {
    pub fn code(&self) -> i32 {
        match self {
            DngError::NotYetImplemented(_) => DNG_ERROR_NOT_YET_IMPLEMENTED,
            DngError::Memory(_) => DNG_ERROR_MEMORY,
            DngError::BadFormat(_) => DNG_ERROR_BAD_FORMAT,
            DngError::OpenFile { .. } => DNG_ERROR_OPEN_FILE,
            DngError::ReadFile(_) => DNG_ERROR_READ_FILE,
            DngError::WriteFile(_) => DNG_ERROR_WRITE_FILE,
            DngError::EndOfFile(_) => DNG_ERROR_END_OF_FILE,
            DngError::ImageTooBig { .. } => DNG_ERROR_IMAGE_TOO_BIG,
            DngError::Encode(tiff::TiffError::IoError(_)) => DNG_ERROR_WRITE_FILE,
            DngError::Encode(_) => DNG_ERROR_BAD_FORMAT,
        }
    }
}

pub type DngResult<T> = std::result::Result<T, DngError>;
