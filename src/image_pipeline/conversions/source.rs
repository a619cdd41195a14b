use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::dng::{DngHost, MemoryBlock};

/// Supplies the raw capture bytes.
pub trait RawSource {
    fn read_raw(&self, path: &Path, host: &DngHost) -> Result<MemoryBlock>;
}

/// Reads the whole raw file into a host-allocated block.
pub struct FileRawSource;

impl RawSource for FileRawSource {
    fn read_raw(&self, path: &Path, host: &DngHost) -> Result<MemoryBlock> {
        let input_error = |e: std::io::Error| ConversionError::InputReadError(format!("{}: {}", path.display(), e));

        let mut file = File::open(path).map_err(input_error)?;
        let len = file.metadata().map_err(input_error)?.len();
        let len = usize::try_from(len)
            .map_err(|_| ConversionError::InputReadError(format!("{}: file too large", path.display())))?;
        let mut block = host.allocate(len)?;
        file.read_exact(block.buffer_mut()).map_err(input_error)?;
        debug!(bytes = len, "Read raw buffer");
        Ok(block)
    }
}

/// Output path for a raw file: its last extension replaced by `.dng`.
pub fn derive_output_path(raw_path: &Path) -> std::path::PathBuf {
    raw_path.with_extension("dng")
}
