use tracing::debug;

use crate::image_pipeline::dng::error::{DngError, DngResult};
use crate::image_pipeline::dng::image::DngImage;
use crate::image_pipeline::dng::negative::DngNegative;
use crate::image_pipeline::dng::types::{PixelType, Rect};

/// Owned, zero-initialised byte buffer handed out by [`DngHost::allocate`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBlock {
    data: Vec<u8>,
}

impl MemoryBlock {
    pub fn buffer(&self) -> &[u8] {
        &self.data
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for MemoryBlock {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Entry point of the container builder: allocation and object factories.
#[derive(Debug, Default)]
pub struct DngHost {
    /// Largest image the host agrees to construct, in samples.
    max_samples: Option<u64>,
}

impl DngHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_samples(mut self, max_samples: u64) -> Self {
        self.max_samples = Some(max_samples);
        self
    }

    /// Allocates a zeroed buffer, reporting a memory error instead of aborting.
    pub fn allocate(&self, size: usize) -> DngResult<MemoryBlock> {
        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|_| DngError::Memory(size))?;
        data.resize(size, 0);
        Ok(MemoryBlock { data })
    }

    pub fn make_image(&self, bounds: Rect, planes: u32, pixel_type: PixelType) -> DngResult<DngImage> {
        if bounds.is_empty() || planes == 0 {
            return Err(DngError::BadFormat(format!(
                "empty image bounds {}x{}x{}",
                bounds.width(),
                bounds.height(),
                planes
            )));
        }
        let samples = bounds.width() as u64 * bounds.height() as u64 * planes as u64;
        if self.max_samples.is_some_and(|max| samples > max) {
            return Err(DngError::ImageTooBig {
                width: bounds.width(),
                height: bounds.height(),
                planes,
            });
        }
        debug!(
            width = bounds.width(),
            height = bounds.height(),
            planes,
            "Allocating DNG image"
        );
        DngImage::new(bounds, planes, pixel_type)
    }

    pub fn make_negative(&self) -> DngNegative {
        DngNegative::default()
    }
}
