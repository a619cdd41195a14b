//! In-memory DNG image planes and the pixel-buffer descriptor used to fill them

use crate::image_pipeline::dng::error::{DngError, DngResult};
use crate::image_pipeline::dng::types::{PixelType, Rect};

/// Describes how samples are laid out in a caller-owned byte buffer.
///
/// Steps are expressed in samples, not bytes: sample `(row, col, plane)` of
/// `area` lives at `((row * row_step) + (col * col_step) + (plane * plane_step)) * pixel_size`.
#[derive(Debug, Clone)]
pub struct PixelBuffer<'a> {
    pub area: Rect,
    pub plane: u32,
    pub planes: u32,
    pub row_step: usize,
    pub col_step: usize,
    pub plane_step: usize,
    pub pixel_type: PixelType,
    pub pixel_size: usize,
    pub data: &'a [u8],
}

impl PixelBuffer<'_> {
    /// Number of bytes the descriptor addresses.
    pub fn required_len(&self) -> usize {
        if self.area.is_empty() || self.planes == 0 {
            return 0;
        }
        let last = (self.area.height() as usize - 1) * self.row_step
            + (self.area.width() as usize - 1) * self.col_step
            + (self.planes as usize - 1) * self.plane_step;
        (last + 1) * self.pixel_size
    }

    fn sample(&self, row: usize, col: usize, plane: usize) -> u16 {
        let index = (row * self.row_step + col * self.col_step + plane * self.plane_step) * self.pixel_size;
        match self.pixel_type {
            PixelType::Byte => self.data[index] as u16,
            // Samples are taken in host byte order.
            PixelType::Short => u16::from_ne_bytes([self.data[index], self.data[index + 1]]),
        }
    }
}

/// A multi-plane image with 16-bit storage, planes interleaved per pixel.
#[derive(Debug, Clone)]
pub struct DngImage {
    bounds: Rect,
    planes: u32,
    pixel_type: PixelType,
    data: Vec<u16>,
}

impl DngImage {
    pub(crate) fn new(bounds: Rect, planes: u32, pixel_type: PixelType) -> DngResult<Self> {
        let len = bounds.width() as usize * bounds.height() as usize * planes as usize;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| DngError::Memory(len * std::mem::size_of::<u16>()))?;
        data.resize(len, 0);
        Ok(Self { bounds, planes, pixel_type, data })
    }

    pub(crate) fn from_samples(bounds: Rect, planes: u32, pixel_type: PixelType, data: Vec<u16>) -> DngResult<Self> {
        let expected = bounds.width() as usize * bounds.height() as usize * planes as usize;
        if data.len() != expected {
            return Err(DngError::BadFormat(format!(
                "image data holds {} samples, expected {}",
                data.len(),
                expected
            )));
        }
        Ok(Self { bounds, planes, pixel_type, data })
    }

    /// Copies the samples described by `buffer` into this image.
    pub fn put(&mut self, buffer: &PixelBuffer<'_>) -> DngResult<()> {
        if buffer.pixel_type != self.pixel_type || buffer.pixel_size != buffer.pixel_type.size() {
            return Err(DngError::NotYetImplemented(format!(
                "pixel buffer of type {:?} with {} byte samples",
                buffer.pixel_type, buffer.pixel_size
            )));
        }
        if !self.bounds.contains(&buffer.area) {
            return Err(DngError::BadFormat(format!(
                "pixel buffer area {:?} outside image bounds {:?}",
                buffer.area, self.bounds
            )));
        }
        if buffer.plane + buffer.planes > self.planes {
            return Err(DngError::BadFormat(format!(
                "pixel buffer planes {}..{} exceed image planes {}",
                buffer.plane,
                buffer.plane + buffer.planes,
                self.planes
            )));
        }
        let required = buffer.required_len();
        if buffer.data.len() < required {
            return Err(DngError::EndOfFile(format!(
                "pixel buffer holds {} bytes, {} required",
                buffer.data.len(),
                required
            )));
        }

        let width = self.bounds.width() as usize;
        let planes = self.planes as usize;
        for row in 0..buffer.area.height() as usize {
            let dst_row = (buffer.area.top - self.bounds.top) as usize + row;
            for col in 0..buffer.area.width() as usize {
                let dst_col = (buffer.area.left - self.bounds.left) as usize + col;
                let base = (dst_row * width + dst_col) * planes;
                for plane in 0..buffer.planes as usize {
                    self.data[base + buffer.plane as usize + plane] = buffer.sample(row, col, plane);
                }
            }
        }
        Ok(())
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn width(&self) -> u32 {
        self.bounds.width()
    }

    pub fn height(&self) -> u32 {
        self.bounds.height()
    }

    pub fn planes(&self) -> u32 {
        self.planes
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Interleaved samples, row-major.
    pub fn samples(&self) -> &[u16] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_buffer(area: Rect, data: &[u8]) -> PixelBuffer<'_> {
        PixelBuffer {
            area,
            plane: 0,
            planes: 1,
            row_step: area.width() as usize,
            col_step: 1,
            plane_step: 1,
            pixel_type: PixelType::Short,
            pixel_size: 2,
            data,
        }
    }

    #[test]
    fn put_copies_native_endian_samples() {
        let bounds = Rect::from_size(2, 2);
        let bytes: Vec<u8> = [1u16, 2, 3, 4].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let mut image = DngImage::new(bounds, 1, PixelType::Short).unwrap();
        image.put(&short_buffer(bounds, &bytes)).unwrap();
        assert_eq!(image.samples(), &[1, 2, 3, 4]);
    }

    #[test]
    fn put_rejects_short_buffer() {
        let bounds = Rect::from_size(2, 2);
        let mut image = DngImage::new(bounds, 1, PixelType::Short).unwrap();
        let err = image.put(&short_buffer(bounds, &[0u8; 6])).unwrap_err();
        assert!(matches!(err, DngError::EndOfFile(_)));
    }

    #[test]
    fn put_ignores_trailing_bytes() {
        let bounds = Rect::from_size(1, 2);
        let mut bytes: Vec<u8> = [7u16, 9].iter().flat_map(|v| v.to_ne_bytes()).collect();
        bytes.extend_from_slice(&[0xff; 8]);
        let mut image = DngImage::new(bounds, 1, PixelType::Short).unwrap();
        image.put(&short_buffer(bounds, &bytes)).unwrap();
        assert_eq!(image.samples(), &[7, 9]);
    }
}
