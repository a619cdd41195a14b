use crate::image_pipeline::dng::{MemoryBlock, PixelBuffer, PixelType, Rect};
use crate::image_pipeline::metadata::CaptureMetadata;

/// Describes the raw capture bytes as a 16-bit, `color_planes`-channel image.
///
/// The buffer is taken as-is: samples are read in host byte order and the
/// byte count is not checked here.
pub fn stage_pixels<'a>(meta: &CaptureMetadata, raw: &'a MemoryBlock) -> PixelBuffer<'a> {
    let planes = meta.color_planes.max(1);
    let pixel_type = PixelType::Short;
    PixelBuffer {
        area: Rect::from_size(meta.height, meta.width),
        plane: 0,
        planes,
        row_step: planes as usize * meta.width as usize,
        col_step: planes as usize,
        plane_step: 1,
        pixel_type,
        pixel_size: pixel_type.size(),
        data: raw.buffer(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_plane_strides() {
        let mut meta = CaptureMetadata {
            width: 10,
            height: 4,
            ..Default::default()
        };
        meta.apply_reserved();
        let raw = MemoryBlock::from(vec![0u8; 80]);
        let buffer = stage_pixels(&meta, &raw);
        assert_eq!(buffer.area, Rect::from_size(4, 10));
        assert_eq!(buffer.planes, 1);
        assert_eq!(buffer.row_step, 10);
        assert_eq!(buffer.col_step, 1);
        assert_eq!(buffer.pixel_size, 2);
        assert_eq!(buffer.required_len(), 80);
    }
}
