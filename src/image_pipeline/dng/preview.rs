use crate::image_pipeline::dng::image::DngImage;

const DISPLAY_GAMMA: f64 = 1.0 / 2.2;

/// 8-bit RGB rendition of a stage 3 image, used as the DNG thumbnail.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Nearest-neighbour downsample of `stage3` so neither side exceeds `max_side`,
/// white balanced with the as-shot neutral and gamma encoded for display.
pub fn render_thumbnail(stage3: &DngImage, neutral: Option<[f64; 3]>, max_side: u32) -> Thumbnail {
    let (width, height) = (stage3.width(), stage3.height());
    let longest = width.max(height).max(1);
    let step = longest.div_ceil(max_side.max(1)).max(1);
    let out_w = width.div_ceil(step).max(1);
    let out_h = height.div_ceil(step).max(1);

    let multipliers = match neutral {
        Some(n) => [n[1] / n[0], 1.0, n[1] / n[2]],
        None => [1.0; 3],
    };

    let planes = stage3.planes() as usize;
    let samples = stage3.samples();
    let mut data = Vec::with_capacity(out_w as usize * out_h as usize * 3);
    for y in 0..out_h {
        let src_y = (y * step).min(height.saturating_sub(1)) as usize;
        for x in 0..out_w {
            let src_x = (x * step).min(width.saturating_sub(1)) as usize;
            let base = (src_y * width as usize + src_x) * planes;
            for c in 0..3 {
                let linear = samples[base + c.min(planes - 1)] as f64 / u16::MAX as f64 * multipliers[c];
                data.push((linear.clamp(0.0, 1.0).powf(DISPLAY_GAMMA) * 255.0).round() as u8);
            }
        }
    }

    Thumbnail { width: out_w, height: out_h, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::dng::types::{PixelType, Rect};

    #[test]
    fn thumbnail_fits_within_max_side() {
        let image = DngImage::from_samples(Rect::from_size(10, 30), 3, PixelType::Short, vec![u16::MAX; 900]).unwrap();
        let thumb = render_thumbnail(&image, None, 8);
        assert_eq!((thumb.width, thumb.height), (8, 3));
        assert_eq!(thumb.data.len(), 8 * 3 * 3);
        assert!(thumb.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn thumbnail_applies_white_balance() {
        let image = DngImage::from_samples(Rect::from_size(1, 1), 3, PixelType::Short, vec![16384; 3]).unwrap();
        let thumb = render_thumbnail(&image, Some([0.25, 1.0, 1.0]), 256);
        assert_eq!(thumb.data[0], 255);
        assert!(thumb.data[1] < 255);
        assert_eq!(thumb.data[1], thumb.data[2]);
    }
}
