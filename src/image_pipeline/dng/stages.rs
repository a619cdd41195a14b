//! Stage 2 (linearize + range map) and stage 3 (demosaic) kernels

use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use tracing::debug;

use crate::image_pipeline::dng::error::{DngError, DngResult};
use crate::image_pipeline::dng::image::DngImage;
use crate::image_pipeline::dng::types::{PixelType, Rect};

const STAGE2_MAX: f64 = u16::MAX as f64;

/// Inputs of the stage 2 kernel, borrowed from the negative.
pub struct LinearizationParams<'a> {
    pub active_area: Rect,
    pub table: Option<&'a [u16]>,
    pub quad_blacks: [u32; 4],
    pub white_level: u32,
}

/// Linearizes the stage 1 mosaic and range-maps it to the full 16-bit scale.
///
/// The result covers only the active area. Black levels repeat on a 2x2 grid
/// anchored at the active area origin.
pub fn linearize(stage1: &DngImage, params: &LinearizationParams<'_>) -> DngResult<DngImage> {
    if stage1.planes() != 1 {
        return Err(DngError::NotYetImplemented(format!(
            "linearizing a {} plane stage 1 image",
            stage1.planes()
        )));
    }
    let area = params.active_area;
    if area.is_empty() || !stage1.bounds().contains(&area) {
        return Err(DngError::BadFormat(format!(
            "active area {:?} outside image bounds {:?}",
            area,
            stage1.bounds()
        )));
    }
    if let Some(table) = params.table {
        if table.is_empty() {
            return Err(DngError::BadFormat("empty linearization table".to_string()));
        }
    }
    let max_black = params.quad_blacks.iter().copied().max().unwrap_or(0);
    if params.white_level <= max_black {
        return Err(DngError::BadFormat(format!(
            "white level {} not above black level {}",
            params.white_level, max_black
        )));
    }

    debug!(
        width = area.width(),
        height = area.height(),
        white_level = params.white_level,
        "Building stage 2 image"
    );

    let src_width = stage1.width() as usize;
    let src = stage1.samples();
    let mut out = Vec::with_capacity(area.width() as usize * area.height() as usize);
    for row in 0..area.height() as usize {
        let src_row = (area.top - stage1.bounds().top) as usize + row;
        for col in 0..area.width() as usize {
            let src_col = (area.left - stage1.bounds().left) as usize + col;
            let raw = src[src_row * src_width + src_col];
            let linear = match params.table {
                // Values past the end of the table clip to its last entry.
                Some(table) => table[(raw as usize).min(table.len() - 1)],
                None => raw,
            } as f64;
            let black = params.quad_blacks[(row % 2) * 2 + col % 2] as f64;
            let range = params.white_level as f64 - black;
            let scaled = ((linear - black) / range * STAGE2_MAX).round();
            out.push(scaled.clamp(0.0, STAGE2_MAX) as u16);
        }
    }

    DngImage::from_samples(Rect::from_size(area.height(), area.width()), 1, PixelType::Short, out)
}

/// Maps a bayer mosaic phase (as set on the negative) to the CFA order of its
/// top-left 2x2 block.
pub fn cfa_for_phase(phase: u32) -> DngResult<CFA> {
    match phase {
        0 => Ok(CFA::GRBG),
        1 => Ok(CFA::RGGB),
        2 => Ok(CFA::BGGR),
        3 => Ok(CFA::GBRG),
        other => Err(DngError::BadFormat(format!("unknown bayer phase {}", other))),
    }
}

/// Demosaics a stage 2 mosaic into a 3-plane RGB image.
pub fn demosaic(stage2: &DngImage, phase: u32) -> DngResult<DngImage> {
    let cfa = cfa_for_phase(phase)?;
    let width = stage2.width() as usize;
    let height = stage2.height() as usize;
    debug!(width, height, ?cfa, "Building stage 3 image");

    let bayer_bytes: Vec<u8> = stage2.samples().iter().flat_map(|&v| v.to_le_bytes()).collect();
    let mut output_buf = vec![0u8; width * height * 3 * 2];
    {
        let mut cursor = Cursor::new(&bayer_bytes[..]);
        let mut raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output_buf);
        bayer::run_demosaic(&mut cursor, BayerDepth::Depth16LE, cfa, Demosaic::Linear, &mut raster)
            .map_err(|e| DngError::BadFormat(format!("demosaic failed: {:?}", e)))?;
    }

    let rgb: Vec<u16> = output_buf
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    DngImage::from_samples(stage2.bounds(), 3, PixelType::Short, rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mosaic(width: u32, height: u32, samples: Vec<u16>) -> DngImage {
        DngImage::from_samples(Rect::from_size(height, width), 1, PixelType::Short, samples).unwrap()
    }

    #[test]
    fn linearize_maps_black_and_white_to_range_ends() {
        let stage1 = mosaic(2, 2, vec![64, 4095, 64, 4095]);
        let params = LinearizationParams {
            active_area: Rect::from_size(2, 2),
            table: None,
            quad_blacks: [64; 4],
            white_level: 4095,
        };
        let stage2 = linearize(&stage1, &params).unwrap();
        assert_eq!(stage2.samples(), &[0, 65535, 0, 65535]);
    }

    #[test]
    fn linearize_crops_to_active_area_and_clips_table() {
        let stage1 = mosaic(4, 2, vec![9, 1, 2, 9, 9, 3, 200, 9]);
        let table: Vec<u16> = (0..16).collect();
        let params = LinearizationParams {
            active_area: Rect::new(0, 1, 2, 3),
            table: Some(&table),
            quad_blacks: [0; 4],
            white_level: 15,
        };
        let stage2 = linearize(&stage1, &params).unwrap();
        assert_eq!(stage2.width(), 2);
        assert_eq!(stage2.height(), 2);
        // 200 is past the table end and clips to 15, the white level.
        assert_eq!(stage2.samples()[3], 65535);
        assert_eq!(stage2.samples()[0], (1.0f64 / 15.0 * 65535.0).round() as u16);
    }

    #[test]
    fn linearize_rejects_white_below_black() {
        let stage1 = mosaic(2, 2, vec![0; 4]);
        let params = LinearizationParams {
            active_area: Rect::from_size(2, 2),
            table: None,
            quad_blacks: [100, 0, 0, 0],
            white_level: 100,
        };
        assert!(matches!(linearize(&stage1, &params), Err(DngError::BadFormat(_))));
    }

    #[test]
    fn cfa_phase_range_is_checked() {
        assert!(matches!(cfa_for_phase(1), Ok(CFA::RGGB)));
        assert!(cfa_for_phase(4).is_err());
    }

    #[test]
    fn demosaic_produces_three_planes() {
        let stage2 = mosaic(4, 4, vec![1000; 16]);
        let stage3 = demosaic(&stage2, 1).unwrap();
        assert_eq!(stage3.planes(), 3);
        assert_eq!(stage3.samples().len(), 4 * 4 * 3);
    }
}
