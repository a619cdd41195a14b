//! Translation of capture metadata into DNG negative fields.

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::dng::{ColorKey, DngNegative, Orientation, Rect, SRational, URational, XyCoord};
use crate::image_pipeline::linearization::LinearizationCurve;
use crate::image_pipeline::metadata::CaptureMetadata;

/// Denominator used for AntiAliasStrength; keeps six decimal digits exact.
pub const ANTI_ALIAS_DENOMINATOR: u32 = 1_000_000;
pub const FOCAL_LENGTH_DENOMINATOR: u32 = 1000;
pub const LENS_INFO_DENOMINATOR: u32 = 10;

/// EXIF MeteringMode "center weighted average".
const METERING_MODE_CENTER_WEIGHTED: u16 = 2;
/// EXIF WhiteBalance "auto".
const WHITE_BALANCE_AUTO: u16 = 0;

/// As-shot neutral `[1/rgain, 1, 1/bgain]`; zero or non-finite gains are rejected.
pub fn as_shot_neutral(rgain: f32, bgain: f32) -> Result<[f64; 3]> {
    for (channel, value) in [("red", rgain), ("blue", bgain)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConversionError::InvalidGain { channel, value });
        }
    }
    Ok([1.0 / rgain as f64, 1.0, 1.0 / bgain as f64])
}

pub fn anti_alias_rational(strength: f32) -> Result<URational> {
    if !(0.0..=1.0).contains(&strength) {
        return Err(ConversionError::InvalidField {
            field: "AntiAliasStrength",
            reason: format!("{} is outside 0.0..=1.0", strength),
        });
    }
    Ok(URational::from_real(strength as f64, ANTI_ALIAS_DENOMINATOR))
}

fn required<T: Copy>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(ConversionError::MissingField(field))
}

/// Sets every negative field derived from `meta`.
///
/// All required values are checked before the negative is touched, so a
/// failure leaves it unmodified.
pub fn map_negative_fields(meta: &CaptureMetadata, negative: &mut DngNegative) -> Result<()> {
    let bit_depth = required(meta.bit_depth, "bit_depth")?;
    let [b0, b1, b2, b3] = required(meta.black_level, "BlackLevel")?;
    let [top, left, bottom, right] = required(meta.active_area, "ActiveArea")?;
    let [crop_x, crop_y] = required(meta.default_crop_origin, "DefaultCropOrigin")?;
    let [crop_width, crop_height] = required(meta.default_crop_size, "DefaultCropSize")?;
    if meta.white_level == 0 {
        return Err(ConversionError::MissingField("WhiteLevel"));
    }
    let neutral = as_shot_neutral(meta.rgain, meta.bgain)?;
    let anti_alias = anti_alias_rational(meta.anti_alias_strength)?;
    let curve = LinearizationCurve::identity(bit_depth)?;

    debug!(
        model = %meta.camera_model,
        cfa_layout = meta.cfa_layout,
        bit_depth,
        "Mapping negative fields"
    );

    // Identity and mosaic
    negative.set_model_name(&meta.camera_model);
    negative.set_local_name(&meta.camera_model);
    negative.set_color_keys(ColorKey::Red, ColorKey::Green, ColorKey::Blue);
    negative.set_bayer_mosaic(meta.cfa_layout)?;
    negative.set_color_channels(3);

    // Levels
    negative.set_linearization(curve.into_table());
    negative.set_quad_blacks(b0, b1, b2, b3);
    negative.set_white_level(meta.white_level);

    // Geometry
    let one = URational::new(1, 1);
    negative.set_default_scale(one, one);
    negative.set_best_quality_scale(one);
    negative.set_active_area(Rect::new(top, left, bottom, right));
    negative.set_default_crop_origin(crop_x, crop_y);
    negative.set_default_crop_size(crop_width, crop_height);
    negative.set_base_orientation(Orientation::Normal);

    // Calibration policy
    negative.set_camera_neutral(neutral)?;
    negative.set_camera_white_xy(XyCoord::D65);
    negative.set_baseline_exposure(0.0);
    negative.set_anti_alias_strength(anti_alias);
    negative.set_noise_reduction_applied(URational::new(0, 1));
    negative.set_baseline_sharpness(1.0);

    // EXIF
    let exif = negative.exif_mut();
    exif.make = meta.camera_maker.clone();
    exif.model = meta.camera_model.clone();
    exif.iso_speed_ratings = [meta.iso, 0, 0];
    exif.white_balance = WHITE_BALANCE_AUTO;
    exif.metering_mode = METERING_MODE_CENTER_WEIGHTED;
    exif.exposure_bias_value = SRational::new(0, 1);
    exif.set_f_number(meta.lens_aperture);
    exif.set_exposure_time(meta.exposure_time);
    if meta.focal_length > 0.0 {
        exif.focal_length = Some(URational::from_real(meta.focal_length, FOCAL_LENGTH_DENOMINATOR));
    }
    if meta.focal_length > 0.0 || meta.lens_aperture > 0.0 {
        let focal = URational::from_real(meta.focal_length, LENS_INFO_DENOMINATOR);
        let aperture = URational::from_real(meta.lens_aperture, LENS_INFO_DENOMINATOR);
        exif.lens_info = Some([focal, focal, aperture, aperture]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_metadata() -> CaptureMetadata {
        CaptureMetadata {
            camera_maker: "Acme".to_string(),
            camera_model: "Sensor One".to_string(),
            width: 8,
            height: 6,
            active_area: Some([0, 0, 6, 8]),
            default_crop_origin: Some([1, 1]),
            default_crop_size: Some([6, 4]),
            cfa_layout: 1,
            bit_depth: Some(12),
            black_level: Some([64; 4]),
            white_level: 4095,
            rgain: 2.0,
            bgain: 4.0,
            anti_alias_strength: 0.25,
            iso: 200,
            exposure_time: 0.004,
            lens_aperture: 2.8,
            focal_length: 35.5,
            ..Default::default()
        }
    }

    #[test]
    fn neutral_is_reciprocal_of_gains() {
        assert_eq!(as_shot_neutral(2.0, 4.0).unwrap(), [0.5, 1.0, 0.25]);
    }

    #[test]
    fn zero_gain_is_rejected() {
        let err = as_shot_neutral(0.0, 1.0).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidGain { channel: "red", .. }));
        let err = as_shot_neutral(1.0, f32::NAN).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidGain { channel: "blue", .. }));
    }

    #[test]
    fn anti_alias_uses_micro_denominator() {
        assert_eq!(anti_alias_rational(0.25).unwrap(), URational::new(250_000, 1_000_000));
        assert_eq!(anti_alias_rational(1.0).unwrap(), URational::new(1_000_000, 1_000_000));
        assert!(anti_alias_rational(1.5).is_err());
    }

    #[test]
    fn maps_complete_metadata() {
        let mut negative = DngNegative::default();
        map_negative_fields(&complete_metadata(), &mut negative).unwrap();

        assert_eq!(negative.model_name(), "Sensor One");
        assert_eq!(negative.bayer_phase, Some(1));
        assert_eq!(negative.linearization.as_ref().map(Vec::len), Some(4096));
        assert_eq!(negative.quad_blacks, [64; 4]);
        assert_eq!(negative.white_level, 4095);
        assert_eq!(negative.active_area, Some(Rect::new(0, 0, 6, 8)));
        assert_eq!(negative.default_crop_origin, Some((1, 1)));
        assert_eq!(negative.default_crop_size, Some((6, 4)));
        assert_eq!(negative.camera_neutral(), Some([0.5, 1.0, 0.25]));
        assert_eq!(negative.anti_alias_strength, URational::new(250_000, 1_000_000));
        assert_eq!(negative.noise_reduction_applied, URational::new(0, 1));

        let exif = negative.exif();
        assert_eq!(exif.make, "Acme");
        assert_eq!(exif.iso_speed_ratings, [200, 0, 0]);
        assert_eq!(exif.exposure_time, Some(URational::new(1, 250)));
        assert_eq!(exif.f_number, Some(URational::new(28, 10)));
        assert_eq!(exif.focal_length, Some(URational::new(35_500, 1000)));
        assert_eq!(
            exif.lens_info,
            Some([
                URational::new(355, 10),
                URational::new(355, 10),
                URational::new(28, 10),
                URational::new(28, 10),
            ])
        );
    }

    #[test]
    fn missing_geometry_fails_without_touching_negative() {
        let meta = CaptureMetadata {
            active_area: None,
            ..complete_metadata()
        };
        let mut negative = DngNegative::default();
        let err = map_negative_fields(&meta, &mut negative).unwrap_err();
        assert!(matches!(err, ConversionError::MissingField("ActiveArea")));
        assert!(negative.model_name().is_empty());
        assert!(negative.linearization.is_none());
    }

    #[test]
    fn missing_bit_depth_and_black_level_fail_fast() {
        let meta = CaptureMetadata { bit_depth: None, ..complete_metadata() };
        assert!(matches!(
            map_negative_fields(&meta, &mut DngNegative::default()),
            Err(ConversionError::MissingField("bit_depth"))
        ));
        let meta = CaptureMetadata { black_level: None, ..complete_metadata() };
        assert!(matches!(
            map_negative_fields(&meta, &mut DngNegative::default()),
            Err(ConversionError::MissingField("BlackLevel"))
        ));
    }

    #[test]
    fn unset_gain_is_an_input_error() {
        let meta = CaptureMetadata { rgain: 0.0, ..complete_metadata() };
        let err = map_negative_fields(&meta, &mut DngNegative::default()).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidGain { .. }));
    }

    #[test]
    fn cfa_layout_out_of_range_is_a_library_error() {
        let meta = CaptureMetadata { cfa_layout: 9, ..complete_metadata() };
        let err = map_negative_fields(&meta, &mut DngNegative::default()).unwrap_err();
        assert!(matches!(err, ConversionError::Dng(_)));
    }
}
