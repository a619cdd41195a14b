//! The DNG negative: every non-pixel field of the container plus the staged images.

use tracing::debug;

use crate::image_pipeline::dng::error::{DngError, DngResult};
use crate::image_pipeline::dng::host::DngHost;
use crate::image_pipeline::dng::image::DngImage;
use crate::image_pipeline::dng::profile::CameraProfile;
use crate::image_pipeline::dng::stages::{self, LinearizationParams};
use crate::image_pipeline::dng::types::{ColorKey, Orientation, Rect, SRational, URational, XyCoord};
use crate::image_pipeline::dng::xmp;

/// EXIF and TIFF/EP capture settings.
#[derive(Debug, Clone, Default)]
pub struct DngExif {
    pub make: String,
    pub model: String,
    pub iso_speed_ratings: [u32; 3],
    pub white_balance: u16,
    pub metering_mode: u16,
    pub exposure_bias_value: SRational,
    pub f_number: Option<URational>,
    pub aperture_value: Option<URational>,
    pub exposure_time: Option<URational>,
    pub focal_length: Option<URational>,
    pub lens_info: Option<[URational; 4]>,
}

impl DngExif {
    /// Sets FNumber and the matching APEX ApertureValue.
    pub fn set_f_number(&mut self, f_number: f64) {
        if !(f_number.is_finite() && f_number > 0.0) {
            self.f_number = None;
            self.aperture_value = None;
            return;
        }
        self.f_number = Some(URational::from_real(f_number, 10));
        let apex = 2.0 * f_number.log2();
        self.aperture_value = Some(URational::from_real(apex.max(0.0), 1_000_000));
    }

    /// Sets ExposureTime, using an exact `1/N` form for reciprocal shutter speeds.
    pub fn set_exposure_time(&mut self, seconds: f64) {
        if !(seconds.is_finite() && seconds > 0.0) {
            self.exposure_time = None;
            return;
        }
        let reciprocal = 1.0 / seconds;
        self.exposure_time = if seconds < 1.0 && (reciprocal - reciprocal.round()).abs() < 1e-3 {
            Some(URational::new(1, reciprocal.round() as u32))
        } else {
            Some(URational::from_real(seconds, 1000))
        };
    }
}

#[derive(Debug, Clone)]
pub struct DngNegative {
    pub(crate) model_name: String,
    pub(crate) local_name: String,
    pub(crate) color_keys: [ColorKey; 3],
    pub(crate) color_channels: u32,
    pub(crate) bayer_phase: Option<u32>,
    pub(crate) linearization: Option<Vec<u16>>,
    pub(crate) quad_blacks: [u32; 4],
    pub(crate) white_level: u32,
    pub(crate) default_scale: (URational, URational),
    pub(crate) best_quality_scale: URational,
    pub(crate) active_area: Option<Rect>,
    pub(crate) default_crop_origin: Option<(u32, u32)>,
    pub(crate) default_crop_size: Option<(u32, u32)>,
    pub(crate) base_orientation: Orientation,
    pub(crate) camera_neutral: Option<[f64; 3]>,
    pub(crate) camera_white_xy: Option<XyCoord>,
    pub(crate) baseline_exposure: SRational,
    pub(crate) baseline_noise: URational,
    pub(crate) baseline_sharpness: URational,
    pub(crate) anti_alias_strength: URational,
    pub(crate) noise_reduction_applied: URational,
    pub(crate) software: Option<String>,
    pub(crate) exif: DngExif,
    pub(crate) profiles: Vec<CameraProfile>,
    pub(crate) stage1: Option<DngImage>,
    pub(crate) stage2: Option<DngImage>,
    pub(crate) stage3: Option<DngImage>,
    pub(crate) xmp: Option<Vec<u8>>,
}

impl Default for DngNegative {
    fn default() -> Self {
        let one = URational::new(1, 1);
        Self {
            model_name: String::new(),
            local_name: String::new(),
            color_keys: [ColorKey::Red, ColorKey::Green, ColorKey::Blue],
            color_channels: 3,
            bayer_phase: None,
            linearization: None,
            quad_blacks: [0; 4],
            white_level: u16::MAX as u32,
            default_scale: (one, one),
            best_quality_scale: one,
            active_area: None,
            default_crop_origin: None,
            default_crop_size: None,
            base_orientation: Orientation::Normal,
            camera_neutral: None,
            camera_white_xy: None,
            baseline_exposure: SRational::new(0, 1),
            baseline_noise: one,
            baseline_sharpness: one,
            anti_alias_strength: one,
            noise_reduction_applied: URational::new(0, 1),
            software: None,
            exif: DngExif::default(),
            profiles: Vec::new(),
            stage1: None,
            stage2: None,
            stage3: None,
            xmp: None,
        }
    }
}

impl DngNegative {
    pub fn set_model_name(&mut self, name: &str) {
        self.model_name = name.to_string();
    }

    pub fn set_local_name(&mut self, name: &str) {
        self.local_name = name.to_string();
    }

    pub fn set_color_keys(&mut self, key0: ColorKey, key1: ColorKey, key2: ColorKey) {
        self.color_keys = [key0, key1, key2];
    }

    /// Selects the 2x2 Bayer arrangement: 0 GRBG, 1 RGGB, 2 BGGR, 3 GBRG.
    pub fn set_bayer_mosaic(&mut self, phase: u32) -> DngResult<()> {
        stages::cfa_for_phase(phase)?;
        self.bayer_phase = Some(phase);
        Ok(())
    }

    pub fn set_color_channels(&mut self, channels: u32) {
        self.color_channels = channels;
    }

    pub fn set_linearization(&mut self, table: Vec<u16>) {
        self.linearization = Some(table);
    }

    pub fn set_quad_blacks(&mut self, b0: u32, b1: u32, b2: u32, b3: u32) {
        self.quad_blacks = [b0, b1, b2, b3];
    }

    pub fn set_white_level(&mut self, white: u32) {
        self.white_level = white;
    }

    pub fn set_default_scale(&mut self, horizontal: URational, vertical: URational) {
        self.default_scale = (horizontal, vertical);
    }

    pub fn set_best_quality_scale(&mut self, scale: URational) {
        self.best_quality_scale = scale;
    }

    pub fn set_active_area(&mut self, area: Rect) {
        self.active_area = Some(area);
    }

    pub fn set_default_crop_origin(&mut self, x: u32, y: u32) {
        self.default_crop_origin = Some((x, y));
    }

    pub fn set_default_crop_size(&mut self, width: u32, height: u32) {
        self.default_crop_size = Some((width, height));
    }

    pub fn set_base_orientation(&mut self, orientation: Orientation) {
        self.base_orientation = orientation;
    }

    pub fn set_camera_neutral(&mut self, neutral: [f64; 3]) -> DngResult<()> {
        if neutral.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(DngError::BadFormat(format!("invalid camera neutral {:?}", neutral)));
        }
        self.camera_neutral = Some(neutral);
        Ok(())
    }

    pub fn set_camera_white_xy(&mut self, white: XyCoord) {
        self.camera_white_xy = Some(white);
    }

    pub fn set_baseline_exposure(&mut self, ev: f64) {
        self.baseline_exposure = SRational::from_real(ev, 100);
    }

    pub fn set_baseline_sharpness(&mut self, sharpness: f64) {
        self.baseline_sharpness = URational::from_real(sharpness, 100);
    }

    pub fn set_anti_alias_strength(&mut self, strength: URational) {
        self.anti_alias_strength = strength;
    }

    pub fn set_noise_reduction_applied(&mut self, value: URational) {
        self.noise_reduction_applied = value;
    }

    pub fn set_software(&mut self, software: &str) {
        self.software = Some(software.to_string());
    }

    pub fn exif(&self) -> &DngExif {
        &self.exif
    }

    pub fn exif_mut(&mut self) -> &mut DngExif {
        &mut self.exif
    }

    pub fn add_profile(&mut self, profile: CameraProfile) {
        self.profiles.push(profile);
    }

    pub fn profiles(&self) -> &[CameraProfile] {
        &self.profiles
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn camera_neutral(&self) -> Option<[f64; 3]> {
        self.camera_neutral
    }

    pub fn xmp_packet(&self) -> Option<&[u8]> {
        self.xmp.as_deref()
    }

    pub fn set_stage1_image(&mut self, image: DngImage) {
        self.stage1 = Some(image);
        self.stage2 = None;
        self.stage3 = None;
    }

    pub fn stage1_image(&self) -> Option<&DngImage> {
        self.stage1.as_ref()
    }

    pub fn stage2_image(&self) -> Option<&DngImage> {
        self.stage2.as_ref()
    }

    pub fn stage3_image(&self) -> Option<&DngImage> {
        self.stage3.as_ref()
    }

    /// Active area, defaulting to the full stage 1 bounds.
    pub fn active_area(&self) -> Option<Rect> {
        self.active_area.or_else(|| self.stage1.as_ref().map(DngImage::bounds))
    }

    pub fn build_stage2_image(&mut self, _host: &DngHost) -> DngResult<()> {
        let (Some(stage1), Some(active_area)) = (self.stage1.as_ref(), self.active_area()) else {
            return Err(DngError::BadFormat("stage 1 image not set".to_string()));
        };
        let params = LinearizationParams {
            active_area,
            table: self.linearization.as_deref(),
            quad_blacks: self.quad_blacks,
            white_level: self.white_level,
        };
        self.stage2 = Some(stages::linearize(stage1, &params)?);
        Ok(())
    }

    pub fn build_stage3_image(&mut self, _host: &DngHost) -> DngResult<()> {
        let stage2 = self
            .stage2
            .as_ref()
            .ok_or_else(|| DngError::BadFormat("stage 2 image not built".to_string()))?;
        let phase = self
            .bayer_phase
            .ok_or_else(|| DngError::BadFormat("bayer mosaic not set".to_string()))?;
        self.stage3 = Some(stages::demosaic(stage2, phase)?);
        Ok(())
    }

    /// Reconciles the EXIF identity fields with the negative's model name.
    pub fn synchronize_metadata(&mut self) {
        if self.exif.model.is_empty() {
            self.exif.model = self.model_name.clone();
        } else if self.model_name.is_empty() {
            self.model_name = self.exif.model.clone();
        }
        if self.local_name.is_empty() {
            self.local_name = self.model_name.clone();
        }
        debug!(make = %self.exif.make, model = %self.exif.model, "Synchronized metadata");
    }

    /// Regenerates the embedded XMP packet from the current fields.
    pub fn rebuild_embedded_metadata(&mut self) {
        self.xmp = Some(xmp::build_packet(self).into_bytes());
    }

    /// Checks the invariants a readable DNG needs before it is written.
    pub fn validate(&self) -> DngResult<()> {
        let (Some(stage1), Some(active)) = (self.stage1.as_ref(), self.active_area()) else {
            return Err(DngError::BadFormat("stage 1 image not set".to_string()));
        };
        if self.bayer_phase.is_none() {
            return Err(DngError::BadFormat("bayer mosaic not set".to_string()));
        }
        if active.is_empty() || !stage1.bounds().contains(&active) {
            return Err(DngError::BadFormat(format!(
                "active area {:?} outside image bounds {:?}",
                active,
                stage1.bounds()
            )));
        }
        let (Some((x, y)), Some((width, height))) = (self.default_crop_origin, self.default_crop_size) else {
            return Err(DngError::BadFormat("default crop not set".to_string()));
        };
        if width == 0
            || height == 0
            || x as u64 + width as u64 > active.width() as u64
            || y as u64 + height as u64 > active.height() as u64
        {
            return Err(DngError::BadFormat(format!(
                "default crop {}x{}+{}+{} outside active area {}x{}",
                width,
                height,
                x,
                y,
                active.width(),
                active.height()
            )));
        }
        if self.profiles.is_empty() {
            return Err(DngError::BadFormat("no camera profile attached".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::dng::types::PixelType;

    #[test]
    fn exposure_time_prefers_reciprocal_form() {
        let mut exif = DngExif::default();
        exif.set_exposure_time(1.0 / 125.0);
        assert_eq!(exif.exposure_time, Some(URational::new(1, 125)));
        exif.set_exposure_time(2.5);
        assert_eq!(exif.exposure_time, Some(URational::new(2500, 1000)));
        exif.set_exposure_time(0.0);
        assert_eq!(exif.exposure_time, None);
    }

    #[test]
    fn f_number_sets_apex_aperture() {
        let mut exif = DngExif::default();
        exif.set_f_number(4.0);
        assert_eq!(exif.f_number, Some(URational::new(40, 10)));
        assert_eq!(exif.aperture_value, Some(URational::new(4_000_000, 1_000_000)));
    }

    #[test]
    fn bayer_phase_out_of_range_is_rejected() {
        let mut negative = DngNegative::default();
        assert!(negative.set_bayer_mosaic(3).is_ok());
        assert!(negative.set_bayer_mosaic(4).is_err());
        assert_eq!(negative.bayer_phase, Some(3));
    }

    #[test]
    fn camera_neutral_must_be_positive() {
        let mut negative = DngNegative::default();
        assert!(negative.set_camera_neutral([0.5, 1.0, f64::INFINITY]).is_err());
        assert!(negative.set_camera_neutral([0.5, 1.0, 0.25]).is_ok());
    }

    #[test]
    fn stage_images_build_in_order() {
        let host = DngHost::new();
        let mut negative = host.make_negative();
        assert!(negative.build_stage2_image(&host).is_err());

        let image = DngImage::from_samples(Rect::from_size(4, 4), 1, PixelType::Short, vec![512; 16]).unwrap();
        negative.set_stage1_image(image);
        negative.set_white_level(1023);
        negative.set_bayer_mosaic(1).unwrap();
        negative.build_stage2_image(&host).unwrap();
        negative.build_stage3_image(&host).unwrap();
        assert_eq!(negative.stage3_image().map(DngImage::planes), Some(3));
    }

    #[test]
    fn active_area_defaults_to_stage1_bounds() {
        let mut negative = DngNegative::default();
        assert_eq!(negative.active_area(), None);

        let image = DngImage::from_samples(Rect::from_size(4, 4), 1, PixelType::Short, vec![0; 16]).unwrap();
        negative.set_stage1_image(image);
        assert_eq!(negative.active_area(), Some(Rect::from_size(4, 4)));

        negative.set_active_area(Rect::new(0, 0, 2, 4));
        assert_eq!(negative.active_area(), Some(Rect::new(0, 0, 2, 4)));
        negative.set_white_level(1023);
        negative.set_bayer_mosaic(1).unwrap();
        negative.build_stage2_image(&DngHost::new()).unwrap();
        assert_eq!(negative.stage2_image().map(DngImage::bounds), Some(Rect::new(0, 0, 2, 4)));
    }

    #[test]
    fn default_crop_size_is_width_then_height() {
        let mut negative = DngNegative::default();
        let image = DngImage::from_samples(Rect::from_size(4, 8), 1, PixelType::Short, vec![0; 32]).unwrap();
        negative.set_stage1_image(image);
        negative.set_bayer_mosaic(1).unwrap();
        negative.set_default_crop_origin(0, 0);

        negative.set_default_crop_size(4, 8);
        match negative.validate() {
            Err(DngError::BadFormat(msg)) => assert!(msg.starts_with("default crop 4x8"), "{}", msg),
            other => panic!("unexpected result: {:?}", other),
        }

        negative.set_default_crop_size(8, 4);
        match negative.validate() {
            Err(DngError::BadFormat(msg)) => assert_eq!(msg, "no camera profile attached"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn synchronize_fills_exif_model() {
        let mut negative = DngNegative::default();
        negative.set_model_name("X100");
        negative.synchronize_metadata();
        assert_eq!(negative.exif().model, "X100");
        assert_eq!(negative.local_name, "X100");
    }
}
