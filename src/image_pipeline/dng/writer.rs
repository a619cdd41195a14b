use std::io::{Seek, Write};

use tiff::encoder::{DirectoryEncoder, Rational, SRational, TiffEncoder, TiffKind, colortype};
use tiff::tags::Tag;
use tracing::debug;

use crate::image_pipeline::dng::error::{DngError, DngResult};
use crate::image_pipeline::dng::host::DngHost;
use crate::image_pipeline::dng::negative::DngNegative;
use crate::image_pipeline::dng::preview;
use crate::image_pipeline::dng::profile::{CameraProfile, ProfileValue};
use crate::image_pipeline::dng::tags;
use crate::image_pipeline::dng::types::{DngCompression, DngVersion, URational};

/// Output sink accepted by [`NegativeWriter`].
pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek> WriteSeek for T {}

/// Serialization settings for a single DNG file.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub version: DngVersion,
    pub compression: DngCompression,
    /// Longest thumbnail side in pixels, `None` to omit the thumbnail IFD.
    pub thumbnail_size: Option<u32>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: DngVersion::default(),
            compression: DngCompression::Uncompressed,
            thumbnail_size: Some(256),
        }
    }
}

pub trait NegativeWriter {
    fn write_dng(
        &self,
        host: &DngHost,
        output: &mut dyn WriteSeek,
        negative: &DngNegative,
        options: &WriteOptions,
    ) -> DngResult<()>;
}

/// Writes the stage 1 mosaic in IFD0 and an optional RGB thumbnail in IFD1.
pub struct TiffDngWriter;

fn tag(code: u16) -> Tag {
    Tag::Unknown(code)
}

fn rationals(values: &[URational]) -> Vec<Rational> {
    values.iter().copied().map(Rational::from).collect()
}

impl NegativeWriter for TiffDngWriter {
    fn write_dng(
        &self,
        _host: &DngHost,
        output: &mut dyn WriteSeek,
        negative: &DngNegative,
        options: &WriteOptions,
    ) -> DngResult<()> {
        negative.validate()?;
        let stage1 = negative
            .stage1_image()
            .ok_or_else(|| DngError::BadFormat("stage 1 image not set".to_string()))?;
        debug!(
            width = stage1.width(),
            height = stage1.height(),
            version = ?options.version,
            "Encoding DNG"
        );

        let compression = match options.compression {
            DngCompression::Uncompressed => tiff::encoder::Compression::Uncompressed,
        };
        let mut encoder = TiffEncoder::new(output)?.with_compression(compression);

        let mut image = encoder.new_image::<colortype::Gray16>(stage1.width(), stage1.height())?;
        write_raw_tags(image.encoder(), negative, options)?;
        image.write_data(stage1.samples())?;

        if let (Some(max_side), Some(stage3)) = (options.thumbnail_size, negative.stage3_image()) {
            let thumbnail = preview::render_thumbnail(stage3, negative.camera_neutral(), max_side);
            debug!(width = thumbnail.width, height = thumbnail.height, "Encoding thumbnail");
            let mut thumb = encoder.new_image::<colortype::RGB8>(thumbnail.width, thumbnail.height)?;
            thumb.encoder().write_tag(tag(tags::NEW_SUBFILE_TYPE), 1u32)?;
            thumb.write_data(&thumbnail.data)?;
        }

        debug!("DNG encoding complete");
        Ok(())
    }
}

fn write_raw_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    negative: &DngNegative,
    options: &WriteOptions,
) -> DngResult<()> {
    dir.write_tag(tag(tags::NEW_SUBFILE_TYPE), 0u32)?;
    dir.write_tag(tag(tags::PHOTOMETRIC_INTERPRETATION), tags::PHOTOMETRIC_CFA)?;
    dir.write_tag(tag(tags::DNG_VERSION), &options.version.bytes()[..])?;
    dir.write_tag(tag(tags::DNG_BACKWARD_VERSION), &DngVersion::V1_1.bytes()[..])?;
    dir.write_tag(tag(tags::ORIENTATION), negative.base_orientation.tiff_value())?;

    // Identity
    let exif = negative.exif();
    if !exif.make.is_empty() {
        dir.write_tag(tag(tags::MAKE), exif.make.as_str())?;
    }
    if !exif.model.is_empty() {
        dir.write_tag(tag(tags::MODEL), exif.model.as_str())?;
    }
    if let Some(software) = negative.software.as_deref() {
        dir.write_tag(tag(tags::SOFTWARE), software)?;
    }
    let unique_model = if negative.model_name.is_empty() { "Unknown" } else { negative.model_name.as_str() };
    dir.write_tag(tag(tags::UNIQUE_CAMERA_MODEL), unique_model)?;
    if !negative.local_name.is_empty() {
        dir.write_tag(tag(tags::LOCALIZED_CAMERA_MODEL), negative.local_name.as_str())?;
    }

    // Mosaic
    let phase = negative
        .bayer_phase
        .ok_or_else(|| DngError::BadFormat("bayer mosaic not set".to_string()))?;
    let [c0, c1, c2] = negative.color_keys.map(|k| k as u8);
    let pattern = match phase {
        0 => [c1, c0, c2, c1],
        1 => [c0, c1, c1, c2],
        2 => [c2, c1, c1, c0],
        _ => [c1, c2, c0, c1],
    };
    dir.write_tag(tag(tags::CFA_REPEAT_PATTERN_DIM), &[2u16, 2][..])?;
    dir.write_tag(tag(tags::CFA_PATTERN), &pattern[..])?;
    dir.write_tag(tag(tags::CFA_PLANE_COLOR), &[c0, c1, c2][..])?;
    dir.write_tag(tag(tags::CFA_LAYOUT), 1u16)?;

    // Levels
    if let Some(table) = negative.linearization.as_deref() {
        dir.write_tag(tag(tags::LINEARIZATION_TABLE), table)?;
    }
    dir.write_tag(tag(tags::BLACK_LEVEL_REPEAT_DIM), &[2u16, 2][..])?;
    dir.write_tag(tag(tags::BLACK_LEVEL), &negative.quad_blacks[..])?;
    dir.write_tag(tag(tags::WHITE_LEVEL), negative.white_level)?;

    // Geometry
    let (scale_h, scale_v) = negative.default_scale;
    dir.write_tag(tag(tags::DEFAULT_SCALE), &rationals(&[scale_h, scale_v])[..])?;
    dir.write_tag(tag(tags::BEST_QUALITY_SCALE), Rational::from(negative.best_quality_scale))?;
    if let Some(area) = negative.active_area {
        dir.write_tag(tag(tags::ACTIVE_AREA), &[area.top, area.left, area.bottom, area.right][..])?;
    }
    if let Some((x, y)) = negative.default_crop_origin {
        dir.write_tag(tag(tags::DEFAULT_CROP_ORIGIN), &[x, y][..])?;
    }
    if let Some((width, height)) = negative.default_crop_size {
        dir.write_tag(tag(tags::DEFAULT_CROP_SIZE), &[width, height][..])?;
    }

    // Calibration. AsShotNeutral and AsShotWhiteXY are mutually exclusive.
    if let Some(neutral) = negative.camera_neutral {
        let values = neutral.map(|v| URational::from_real(v, 1_000_000));
        dir.write_tag(tag(tags::AS_SHOT_NEUTRAL), &rationals(&values)[..])?;
    } else if let Some(white) = negative.camera_white_xy {
        let values = [URational::from_real(white.x, 1_000_000), URational::from_real(white.y, 1_000_000)];
        dir.write_tag(tag(tags::AS_SHOT_WHITE_XY), &rationals(&values)[..])?;
    }
    dir.write_tag(tag(tags::BASELINE_EXPOSURE), SRational::from(negative.baseline_exposure))?;
    dir.write_tag(tag(tags::BASELINE_NOISE), Rational::from(negative.baseline_noise))?;
    dir.write_tag(tag(tags::BASELINE_SHARPNESS), Rational::from(negative.baseline_sharpness))?;
    dir.write_tag(tag(tags::ANTI_ALIAS_STRENGTH), Rational::from(negative.anti_alias_strength))?;
    dir.write_tag(tag(tags::NOISE_REDUCTION_APPLIED), Rational::from(negative.noise_reduction_applied))?;

    // Capture settings
    if exif.iso_speed_ratings[0] != 0 {
        let iso = exif.iso_speed_ratings[0].min(u16::MAX as u32) as u16;
        dir.write_tag(tag(tags::ISO_SPEED_RATINGS), iso)?;
    }
    dir.write_tag(tag(tags::WHITE_BALANCE), exif.white_balance)?;
    dir.write_tag(tag(tags::METERING_MODE), exif.metering_mode)?;
    dir.write_tag(tag(tags::EXPOSURE_BIAS_VALUE), SRational::from(exif.exposure_bias_value))?;
    if let Some(t) = exif.exposure_time {
        dir.write_tag(tag(tags::EXPOSURE_TIME), Rational::from(t))?;
    }
    if let Some(f) = exif.f_number {
        dir.write_tag(tag(tags::F_NUMBER), Rational::from(f))?;
    }
    if let Some(av) = exif.aperture_value {
        dir.write_tag(tag(tags::APERTURE_VALUE), Rational::from(av))?;
    }
    if let Some(fl) = exif.focal_length {
        dir.write_tag(tag(tags::FOCAL_LENGTH), Rational::from(fl))?;
    }
    if let Some(lens) = exif.lens_info {
        dir.write_tag(tag(tags::LENS_INFO), &rationals(&lens)[..])?;
    }

    if let Some(profile) = negative.profiles().first() {
        write_profile_tags(dir, profile)?;
        if negative.profiles().len() > 1 {
            debug!(count = negative.profiles().len() - 1, "Extra camera profiles not embedded");
        }
    }

    if let Some(xmp) = negative.xmp_packet() {
        dir.write_tag(tag(tags::XMP), xmp)?;
    }
    Ok(())
}

fn write_profile_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    profile: &CameraProfile,
) -> DngResult<()> {
    for entry in profile.entries() {
        if entry.tag == tags::UNIQUE_CAMERA_MODEL {
            continue;
        }
        let t = tag(entry.tag);
        match &entry.value {
            ProfileValue::Byte(v) => dir.write_tag(t, &v[..])?,
            ProfileValue::Ascii(s) => dir.write_tag(t, s.as_str())?,
            ProfileValue::Short(v) => dir.write_tag(t, &v[..])?,
            ProfileValue::Long(v) => dir.write_tag(t, &v[..])?,
            ProfileValue::Rational(v) => {
                let values: Vec<Rational> = v.iter().map(|&(n, d)| Rational { n, d }).collect();
                dir.write_tag(t, &values[..])?
            }
            ProfileValue::SByte(v) => dir.write_tag(t, &v[..])?,
            ProfileValue::SShort(v) => dir.write_tag(t, &v[..])?,
            ProfileValue::SLong(v) => dir.write_tag(t, &v[..])?,
            ProfileValue::SRational(v) => {
                let values: Vec<SRational> = v.iter().map(|&(n, d)| SRational { n, d }).collect();
                dir.write_tag(t, &values[..])?
            }
            ProfileValue::Float(v) => dir.write_tag(t, &v[..])?,
            ProfileValue::Double(v) => dir.write_tag(t, &v[..])?,
        }
    }
    Ok(())
}
