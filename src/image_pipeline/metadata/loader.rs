use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::metadata::sidecar::{BASIC_INFORMATION, BasicInformation, COMMENT_MARKER};
use crate::image_pipeline::metadata::types::{CaptureMetadata, Diagnostic};

pub const MIN_BIT_DEPTH: u32 = 1;
pub const MAX_BIT_DEPTH: u32 = 16;

/// Populated metadata together with the non-fatal findings of the load.
#[derive(Debug, Clone, Default)]
pub struct LoadedMetadata {
    pub metadata: CaptureMetadata,
    pub diagnostics: Vec<Diagnostic>,
}

/// Reads a JSON sidecar into a [`CaptureMetadata`].
#[derive(Debug, Clone)]
pub struct MetadataLoader {
    strict: bool,
}

impl Default for MetadataLoader {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl MetadataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// When disabled, a document that is not a JSON object is treated as
    /// empty and reported as a diagnostic instead of failing the load.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Loads the sidecar at `path`. No path (or an empty one) yields defaults.
    #[instrument(skip(self))]
    pub fn load(&self, path: Option<&Path>) -> Result<LoadedMetadata> {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            debug!("No metadata file supplied, using defaults");
            return Ok(LoadedMetadata::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConversionError::MetadataReadError {
            path: path.display().to_string(),
            source,
        })?;
        self.load_str(&text, &path.display().to_string())
    }

    /// Parses sidecar text; `origin` names the document in errors.
    ///
    /// Leniency covers documents that cannot be read as a JSON object at all.
    /// A recognised key holding the wrong type is always an error naming the key.
    pub fn load_str(&self, text: &str, origin: &str) -> Result<LoadedMetadata> {
        let mut loaded = LoadedMetadata::default();
        let mut document = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(document)) => document,
            Ok(other) => return self.reject(loaded, origin, format!("expected a JSON object, got {}", other)),
            Err(e) => return self.reject(loaded, origin, e.to_string()),
        };

        let section = document.remove(BASIC_INFORMATION);
        for key in document.into_iter().map(|(k, _)| k).filter(|k| !k.starts_with(COMMENT_MARKER)) {
            loaded.diagnostics.push(Diagnostic::UnknownKey { section: None, key });
        }
        match section {
            None | Some(Value::Null) => {}
            Some(Value::Object(section)) => apply_section(section, &mut loaded.metadata, &mut loaded.diagnostics)?,
            Some(other) => {
                return Err(ConversionError::InvalidField {
                    field: BASIC_INFORMATION,
                    reason: format!("expected an object, got {}", other),
                });
            }
        }
        debug!(diagnostics = loaded.diagnostics.len(), "Metadata loaded");
        Ok(loaded)
    }

    fn reject(&self, mut loaded: LoadedMetadata, origin: &str, reason: String) -> Result<LoadedMetadata> {
        if self.strict {
            return Err(ConversionError::MetadataParseError {
                path: origin.to_string(),
                reason,
            });
        }
        loaded.diagnostics.push(Diagnostic::MalformedDocument { reason });
        Ok(loaded)
    }
}

/// Expands a `BlackLevel` entry to one value per CFA phase.
pub fn resolve_black_level(values: &[u32]) -> Result<[u32; 4]> {
    match *values {
        [v] => Ok([v; 4]),
        [a, b, c, d] => Ok([a, b, c, d]),
        _ => Err(ConversionError::InvalidField {
            field: "BlackLevel",
            reason: format!("expected 1 or 4 values, got {}", values.len()),
        }),
    }
}

fn fixed<const N: usize>(field: &'static str, values: Vec<u32>) -> Result<[u32; N]> {
    let len = values.len();
    values.try_into().map_err(|_| ConversionError::InvalidField {
        field,
        reason: format!("expected {} values, got {}", N, len),
    })
}

fn apply_section(mut fields: Map<String, Value>, meta: &mut CaptureMetadata, diagnostics: &mut Vec<Diagnostic>) -> Result<()> {
    let section = BasicInformation::take_from(&mut fields)?;
    if let Some(v) = section.input_file {
        meta.input_file = v;
    }
    if let Some(v) = section.camera_maker {
        meta.camera_maker = v;
    }
    if let Some(v) = section.camera_model {
        meta.camera_model = v;
    }
    // Profile identity follows the camera identity unless overridden.
    meta.profile_copy_right = section.profile_copy_right.unwrap_or_else(|| meta.camera_maker.clone());
    meta.profile_name = section.profile_name.unwrap_or_else(|| meta.camera_model.clone());

    if let Some(v) = section.width {
        meta.width = v;
    }
    if let Some(v) = section.height {
        meta.height = v;
    }
    if let Some(v) = section.active_area {
        meta.active_area = Some(fixed("ActiveArea", v)?);
    }
    if let Some(v) = section.default_crop_origin {
        meta.default_crop_origin = Some(fixed("DefaultCropOrigin", v)?);
    }
    if let Some(v) = section.default_crop_size {
        meta.default_crop_size = Some(fixed("DefaultCropSize", v)?);
    }
    if let Some(v) = section.cfa_layout {
        meta.cfa_layout = v;
    }
    if let Some(v) = section.bit_depth {
        if !(MIN_BIT_DEPTH..=MAX_BIT_DEPTH).contains(&v) {
            return Err(ConversionError::InvalidField {
                field: "bit_depth",
                reason: format!("{} is outside {}..={}", v, MIN_BIT_DEPTH, MAX_BIT_DEPTH),
            });
        }
        meta.bit_depth = Some(v);
    }
    if let Some(v) = section.black_level {
        meta.black_level = Some(resolve_black_level(v.as_slice())?);
    }
    if let Some(v) = section.white_level {
        meta.white_level = v;
    }
    if let Some(v) = section.rgain {
        meta.rgain = v;
    }
    if let Some(v) = section.bgain {
        meta.bgain = v;
    }
    if let Some(v) = section.anti_alias_strength {
        meta.anti_alias_strength = v;
    }
    if let Some(v) = section.iso {
        meta.iso = v;
    }
    if let Some(v) = section.exposure_time {
        meta.exposure_time = v;
    }
    if let Some(v) = section.lens_aperture {
        meta.lens_aperture = v;
    }
    if let Some(v) = section.focal_length {
        meta.focal_length = v;
    }

    for key in fields.into_iter().map(|(k, _)| k).filter(|k| !k.starts_with(COMMENT_MARKER)) {
        diagnostics.push(Diagnostic::UnknownKey {
            section: Some(BASIC_INFORMATION.to_string()),
            key,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r##"{
        "#comment": "top-level comment",
        "basic_information": {
            "#source": "bench rig",
            "input_file": "capture.raw",
            "camera_maker": "Acme",
            "camera_model": "Sensor One",
            "width": 64,
            "height": 48,
            "ActiveArea": [0, 0, 48, 64],
            "DefaultCropOrigin": [2, 2],
            "DefaultCropSize": [60, 44],
            "CfaLayout": 1,
            "bit_depth": 12,
            "BlackLevel": [64],
            "WhiteLevel": 4095,
            "rgain": 1.8,
            "bgain": 1.4,
            "AntiAliasStrength": 0.25,
            "ISO": 100,
            "exposure_time": 0.01,
            "lens_aperture": 2.8,
            "focal_length": 35
        }
    }"##;

    fn load(text: &str) -> Result<LoadedMetadata> {
        MetadataLoader::new().load_str(text, "test.json")
    }

    #[test]
    fn loads_every_recognized_key() {
        let loaded = load(FULL).unwrap();
        let meta = loaded.metadata;
        assert!(loaded.diagnostics.is_empty());
        assert_eq!(meta.input_file, "capture.raw");
        assert_eq!((meta.width, meta.height), (64, 48));
        assert_eq!(meta.active_area, Some([0, 0, 48, 64]));
        assert_eq!(meta.default_crop_origin, Some([2, 2]));
        assert_eq!(meta.default_crop_size, Some([60, 44]));
        assert_eq!(meta.cfa_layout, 1);
        assert_eq!(meta.bit_depth, Some(12));
        assert_eq!(meta.black_level, Some([64; 4]));
        assert_eq!(meta.white_level, 4095);
        assert_eq!(meta.rgain, 1.8);
        assert_eq!(meta.bgain, 1.4);
        assert_eq!(meta.anti_alias_strength, 0.25);
        assert_eq!(meta.iso, 100);
        assert_eq!(meta.exposure_time, 0.01);
        assert_eq!(meta.lens_aperture, 2.8);
        assert_eq!(meta.focal_length, 35.0);
    }

    #[test]
    fn profile_identity_derives_from_camera() {
        let meta = load(FULL).unwrap().metadata;
        assert_eq!(meta.profile_copy_right, "Acme");
        assert_eq!(meta.profile_name, "Sensor One");
    }

    #[test]
    fn explicit_profile_identity_wins() {
        let text = r#"{"basic_information": {
            "camera_maker": "Acme", "camera_model": "Sensor One",
            "profile_name": "Studio", "profile_copy_right": "Lab"
        }}"#;
        let meta = load(text).unwrap().metadata;
        assert_eq!(meta.profile_name, "Studio");
        assert_eq!(meta.profile_copy_right, "Lab");
    }

    #[test]
    fn black_level_broadcasts_single_value() {
        assert_eq!(resolve_black_level(&[64]).unwrap(), [64, 64, 64, 64]);
        assert_eq!(resolve_black_level(&[1, 2, 3, 4]).unwrap(), [1, 2, 3, 4]);
        assert!(resolve_black_level(&[1, 2]).is_err());
        assert!(resolve_black_level(&[]).is_err());

        let meta = load(r#"{"basic_information": {"BlackLevel": 128}}"#).unwrap().metadata;
        assert_eq!(meta.black_level, Some([128; 4]));
    }

    #[test]
    fn wrong_array_length_is_an_input_error() {
        let err = load(r#"{"basic_information": {"ActiveArea": [0, 0, 10]}}"#).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidField { field: "ActiveArea", .. }));
        let err = load(r#"{"basic_information": {"DefaultCropSize": [1, 2, 3]}}"#).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidField { field: "DefaultCropSize", .. }));
    }

    #[test]
    fn bit_depth_out_of_range_is_rejected() {
        let err = load(r#"{"basic_information": {"bit_depth": 17}}"#).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidField { field: "bit_depth", .. }));
    }

    #[test]
    fn unknown_keys_are_diagnosed_and_comments_ignored() {
        let text = r##"{
            "extras": {},
            "#top": 1,
            "basic_information": {"lens_model": "50mm", "#why": "x", "ISO": 200}
        }"##;
        let loaded = load(text).unwrap();
        assert_eq!(loaded.metadata.iso, 200);
        assert_eq!(
            loaded.diagnostics,
            vec![
                Diagnostic::UnknownKey { section: None, key: "extras".to_string() },
                Diagnostic::UnknownKey {
                    section: Some("basic_information".to_string()),
                    key: "lens_model".to_string(),
                },
            ]
        );
    }

    #[test]
    fn malformed_document_fails_when_strict() {
        let err = load("{ not json").unwrap_err();
        assert!(matches!(err, ConversionError::MetadataParseError { .. }));
    }

    #[test]
    fn malformed_document_is_diagnosed_when_lenient() {
        let loaded = MetadataLoader::new().strict(false).load_str("{ not json", "x").unwrap();
        assert_eq!(loaded.metadata, CaptureMetadata::default());
        assert!(matches!(loaded.diagnostics[..], [Diagnostic::MalformedDocument { .. }]));
    }

    #[test]
    fn wrong_value_type_names_the_key() {
        let err = load(r#"{"basic_information": {"width": "wide"}}"#).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidField { field: "width", .. }));
        let err = load(r#"{"basic_information": {"BlackLevel": [1.5]}}"#).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidField { field: "BlackLevel", .. }));
        let err = load(r#"{"basic_information": {"ISO": -100}}"#).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidField { field: "ISO", .. }));
    }

    #[test]
    fn lenient_mode_still_rejects_bad_values() {
        let lenient = MetadataLoader::new().strict(false);
        let err = lenient
            .load_str(r#"{"basic_information": {"width": 64, "height": "tall"}}"#, "x")
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidField { field: "height", .. }));

        let loaded = lenient.load_str("[1, 2]", "x").unwrap();
        assert_eq!(loaded.metadata, CaptureMetadata::default());
        assert!(matches!(loaded.diagnostics[..], [Diagnostic::MalformedDocument { .. }]));
    }

    #[test]
    fn section_must_be_an_object() {
        let err = load(r#"{"basic_information": [1, 2]}"#).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidField { field: "basic_information", .. }));
        let meta = load(r#"{"basic_information": null}"#).unwrap().metadata;
        assert_eq!(meta, CaptureMetadata::default());
    }

    #[test]
    fn non_object_document_fails_when_strict() {
        let err = load("42").unwrap_err();
        assert!(matches!(err, ConversionError::MetadataParseError { .. }));
    }

    #[test]
    fn no_path_leaves_defaults() {
        let loaded = MetadataLoader::new().load(None).unwrap();
        assert_eq!(loaded.metadata, CaptureMetadata::default());
        let loaded = MetadataLoader::new().load(Some(Path::new(""))).unwrap();
        assert!(loaded.diagnostics.is_empty());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = MetadataLoader::new().load(Some(Path::new("/nonexistent/meta.json"))).unwrap_err();
        assert!(matches!(err, ConversionError::MetadataReadError { .. }));
    }
}
