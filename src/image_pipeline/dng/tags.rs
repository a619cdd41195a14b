//! TIFF, TIFF/EP, EXIF and DNG tag codes written by the DNG writer

pub const NEW_SUBFILE_TYPE: u16 = 254;
pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
pub const MAKE: u16 = 271;
pub const MODEL: u16 = 272;
pub const ORIENTATION: u16 = 274;
pub const SOFTWARE: u16 = 305;
pub const XMP: u16 = 700;

pub const CFA_REPEAT_PATTERN_DIM: u16 = 33421;
pub const CFA_PATTERN: u16 = 33422;
pub const EXPOSURE_TIME: u16 = 33434;
pub const F_NUMBER: u16 = 33437;
pub const ISO_SPEED_RATINGS: u16 = 34855;
pub const APERTURE_VALUE: u16 = 37378;
pub const EXPOSURE_BIAS_VALUE: u16 = 37380;
pub const METERING_MODE: u16 = 37383;
pub const FOCAL_LENGTH: u16 = 37386;
pub const WHITE_BALANCE: u16 = 41987;

pub const DNG_VERSION: u16 = 50706;
pub const DNG_BACKWARD_VERSION: u16 = 50707;
pub const UNIQUE_CAMERA_MODEL: u16 = 50708;
pub const LOCALIZED_CAMERA_MODEL: u16 = 50709;
pub const CFA_PLANE_COLOR: u16 = 50710;
pub const CFA_LAYOUT: u16 = 50711;
pub const LINEARIZATION_TABLE: u16 = 50712;
pub const BLACK_LEVEL_REPEAT_DIM: u16 = 50713;
pub const BLACK_LEVEL: u16 = 50714;
pub const WHITE_LEVEL: u16 = 50717;
pub const DEFAULT_SCALE: u16 = 50718;
pub const DEFAULT_CROP_ORIGIN: u16 = 50719;
pub const DEFAULT_CROP_SIZE: u16 = 50720;
pub const COLOR_MATRIX1: u16 = 50721;
pub const AS_SHOT_NEUTRAL: u16 = 50728;
pub const AS_SHOT_WHITE_XY: u16 = 50729;
pub const BASELINE_EXPOSURE: u16 = 50730;
pub const BASELINE_NOISE: u16 = 50731;
pub const BASELINE_SHARPNESS: u16 = 50732;
pub const LENS_INFO: u16 = 50736;
pub const ANTI_ALIAS_STRENGTH: u16 = 50738;
pub const CALIBRATION_ILLUMINANT1: u16 = 50778;
pub const BEST_QUALITY_SCALE: u16 = 50780;
pub const ACTIVE_AREA: u16 = 50829;
pub const NOISE_REDUCTION_APPLIED: u16 = 50935;
pub const PROFILE_NAME: u16 = 50936;
pub const PROFILE_COPYRIGHT: u16 = 50942;

/// PhotometricInterpretation value for color filter array data.
pub const PHOTOMETRIC_CFA: u16 = 32803;
