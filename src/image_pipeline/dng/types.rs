//! Value types shared by the DNG container builder

/// Pixel rectangle, `top`/`left` inclusive and `bottom`/`right` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Rect {
    pub fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self { top, left, bottom, right }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(height: u32, width: u32) -> Self {
        Self::new(0, 0, height, width)
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.top >= self.top
            && other.left >= self.left
            && other.bottom <= self.bottom
            && other.right <= self.right
    }
}

/// Unsigned rational as stored in TIFF RATIONAL fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct URational {
    pub n: u32,
    pub d: u32,
}

impl URational {
    pub const fn new(n: u32, d: u32) -> Self {
        Self { n, d }
    }

    /// Encodes `value` with a fixed denominator, rounding to nearest.
    pub fn from_real(value: f64, d: u32) -> Self {
        let scaled = (value.max(0.0) * d as f64).round();
        Self::new(scaled.min(u32::MAX as f64) as u32, d)
    }

    pub fn as_f64(&self) -> f64 {
        if self.d == 0 { 0.0 } else { self.n as f64 / self.d as f64 }
    }
}

impl From<URational> for tiff::encoder::Rational {
    fn from(value: URational) -> Self {
        tiff::encoder::Rational { n: value.n, d: value.d }
    }
}

/// Signed rational as stored in TIFF SRATIONAL fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SRational {
    pub n: i32,
    pub d: i32,
}

impl SRational {
    pub const fn new(n: i32, d: i32) -> Self {
        Self { n, d }
    }

    pub fn from_real(value: f64, d: i32) -> Self {
        let scaled = (value * d as f64).round();
        Self::new(scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32, d)
    }

    pub fn as_f64(&self) -> f64 {
        if self.d == 0 { 0.0 } else { self.n as f64 / self.d as f64 }
    }
}

impl From<SRational> for tiff::encoder::SRational {
    fn from(value: SRational) -> Self {
        tiff::encoder::SRational { n: value.n, d: value.d }
    }
}

/// Sample storage type of an image plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    Byte,
    Short,
}

impl PixelType {
    /// Size of one sample in bytes.
    pub fn size(self) -> usize {
        match self {
            PixelType::Byte => 1,
            PixelType::Short => 2,
        }
    }
}

/// CFA plane color, using the TIFF/EP CFAPattern codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorKey {
    Red = 0,
    Green = 1,
    Blue = 2,
}

/// Image orientation, TIFF Orientation tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90Cw,
    Rotate180,
    Rotate90Ccw,
}

impl Orientation {
    pub fn tiff_value(self) -> u16 {
        match self {
            Orientation::Normal => 1,
            Orientation::Rotate180 => 3,
            Orientation::Rotate90Cw => 6,
            Orientation::Rotate90Ccw => 8,
        }
    }
}

/// CIE xy chromaticity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyCoord {
    pub x: f64,
    pub y: f64,
}

impl XyCoord {
    pub const D65: XyCoord = XyCoord { x: 0.3127, y: 0.3290 };
}

/// Version written into the DNGVersion tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DngVersion {
    V1_1,
    #[default]
    V1_4,
}

impl DngVersion {
    pub fn bytes(self) -> [u8; 4] {
        match self {
            DngVersion::V1_1 => [1, 1, 0, 0],
            DngVersion::V1_4 => [1, 4, 0, 0],
        }
    }
}

/// Compression applied to the stored raw image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DngCompression {
    /// No compression is applied
    #[default]
    Uncompressed,
}
