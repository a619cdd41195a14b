//! DNG container builder
//!
//! Host, image, negative, camera profile and writer objects used to assemble
//! a digital negative from a raw Bayer capture and serialize it as a TIFF-based
//! DNG file.

pub mod error;
mod host;
mod image;
mod negative;
mod preview;
mod profile;
mod stages;
pub mod tags;
pub mod types;
mod writer;
mod xmp;

pub use error::{DngError, DngResult};
pub use host::{DngHost, MemoryBlock};
pub use image::{DngImage, PixelBuffer};
pub use negative::{DngExif, DngNegative};
pub use profile::{CameraProfile, ProfileEntry, ProfileValue};
pub use types::{ColorKey, DngCompression, DngVersion, Orientation, PixelType, Rect, SRational, URational, XyCoord};
pub use writer::{NegativeWriter, TiffDngWriter, WriteOptions, WriteSeek};

#[cfg(test)]
pub(crate) use profile::{read_ifd0_entries, test_profile_bytes};
