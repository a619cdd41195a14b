//! DNG camera profile (`.dcp`) parsing.
//!
//! A DCP file is a TIFF structure whose magic number is `RC` instead of 42.
//! Its single IFD carries the same color tags a DNG stores in IFD0, so the
//! profile is kept as a list of typed entries and re-emitted verbatim by the
//! writer. The IFD itself is decoded by the `dng` crate.

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use ::dng::FileType;
use ::dng::ifd::{IfdEntryRef, IfdValue};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

use crate::image_pipeline::dng::error::{DngError, DngResult};
use crate::image_pipeline::dng::tags;

const ASCII: u16 = 2;
const LONG: u16 = 4;
const IFD_POINTER_TAGS: [u16; 4] = [330, 400, 34665, 34853];

/// Decoded value of a profile tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileValue {
    Byte(Vec<u8>),
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SByte(Vec<i8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry {
    pub tag: u16,
    pub value: ProfileValue,
}

/// Color calibration profile attached to a negative.
#[derive(Debug, Clone, Default)]
pub struct CameraProfile {
    entries: Vec<ProfileEntry>,
}

impl CameraProfile {
    pub fn parse_file<P: AsRef<Path>>(path: P) -> DngResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DngError::OpenFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_extended(BufReader::new(file))
    }

    /// Parses a complete DCP stream.
    pub fn parse_extended<R: Read>(mut reader: R) -> DngResult<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(DngError::ReadFile)?;
        let profile = CameraProfile {
            entries: read_ifd0_entries(&data, FileType::Dcp)?,
        };
        if profile.get(tags::COLOR_MATRIX1).is_none() {
            return Err(DngError::BadFormat("camera profile has no ColorMatrix1".to_string()));
        }
        debug!(entries = profile.entries.len(), name = ?profile.name(), "Parsed camera profile");
        Ok(profile)
    }

    pub fn entries(&self) -> &[ProfileEntry] {
        &self.entries
    }

    pub fn get(&self, tag: u16) -> Option<&ProfileValue> {
        self.entries.iter().find(|e| e.tag == tag).map(|e| &e.value)
    }

    pub fn name(&self) -> Option<&str> {
        self.ascii(tags::PROFILE_NAME)
    }

    pub fn copyright(&self) -> Option<&str> {
        self.ascii(tags::PROFILE_COPYRIGHT)
    }

    fn ascii(&self, tag: u16) -> Option<&str> {
        match self.get(tag) {
            Some(ProfileValue::Ascii(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Sets an ASCII tag, replacing any previous value.
    pub fn set_ascii(&mut self, tag: u16, value: &str) {
        let value = ProfileValue::Ascii(value.to_string());
        match self.entries.iter_mut().find(|e| e.tag == tag) {
            Some(entry) => entry.value = value,
            None => self.entries.push(ProfileEntry { tag, value }),
        }
    }
}

/// Reads the entries of IFD0 of a TIFF-structured file of the given type
/// (plain TIFF/DNG or `RC` camera profile).
pub(crate) fn read_ifd0_entries(data: &[u8], expected: FileType) -> DngResult<Vec<ProfileEntry>> {
    let data = match data.get(0..2) {
        Some(b"II") => screen_ifd0::<LittleEndian>(data, expected)?,
        Some(b"MM") => screen_ifd0::<BigEndian>(data, expected)?,
        _ => return Err(DngError::BadFormat("bad byte order mark".to_string())),
    };

    let hit_end = Cell::new(false);
    let source = EndTracking {
        inner: Cursor::new(data),
        hit_end: &hit_end,
    };
    let reader = ::dng::DngReader::read(source).map_err(|e| {
        if hit_end.get() {
            DngError::EndOfFile(e.to_string())
        } else {
            DngError::BadFormat(e.to_string())
        }
    })?;

    let entries = RefCell::new(Vec::new());
    reader.get_ifd0().find_entry(|entry: IfdEntryRef| {
        if entry.path.as_vec().len() == 1 {
            let tag = entry.tag.numeric();
            match convert_value(entry.value) {
                Some(value) => entries.borrow_mut().push(ProfileEntry { tag, value }),
                None => debug!(tag, "Skipping tag without a plain value"),
            }
        }
        false
    });
    Ok(entries.into_inner())
}

/// Checks the header and the IFD0 entry table, and returns a copy of `data`
/// whose IFD chain ends after IFD0.
fn screen_ifd0<B: ByteOrder>(data: &[u8], expected: FileType) -> DngResult<Vec<u8>> {
    if data.len() < 8 {
        return Err(DngError::EndOfFile("TIFF header".to_string()));
    }
    if FileType::from_magic(B::read_u16(&data[2..4])) != Some(expected) {
        return Err(DngError::BadFormat(format!("magic number is not {:?}", expected)));
    }
    let ifd0 = B::read_u32(&data[4..8]) as usize;
    if ifd0 == 0 {
        return Err(DngError::BadFormat("file has no IFD".to_string()));
    }
    let count = data
        .get(ifd0..ifd0 + 2)
        .map(B::read_u16)
        .ok_or_else(|| DngError::EndOfFile("IFD entry count".to_string()))? as usize;

    let table = ifd0 + 2;
    for i in 0..count {
        let Some(raw) = data.get(table + i * 12..table + i * 12 + 12) else {
            break;
        };
        let tag = B::read_u16(&raw[0..2]);
        let field_type = B::read_u16(&raw[2..4]);
        let value_count = B::read_u32(&raw[4..8]);
        if field_type == ASCII && value_count == 0 {
            return Err(DngError::BadFormat(format!("tag {} is an empty ASCII value", tag)));
        }
        if IFD_POINTER_TAGS.contains(&tag) && field_type != LONG {
            return Err(DngError::BadFormat(format!("IFD pointer tag {} has type {}", tag, field_type)));
        }
    }

    let mut data = data.to_vec();
    let link = table + count * 12;
    if let Some(next) = data.get_mut(link..link + 4) {
        B::write_u32(next, 0);
    }
    Ok(data)
}

fn convert_value(value: &IfdValue) -> Option<ProfileValue> {
    let items: Vec<&IfdValue> = value.as_list().collect();
    let value = match items.first()? {
        IfdValue::Ascii(text) => {
            let text = text.split('\0').next().unwrap_or_default();
            ProfileValue::Ascii(text.to_string())
        }
        IfdValue::Byte(_) | IfdValue::Undefined(_) => ProfileValue::Byte(pick(&items, |v| match v {
            IfdValue::Byte(b) | IfdValue::Undefined(b) => Some(*b),
            _ => None,
        })?),
        IfdValue::Short(_) => ProfileValue::Short(pick(&items, |v| match v {
            IfdValue::Short(x) => Some(*x),
            _ => None,
        })?),
        IfdValue::Long(_) => ProfileValue::Long(pick(&items, |v| match v {
            IfdValue::Long(x) => Some(*x),
            _ => None,
        })?),
        IfdValue::Rational(..) => ProfileValue::Rational(pick(&items, |v| match v {
            IfdValue::Rational(n, d) => Some((*n, *d)),
            _ => None,
        })?),
        IfdValue::SByte(_) => ProfileValue::SByte(pick(&items, |v| match v {
            IfdValue::SByte(x) => Some(*x),
            _ => None,
        })?),
        IfdValue::SShort(_) => ProfileValue::SShort(pick(&items, |v| match v {
            IfdValue::SShort(x) => Some(*x),
            _ => None,
        })?),
        IfdValue::SLong(_) => ProfileValue::SLong(pick(&items, |v| match v {
            IfdValue::SLong(x) => Some(*x),
            _ => None,
        })?),
        IfdValue::SRational(..) => ProfileValue::SRational(pick(&items, |v| match v {
            IfdValue::SRational(n, d) => Some((*n, *d)),
            _ => None,
        })?),
        IfdValue::Float(_) => ProfileValue::Float(pick(&items, |v| match v {
            IfdValue::Float(x) => Some(*x),
            _ => None,
        })?),
        IfdValue::Double(_) => ProfileValue::Double(pick(&items, |v| match v {
            IfdValue::Double(x) => Some(*x),
            _ => None,
        })?),
        IfdValue::List(_) | IfdValue::Ifd(_) | IfdValue::Offsets(_) => return None,
    };
    Some(value)
}

fn pick<T>(items: &[&IfdValue], f: impl Fn(&IfdValue) -> Option<T>) -> Option<Vec<T>> {
    items.iter().map(|v| f(v)).collect()
}

/// Notes whether a read came up short, so a truncated file can be told
/// apart from a malformed one.
struct EndTracking<'a, R> {
    inner: R,
    hit_end: &'a Cell<bool>,
}

impl<R: Read> Read for EndTracking<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.hit_end.set(true);
        }
        Ok(n)
    }
}

impl<R: Seek> Seek for EndTracking<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Builds a minimal little-endian DCP image, used by tests across the crate.
#[cfg(test)]
pub(crate) fn test_profile_bytes(name: &str) -> Vec<u8> {
    use byteorder::WriteBytesExt;

    let mut ascii = name.as_bytes().to_vec();
    ascii.push(0);
    let matrix: [(i32, i32); 9] = [
        (10000, 10000), (0, 10000), (0, 10000),
        (0, 10000), (10000, 10000), (0, 10000),
        (0, 10000), (0, 10000), (10000, 10000),
    ];

    let entry_count = 3u16;
    let ifd_offset = 8u32;
    let data_offset = ifd_offset + 2 + entry_count as u32 * 12 + 4;
    let name_offset = data_offset + 72;

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.write_u16::<LittleEndian>(FileType::Dcp.magic()).unwrap();
    out.write_u32::<LittleEndian>(ifd_offset).unwrap();
    out.write_u16::<LittleEndian>(entry_count).unwrap();
    // ColorMatrix1, SRATIONAL x 9
    out.write_u16::<LittleEndian>(tags::COLOR_MATRIX1).unwrap();
    out.write_u16::<LittleEndian>(10).unwrap();
    out.write_u32::<LittleEndian>(9).unwrap();
    out.write_u32::<LittleEndian>(data_offset).unwrap();
    // CalibrationIlluminant1 = D65
    out.write_u16::<LittleEndian>(tags::CALIBRATION_ILLUMINANT1).unwrap();
    out.write_u16::<LittleEndian>(3).unwrap();
    out.write_u32::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(21).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    // ProfileName
    out.write_u16::<LittleEndian>(tags::PROFILE_NAME).unwrap();
    out.write_u16::<LittleEndian>(2).unwrap();
    out.write_u32::<LittleEndian>(ascii.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(name_offset).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    for (n, d) in matrix {
        out.write_i32::<LittleEndian>(n).unwrap();
        out.write_i32::<LittleEndian>(d).unwrap();
    }
    out.extend_from_slice(&ascii);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_little_endian_profile() {
        let profile = CameraProfile::parse_extended(&test_profile_bytes("Sensor Standard")[..]).unwrap();
        assert_eq!(profile.name(), Some("Sensor Standard"));
        assert_eq!(profile.get(tags::CALIBRATION_ILLUMINANT1), Some(&ProfileValue::Short(vec![21])));
        match profile.get(tags::COLOR_MATRIX1) {
            Some(ProfileValue::SRational(values)) => {
                assert_eq!(values.len(), 9);
                assert_eq!(values[0], (10000, 10000));
            }
            other => panic!("unexpected ColorMatrix1: {:?}", other),
        }
    }

    #[test]
    fn rejects_plain_tiff() {
        let mut bytes = test_profile_bytes("x");
        bytes[2] = 42;
        bytes[3] = 0;
        assert!(matches!(CameraProfile::parse_extended(&bytes[..]), Err(DngError::BadFormat(_))));
    }

    #[test]
    fn rejects_truncated_profile() {
        let bytes = test_profile_bytes("x");
        let err = CameraProfile::parse_extended(&bytes[..30]).unwrap_err();
        assert!(matches!(err, DngError::EndOfFile(_)));
    }

    #[test]
    fn reads_big_endian_profile() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MM");
        bytes.extend_from_slice(&0x4352u16.to_be_bytes());
        bytes.extend_from_slice(&8u32.to_be_bytes());
        bytes.extend_from_slice(&2u16.to_be_bytes());
        // CalibrationIlluminant1 = StdA
        bytes.extend_from_slice(&tags::CALIBRATION_ILLUMINANT1.to_be_bytes());
        bytes.extend_from_slice(&3u16.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&[0, 17, 0, 0]);
        // ColorMatrix1, one SRATIONAL at offset 38
        bytes.extend_from_slice(&tags::COLOR_MATRIX1.to_be_bytes());
        bytes.extend_from_slice(&10u16.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&38u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&(-3i32).to_be_bytes());
        bytes.extend_from_slice(&4i32.to_be_bytes());

        let profile = CameraProfile::parse_extended(&bytes[..]).unwrap();
        assert_eq!(profile.get(tags::CALIBRATION_ILLUMINANT1), Some(&ProfileValue::Short(vec![17])));
        assert_eq!(profile.get(tags::COLOR_MATRIX1), Some(&ProfileValue::SRational(vec![(-3, 4)])));
        assert_eq!(profile.name(), None);
    }

    #[test]
    fn looping_ifd_chain_is_ignored() {
        let mut bytes = test_profile_bytes("Loop");
        // Point the next-IFD link of IFD0 back at IFD0.
        let link = 8 + 2 + 3 * 12;
        bytes[link..link + 4].copy_from_slice(&8u32.to_le_bytes());
        let profile = CameraProfile::parse_extended(&bytes[..]).unwrap();
        assert_eq!(profile.entries().len(), 3);
    }

    #[test]
    fn empty_ascii_value_is_bad_format() {
        let mut bytes = test_profile_bytes("x");
        // ProfileName is the third entry; zero its count.
        let count = 8 + 2 + 2 * 12 + 4;
        bytes[count..count + 4].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(CameraProfile::parse_extended(&bytes[..]), Err(DngError::BadFormat(_))));
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = CameraProfile::parse_file("/nonexistent/profile.dcp").unwrap_err();
        assert_eq!(err.code(), crate::image_pipeline::dng::error::DNG_ERROR_OPEN_FILE);
    }
}
