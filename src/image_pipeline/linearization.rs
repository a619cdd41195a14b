//! Linearization lookup tables
//!
//! A curve maps every raw sample value representable at the sensor's bit
//! depth to a linear response value. Only the identity mapping is produced by
//! the converter today; [`LinearizationCurve::from_fn`] accepts any monotonic
//! mapping.

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::metadata::{MAX_BIT_DEPTH, MIN_BIT_DEPTH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearizationCurve {
    bit_depth: u32,
    table: Vec<u16>,
}

impl LinearizationCurve {
    /// Identity curve with `2^bit_depth` entries.
    pub fn identity(bit_depth: u32) -> Result<Self> {
        Self::from_fn(bit_depth, |i| i)
    }

    /// Builds a curve by evaluating `map` at every raw value `0..2^bit_depth`.
    ///
    /// Fails if the resulting table decreases anywhere.
    pub fn from_fn<F>(bit_depth: u32, map: F) -> Result<Self>
    where
        F: Fn(u16) -> u16,
    {
        if !(MIN_BIT_DEPTH..=MAX_BIT_DEPTH).contains(&bit_depth) {
            return Err(ConversionError::InvalidField {
                field: "bit_depth",
                reason: format!("{} is outside {}..={}", bit_depth, MIN_BIT_DEPTH, MAX_BIT_DEPTH),
            });
        }
        let len = 1usize << bit_depth;
        let mut table = Vec::with_capacity(len);
        table.extend((0..len).map(|i| map(i as u16)));

        if let Some(i) = table.windows(2).position(|w| w[1] < w[0]) {
            return Err(ConversionError::InvalidField {
                field: "linearization",
                reason: format!("curve decreases at entry {}", i + 1),
            });
        }
        Ok(Self { bit_depth, table })
    }

    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.table
    }

    pub fn into_table(self) -> Vec<u16> {
        self.table
    }
}
