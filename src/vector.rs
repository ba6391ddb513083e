//! Conversion between packed RGB bytes and floating point color vectors.
//!
//! Nothing here validates the buffer length: a trailing partial pixel is
//! ignored. Alignment is checked once, at [`crate::quantize_in_place`].

use crate::error::{Result, try_vec_with_capacity};

/// One pixel's channels as real numbers, in the same 0..=255 scale as the
/// source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorVector {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorVector {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn from_bytes(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0] as f64, rgb[1] as f64, rgb[2] as f64)
    }

    /// Truncates each channel toward zero. Out-of-range values saturate.
    #[inline]
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r as u8, self.g as u8, self.b as u8]
    }

    #[inline(always)]
    pub fn distance_squared(&self, other: &ColorVector) -> f64 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        dr * dr + dg * dg + db * db
    }

    /// Key used for value-identity checks. Adding `0.0` folds `-0.0` into
    /// `0.0` so equal values share a key.
    #[inline]
    pub(crate) fn key(&self) -> [u64; 3] {
        [
            (self.r + 0.0).to_bits(),
            (self.g + 0.0).to_bits(),
            (self.b + 0.0).to_bits(),
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

/// Reads every complete 3-byte pixel of `bytes` into a color vector.
pub fn unpack(bytes: &[u8]) -> Vec<ColorVector> {
    bytes
        .chunks_exact(3)
        .map(|px| ColorVector::from_bytes([px[0], px[1], px[2]]))
        .collect()
}

/// Like [`unpack`], but reports a failed allocation instead of aborting.
pub fn try_unpack(bytes: &[u8]) -> Result<Vec<ColorVector>> {
    let mut vectors = try_vec_with_capacity("color vectors", bytes.len() / 3)?;
    vectors.extend(
        bytes
            .chunks_exact(3)
            .map(|px| ColorVector::from_bytes([px[0], px[1], px[2]])),
    );
    Ok(vectors)
}

/// Writes each vector back as 3 bytes. Stops at whichever of the two runs out
/// first.
pub fn pack(vectors: &[ColorVector], bytes: &mut [u8]) {
    for (px, v) in bytes.chunks_exact_mut(3).zip(vectors) {
        px.copy_from_slice(&v.to_bytes());
    }
}
