//! In-place scanline colorimetric transforms.
//!
//! One pure function over one row of samples. The engine decides *whether*
//! a page gets transformed; this module only knows *how*. Mode is a value
//! parameter, never shared state, so two consecutive pages can never leak
//! a mode into each other.

use serde::{Deserialize, Serialize};

/// The colorimetric transform applied to eligible pages.
///
/// Exactly one mode is active per copy call; pass-through copies use
/// `Option::<ConversionMode>::None` instead of a third variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum ConversionMode {
    /// Collapse RGB to the luminance gray value.
    Grayscale,
    /// Collapse RGB to luminance, then snap to black or white.
    Binary {
        /// A pixel becomes white (0xFF) iff its gray value is strictly
        /// greater than this.
        threshold: u8,
    },
}

/// ITU-R BT.601 luminance, rounded to the nearest integer.
///
/// Already-neutral pixels (R==G==B) return R directly: the float
/// round-trip is a no-op for them by definition, and skipping it keeps
/// gray source material bit-exact.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        return r;
    }
    let gray = 0.2989 * r as f32 + 0.5870 * g as f32 + 0.1140 * b as f32;
    gray.round().clamp(0.0, 255.0) as u8
}

/// Transform one scanline in place, one pixel at a time.
///
/// Only the first three samples of each pixel are touched; a fourth
/// (alpha) sample passes through untouched. Rows whose length is not a
/// multiple of `samples_per_pixel`, and pixels with fewer than three
/// samples, are left as they are.
pub fn transform_scanline(row: &mut [u8], samples_per_pixel: u16, mode: ConversionMode) {
    let samples = samples_per_pixel as usize;
    if samples < 3 {
        return;
    }

    for pixel in row.chunks_exact_mut(samples) {
        let gray = luminance(pixel[0], pixel[1], pixel[2]);
        let value = match mode {
            ConversionMode::Grayscale => gray,
            ConversionMode::Binary { threshold } => {
                if gray > threshold {
                    0xFF
                } else {
                    0x00
                }
            }
        };
        pixel[0] = value;
        pixel[1] = value;
        pixel[2] = value;
    }
}
