//! Page classification: blank detection, color detection, conversion
//! eligibility.
//!
//! All scans work on one reused scanline buffer; nothing here allocates a
//! full page. Blank detection short-circuits on the first non-background
//! sample; the color scan always reads the full page before answering.

use scanline_tiff::tags::photometric;
use scanline_tiff::{TiffReader, TiffError};
use serde::{Deserialize, Serialize};

use crate::header::TagHeader;

/// What a page's pixels actually contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Every sample equals the background value.
    Blank,
    /// At least one pixel's RGB samples differ from each other.
    Color,
    /// Non-blank with no chromatic content (includes all < 3-sample pages).
    Grayscale,
}

/// The sample value an empty page consists of.
///
/// Min-is-white scans store white as 0x00; everything else stores white as
/// the maximum sample value.
pub fn background_sample(photometric_value: u16) -> u8 {
    if photometric_value == photometric::MIN_IS_WHITE {
        0x00
    } else {
        0xFF
    }
}

fn row_is_background(row: &[u8], background: u8) -> bool {
    row.iter().all(|&sample| sample == background)
}

/// True when any pixel in the row has chromatic content, judged by its
/// first three samples: `(r | g | b) != (r & g & b)` is false exactly when
/// the three are equal.
fn row_has_color(row: &[u8], samples_per_pixel: usize) -> bool {
    row.chunks_exact(samples_per_pixel).any(|pixel| {
        let (r, g, b) = (pixel[0], pixel[1], pixel[2]);
        (r | g | b) != (r & g & b)
    })
}

/// Classify the reader's selected page by scanning every scanline.
pub fn classify(reader: &TiffReader, header: &TagHeader) -> Result<PageKind, TiffError> {
    let background = background_sample(header.photometric);
    let samples = header.samples_per_pixel as usize;
    let mut row = vec![0u8; reader.scanline_len()];

    let mut blank = true;
    let mut color = false;

    for y in 0..header.height {
        reader.read_scanline(&mut row, y)?;
        if blank && !row_is_background(&row, background) {
            blank = false;
        }
        if samples >= 3 && !color && row_has_color(&row, samples) {
            color = true;
        }
    }

    Ok(if blank {
        PageKind::Blank
    } else if color {
        PageKind::Color
    } else {
        PageKind::Grayscale
    })
}

/// Short-circuiting blank test: stops at the first non-background sample.
pub fn is_blank(reader: &TiffReader, header: &TagHeader) -> Result<bool, TiffError> {
    let background = background_sample(header.photometric);
    let mut row = vec![0u8; reader.scanline_len()];

    for y in 0..header.height {
        reader.read_scanline(&mut row, y)?;
        if !row_is_background(&row, background) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether a page's pixel format qualifies for color conversion.
///
/// Two groupings of the same three conditions exist; see
/// [`crate::options::ProcessOptions::strict_eligibility`] for why both are
/// kept. Pages failing the predicate are copied through unmodified.
pub fn eligible_for_color_conversion(header: &TagHeader, strict: bool) -> bool {
    let not_palette = header.photometric != photometric::PALETTE;
    let samples = header.samples_per_pixel;
    if strict {
        not_palette && (samples == 3 || samples == 4)
    } else {
        (not_palette && samples == 3) || samples == 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_tiff::tags::{orientation, planar};

    fn header(samples: u16, photometric_value: u16) -> TagHeader {
        TagHeader {
            width: 4,
            height: 2,
            samples_per_pixel: samples,
            bits_per_sample: 8,
            planar_config: planar::CHUNKY,
            orientation: orientation::TOP_LEFT,
            photometric: photometric_value,
            compression: 1,
        }
    }

    #[test]
    fn background_depends_on_photometric() {
        assert_eq!(background_sample(photometric::MIN_IS_WHITE), 0x00);
        assert_eq!(background_sample(photometric::MIN_IS_BLACK), 0xFF);
        assert_eq!(background_sample(photometric::RGB), 0xFF);
        assert_eq!(background_sample(photometric::PALETTE), 0xFF);
    }

    #[test]
    fn row_background_checks_every_sample() {
        assert!(row_is_background(&[0xFF, 0xFF, 0xFF], 0xFF));
        assert!(!row_is_background(&[0xFF, 0xFE, 0xFF], 0xFF));
        assert!(row_is_background(&[], 0xFF));
    }

    #[test]
    fn color_triple_test() {
        // Equal channels: neutral
        assert!(!row_has_color(&[10, 10, 10], 3));
        // Any difference: chromatic
        assert!(row_has_color(&[10, 10, 11], 3));
        // Alpha is ignored by the triple test
        assert!(!row_has_color(&[5, 5, 5, 200], 4));
        assert!(row_has_color(&[5, 6, 5, 200], 4));
    }

    #[test]
    fn eligibility_legacy_grouping() {
        // RGB 3-sample: eligible
        assert!(eligible_for_color_conversion(&header(3, photometric::RGB), false));
        // Palette 3-sample: the palette check gates the 3-sample clause
        assert!(!eligible_for_color_conversion(&header(3, photometric::PALETTE), false));
        // Palette 4-sample: the 4-sample clause ignores palette entirely
        assert!(eligible_for_color_conversion(&header(4, photometric::PALETTE), false));
        // Single sample: never eligible
        assert!(!eligible_for_color_conversion(&header(1, photometric::MIN_IS_BLACK), false));
    }

    #[test]
    fn eligibility_strict_grouping() {
        assert!(eligible_for_color_conversion(&header(3, photometric::RGB), true));
        assert!(eligible_for_color_conversion(&header(4, photometric::RGB), true));
        // Strict mode excludes palette pages for both sample counts
        assert!(!eligible_for_color_conversion(&header(3, photometric::PALETTE), true));
        assert!(!eligible_for_color_conversion(&header(4, photometric::PALETTE), true));
        assert!(!eligible_for_color_conversion(&header(2, photometric::RGB), true));
    }
}
