//! Per-page TIFF header transfer.
//!
//! A [`TagHeader`] is read fresh from every source page, normalized by
//! [`TagHeader::finalized`], written to the destination, and discarded when
//! the page ends. Nothing here survives across pages — stale header state
//! was the classic source of wrong-compression bugs in batch scan tools.

use scanline_tiff::tags::{orientation, photometric, planar, tag};
use scanline_tiff::{PageLayout, TiffReader};
use serde::{Deserialize, Serialize};

use crate::options::CompressionPreference;

/// The eight header fields carried from a source page to a destination page.
///
/// Raw TIFF field values; `width`/`height` are pixels, everything else uses
/// the standard field encodings (see [`scanline_tiff::tags`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHeader {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u16,
    pub bits_per_sample: u16,
    pub planar_config: u16,
    pub orientation: u16,
    pub photometric: u16,
    pub compression: u16,
}

impl TagHeader {
    /// Read the header of the reader's selected page.
    ///
    /// Missing optional fields take the TIFF defaults: 8-bit samples, one
    /// sample per pixel, chunky layout, top-left orientation, min-is-black,
    /// no compression. Width and height always exist on a page the codec
    /// agreed to decode, so 0 here only ever means "no page selected".
    pub fn read(reader: &TiffReader) -> TagHeader {
        TagHeader {
            width: reader.field_u32(tag::IMAGE_WIDTH).unwrap_or(0),
            height: reader.field_u32(tag::IMAGE_LENGTH).unwrap_or(0),
            samples_per_pixel: reader.field_u16(tag::SAMPLES_PER_PIXEL).unwrap_or(1),
            bits_per_sample: reader.field_u16(tag::BITS_PER_SAMPLE).unwrap_or(8),
            planar_config: reader
                .field_u16(tag::PLANAR_CONFIGURATION)
                .unwrap_or(planar::CHUNKY),
            orientation: reader
                .field_u16(tag::ORIENTATION)
                .unwrap_or(orientation::TOP_LEFT),
            photometric: reader
                .field_u16(tag::PHOTOMETRIC_INTERPRETATION)
                .unwrap_or(photometric::MIN_IS_BLACK),
            compression: reader.field_u16(tag::COMPRESSION).unwrap_or(1),
        }
    }

    /// Normalize the header for writing.
    ///
    /// Two rules, applied before any field reaches the destination:
    ///
    /// * an orientation outside the valid 1..=8 range is clamped to
    ///   top-left — scanners emit 0 and garbage values here routinely;
    /// * multi-sample pages that are not palette-indexed are always written
    ///   as JPEG; everything else takes the configured preference.
    pub fn finalized(&self, pref: CompressionPreference) -> TagHeader {
        let mut out = *self;

        if out.orientation < orientation::TOP_LEFT || out.orientation > orientation::LEFT_BOTTOM {
            out.orientation = orientation::TOP_LEFT;
        }

        out.compression = if out.photometric != photometric::PALETTE && out.samples_per_pixel > 1 {
            scanline_tiff::tags::compression::JPEG
        } else {
            pref.to_field_value()
        };

        out
    }

    /// The codec-level layout this header describes.
    pub fn layout(&self) -> PageLayout {
        PageLayout {
            width: self.width,
            height: self.height,
            samples_per_pixel: self.samples_per_pixel,
            bits_per_sample: self.bits_per_sample,
            planar_config: self.planar_config,
            photometric: self.photometric,
            orientation: self.orientation,
            compression: self.compression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_header() -> TagHeader {
        TagHeader {
            width: 100,
            height: 50,
            samples_per_pixel: 1,
            bits_per_sample: 8,
            planar_config: planar::CHUNKY,
            orientation: orientation::TOP_LEFT,
            photometric: photometric::MIN_IS_BLACK,
            compression: 1,
        }
    }

    #[test]
    fn orientation_zero_clamps_to_top_left() {
        let mut h = gray_header();
        h.orientation = 0;
        assert_eq!(h.finalized(CompressionPreference::None).orientation, 1);
    }

    #[test]
    fn orientation_nine_clamps_to_top_left() {
        let mut h = gray_header();
        h.orientation = 9;
        assert_eq!(h.finalized(CompressionPreference::None).orientation, 1);
    }

    #[test]
    fn valid_orientations_survive() {
        for value in 1..=8u16 {
            let mut h = gray_header();
            h.orientation = value;
            assert_eq!(h.finalized(CompressionPreference::None).orientation, value);
        }
    }

    #[test]
    fn rgb_page_forces_jpeg() {
        let mut h = gray_header();
        h.samples_per_pixel = 3;
        h.photometric = photometric::RGB;
        let out = h.finalized(CompressionPreference::Lzw);
        assert_eq!(out.compression, scanline_tiff::tags::compression::JPEG);
    }

    #[test]
    fn palette_page_takes_preference() {
        let mut h = gray_header();
        h.samples_per_pixel = 3;
        h.photometric = photometric::PALETTE;
        let out = h.finalized(CompressionPreference::Lzw);
        assert_eq!(out.compression, scanline_tiff::tags::compression::LZW);
    }

    #[test]
    fn single_sample_page_takes_preference() {
        let h = gray_header();
        let out = h.finalized(CompressionPreference::None);
        assert_eq!(out.compression, scanline_tiff::tags::compression::NONE);
    }

    #[test]
    fn layout_mirrors_header() {
        let h = gray_header();
        let layout = h.layout();
        assert_eq!(layout.width, 100);
        assert_eq!(layout.height, 50);
        assert_eq!(layout.samples_per_pixel, 1);
        assert_eq!(layout.compression, 1);
    }
}
