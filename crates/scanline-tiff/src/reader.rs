//! Multi-page TIFF reader with per-scanline access
//!
//! The whole container is loaded into memory and the IFD chain is walked up
//! front. `select_directory` decodes that page's strips into a contiguous
//! sample buffer; `read_scanline` then copies single rows out of it.

use crate::codec;
use crate::error::{Result, TiffError};
use crate::ifd::Ifd;
use crate::tags::{compression, planar, tag, tag_name};
use crate::{Endian, TIFF_MAGIC_BE, TIFF_MAGIC_LE, TIFF_VERSION};
use std::path::Path;

// Page counts are u16; a longer chain is malformed (or a pointer loop)
const MAX_DIRECTORIES: usize = u16::MAX as usize;

#[derive(Debug)]
struct PageBuffer {
    rows: Vec<u8>,
    row_len: usize,
    height: u32,
}

/// Read-only handle on a multi-page TIFF container
#[derive(Debug)]
pub struct TiffReader {
    data: Vec<u8>,
    endian: Endian,
    ifds: Vec<Ifd>,
    current: Option<usize>,
    page: Option<PageBuffer>,
}

impl TiffReader {
    /// Open a container from the file system
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Open a container already held in memory
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < 8 {
            return Err(TiffError::InsufficientData {
                needed: 8,
                available: data.len(),
            });
        }

        let endian = if data[0..2] == TIFF_MAGIC_LE {
            Endian::Little
        } else if data[0..2] == TIFF_MAGIC_BE {
            Endian::Big
        } else {
            return Err(TiffError::InvalidMagic);
        };

        let version = endian.u16(&data[2..4]);
        if version != TIFF_VERSION {
            return Err(TiffError::UnsupportedVersion { version });
        }

        let mut ifds = Vec::new();
        let mut offset = endian.u32(&data[4..8]);
        while offset != 0 {
            if ifds.len() >= MAX_DIRECTORIES {
                return Err(TiffError::InvalidIfd("directory chain too long".into()));
            }
            let ifd = Ifd::read(&data, offset, endian)?;
            offset = ifd.next_offset;
            ifds.push(ifd);
        }

        Ok(TiffReader {
            data,
            endian,
            ifds,
            current: None,
            page: None,
        })
    }

    /// Byte order of the container
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Number of pages in the container
    pub fn directory_count(&self) -> u16 {
        self.ifds.len() as u16
    }

    /// Select a page and decode its strips
    pub fn select_directory(&mut self, index: u16) -> Result<()> {
        let count = self.directory_count();
        let ifd = self
            .ifds
            .get(index as usize)
            .ok_or(TiffError::DirectoryOutOfRange { index, count })?;

        let width = ifd.get_required_u32(tag::IMAGE_WIDTH)?;
        let height = ifd.get_required_u32(tag::IMAGE_LENGTH)?;
        if width == 0 || height == 0 {
            return Err(TiffError::InvalidDimensions { width, height });
        }

        let samples = ifd.get_u16_or(tag::SAMPLES_PER_PIXEL, 1) as usize;
        let bits = ifd.get_u16_or(tag::BITS_PER_SAMPLE, 8);
        if bits != 8 {
            return Err(TiffError::UnsupportedFeature(format!("{bits}-bit samples")));
        }
        if ifd.get_u16_or(tag::PLANAR_CONFIGURATION, planar::CHUNKY) != planar::CHUNKY {
            return Err(TiffError::UnsupportedFeature(
                "planar sample layout".into(),
            ));
        }
        if ifd.has(tag::TILE_OFFSETS) || ifd.has(tag::TILE_WIDTH) {
            return Err(TiffError::UnsupportedFeature("tiled layout".into()));
        }

        let method = ifd.get_u16_or(tag::COMPRESSION, compression::NONE);
        let offsets = ifd
            .get_value(tag::STRIP_OFFSETS)
            .and_then(|v| v.as_u32_vec())
            .ok_or_else(|| TiffError::MissingTag(tag_name(tag::STRIP_OFFSETS).to_string()))?;
        let byte_counts = ifd
            .get_value(tag::STRIP_BYTE_COUNTS)
            .and_then(|v| v.as_u32_vec())
            .ok_or_else(|| TiffError::MissingTag(tag_name(tag::STRIP_BYTE_COUNTS).to_string()))?;
        if offsets.len() != byte_counts.len() {
            return Err(TiffError::InvalidIfd(format!(
                "{} strip offsets but {} byte counts",
                offsets.len(),
                byte_counts.len()
            )));
        }

        let mut rows_per_strip = ifd.get_u32_or(tag::ROWS_PER_STRIP, height);
        if rows_per_strip == 0 {
            rows_per_strip = height;
        }

        let row_len = width as usize * samples;
        let mut rows = Vec::with_capacity(row_len * height as usize);
        let mut remaining = height;

        for (&offset, &byte_count) in offsets.iter().zip(byte_counts.iter()) {
            let start = offset as usize;
            let end = start.saturating_add(byte_count as usize);
            if end > self.data.len() {
                return Err(TiffError::InsufficientData {
                    needed: end,
                    available: self.data.len(),
                });
            }

            let strip_rows = rows_per_strip.min(remaining);
            let expected = strip_rows as usize * row_len;
            let decoded = codec::decode_strip(method, &self.data[start..end], expected, samples)?;
            if decoded.len() < expected {
                return Err(TiffError::InsufficientData {
                    needed: expected,
                    available: decoded.len(),
                });
            }
            rows.extend_from_slice(&decoded[..expected]);
            remaining -= strip_rows;
        }

        if remaining > 0 {
            return Err(TiffError::InsufficientData {
                needed: row_len * height as usize,
                available: rows.len(),
            });
        }

        if ifd.get_u16_or(tag::PREDICTOR, 1) == 2 {
            codec::reverse_horizontal_predictor(&mut rows, width as usize, samples);
        }

        self.page = Some(PageBuffer {
            rows,
            row_len,
            height,
        });
        self.current = Some(index as usize);
        Ok(())
    }

    /// Raw u32 field of the selected page
    pub fn field_u32(&self, tag_id: u16) -> Option<u32> {
        self.current_ifd()
            .and_then(|ifd| ifd.get_value(tag_id))
            .and_then(|v| v.as_u32())
    }

    /// Raw u16 field of the selected page
    pub fn field_u16(&self, tag_id: u16) -> Option<u16> {
        self.current_ifd()
            .and_then(|ifd| ifd.get_value(tag_id))
            .and_then(|v| v.as_u16())
    }

    /// Byte length of one decoded scanline of the selected page
    pub fn scanline_len(&self) -> usize {
        self.page.as_ref().map(|p| p.row_len).unwrap_or(0)
    }

    /// Copy one decoded row into `buf`
    pub fn read_scanline(&self, buf: &mut [u8], row: u32) -> Result<()> {
        let page = self.page.as_ref().ok_or(TiffError::NoDirectorySelected)?;
        if row >= page.height {
            return Err(TiffError::RowOutOfRange {
                row,
                height: page.height,
            });
        }
        if buf.len() < page.row_len {
            return Err(TiffError::BufferTooSmall {
                needed: page.row_len,
                available: buf.len(),
            });
        }
        let start = row as usize * page.row_len;
        buf[..page.row_len].copy_from_slice(&page.rows[start..start + page.row_len]);
        Ok(())
    }

    fn current_ifd(&self) -> Option<&Ifd> {
        self.current.and_then(|i| self.ifds.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_magic() {
        let err = TiffReader::from_bytes(vec![0x50, 0x4B, 0x2A, 0, 8, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, TiffError::InvalidMagic));
    }

    #[test]
    fn test_rejects_bad_version() {
        let err = TiffReader::from_bytes(vec![0x49, 0x49, 43, 0, 8, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, TiffError::UnsupportedVersion { version: 43 }));
    }

    #[test]
    fn test_empty_container() {
        // Valid header, zero first-IFD offset: zero pages
        let reader = TiffReader::from_bytes(vec![0x49, 0x49, 42, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(reader.directory_count(), 0);
    }

    #[test]
    fn test_scanline_without_selection() {
        let reader = TiffReader::from_bytes(vec![0x49, 0x49, 42, 0, 0, 0, 0, 0]).unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(
            reader.read_scanline(&mut buf, 0),
            Err(TiffError::NoDirectorySelected)
        ));
        assert_eq!(reader.scanline_len(), 0);
    }

    #[test]
    fn test_truncated_header() {
        let err = TiffReader::from_bytes(vec![0x49, 0x49, 42]).unwrap_err();
        assert!(matches!(err, TiffError::InsufficientData { .. }));
    }
}
