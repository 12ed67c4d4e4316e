//! Multi-page TIFF writer: one page at a time, one strip per page
//!
//! Pages are buffered scanline by scanline, compressed when the page ends,
//! and appended to an in-memory container image together with their IFD.
//! Each new IFD is chained by patching the previous next-directory pointer.
//! `flush`/`finish` materialize the container on disk. Output is always
//! little-endian.

use crate::codec;
use crate::error::{Result, TiffError};
use crate::ifd::{push_u16, push_u32, Ifd, IfdEntry, IfdValue};
use crate::tags::{compression, planar, tag};
use crate::{TIFF_MAGIC_LE, TIFF_VERSION};
use byteorder::{ByteOrder, LittleEndian};
use std::path::{Path, PathBuf};

const SOFTWARE_NAME: &str = "scanline-tiff";

/// Header fields describing a page about to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u16,
    pub bits_per_sample: u16,
    pub planar_config: u16,
    pub photometric: u16,
    pub orientation: u16,
    pub compression: u16,
}

#[derive(Debug)]
struct PendingPage {
    layout: PageLayout,
    rows: Vec<u8>,
    row_len: usize,
}

/// Write handle on a multi-page TIFF container
#[derive(Debug)]
pub struct TiffWriter {
    path: PathBuf,
    buf: Vec<u8>,
    // Byte position of the pointer the next IFD offset gets patched into
    next_ptr_pos: usize,
    page: Option<PendingPage>,
}

impl TiffWriter {
    /// Create a fresh container (truncates any existing file)
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut buf = Vec::with_capacity(8);
        buf.extend_from_slice(&TIFF_MAGIC_LE);
        push_u16(&mut buf, TIFF_VERSION);
        push_u32(&mut buf, 0);

        // Materialize the header now so open failures surface here
        std::fs::write(path.as_ref(), &buf)?;

        Ok(TiffWriter {
            path: path.as_ref().to_path_buf(),
            buf,
            next_ptr_pos: 4,
            page: None,
        })
    }

    /// Open an existing container for appending pages (created if missing)
    pub fn append<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = match std::fs::read(path.as_ref()) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Self::create(path);
            }
            Err(e) => return Err(e.into()),
        };

        if data.len() < 8 {
            return Err(TiffError::InsufficientData {
                needed: 8,
                available: data.len(),
            });
        }
        if data[0..2] != TIFF_MAGIC_LE {
            return Err(TiffError::UnsupportedFeature(
                "appending to a big-endian container".into(),
            ));
        }
        let version = LittleEndian::read_u16(&data[2..4]);
        if version != TIFF_VERSION {
            return Err(TiffError::UnsupportedVersion { version });
        }

        // Walk the IFD chain to find the dangling next-directory pointer
        let mut ptr_pos = 4usize;
        let mut hops = 0usize;
        loop {
            if ptr_pos + 4 > data.len() {
                return Err(TiffError::InvalidIfd(
                    "next-directory pointer out of bounds".into(),
                ));
            }
            let offset = LittleEndian::read_u32(&data[ptr_pos..ptr_pos + 4]) as usize;
            if offset == 0 {
                break;
            }
            if offset + 2 > data.len() {
                return Err(TiffError::InvalidIfd("directory out of bounds".into()));
            }
            let entries = LittleEndian::read_u16(&data[offset..offset + 2]) as usize;
            ptr_pos = offset + 2 + entries * 12;

            hops += 1;
            if hops > u16::MAX as usize {
                return Err(TiffError::InvalidIfd("directory chain too long".into()));
            }
        }

        Ok(TiffWriter {
            path: path.as_ref().to_path_buf(),
            buf: data,
            next_ptr_pos: ptr_pos,
            page: None,
        })
    }

    /// Start a page; rejects layouts this codec cannot represent
    pub fn begin_page(&mut self, layout: &PageLayout) -> Result<()> {
        if self.page.is_some() {
            return Err(TiffError::InvalidPageState(
                "previous page not finished".into(),
            ));
        }
        if layout.width == 0 || layout.height == 0 {
            return Err(TiffError::InvalidDimensions {
                width: layout.width,
                height: layout.height,
            });
        }
        if layout.bits_per_sample != 8 {
            return Err(TiffError::UnsupportedFeature(format!(
                "{}-bit samples",
                layout.bits_per_sample
            )));
        }
        if layout.planar_config != planar::CHUNKY {
            return Err(TiffError::UnsupportedFeature(
                "planar sample layout".into(),
            ));
        }
        match layout.compression {
            compression::NONE | compression::PACKBITS | compression::LZW => {}
            compression::JPEG => {
                if layout.samples_per_pixel != 1 && layout.samples_per_pixel != 3 {
                    return Err(TiffError::UnsupportedFeature(format!(
                        "JPEG strips with {} samples per pixel",
                        layout.samples_per_pixel
                    )));
                }
            }
            other => return Err(TiffError::UnsupportedCompression(other)),
        }

        let row_len = layout.width as usize * layout.samples_per_pixel as usize;
        self.page = Some(PendingPage {
            layout: *layout,
            rows: vec![0u8; row_len * layout.height as usize],
            row_len,
        });
        Ok(())
    }

    /// Store one scanline of the open page
    pub fn write_scanline(&mut self, buf: &[u8], row: u32) -> Result<()> {
        let page = self
            .page
            .as_mut()
            .ok_or_else(|| TiffError::InvalidPageState("no page in progress".into()))?;
        if row >= page.layout.height {
            return Err(TiffError::RowOutOfRange {
                row,
                height: page.layout.height,
            });
        }
        if buf.len() < page.row_len {
            return Err(TiffError::BufferTooSmall {
                needed: page.row_len,
                available: buf.len(),
            });
        }
        let start = row as usize * page.row_len;
        page.rows[start..start + page.row_len].copy_from_slice(&buf[..page.row_len]);
        Ok(())
    }

    /// Compress the open page into a strip and chain its directory
    pub fn end_page(&mut self) -> Result<()> {
        let page = self
            .page
            .take()
            .ok_or_else(|| TiffError::InvalidPageState("no page in progress".into()))?;
        let layout = page.layout;

        let strip = codec::encode_strip(
            layout.compression,
            &page.rows,
            layout.width,
            layout.height,
            layout.samples_per_pixel,
        )?;

        if self.buf.len() % 2 != 0 {
            self.buf.push(0);
        }
        let strip_offset = self.buf.len() as u32;
        self.buf.extend_from_slice(&strip);

        let mut ifd = Ifd::new();
        ifd.add(IfdEntry::long(tag::IMAGE_WIDTH, layout.width));
        ifd.add(IfdEntry::long(tag::IMAGE_LENGTH, layout.height));
        ifd.add(IfdEntry::new(
            tag::BITS_PER_SAMPLE,
            IfdValue::Shorts(vec![
                layout.bits_per_sample;
                layout.samples_per_pixel as usize
            ]),
        ));
        ifd.add(IfdEntry::short(tag::COMPRESSION, layout.compression));
        ifd.add(IfdEntry::short(
            tag::PHOTOMETRIC_INTERPRETATION,
            layout.photometric,
        ));
        ifd.add(IfdEntry::new(
            tag::STRIP_OFFSETS,
            IfdValue::Longs(vec![strip_offset]),
        ));
        ifd.add(IfdEntry::short(tag::ORIENTATION, layout.orientation));
        ifd.add(IfdEntry::short(
            tag::SAMPLES_PER_PIXEL,
            layout.samples_per_pixel,
        ));
        ifd.add(IfdEntry::long(tag::ROWS_PER_STRIP, layout.height));
        ifd.add(IfdEntry::new(
            tag::STRIP_BYTE_COUNTS,
            IfdValue::Longs(vec![strip.len() as u32]),
        ));
        ifd.add(IfdEntry::short(
            tag::PLANAR_CONFIGURATION,
            layout.planar_config,
        ));
        ifd.add(IfdEntry::ascii(tag::SOFTWARE, SOFTWARE_NAME));

        let loc = ifd.write_to(&mut self.buf);
        LittleEndian::write_u32(
            &mut self.buf[self.next_ptr_pos..self.next_ptr_pos + 4],
            loc.start,
        );
        self.next_ptr_pos = loc.next_ptr_pos;
        Ok(())
    }

    /// Write the container image to disk
    pub fn flush(&mut self) -> Result<()> {
        std::fs::write(&self.path, &self.buf)?;
        Ok(())
    }

    /// Flush and consume the writer; fails if a page is still open
    pub fn finish(mut self) -> Result<()> {
        if self.page.is_some() {
            return Err(TiffError::InvalidPageState(
                "finish with a page in progress".into(),
            ));
        }
        self.flush()
    }

    /// Serialised container bytes built so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TiffReader;
    use crate::tags::photometric;

    fn gray_layout(width: u32, height: u32) -> PageLayout {
        PageLayout {
            width,
            height,
            samples_per_pixel: 1,
            bits_per_sample: 8,
            planar_config: planar::CHUNKY,
            photometric: photometric::MIN_IS_BLACK,
            orientation: 1,
            compression: compression::NONE,
        }
    }

    fn write_page(writer: &mut TiffWriter, layout: &PageLayout, seed: u8) {
        writer.begin_page(layout).unwrap();
        let row_len = layout.width as usize * layout.samples_per_pixel as usize;
        let mut row = vec![0u8; row_len];
        for y in 0..layout.height {
            for (x, sample) in row.iter_mut().enumerate() {
                *sample = seed.wrapping_add((x as u8).wrapping_mul(y as u8 + 1));
            }
            writer.write_scanline(&row, y).unwrap();
        }
        writer.end_page().unwrap();
    }

    #[test]
    fn test_single_page_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.tif");

        let mut writer = TiffWriter::create(&path).unwrap();
        write_page(&mut writer, &gray_layout(17, 5), 7);
        writer.finish().unwrap();

        let mut reader = TiffReader::open(&path).unwrap();
        assert_eq!(reader.directory_count(), 1);
        reader.select_directory(0).unwrap();
        assert_eq!(reader.field_u32(tag::IMAGE_WIDTH), Some(17));
        assert_eq!(reader.field_u32(tag::IMAGE_LENGTH), Some(5));
        assert_eq!(reader.field_u16(tag::SAMPLES_PER_PIXEL), Some(1));
        assert_eq!(reader.scanline_len(), 17);

        let mut row = vec![0u8; 17];
        reader.read_scanline(&mut row, 0).unwrap();
        assert_eq!(row[0], 7);
        assert_eq!(row[1], 8);
    }

    #[test]
    fn test_multi_page_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.tif");

        let mut writer = TiffWriter::create(&path).unwrap();
        for seed in [1, 2, 3] {
            write_page(&mut writer, &gray_layout(8, 4), seed);
        }
        writer.finish().unwrap();

        let mut reader = TiffReader::open(&path).unwrap();
        assert_eq!(reader.directory_count(), 3);
        for (index, seed) in [1u8, 2, 3].iter().enumerate() {
            reader.select_directory(index as u16).unwrap();
            let mut row = vec![0u8; 8];
            reader.read_scanline(&mut row, 0).unwrap();
            assert_eq!(row[0], *seed);
        }
    }

    #[test]
    fn test_append_chains_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grow.tif");

        let mut writer = TiffWriter::create(&path).unwrap();
        write_page(&mut writer, &gray_layout(8, 4), 10);
        writer.finish().unwrap();

        let mut writer = TiffWriter::append(&path).unwrap();
        write_page(&mut writer, &gray_layout(8, 4), 20);
        writer.finish().unwrap();

        let mut reader = TiffReader::open(&path).unwrap();
        assert_eq!(reader.directory_count(), 2);
        reader.select_directory(1).unwrap();
        let mut row = vec![0u8; 8];
        reader.read_scanline(&mut row, 0).unwrap();
        assert_eq!(row[0], 20);
    }

    #[test]
    fn test_append_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.tif");

        let mut writer = TiffWriter::append(&path).unwrap();
        write_page(&mut writer, &gray_layout(4, 4), 5);
        writer.finish().unwrap();

        let reader = TiffReader::open(&path).unwrap();
        assert_eq!(reader.directory_count(), 1);
    }

    #[test]
    fn test_lzw_page_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lzw.tif");

        let mut layout = gray_layout(32, 8);
        layout.compression = compression::LZW;

        let mut writer = TiffWriter::create(&path).unwrap();
        write_page(&mut writer, &layout, 42);
        writer.finish().unwrap();

        let mut reader = TiffReader::open(&path).unwrap();
        reader.select_directory(0).unwrap();
        assert_eq!(reader.field_u16(tag::COMPRESSION), Some(compression::LZW));
        let mut row = vec![0u8; 32];
        reader.read_scanline(&mut row, 3).unwrap();
        assert_eq!(row[0], 42);
    }

    #[test]
    fn test_begin_page_rejects_bad_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TiffWriter::create(dir.path().join("bad.tif")).unwrap();

        let mut layout = gray_layout(4, 4);
        layout.bits_per_sample = 16;
        assert!(writer.begin_page(&layout).is_err());

        let mut layout = gray_layout(4, 4);
        layout.compression = compression::CCITT_G4;
        assert!(writer.begin_page(&layout).is_err());

        let mut layout = gray_layout(4, 4);
        layout.compression = compression::JPEG;
        layout.samples_per_pixel = 4;
        assert!(writer.begin_page(&layout).is_err());

        let layout = gray_layout(0, 4);
        assert!(writer.begin_page(&layout).is_err());
    }

    #[test]
    fn test_page_lifecycle_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TiffWriter::create(dir.path().join("state.tif")).unwrap();

        assert!(writer.end_page().is_err());
        assert!(writer.write_scanline(&[0u8; 4], 0).is_err());

        writer.begin_page(&gray_layout(4, 1)).unwrap();
        assert!(writer.begin_page(&gray_layout(4, 1)).is_err());
        writer.write_scanline(&[0u8; 4], 0).unwrap();
        writer.end_page().unwrap();
        writer.finish().unwrap();
    }
}
