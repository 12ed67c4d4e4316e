//! Strip-based multi-page TIFF codec with scanline-level access
//!
//! Supports baseline, strip-organized TIFF: 8-bit samples, chunky planar
//! layout, any number of pages chained through IFD offsets. Both byte orders
//! are accepted on read; output is always little-endian.
//!
//! Compression on read and write: none, PackBits, LZW, and JPEG strips
//! (JPEG limited to 1 or 3 samples per pixel). Tiled layouts are rejected.
//!
//! # Example
//!
//! ```ignore
//! use scanline_tiff::{TiffReader, TiffWriter, PageLayout};
//!
//! let mut reader = TiffReader::open("scan.tif")?;
//! reader.select_directory(0)?;
//! let mut row = vec![0u8; reader.scanline_len()];
//! reader.read_scanline(&mut row, 0)?;
//! ```

pub mod codec;
pub mod error;
pub mod ifd;
pub mod reader;
pub mod tags;
pub mod writer;

pub use error::{Result, TiffError};
pub use ifd::{Ifd, IfdEntry, IfdValue};
pub use reader::TiffReader;
pub use writer::{PageLayout, TiffWriter};

/// TIFF magic number - little endian "II"
pub const TIFF_MAGIC_LE: [u8; 2] = [0x49, 0x49];

/// TIFF magic number - big endian "MM"
pub const TIFF_MAGIC_BE: [u8; 2] = [0x4D, 0x4D];

/// TIFF version (42)
pub const TIFF_VERSION: u16 = 42;

/// Byte order of a TIFF container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub(crate) fn u16(self, data: &[u8]) -> u16 {
        use byteorder::ByteOrder;
        match self {
            Endian::Little => byteorder::LittleEndian::read_u16(data),
            Endian::Big => byteorder::BigEndian::read_u16(data),
        }
    }

    pub(crate) fn u32(self, data: &[u8]) -> u32 {
        use byteorder::ByteOrder;
        match self {
            Endian::Little => byteorder::LittleEndian::read_u32(data),
            Endian::Big => byteorder::BigEndian::read_u32(data),
        }
    }
}
