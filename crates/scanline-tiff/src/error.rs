//! Codec error types

use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, TiffError>;

/// Codec error types
#[derive(Error, Debug)]
pub enum TiffError {
    /// Invalid magic number
    #[error("Invalid TIFF magic number")]
    InvalidMagic,

    /// Invalid version
    #[error("Unsupported TIFF version: {version}")]
    UnsupportedVersion { version: u16 },

    /// Unsupported compression
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(u16),

    /// Invalid IFD
    #[error("Invalid IFD: {0}")]
    InvalidIfd(String),

    /// Missing required tag
    #[error("Missing required tag: {0}")]
    MissingTag(String),

    /// Invalid image dimensions
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Directory index past the end of the IFD chain
    #[error("Directory {index} out of range: file has {count} directories")]
    DirectoryOutOfRange { index: u16, count: u16 },

    /// Scanline access without a selected directory or an open page
    #[error("No directory selected")]
    NoDirectorySelected,

    /// Page lifecycle violation on write
    #[error("Invalid page state: {0}")]
    InvalidPageState(String),

    /// Row index past the page height
    #[error("Row {row} out of range: page height is {height}")]
    RowOutOfRange { row: u32, height: u32 },

    /// Insufficient data
    #[error("Insufficient data: needed {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// Buffer too small
    #[error("Buffer too small: needed {needed} bytes, got {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Compression error
    #[error("Compression error: {0}")]
    CompressionError(String),

    /// Decompression error
    #[error("Decompression error: {0}")]
    DecompressionError(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TiffError::InvalidMagic;
        assert_eq!(format!("{}", err), "Invalid TIFF magic number");

        let err = TiffError::UnsupportedVersion { version: 43 };
        assert!(format!("{}", err).contains("43"));

        let err = TiffError::MissingTag("ImageWidth".into());
        assert!(format!("{}", err).contains("ImageWidth"));

        let err = TiffError::DirectoryOutOfRange { index: 5, count: 3 };
        assert!(format!("{}", err).contains("5"));
        assert!(format!("{}", err).contains("3"));
    }
}
