//! Error types for the tiffpages library.
//!
//! Every variant of [`TiffPagesError`] is **fatal**: a multi-page operation
//! either completes for every page or fails as a whole. There is no
//! per-page partial-success mode — a half-written destination container is
//! unreliable by contract, so the first failure aborts the run and the
//! error carries enough context (path, page, row) to point at the cause.

use scanline_tiff::TiffError;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the tiffpages library.
///
/// Page and row numbers in messages are 1-based page ordinals and 0-based
/// rows, matching what [`crate::engine::FileReport`] prints.
#[derive(Debug, Error)]
pub enum TiffPagesError {
    // ── Session errors ────────────────────────────────────────────────────
    /// Source container could not be opened or parsed.
    #[error("Failed to open input TIFF '{path}': {source}\nCheck the path exists and the file is a strip-based TIFF.")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: TiffError,
    },

    /// Destination container could not be created.
    #[error("Failed to create output TIFF '{path}': {source}\nCheck the directory exists and is writable.")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: TiffError,
    },

    /// Staging file for an in-place edit could not be created.
    #[error("Failed to create staging file next to '{path}': {source}\nPass a working directory on the same filesystem if the input's directory is read-only.")]
    StagingCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic replace of the input by the staging file failed.
    ///
    /// The original input is still intact when this is returned.
    #[error("Failed to replace '{path}' with its edited copy: {source}")]
    RenameSwap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Page transfer errors ──────────────────────────────────────────────
    /// The destination rejected a page's header fields.
    #[error("Failed to write header of page {page}: {source}")]
    HeaderWrite {
        page: u16,
        #[source]
        source: TiffError,
    },

    /// A scanline could not be read from the source page.
    #[error("Failed to read row {row} of page {page}: {source}")]
    ScanlineRead {
        page: u16,
        row: u32,
        #[source]
        source: TiffError,
    },

    /// A scanline could not be written to the destination page.
    #[error("Failed to write row {row} of page {page}: {source}")]
    ScanlineWrite {
        page: u16,
        row: u32,
        #[source]
        source: TiffError,
    },

    /// The destination could not encode and finish a page.
    #[error("Failed to finalize page {page}: {source}")]
    PageFinalize {
        page: u16,
        #[source]
        source: TiffError,
    },

    // ── Report errors ─────────────────────────────────────────────────────
    /// The rendered file report could not be written.
    #[error("Failed to write report file '{path}': {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Codec failure outside any specific page transfer step.
    #[error("TIFF codec error: {0}")]
    Codec(#[from] TiffError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanline_read_display() {
        let e = TiffPagesError::ScanlineRead {
            page: 3,
            row: 17,
            source: TiffError::NoDirectorySelected,
        };
        let msg = e.to_string();
        assert!(msg.contains("row 17"), "got: {msg}");
        assert!(msg.contains("page 3"), "got: {msg}");
    }

    #[test]
    fn input_open_display_mentions_path() {
        let e = TiffPagesError::InputOpen {
            path: "scans/batch.tif".into(),
            source: TiffError::InvalidMagic,
        };
        assert!(e.to_string().contains("scans/batch.tif"));
    }

    #[test]
    fn rename_swap_display() {
        let e = TiffPagesError::RenameSwap {
            path: "doc.tif".into(),
            source: std::io::Error::other("cross-device link"),
        };
        assert!(e.to_string().contains("doc.tif"));
    }
}
