//! # tiffpages
//!
//! Merge, prune, and convert pages of multi-page TIFF files.
//!
//! ## Why this crate?
//!
//! Scanned-document batches accumulate junk: blank separator sheets, cover
//! pages nobody wants, and color scans of black-and-white originals that
//! waste storage. This crate walks a container page by page, classifies
//! each page from its actual pixels, and streams the keepers into a fresh
//! container — one scanline of pixel memory at a time, so hundred-page
//! scan jobs run in constant space.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input.tif
//!  │
//!  ├─ 1. Session   open source, stage destination (in-place or explicit)
//!  ├─ 2. Header    read the page's 8 tag fields, normalize for writing
//!  ├─ 3. Classify  blank / color / grayscale from the pixels themselves
//!  ├─ 4. Decide    copy, transform-and-copy, or skip (per operation)
//!  ├─ 5. Copy      stream scanlines, optionally collapsing RGB to gray
//!  └─ 6. Commit    flush; in-place edits atomically replace the input
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiffpages::{PageEngine, ProcessOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = PageEngine::new(ProcessOptions::default());
//!     let summary = engine.remove_blank_pages("scans.tif".as_ref(), None)?;
//!     eprintln!("kept {} of {} pages", summary.copied, summary.total_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tiffpages` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! tiffpages = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod classify;
pub mod copier;
pub mod engine;
pub mod error;
pub mod header;
pub mod options;
pub mod session;
pub mod transform;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use classify::{background_sample, classify, eligible_for_color_conversion, is_blank, PageKind};
pub use engine::{FileReport, PageEngine, PageInfo, RunSummary};
pub use error::TiffPagesError;
pub use header::TagHeader;
pub use options::{CompressionPreference, ProcessOptions, ProcessOptionsBuilder};
pub use session::IoSession;
pub use transform::{luminance, transform_scanline, ConversionMode};
