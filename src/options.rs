//! Configuration types for page-processing runs.
//!
//! Every knob lives in [`ProcessOptions`], built via its
//! [`ProcessOptionsBuilder`]. Options are immutable for the duration of a
//! run; a [`crate::engine::PageEngine`] holds one copy and every operation
//! reads from it. Keeping the knobs in one serialisable struct makes it
//! trivial to log a run's exact configuration and diff two runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use scanline_tiff::tags::compression;

/// Compression to apply to written pages, unless the forced-JPEG rule
/// overrides it (see [`crate::header::TagHeader::finalized`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionPreference {
    /// Store strips uncompressed.
    None,
    /// JPEG strips. (default — scanned documents are the common input)
    #[default]
    Jpeg,
    /// LZW strips: lossless, effective on text and line art.
    Lzw,
}

impl CompressionPreference {
    /// The TIFF Compression field value this preference writes.
    pub fn to_field_value(self) -> u16 {
        match self {
            CompressionPreference::None => compression::NONE,
            CompressionPreference::Jpeg => compression::JPEG,
            CompressionPreference::Lzw => compression::LZW,
        }
    }
}

impl FromStr for CompressionPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CompressionPreference::None),
            "jpeg" => Ok(CompressionPreference::Jpeg),
            "lzw" => Ok(CompressionPreference::Lzw),
            other => Err(format!(
                "unknown compression '{other}' (expected none, jpeg, or lzw)"
            )),
        }
    }
}

/// Options for a page-processing run.
///
/// Built via [`ProcessOptions::builder()`] or using
/// [`ProcessOptions::default()`].
///
/// # Example
/// ```rust
/// use tiffpages::{CompressionPreference, ProcessOptions};
///
/// let options = ProcessOptions::builder()
///     .compression(CompressionPreference::Lzw)
///     .threshold(128)
///     .build();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Compression preference for written pages. Default: JPEG.
    ///
    /// Only honoured where the page's photometric and sample count allow a
    /// choice: pages with more than one sample per pixel that are not
    /// palette-indexed are always written as JPEG regardless of this field.
    pub compression: CompressionPreference,

    /// Binarization threshold for [`crate::transform::ConversionMode::Binary`]
    /// conversions. Range: 0–255. Default: 100.
    ///
    /// A pixel becomes white only when its gray value is strictly greater
    /// than the threshold. 100 keeps faint pencil strokes black on typical
    /// 8-bit scans; raise it for dark backgrounds, lower it for light ones.
    pub threshold: u8,

    /// Directory for in-place-edit staging files. Default: the input's own
    /// directory.
    ///
    /// The staging file must live on the same filesystem as the input for
    /// the final swap to be a single atomic rename. Only set this when the
    /// input's directory is not writable, and keep it on the same mount.
    pub work_dir: Option<PathBuf>,

    /// Use the strict color-conversion eligibility predicate. Default: false.
    ///
    /// The legacy predicate `(not-palette && samples == 3) || samples == 4`
    /// lets palette-indexed 4-sample pages through to conversion. The strict
    /// form `not-palette && (samples == 3 || samples == 4)` excludes every
    /// palette page. Legacy remains the default so existing batch jobs keep
    /// their output byte-for-byte.
    pub strict_eligibility: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            compression: CompressionPreference::default(),
            threshold: 100,
            work_dir: None,
            strict_eligibility: false,
        }
    }
}

impl ProcessOptions {
    /// Create a new builder for `ProcessOptions`.
    pub fn builder() -> ProcessOptionsBuilder {
        ProcessOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`ProcessOptions`].
#[derive(Debug)]
pub struct ProcessOptionsBuilder {
    options: ProcessOptions,
}

impl ProcessOptionsBuilder {
    pub fn compression(mut self, pref: CompressionPreference) -> Self {
        self.options.compression = pref;
        self
    }

    pub fn threshold(mut self, threshold: u8) -> Self {
        self.options.threshold = threshold;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.work_dir = Some(dir.into());
        self
    }

    pub fn strict_eligibility(mut self, strict: bool) -> Self {
        self.options.strict_eligibility = strict;
        self
    }

    /// Build the options. Every field is range-safe by construction, so
    /// this cannot fail.
    pub fn build(self) -> ProcessOptions {
        self.options
    }
}
