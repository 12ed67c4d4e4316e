//! The page engine: every multi-page operation lives here.
//!
//! Each operation follows the same shape: open an [`IoSession`], walk the
//! source's directory chain in order, decide a per-page disposition (copy,
//! transform-and-copy, or skip), close the session, and return a
//! [`RunSummary`]. Pages are processed strictly one at a time — the peak
//! pixel memory of any run is one decoded page plus one scanline.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use scanline_tiff::TiffReader;

use crate::classify::{classify, eligible_for_color_conversion, is_blank, PageKind};
use crate::copier::copy_page;
use crate::error::TiffPagesError;
use crate::header::TagHeader;
use crate::options::ProcessOptions;
use crate::transform::ConversionMode;

/// Per-run page accounting, returned by every mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Pages in the source container.
    pub total_pages: u16,
    /// Pages written to the destination.
    pub copied: u16,
    /// Pages dropped by the operation's disposition rule.
    pub skipped: u16,
}

/// Everything [`PageEngine::file_info`] learns about one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// 1-based page ordinal.
    pub number: u16,
    /// Pixel classification.
    pub kind: PageKind,
    /// The page's header fields as stored.
    pub header: TagHeader,
}

/// Read-only report over a whole container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub total_pages: u16,
    pub blank_pages: u16,
    pub pages: Vec<PageInfo>,
}

impl FileReport {
    /// Render the report as the plain-text page dump.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total number of pages: {}", self.total_pages);
        let _ = writeln!(out, "Total number of blank pages: {}", self.blank_pages);

        for page in &self.pages {
            let h = &page.header;
            let _ = writeln!(out);
            let _ = writeln!(out, "Page Number: {}", page.number);
            let _ = writeln!(out, "---------------");
            let _ = writeln!(out, "Width: {}", h.width);
            let _ = writeln!(out, "Height: {}", h.height);
            let _ = writeln!(out, "Planar Config: {}", h.planar_config);
            let _ = writeln!(out, "Photometric: {}", h.photometric);
            let _ = writeln!(out, "Orientation: {}", h.orientation);
            let _ = writeln!(out, "Compression: {}", h.compression);
            let _ = writeln!(out, "Bits Per Sample: {}", h.bits_per_sample);
            let _ = writeln!(out, "Samples Per Pixel: {}", h.samples_per_pixel);
            let _ = writeln!(out, "Classification: {:?}", page.kind);
        }
        out
    }
}

/// Multi-page TIFF operations, configured once via [`ProcessOptions`].
///
/// # Example
/// ```no_run
/// use tiffpages::{PageEngine, ProcessOptions};
///
/// let engine = PageEngine::new(ProcessOptions::default());
/// let summary = engine.remove_blank_pages("scans.tif".as_ref(), None)?;
/// println!("kept {} of {} pages", summary.copied, summary.total_pages);
/// # Ok::<(), tiffpages::TiffPagesError>(())
/// ```
pub struct PageEngine {
    options: ProcessOptions,
}

impl PageEngine {
    /// Create an engine over the given options.
    pub fn new(options: ProcessOptions) -> Self {
        PageEngine { options }
    }

    /// The options this engine runs with.
    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Append every page of `file2` to `file1` in place.
    ///
    /// `file1` is created when missing, so merging into a fresh path is a
    /// plain copy of `file2`.
    pub fn merge(&self, file1: &Path, file2: &Path) -> Result<RunSummary, TiffPagesError> {
        let mut session = crate::session::IoSession::append(file2, file1)?;
        let total_pages = session.reader().directory_count();
        info!(
            dest = %file1.display(),
            source = %file2.display(),
            pages = total_pages,
            "merging containers"
        );

        for index in 0..total_pages {
            let (reader, writer) = session.parts();
            reader.select_directory(index)?;
            let header = TagHeader::read(reader);
            copy_page(
                reader,
                writer,
                &header,
                None,
                self.options.compression,
                index + 1,
            )?;
        }

        session.close()?;
        Ok(RunSummary {
            total_pages,
            copied: total_pages,
            skipped: 0,
        })
    }

    /// Copy every non-blank page; drop the blank ones.
    pub fn remove_blank_pages(
        &self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<RunSummary, TiffPagesError> {
        self.filtered_copy(input, output, "removing blank pages", |reader, header, page| {
            let blank = is_blank(reader, header)?;
            if blank {
                debug!(page, "blank page dropped");
            }
            Ok(if blank { Disposition::Skip } else { Disposition::Copy })
        })
    }

    /// Copy every page whose 1-based ordinal is *not* in `pages`.
    ///
    /// The set type collapses duplicate requests; ordinals past the end of
    /// the container are ignored.
    pub fn remove_pages(
        &self,
        input: &Path,
        pages: &BTreeSet<u16>,
        output: Option<&Path>,
    ) -> Result<RunSummary, TiffPagesError> {
        self.filtered_copy(input, output, "removing pages by number", |_, _, page| {
            Ok(if pages.contains(&page) {
                debug!(page, "page dropped by number");
                Disposition::Skip
            } else {
                Disposition::Copy
            })
        })
    }

    /// Convert eligible pages with `mode`; copy everything else through.
    ///
    /// Blank pages and pages whose pixel format fails the eligibility
    /// predicate are passed through unmodified, never dropped.
    pub fn convert_pages(
        &self,
        input: &Path,
        mode: ConversionMode,
        output: Option<&Path>,
    ) -> Result<RunSummary, TiffPagesError> {
        let strict = self.options.strict_eligibility;
        self.filtered_copy(input, output, "converting pages", |reader, header, page| {
            if !eligible_for_color_conversion(header, strict) {
                debug!(page, "pixel format not eligible, passing through");
                return Ok(Disposition::Copy);
            }
            if is_blank(reader, header)? {
                debug!(page, "blank page passed through");
                return Ok(Disposition::Copy);
            }
            Ok(Disposition::Convert(mode))
        })
    }

    /// Inspect a container without writing any image data.
    ///
    /// When `output` is given the rendered text report is written there;
    /// callers can also serialise the returned [`FileReport`] directly.
    pub fn file_info(
        &self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<FileReport, TiffPagesError> {
        let mut reader =
            TiffReader::open(input).map_err(|source| TiffPagesError::InputOpen {
                path: input.to_path_buf(),
                source,
            })?;
        let total_pages = reader.directory_count();
        info!(input = %input.display(), pages = total_pages, "inspecting container");

        let mut pages = Vec::with_capacity(total_pages as usize);
        let mut blank_pages = 0u16;
        for index in 0..total_pages {
            reader.select_directory(index)?;
            let header = TagHeader::read(&reader);
            let kind = classify(&reader, &header)?;
            if kind == PageKind::Blank {
                blank_pages += 1;
            }
            pages.push(PageInfo {
                number: index + 1,
                kind,
                header,
            });
        }

        let report = FileReport {
            total_pages,
            blank_pages,
            pages,
        };

        if let Some(path) = output {
            std::fs::write(path, report.render()).map_err(|source| {
                TiffPagesError::ReportWrite {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        }
        Ok(report)
    }

    /// Shared walk for the input→output operations: one disposition
    /// decision per page, strictly in order.
    fn filtered_copy<F>(
        &self,
        input: &Path,
        output: Option<&Path>,
        what: &str,
        mut decide: F,
    ) -> Result<RunSummary, TiffPagesError>
    where
        F: FnMut(&TiffReader, &TagHeader, u16) -> Result<Disposition, scanline_tiff::TiffError>,
    {
        let mut session =
            crate::session::IoSession::create(input, output, self.options.work_dir.as_deref())?;
        let total_pages = session.reader().directory_count();
        info!(input = %input.display(), pages = total_pages, "{what}");

        let mut copied = 0u16;
        let mut skipped = 0u16;
        for index in 0..total_pages {
            let page = index + 1;
            let (reader, writer) = session.parts();
            reader.select_directory(index)?;
            let header = TagHeader::read(reader);

            match decide(reader, &header, page)? {
                Disposition::Skip => skipped += 1,
                Disposition::Copy => {
                    copy_page(reader, writer, &header, None, self.options.compression, page)?;
                    copied += 1;
                }
                Disposition::Convert(mode) => {
                    copy_page(
                        reader,
                        writer,
                        &header,
                        Some(mode),
                        self.options.compression,
                        page,
                    )?;
                    copied += 1;
                }
            }
        }

        session.close()?;
        info!(copied, skipped, "{what} finished");
        Ok(RunSummary {
            total_pages,
            copied,
            skipped,
        })
    }
}

enum Disposition {
    Copy,
    Convert(ConversionMode),
    Skip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serialises_to_json() {
        let summary = RunSummary {
            total_pages: 5,
            copied: 4,
            skipped: 1,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"copied\":4"));
    }

    #[test]
    fn report_render_layout() {
        let report = FileReport {
            total_pages: 1,
            blank_pages: 0,
            pages: vec![PageInfo {
                number: 1,
                kind: PageKind::Grayscale,
                header: TagHeader {
                    width: 640,
                    height: 480,
                    samples_per_pixel: 1,
                    bits_per_sample: 8,
                    planar_config: 1,
                    orientation: 1,
                    photometric: 1,
                    compression: 1,
                },
            }],
        };
        let text = report.render();
        assert!(text.contains("Total number of pages: 1"));
        assert!(text.contains("Page Number: 1"));
        assert!(text.contains("Width: 640"));
        assert!(text.contains("Classification: Grayscale"));
    }
}
