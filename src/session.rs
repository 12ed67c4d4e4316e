//! Input/output lifecycle for one multi-page operation.
//!
//! An [`IoSession`] owns the source reader, the destination writer, and —
//! for in-place edits — the staging file that will atomically replace the
//! input on [`IoSession::close`]. The staging file lives in the input's
//! directory (or a configured working directory on the same filesystem) so
//! the final swap is a single rename; a crash mid-run leaves the original
//! input untouched.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use scanline_tiff::{TiffReader, TiffWriter};

use crate::error::TiffPagesError;

#[derive(Debug)]
struct Staging {
    file: NamedTempFile,
    replaces: PathBuf,
}

/// Paired reader/writer for one operation.
#[derive(Debug)]
pub struct IoSession {
    reader: TiffReader,
    writer: TiffWriter,
    staging: Option<Staging>,
}

impl IoSession {
    /// Open `input` for reading and prepare the destination.
    ///
    /// With `output = Some(path)` any pre-existing file there is replaced.
    /// With `output = None` the edit is in-place: writes go to a staging
    /// file that [`close`](Self::close) renames over the input.
    pub fn create(
        input: &Path,
        output: Option<&Path>,
        work_dir: Option<&Path>,
    ) -> Result<Self, TiffPagesError> {
        let reader = TiffReader::open(input).map_err(|source| TiffPagesError::InputOpen {
            path: input.to_path_buf(),
            source,
        })?;

        match output {
            Some(path) => {
                let writer =
                    TiffWriter::create(path).map_err(|source| TiffPagesError::OutputCreate {
                        path: path.to_path_buf(),
                        source,
                    })?;
                debug!(input = %input.display(), output = %path.display(), "session opened");
                Ok(IoSession {
                    reader,
                    writer,
                    staging: None,
                })
            }
            None => {
                let dir = match work_dir {
                    Some(dir) => dir.to_path_buf(),
                    None => input
                        .parent()
                        .filter(|p| !p.as_os_str().is_empty())
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from(".")),
                };
                let file = NamedTempFile::new_in(&dir).map_err(|source| {
                    TiffPagesError::StagingCreate {
                        path: input.to_path_buf(),
                        source,
                    }
                })?;
                let writer = TiffWriter::create(file.path()).map_err(|source| {
                    TiffPagesError::OutputCreate {
                        path: file.path().to_path_buf(),
                        source,
                    }
                })?;
                debug!(
                    input = %input.display(),
                    staging = %file.path().display(),
                    "in-place session opened"
                );
                Ok(IoSession {
                    reader,
                    writer,
                    staging: Some(Staging {
                        file,
                        replaces: input.to_path_buf(),
                    }),
                })
            }
        }
    }

    /// Open a merge session: `source`'s pages are read, `dest` is opened
    /// for appending (and created when missing).
    pub fn append(source: &Path, dest: &Path) -> Result<Self, TiffPagesError> {
        let reader = TiffReader::open(source).map_err(|s| TiffPagesError::InputOpen {
            path: source.to_path_buf(),
            source: s,
        })?;
        let writer = TiffWriter::append(dest).map_err(|s| TiffPagesError::OutputCreate {
            path: dest.to_path_buf(),
            source: s,
        })?;
        debug!(source = %source.display(), dest = %dest.display(), "append session opened");
        Ok(IoSession {
            reader,
            writer,
            staging: None,
        })
    }

    /// The source reader.
    pub fn reader(&self) -> &TiffReader {
        &self.reader
    }

    /// Both halves at once, for loops that read and write per page.
    pub fn parts(&mut self) -> (&mut TiffReader, &mut TiffWriter) {
        (&mut self.reader, &mut self.writer)
    }

    /// Flush the destination and, for in-place edits, atomically replace
    /// the input with the staging file.
    pub fn close(self) -> Result<(), TiffPagesError> {
        let IoSession {
            reader: _,
            mut writer,
            staging,
        } = self;

        writer.flush()?;

        if let Some(staging) = staging {
            let target = staging.replaces;
            staging
                .file
                .persist(&target)
                .map_err(|e| TiffPagesError::RenameSwap {
                    path: target.clone(),
                    source: e.error,
                })?;
            info!(path = %target.display(), "in-place edit committed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_tiff::tags::{photometric, planar};
    use scanline_tiff::PageLayout;

    fn one_page_tiff(path: &Path, value: u8) {
        let mut writer = TiffWriter::create(path).unwrap();
        writer
            .begin_page(&PageLayout {
                width: 4,
                height: 2,
                samples_per_pixel: 1,
                bits_per_sample: 8,
                planar_config: planar::CHUNKY,
                photometric: photometric::MIN_IS_BLACK,
                orientation: 1,
                compression: 1,
            })
            .unwrap();
        let row = [value; 4];
        writer.write_scanline(&row, 0).unwrap();
        writer.write_scanline(&row, 1).unwrap();
        writer.end_page().unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn missing_input_is_input_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = IoSession::create(&dir.path().join("absent.tif"), None, None).unwrap_err();
        assert!(matches!(err, TiffPagesError::InputOpen { .. }));
    }

    #[test]
    fn explicit_output_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tif");
        let output = dir.path().join("out.tif");
        one_page_tiff(&input, 1);
        std::fs::write(&output, b"stale contents").unwrap();

        let session = IoSession::create(&input, Some(&output), None).unwrap();
        session.close().unwrap();

        // The stale file was truncated down to an empty container
        let reader = TiffReader::open(&output).unwrap();
        assert_eq!(reader.directory_count(), 0);
    }

    #[test]
    fn in_place_close_swaps_staging_over_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.tif");
        one_page_tiff(&input, 42);

        let session = IoSession::create(&input, None, None).unwrap();
        session.close().unwrap();

        // Input now holds the (empty) edited container, and no staging
        // file is left behind
        let reader = TiffReader::open(&input).unwrap();
        assert_eq!(reader.directory_count(), 0);
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("doc.tif")]);
    }

    #[test]
    fn staging_honours_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.tif");
        one_page_tiff(&input, 3);

        let session = IoSession::create(&input, None, Some(work.path())).unwrap();
        let staged: Vec<_> = std::fs::read_dir(work.path()).unwrap().collect();
        assert_eq!(staged.len(), 1);
        drop(session);
    }
}
