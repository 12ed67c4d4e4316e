//! Streaming transfer of one page from source to destination.
//!
//! One scanline buffer per page, sized by the source, reused for every
//! row. Header normalization happens here, immediately before the header
//! is written, so no caller can forget it.

use tracing::{debug, trace};

use scanline_tiff::{TiffReader, TiffWriter};

use crate::error::TiffPagesError;
use crate::header::TagHeader;
use crate::options::CompressionPreference;
use crate::transform::{transform_scanline, ConversionMode};

/// Copy the reader's selected page onto the writer.
///
/// `mode = None` copies pixels through untouched. `page` is the 1-based
/// ordinal used only for error context and logging.
pub fn copy_page(
    reader: &TiffReader,
    writer: &mut TiffWriter,
    header: &TagHeader,
    mode: Option<ConversionMode>,
    pref: CompressionPreference,
    page: u16,
) -> Result<(), TiffPagesError> {
    let out_header = header.finalized(pref);
    debug!(
        page,
        width = out_header.width,
        height = out_header.height,
        samples = out_header.samples_per_pixel,
        compression = out_header.compression,
        transform = ?mode,
        "copying page"
    );

    writer
        .begin_page(&out_header.layout())
        .map_err(|source| TiffPagesError::HeaderWrite { page, source })?;

    let mut row = vec![0u8; reader.scanline_len()];
    for y in 0..header.height {
        reader
            .read_scanline(&mut row, y)
            .map_err(|source| TiffPagesError::ScanlineRead { page, row: y, source })?;

        if let Some(mode) = mode {
            transform_scanline(&mut row, header.samples_per_pixel, mode);
        }

        writer
            .write_scanline(&row, y)
            .map_err(|source| TiffPagesError::ScanlineWrite { page, row: y, source })?;
    }

    writer
        .end_page()
        .map_err(|source| TiffPagesError::PageFinalize { page, source })?;

    trace!(page, rows = header.height, "page copied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompressionPreference;
    use scanline_tiff::tags::{photometric, planar, tag};
    use scanline_tiff::PageLayout;

    fn write_source(path: &std::path::Path, rows: &[Vec<u8>], samples: u16, photo: u16) {
        let mut writer = TiffWriter::create(path).unwrap();
        writer
            .begin_page(&PageLayout {
                width: (rows[0].len() / samples as usize) as u32,
                height: rows.len() as u32,
                samples_per_pixel: samples,
                bits_per_sample: 8,
                planar_config: planar::CHUNKY,
                photometric: photo,
                orientation: 1,
                compression: 1,
            })
            .unwrap();
        for (y, row) in rows.iter().enumerate() {
            writer.write_scanline(row, y as u32).unwrap();
        }
        writer.end_page().unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn passthrough_copy_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.tif");
        let dst = dir.path().join("dst.tif");
        let rows = vec![vec![1u8, 2, 3, 4], vec![5, 6, 7, 8]];
        write_source(&src, &rows, 1, photometric::MIN_IS_BLACK);

        let mut reader = TiffReader::open(&src).unwrap();
        reader.select_directory(0).unwrap();
        let header = TagHeader::read(&reader);

        let mut writer = TiffWriter::create(&dst).unwrap();
        copy_page(
            &reader,
            &mut writer,
            &header,
            None,
            CompressionPreference::None,
            1,
        )
        .unwrap();
        writer.finish().unwrap();

        let mut copied = TiffReader::open(&dst).unwrap();
        copied.select_directory(0).unwrap();
        let mut row = vec![0u8; 4];
        for (y, expected) in rows.iter().enumerate() {
            copied.read_scanline(&mut row, y as u32).unwrap();
            assert_eq!(&row, expected);
        }
    }

    #[test]
    fn grayscale_copy_transforms_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.tif");
        let dst = dir.path().join("dst.tif");
        // One RGB pixel per row
        let rows = vec![vec![200u8, 100, 50], vec![10, 10, 10]];
        write_source(&src, &rows, 3, photometric::PALETTE);

        let mut reader = TiffReader::open(&src).unwrap();
        reader.select_directory(0).unwrap();
        let header = TagHeader::read(&reader);

        let mut writer = TiffWriter::create(&dst).unwrap();
        copy_page(
            &reader,
            &mut writer,
            &header,
            Some(ConversionMode::Grayscale),
            // Palette photometric keeps the preference, so the output
            // stays lossless and assertable
            CompressionPreference::None,
            1,
        )
        .unwrap();
        writer.finish().unwrap();

        let mut copied = TiffReader::open(&dst).unwrap();
        copied.select_directory(0).unwrap();
        let mut row = vec![0u8; 3];
        copied.read_scanline(&mut row, 0).unwrap();
        assert_eq!(row, vec![124, 124, 124]);
        copied.read_scanline(&mut row, 1).unwrap();
        assert_eq!(row, vec![10, 10, 10]);
    }

    #[test]
    fn header_rejection_is_fatal_with_page_context() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.tif");
        let rows = vec![vec![1u8, 2, 3, 4]];
        write_source(&src, &rows, 4, photometric::RGB);

        let mut reader = TiffReader::open(&src).unwrap();
        reader.select_directory(0).unwrap();
        let header = TagHeader::read(&reader);

        let mut writer = TiffWriter::create(dir.path().join("dst.tif")).unwrap();
        // Forced JPEG on a 4-sample page is rejected by the codec
        let err = copy_page(
            &reader,
            &mut writer,
            &header,
            None,
            CompressionPreference::None,
            7,
        )
        .unwrap_err();
        assert!(matches!(err, TiffPagesError::HeaderWrite { page: 7, .. }));
    }

    #[test]
    fn orientation_is_normalized_on_copy() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.tif");
        let dst = dir.path().join("dst.tif");
        write_source(&src, &[vec![9u8, 9]], 1, photometric::MIN_IS_BLACK);

        let mut reader = TiffReader::open(&src).unwrap();
        reader.select_directory(0).unwrap();
        let mut header = TagHeader::read(&reader);
        header.orientation = 0; // as read from a buggy scanner

        let mut writer = TiffWriter::create(&dst).unwrap();
        copy_page(
            &reader,
            &mut writer,
            &header,
            None,
            CompressionPreference::None,
            1,
        )
        .unwrap();
        writer.finish().unwrap();

        let mut copied = TiffReader::open(&dst).unwrap();
        copied.select_directory(0).unwrap();
        assert_eq!(copied.field_u16(tag::ORIENTATION), Some(1));
    }
}
