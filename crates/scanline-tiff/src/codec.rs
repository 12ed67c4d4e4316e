//! Strip compression codecs: none, PackBits, LZW, JPEG
//!
//! PackBits and LZW are implemented directly; JPEG strips are delegated to
//! the `image` crate and limited to 1 or 3 samples per pixel.

use crate::error::{Result, TiffError};
use crate::tags::compression;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat};

const JPEG_QUALITY: u8 = 95;

/// Decode one strip into raw samples
///
/// `expected_size` is the decoded byte count the strip should produce;
/// codecs that cannot know it up front (JPEG) are checked by the caller.
pub fn decode_strip(
    method: u16,
    data: &[u8],
    expected_size: usize,
    samples_per_pixel: usize,
) -> Result<Vec<u8>> {
    match method {
        compression::NONE => Ok(data.to_vec()),
        compression::PACKBITS => decompress_packbits(data, expected_size),
        compression::LZW => decompress_lzw(data, expected_size),
        compression::JPEG => decode_jpeg(data, samples_per_pixel),
        other => Err(TiffError::UnsupportedCompression(other)),
    }
}

/// Encode raw samples into one strip
pub fn encode_strip(
    method: u16,
    rows: &[u8],
    width: u32,
    height: u32,
    samples_per_pixel: u16,
) -> Result<Vec<u8>> {
    match method {
        compression::NONE => Ok(rows.to_vec()),
        compression::PACKBITS => Ok(compress_packbits(rows)),
        compression::LZW => Ok(compress_lzw(rows)),
        compression::JPEG => encode_jpeg(rows, width, height, samples_per_pixel),
        other => Err(TiffError::UnsupportedCompression(other)),
    }
}

fn decode_jpeg(data: &[u8], samples_per_pixel: usize) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| TiffError::DecompressionError(format!("JPEG strip: {e}")))?;
    match samples_per_pixel {
        1 => Ok(img.to_luma8().into_raw()),
        3 => Ok(img.to_rgb8().into_raw()),
        n => Err(TiffError::UnsupportedFeature(format!(
            "JPEG strips with {n} samples per pixel"
        ))),
    }
}

fn encode_jpeg(rows: &[u8], width: u32, height: u32, samples_per_pixel: u16) -> Result<Vec<u8>> {
    let color = match samples_per_pixel {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        n => {
            return Err(TiffError::UnsupportedFeature(format!(
                "JPEG strips with {n} samples per pixel"
            )))
        }
    };
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode(rows, width, height, color)
        .map_err(|e| TiffError::CompressionError(format!("JPEG strip: {e}")))?;
    Ok(out)
}

/// Decompress PackBits RLE data
fn decompress_packbits(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size);
    let mut i = 0;

    while i < data.len() && output.len() < expected_size {
        let header = data[i] as i8;
        i += 1;

        if header >= 0 {
            // Literal run: copy next (header + 1) bytes
            let count = (header as usize) + 1;
            if i + count > data.len() {
                return Err(TiffError::DecompressionError(
                    "PackBits: unexpected end of data".into(),
                ));
            }
            output.extend_from_slice(&data[i..i + count]);
            i += count;
        } else if header != -128 {
            // Repeat run: repeat next byte (-header + 1) times
            let count = (-header as usize) + 1;
            if i >= data.len() {
                return Err(TiffError::DecompressionError(
                    "PackBits: unexpected end of data".into(),
                ));
            }
            let value = data[i];
            i += 1;
            output.resize(output.len() + count, value);
        }
        // header == -128 is a no-op
    }

    Ok(output)
}

/// Compress data using PackBits RLE
fn compress_packbits(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::new();
    let mut i = 0;

    while i < data.len() {
        // Look for runs
        let mut run_length = 1;
        while i + run_length < data.len() && run_length < 128 && data[i + run_length] == data[i] {
            run_length += 1;
        }

        if run_length > 1 {
            // Encode run
            output.push((-(run_length as i8 - 1)) as u8);
            output.push(data[i]);
            i += run_length;
        } else {
            // Look for literal sequence
            let start = i;
            let mut literal_len = 1;
            i += 1;

            while i < data.len() && literal_len < 128 {
                // Stop when the next two bytes begin a run
                if i + 1 < data.len() && data[i] == data[i + 1] {
                    break;
                }
                literal_len += 1;
                i += 1;
            }

            output.push((literal_len - 1) as u8);
            output.extend_from_slice(&data[start..start + literal_len]);
        }
    }

    output
}

/// LZW decoder state
struct LzwDecoder {
    table: Vec<Vec<u8>>,
    code_size: u8,
    next_code: u16,
    clear_code: u16,
    eoi_code: u16,
}

impl LzwDecoder {
    fn new() -> Self {
        let mut decoder = LzwDecoder {
            table: Vec::new(),
            code_size: 9,
            next_code: 0,
            clear_code: 256,
            eoi_code: 257,
        };
        decoder.reset();
        decoder
    }

    fn reset(&mut self) {
        self.table.clear();
        for i in 0..256 {
            self.table.push(vec![i as u8]);
        }
        self.table.push(vec![]); // 256 = clear
        self.table.push(vec![]); // 257 = EOI
        self.code_size = 9;
        self.next_code = 258;
    }

    fn add_entry(&mut self, entry: Vec<u8>) {
        self.table.push(entry);
        self.next_code += 1;

        // The decoder trails the encoder's table by one entry, so reads
        // must widen one code earlier than writes do
        if self.next_code + 1 >= (1 << self.code_size) && self.code_size < 12 {
            self.code_size += 1;
        }
    }
}

/// Decompress LZW data
fn decompress_lzw(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size);
    let mut decoder = LzwDecoder::new();

    let mut bit_pos: usize = 0;
    let total_bits = data.len() * 8;

    let read_code = |data: &[u8], bit_pos: &mut usize, code_size: u8| -> Option<u16> {
        if *bit_pos + code_size as usize > total_bits {
            return None;
        }

        let mut code: u16 = 0;
        for i in 0..code_size {
            let byte_idx = (*bit_pos + i as usize) / 8;
            let bit_idx = (*bit_pos + i as usize) % 8;
            if byte_idx < data.len() && (data[byte_idx] >> bit_idx) & 1 != 0 {
                code |= 1 << i;
            }
        }
        *bit_pos += code_size as usize;
        Some(code)
    };

    let mut prev_code: Option<u16> = None;

    while let Some(code) = read_code(data, &mut bit_pos, decoder.code_size) {
        if code == decoder.eoi_code {
            break;
        }

        if code == decoder.clear_code {
            decoder.reset();
            prev_code = None;
            continue;
        }

        let entry = if (code as usize) < decoder.table.len() {
            decoder.table[code as usize].clone()
        } else if code == decoder.next_code {
            // Code not yet in the table: previous entry + its first byte
            if let Some(prev) = prev_code {
                let mut entry = decoder.table[prev as usize].clone();
                entry.push(entry[0]);
                entry
            } else {
                return Err(TiffError::DecompressionError("LZW: invalid code".into()));
            }
        } else {
            return Err(TiffError::DecompressionError("LZW: code out of range".into()));
        };

        output.extend_from_slice(&entry);

        if let Some(prev) = prev_code {
            if decoder.next_code < 4096 {
                let mut new_entry = decoder.table[prev as usize].clone();
                new_entry.push(entry[0]);
                decoder.add_entry(new_entry);
            }
        }

        prev_code = Some(code);

        if output.len() >= expected_size {
            break;
        }
    }

    Ok(output)
}

/// LZW encoder state
struct LzwEncoder {
    table: std::collections::HashMap<Vec<u8>, u16>,
    code_size: u8,
    next_code: u16,
    clear_code: u16,
    eoi_code: u16,
}

impl LzwEncoder {
    fn new() -> Self {
        let mut encoder = LzwEncoder {
            table: std::collections::HashMap::new(),
            code_size: 9,
            next_code: 0,
            clear_code: 256,
            eoi_code: 257,
        };
        encoder.reset();
        encoder
    }

    fn reset(&mut self) {
        self.table.clear();
        for i in 0..256 {
            self.table.insert(vec![i as u8], i as u16);
        }
        self.code_size = 9;
        self.next_code = 258;
    }

    fn add_entry(&mut self, entry: Vec<u8>) -> bool {
        if self.next_code >= 4095 {
            return false;
        }
        self.table.insert(entry, self.next_code);
        self.next_code += 1;

        if self.next_code >= (1 << self.code_size) && self.code_size < 12 {
            self.code_size += 1;
        }
        true
    }
}

/// Compress data using LZW
fn compress_lzw(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::new();
    let mut encoder = LzwEncoder::new();
    let mut bit_buffer: u32 = 0;
    let mut bits_in_buffer: u8 = 0;

    let write_code = |output: &mut Vec<u8>,
                      bit_buffer: &mut u32,
                      bits_in_buffer: &mut u8,
                      code: u16,
                      code_size: u8| {
        *bit_buffer |= (code as u32) << *bits_in_buffer;
        *bits_in_buffer += code_size;

        while *bits_in_buffer >= 8 {
            output.push(*bit_buffer as u8);
            *bit_buffer >>= 8;
            *bits_in_buffer -= 8;
        }
    };

    write_code(
        &mut output,
        &mut bit_buffer,
        &mut bits_in_buffer,
        encoder.clear_code,
        encoder.code_size,
    );

    if data.is_empty() {
        write_code(
            &mut output,
            &mut bit_buffer,
            &mut bits_in_buffer,
            encoder.eoi_code,
            encoder.code_size,
        );
        if bits_in_buffer > 0 {
            output.push(bit_buffer as u8);
        }
        return output;
    }

    let mut current = vec![data[0]];

    for &byte in &data[1..] {
        let mut next = current.clone();
        next.push(byte);

        if encoder.table.contains_key(&next) {
            current = next;
        } else {
            let code = encoder.table[&current];
            write_code(
                &mut output,
                &mut bit_buffer,
                &mut bits_in_buffer,
                code,
                encoder.code_size,
            );

            if !encoder.add_entry(next) {
                // Table full: emit clear code and start over
                write_code(
                    &mut output,
                    &mut bit_buffer,
                    &mut bits_in_buffer,
                    encoder.clear_code,
                    encoder.code_size,
                );
                encoder.reset();
            }

            current = vec![byte];
        }
    }

    let code = encoder.table[&current];
    write_code(
        &mut output,
        &mut bit_buffer,
        &mut bits_in_buffer,
        code,
        encoder.code_size,
    );

    write_code(
        &mut output,
        &mut bit_buffer,
        &mut bits_in_buffer,
        encoder.eoi_code,
        encoder.code_size,
    );

    if bits_in_buffer > 0 {
        output.push(bit_buffer as u8);
    }

    output
}

/// Reverse horizontal differencing predictor (Predictor=2)
pub fn reverse_horizontal_predictor(data: &mut [u8], width: usize, samples_per_pixel: usize) {
    let row_bytes = width * samples_per_pixel;
    if row_bytes == 0 {
        return;
    }
    for row_start in (0..data.len()).step_by(row_bytes) {
        let row_end = (row_start + row_bytes).min(data.len());
        let row = &mut data[row_start..row_end];

        for i in samples_per_pixel..row.len() {
            row[i] = row[i].wrapping_add(row[i - samples_per_pixel]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packbits_roundtrip() {
        let data = vec![1, 1, 1, 1, 2, 3, 4, 5, 5, 5, 5, 5, 5];
        let compressed = compress_packbits(&data);
        let decompressed = decompress_packbits(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }

    #[test]
    fn test_packbits_literal() {
        let data = vec![1, 2, 3, 4, 5];
        let compressed = compress_packbits(&data);
        let decompressed = decompress_packbits(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }

    #[test]
    fn test_packbits_run() {
        let data = vec![42; 100];
        let compressed = compress_packbits(&data);
        assert!(compressed.len() < data.len());
        let decompressed = decompress_packbits(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }

    #[test]
    fn test_lzw_roundtrip() {
        let data = b"TOBEORNOTTOBEORTOBEORNOT".to_vec();
        let compressed = compress_lzw(&data);
        let decompressed = decompress_lzw(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }

    #[test]
    fn test_lzw_repetitive() {
        let data = vec![65; 1000];
        let compressed = compress_lzw(&data);
        assert!(compressed.len() < data.len());
        let decompressed = decompress_lzw(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }

    #[test]
    fn test_strip_roundtrip_all_methods() {
        let rows: Vec<u8> = (0..240).map(|i| (i % 251) as u8).collect();
        for method in [compression::NONE, compression::PACKBITS, compression::LZW] {
            let strip = encode_strip(method, &rows, 80, 3, 1).unwrap();
            let back = decode_strip(method, &strip, rows.len(), 1).unwrap();
            assert_eq!(back, rows, "method {method}");
        }
    }

    #[test]
    fn test_jpeg_strip_dimensions() {
        let rows = vec![128u8; 16 * 16 * 3];
        let strip = encode_strip(compression::JPEG, &rows, 16, 16, 3).unwrap();
        let back = decode_strip(compression::JPEG, &strip, rows.len(), 3).unwrap();
        assert_eq!(back.len(), rows.len());
    }

    #[test]
    fn test_jpeg_rejects_odd_sample_counts() {
        let rows = vec![0u8; 16];
        assert!(encode_strip(compression::JPEG, &rows, 2, 2, 4).is_err());
    }

    #[test]
    fn test_unsupported_method() {
        assert!(decode_strip(compression::CCITT_G4, &[0], 1, 1).is_err());
        assert!(encode_strip(compression::DEFLATE, &[0], 1, 1, 1).is_err());
    }

    #[test]
    fn test_reverse_predictor() {
        // Differenced row [10, +10, +10] restores to [10, 20, 30]
        let mut data = vec![10, 10, 10];
        reverse_horizontal_predictor(&mut data, 3, 1);
        assert_eq!(data, vec![10, 20, 30]);
    }
}
