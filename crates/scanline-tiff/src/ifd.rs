//! Image File Directory (IFD) model: parsing and serialisation
//!
//! Reading works on an in-memory byte slice in either byte order; writing
//! appends to a little-endian output buffer and reports where the
//! next-directory pointer landed so the caller can chain pages.

use crate::error::{Result, TiffError};
use crate::tags::{data_type, tag_name};
use crate::Endian;
use byteorder::{ByteOrder, LittleEndian};
use std::collections::BTreeMap;

/// IFD entry value (baseline types only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfdValue {
    /// Byte values
    Bytes(Vec<u8>),
    /// ASCII string
    Ascii(String),
    /// Short (u16) values
    Shorts(Vec<u16>),
    /// Long (u32) values
    Longs(Vec<u32>),
    /// Rational (numerator/denominator) values
    Rationals(Vec<(u32, u32)>),
}

impl IfdValue {
    /// Get as single u16 value
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            IfdValue::Bytes(v) if !v.is_empty() => Some(v[0] as u16),
            IfdValue::Shorts(v) if !v.is_empty() => Some(v[0]),
            IfdValue::Longs(v) if !v.is_empty() => Some(v[0] as u16),
            _ => None,
        }
    }

    /// Get as single u32 value
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            IfdValue::Bytes(v) if !v.is_empty() => Some(v[0] as u32),
            IfdValue::Shorts(v) if !v.is_empty() => Some(v[0] as u32),
            IfdValue::Longs(v) if !v.is_empty() => Some(v[0]),
            _ => None,
        }
    }

    /// Get as vector of u32 values
    pub fn as_u32_vec(&self) -> Option<Vec<u32>> {
        match self {
            IfdValue::Bytes(v) => Some(v.iter().map(|&b| b as u32).collect()),
            IfdValue::Shorts(v) => Some(v.iter().map(|&s| s as u32).collect()),
            IfdValue::Longs(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_string(&self) -> Option<String> {
        match self {
            IfdValue::Ascii(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Get data type ID
    pub fn type_id(&self) -> u16 {
        match self {
            IfdValue::Bytes(_) => data_type::BYTE,
            IfdValue::Ascii(_) => data_type::ASCII,
            IfdValue::Shorts(_) => data_type::SHORT,
            IfdValue::Longs(_) => data_type::LONG,
            IfdValue::Rationals(_) => data_type::RATIONAL,
        }
    }

    /// Get count of values
    pub fn count(&self) -> u32 {
        match self {
            IfdValue::Bytes(v) => v.len() as u32,
            IfdValue::Ascii(s) => (s.len() + 1) as u32, // Include null terminator
            IfdValue::Shorts(v) => v.len() as u32,
            IfdValue::Longs(v) => v.len() as u32,
            IfdValue::Rationals(v) => v.len() as u32,
        }
    }

    /// Get total byte size
    pub fn byte_size(&self) -> usize {
        data_type::size(self.type_id()) * self.count() as usize
    }
}

/// IFD entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Tag ID
    pub tag: u16,
    /// Value
    pub value: IfdValue,
}

impl IfdEntry {
    /// Create new entry
    pub fn new(tag: u16, value: IfdValue) -> Self {
        IfdEntry { tag, value }
    }

    /// Create short entry
    pub fn short(tag: u16, value: u16) -> Self {
        IfdEntry {
            tag,
            value: IfdValue::Shorts(vec![value]),
        }
    }

    /// Create long entry
    pub fn long(tag: u16, value: u32) -> Self {
        IfdEntry {
            tag,
            value: IfdValue::Longs(vec![value]),
        }
    }

    /// Create ASCII entry
    pub fn ascii(tag: u16, value: &str) -> Self {
        IfdEntry {
            tag,
            value: IfdValue::Ascii(value.to_string()),
        }
    }
}

/// Where a serialised IFD landed in the output buffer
#[derive(Debug, Clone, Copy)]
pub struct IfdLocation {
    /// Byte offset of the directory itself
    pub start: u32,
    /// Byte position of the 4-byte next-directory pointer
    pub next_ptr_pos: usize,
}

/// Image File Directory
#[derive(Debug, Clone, Default)]
pub struct Ifd {
    /// Entries by tag
    entries: BTreeMap<u16, IfdEntry>,
    /// Offset to next IFD (0 if none)
    pub next_offset: u32,
}

impl Ifd {
    /// Create new empty IFD
    pub fn new() -> Self {
        Ifd::default()
    }

    /// Add entry
    pub fn add(&mut self, entry: IfdEntry) {
        self.entries.insert(entry.tag, entry);
    }

    /// Get value by tag
    pub fn get_value(&self, tag: u16) -> Option<&IfdValue> {
        self.entries.get(&tag).map(|e| &e.value)
    }

    /// Get required u32 value
    pub fn get_required_u32(&self, tag: u16) -> Result<u32> {
        self.get_value(tag)
            .and_then(|v| v.as_u32())
            .ok_or_else(|| TiffError::MissingTag(tag_name(tag).to_string()))
    }

    /// Get optional u32 value with default
    pub fn get_u32_or(&self, tag: u16, default: u32) -> u32 {
        self.get_value(tag)
            .and_then(|v| v.as_u32())
            .unwrap_or(default)
    }

    /// Get optional u16 value with default
    pub fn get_u16_or(&self, tag: u16, default: u16) -> u16 {
        self.get_value(tag)
            .and_then(|v| v.as_u16())
            .unwrap_or(default)
    }

    /// Check for the presence of a tag
    pub fn has(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries
    pub fn entries(&self) -> impl Iterator<Item = &IfdEntry> {
        self.entries.values()
    }

    /// Parse an IFD at `offset` from an in-memory container
    pub fn read(data: &[u8], offset: u32, endian: Endian) -> Result<Self> {
        let mut pos = offset as usize;
        let count = slice_at(data, pos, 2)?;
        let num_entries = endian.u16(count);
        pos += 2;

        let mut ifd = Ifd::new();
        for _ in 0..num_entries {
            let raw = slice_at(data, pos, 12)?;
            let tag = endian.u16(&raw[0..2]);
            let type_id = endian.u16(&raw[2..4]);
            let value_count = endian.u32(&raw[4..8]);
            let total_size = data_type::size(type_id).saturating_mul(value_count as usize);

            let value_data = if total_size <= 4 {
                // Value fits in the 4-byte field
                &raw[8..12]
            } else {
                // Value is at an offset
                let value_offset = endian.u32(&raw[8..12]) as usize;
                slice_at(data, value_offset, total_size)?
            };

            let value = parse_value(type_id, value_count, value_data, endian);
            ifd.add(IfdEntry { tag, value });
            pos += 12;
        }

        let next = slice_at(data, pos, 4)?;
        ifd.next_offset = endian.u32(next);

        Ok(ifd)
    }

    /// Serialise this directory onto a little-endian output buffer
    ///
    /// Values wider than 4 bytes are placed right after the directory.
    /// The directory starts on a word boundary.
    pub fn write_to(&self, out: &mut Vec<u8>) -> IfdLocation {
        if out.len() % 2 != 0 {
            out.push(0);
        }
        let start = out.len() as u32;

        push_u16(out, self.entries.len() as u16);

        // count + entries + next pointer
        let directory_size = 2 + self.entries.len() * 12 + 4;
        let mut value_offset = start + directory_size as u32;

        let mut large_values: Vec<&IfdValue> = Vec::new();
        for entry in self.entries.values() {
            push_u16(out, entry.tag);
            push_u16(out, entry.value.type_id());
            push_u32(out, entry.value.count());

            let byte_size = entry.value.byte_size();
            if byte_size <= 4 {
                let mut inline = [0u8; 4];
                write_inline(&entry.value, &mut inline);
                out.extend_from_slice(&inline);
            } else {
                push_u32(out, value_offset);
                large_values.push(&entry.value);
                value_offset += byte_size as u32;
                // Keep values word-aligned
                if value_offset % 2 != 0 {
                    value_offset += 1;
                }
            }
        }

        let next_ptr_pos = out.len();
        push_u32(out, self.next_offset);

        for value in large_values {
            write_value(out, value);
            if out.len() % 2 != 0 {
                out.push(0);
            }
        }

        IfdLocation {
            start,
            next_ptr_pos,
        }
    }
}

/// Bounds-checked sub-slice
fn slice_at(data: &[u8], pos: usize, len: usize) -> Result<&[u8]> {
    let end = pos.checked_add(len).ok_or(TiffError::InsufficientData {
        needed: len,
        available: 0,
    })?;
    if end > data.len() {
        return Err(TiffError::InsufficientData {
            needed: end,
            available: data.len(),
        });
    }
    Ok(&data[pos..end])
}

/// Decode a value field from raw bytes
fn parse_value(type_id: u16, count: u32, data: &[u8], endian: Endian) -> IfdValue {
    let count = count as usize;
    match type_id {
        data_type::ASCII => {
            let raw = &data[..count.min(data.len())];
            let s = String::from_utf8_lossy(raw);
            IfdValue::Ascii(s.trim_end_matches('\0').to_string())
        }
        data_type::SHORT => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let offset = i * 2;
                if offset + 2 <= data.len() {
                    values.push(endian.u16(&data[offset..]));
                }
            }
            IfdValue::Shorts(values)
        }
        data_type::LONG => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let offset = i * 4;
                if offset + 4 <= data.len() {
                    values.push(endian.u32(&data[offset..]));
                }
            }
            IfdValue::Longs(values)
        }
        data_type::RATIONAL => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let offset = i * 8;
                if offset + 8 <= data.len() {
                    let n = endian.u32(&data[offset..]);
                    let d = endian.u32(&data[offset + 4..]);
                    values.push((n, d));
                }
            }
            IfdValue::Rationals(values)
        }
        // BYTE, UNDEFINED, and anything exotic: keep the raw bytes
        _ => IfdValue::Bytes(data[..count.min(data.len())].to_vec()),
    }
}

/// Pack a small value into the entry's 4-byte field
fn write_inline(value: &IfdValue, bytes: &mut [u8; 4]) {
    match value {
        IfdValue::Bytes(v) => {
            for (i, &b) in v.iter().take(4).enumerate() {
                bytes[i] = b;
            }
        }
        IfdValue::Shorts(v) => {
            if !v.is_empty() {
                LittleEndian::write_u16(&mut bytes[0..], v[0]);
            }
            if v.len() > 1 {
                LittleEndian::write_u16(&mut bytes[2..], v[1]);
            }
        }
        IfdValue::Longs(v) => {
            if !v.is_empty() {
                LittleEndian::write_u32(bytes, v[0]);
            }
        }
        IfdValue::Ascii(s) => {
            let raw = s.as_bytes();
            for (i, &b) in raw.iter().take(3).enumerate() {
                bytes[i] = b;
            }
            bytes[raw.len().min(3)] = 0; // null terminator
        }
        IfdValue::Rationals(_) => {} // never fits in 4 bytes
    }
}

/// Append a value's full byte representation
fn write_value(out: &mut Vec<u8>, value: &IfdValue) {
    match value {
        IfdValue::Bytes(v) => out.extend_from_slice(v),
        IfdValue::Ascii(s) => {
            out.extend_from_slice(s.as_bytes());
            out.push(0); // null terminator
        }
        IfdValue::Shorts(v) => {
            for &val in v {
                push_u16(out, val);
            }
        }
        IfdValue::Longs(v) => {
            for &val in v {
                push_u32(out, val);
            }
        }
        IfdValue::Rationals(v) => {
            for &(n, d) in v {
                push_u32(out, n);
                push_u32(out, d);
            }
        }
    }
}

pub(crate) fn push_u16(out: &mut Vec<u8>, value: u16) {
    let mut raw = [0u8; 2];
    LittleEndian::write_u16(&mut raw, value);
    out.extend_from_slice(&raw);
}

pub(crate) fn push_u32(out: &mut Vec<u8>, value: u32) {
    let mut raw = [0u8; 4];
    LittleEndian::write_u32(&mut raw, value);
    out.extend_from_slice(&raw);
}
