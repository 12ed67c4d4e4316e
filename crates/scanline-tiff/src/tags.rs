//! TIFF tag ids, field data types, and well-known field values

/// Baseline tag ids
pub mod tag {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const ORIENTATION: u16 = 274;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const SOFTWARE: u16 = 305;
    pub const PREDICTOR: u16 = 317;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const EXTRA_SAMPLES: u16 = 338;
}

/// IFD entry data types
pub mod data_type {
    pub const BYTE: u16 = 1;
    pub const ASCII: u16 = 2;
    pub const SHORT: u16 = 3;
    pub const LONG: u16 = 4;
    pub const RATIONAL: u16 = 5;
    pub const UNDEFINED: u16 = 7;

    /// Byte size of one value of the given type
    pub fn size(type_id: u16) -> usize {
        match type_id {
            BYTE | ASCII | UNDEFINED => 1,
            SHORT => 2,
            LONG => 4,
            RATIONAL => 8,
            // Signed/float variants and unknown types: conservative 1 byte
            6 => 1,
            8 => 2,
            9..=11 => 4,
            12 => 8,
            _ => 1,
        }
    }
}

/// Compression field values
pub mod compression {
    pub const NONE: u16 = 1;
    pub const CCITT_G3: u16 = 3;
    pub const CCITT_G4: u16 = 4;
    pub const LZW: u16 = 5;
    pub const JPEG_OLD: u16 = 6;
    pub const JPEG: u16 = 7;
    pub const DEFLATE: u16 = 8;
    pub const PACKBITS: u16 = 32773;
}

/// PhotometricInterpretation field values
pub mod photometric {
    pub const MIN_IS_WHITE: u16 = 0;
    pub const MIN_IS_BLACK: u16 = 1;
    pub const RGB: u16 = 2;
    pub const PALETTE: u16 = 3;
    pub const MASK: u16 = 4;
    pub const SEPARATED: u16 = 5;
    pub const YCBCR: u16 = 6;
}

/// PlanarConfiguration field values
pub mod planar {
    pub const CHUNKY: u16 = 1;
    pub const PLANAR: u16 = 2;
}

/// Orientation field values (valid range 1..=8)
pub mod orientation {
    pub const TOP_LEFT: u16 = 1;
    pub const LEFT_BOTTOM: u16 = 8;
}

/// Human-readable tag name for diagnostics
pub fn tag_name(id: u16) -> &'static str {
    match id {
        tag::IMAGE_WIDTH => "ImageWidth",
        tag::IMAGE_LENGTH => "ImageLength",
        tag::BITS_PER_SAMPLE => "BitsPerSample",
        tag::COMPRESSION => "Compression",
        tag::PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        tag::STRIP_OFFSETS => "StripOffsets",
        tag::ORIENTATION => "Orientation",
        tag::SAMPLES_PER_PIXEL => "SamplesPerPixel",
        tag::ROWS_PER_STRIP => "RowsPerStrip",
        tag::STRIP_BYTE_COUNTS => "StripByteCounts",
        tag::PLANAR_CONFIGURATION => "PlanarConfiguration",
        tag::SOFTWARE => "Software",
        tag::PREDICTOR => "Predictor",
        tag::TILE_WIDTH => "TileWidth",
        tag::TILE_LENGTH => "TileLength",
        tag::TILE_OFFSETS => "TileOffsets",
        tag::EXTRA_SAMPLES => "ExtraSamples",
        _ => "Unknown",
    }
}
