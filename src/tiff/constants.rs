//! TIFF format constants
//!
//! This module defines constants used throughout the TIFF processing code,
//! making the code more readable and maintainable by replacing magic numbers
//! with descriptive names.

/// TIFF header constants
pub mod header {
    /// Standard TIFF version number (42)
    pub const TIFF_VERSION: u16 = 42;

    /// BigTIFF version number (43)
    pub const BIG_TIFF_VERSION: u16 = 43;

    /// BigTIFF offset size (8 bytes)
    pub const BIGTIFF_OFFSET_SIZE: u16 = 8;

    /// BigTIFF reserved word (always 0)
    pub const BIGTIFF_RESERVED: u16 = 0;
}

/// Field types as defined in the TIFF spec
///
/// Only the types the redaction policies encounter are supported; the
/// entry value resolver rejects everything else.
pub mod field_types {
    pub const BYTE: u16 = 1;      // 8-bit unsigned integer
    pub const ASCII: u16 = 2;     // 8-bit byte containing ASCII character
    pub const SHORT: u16 = 3;     // 16-bit unsigned integer
    pub const LONG: u16 = 4;      // 32-bit unsigned integer
    pub const FLOAT: u16 = 11;    // Single precision IEEE floating point
    pub const DOUBLE: u16 = 12;   // Double precision IEEE floating point
    pub const LONG8: u16 = 16;    // BigTIFF 64-bit unsigned integer
}

/// TIFF tags touched by the redaction policies
pub mod tags {
    pub const IMAGE_DESCRIPTION: u16 = 270;   // Free-text description of the image
    pub const STRIP_OFFSETS: u16 = 273;       // Offsets to the data strips
    pub const STRIP_BYTE_COUNTS: u16 = 279;   // Byte counts for strips
    pub const XMLPACKET: u16 = 700;           // XMP metadata packet
    pub const NDPI_MAGIC: u16 = 65420;        // Marks a Hamamatsu NDPI file
    pub const NDPI_SOURCELENS: u16 = 65421;   // NDPI lens power; -1 marks the macro image
}

/// Well-known byte prefixes of compressed image payloads
pub mod markers {
    /// JPEG start-of-image marker
    pub const JPEG_SOI: [u8; 2] = [0xff, 0xd8];
}
