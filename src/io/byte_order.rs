//! Byte order handling for TIFF files
//!
//! This module implements the Strategy pattern for handling different
//! byte orders (little-endian vs big-endian) when reading and writing
//! TIFF data. Redaction edits files in place, so the handlers cover
//! writes as well as reads.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Result};

use crate::errors::{RedactError, RedactResult};
use crate::io::seekable::SeekableFile;

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the TIFF header
    ///
    /// An unknown marker, or a file too short to hold one, means the
    /// file is not a TIFF at all, which the dispatcher treats as "try
    /// the next handler".
    pub fn detect(stream: &mut dyn SeekableFile) -> RedactResult<Self> {
        let mut marker = [0u8; 2];
        match stream.read_exact(&mut marker) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(RedactError::UnrecognizedFile)
            }
            Err(e) => return Err(e.into()),
        }
        match &marker {
            b"II" => Ok(ByteOrder::LittleEndian), // Intel
            b"MM" => Ok(ByteOrder::BigEndian),    // Motorola
            _ => Err(RedactError::UnrecognizedFile),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Returns the handler implementing this byte order
    pub fn handler(&self) -> &'static dyn ByteOrderHandler {
        match self {
            ByteOrder::LittleEndian => &LittleEndianHandler,
            ByteOrder::BigEndian => &BigEndianHandler,
        }
    }
}

/// Trait for byte order handling strategies
pub trait ByteOrderHandler: Send + Sync {
    /// Read a u16 value
    fn read_u16(&self, stream: &mut dyn SeekableFile) -> Result<u16>;

    /// Read a u32 value
    fn read_u32(&self, stream: &mut dyn SeekableFile) -> Result<u32>;

    /// Read a u64 value
    fn read_u64(&self, stream: &mut dyn SeekableFile) -> Result<u64>;

    /// Read an f32 value
    fn read_f32(&self, stream: &mut dyn SeekableFile) -> Result<f32>;

    /// Read an f64 value
    fn read_f64(&self, stream: &mut dyn SeekableFile) -> Result<f64>;

    /// Write a u16 value
    fn write_u16(&self, stream: &mut dyn SeekableFile, value: u16) -> Result<()>;

    /// Write a u32 value
    fn write_u32(&self, stream: &mut dyn SeekableFile, value: u32) -> Result<()>;

    /// Write a u64 value
    fn write_u64(&self, stream: &mut dyn SeekableFile, value: u64) -> Result<()>;
}

/// Little-endian byte order handler
pub struct LittleEndianHandler;

impl ByteOrderHandler for LittleEndianHandler {
    fn read_u16(&self, stream: &mut dyn SeekableFile) -> Result<u16> {
        stream.read_u16::<LittleEndian>()
    }

    fn read_u32(&self, stream: &mut dyn SeekableFile) -> Result<u32> {
        stream.read_u32::<LittleEndian>()
    }

    fn read_u64(&self, stream: &mut dyn SeekableFile) -> Result<u64> {
        stream.read_u64::<LittleEndian>()
    }

    fn read_f32(&self, stream: &mut dyn SeekableFile) -> Result<f32> {
        stream.read_f32::<LittleEndian>()
    }

    fn read_f64(&self, stream: &mut dyn SeekableFile) -> Result<f64> {
        stream.read_f64::<LittleEndian>()
    }

    fn write_u16(&self, stream: &mut dyn SeekableFile, value: u16) -> Result<()> {
        stream.write_u16::<LittleEndian>(value)
    }

    fn write_u32(&self, stream: &mut dyn SeekableFile, value: u32) -> Result<()> {
        stream.write_u32::<LittleEndian>(value)
    }

    fn write_u64(&self, stream: &mut dyn SeekableFile, value: u64) -> Result<()> {
        stream.write_u64::<LittleEndian>(value)
    }
}

/// Big-endian byte order handler
pub struct BigEndianHandler;

impl ByteOrderHandler for BigEndianHandler {
    fn read_u16(&self, stream: &mut dyn SeekableFile) -> Result<u16> {
        stream.read_u16::<BigEndian>()
    }

    fn read_u32(&self, stream: &mut dyn SeekableFile) -> Result<u32> {
        stream.read_u32::<BigEndian>()
    }

    fn read_u64(&self, stream: &mut dyn SeekableFile) -> Result<u64> {
        stream.read_u64::<BigEndian>()
    }

    fn read_f32(&self, stream: &mut dyn SeekableFile) -> Result<f32> {
        stream.read_f32::<BigEndian>()
    }

    fn read_f64(&self, stream: &mut dyn SeekableFile) -> Result<f64> {
        stream.read_f64::<BigEndian>()
    }

    fn write_u16(&self, stream: &mut dyn SeekableFile, value: u16) -> Result<()> {
        stream.write_u16::<BigEndian>(value)
    }

    fn write_u32(&self, stream: &mut dyn SeekableFile, value: u32) -> Result<()> {
        stream.write_u32::<BigEndian>(value)
    }

    fn write_u64(&self, stream: &mut dyn SeekableFile, value: u64) -> Result<()> {
        stream.write_u64::<BigEndian>(value)
    }
}
