//! TIFF dialect handling
//!
//! A TIFF file comes in one of three dialects that change the widths of
//! the on-disk integer fields: classic TIFF, BigTIFF, and Hamamatsu NDPI
//! (classic TIFF with 64-bit directory pointers and truncated 32-bit
//! value offsets). The dialect is established at open time; NDPI is the
//! exception and is switched on right after the first directory has been
//! parsed.
//!
//! Width table:
//!
//! | field            | classic | BigTIFF | NDPI |
//! |------------------|---------|---------|------|
//! | entry count      | u16     | u64     | u16  |
//! | value offset     | u32     | u64     | u32  |
//! | directory pointer| u32     | u64     | u64  |

use log::debug;

use crate::errors::{RedactError, RedactResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableFile;
use crate::tiff::constants::header;

/// The 4 GiB segment implied by NDPI's truncated offsets
const NDPI_SEGMENT_SIZE: u64 = 1 << 32;

/// Dialect traits of an open TIFF file
#[derive(Debug, Clone, Copy)]
pub struct TiffDialect {
    /// Byte order of all multi-byte fields
    pub byte_order: ByteOrder,
    /// Whether the file is BigTIFF (version 43)
    pub big_tiff: bool,
    /// Whether NDPI mode is active
    pub ndpi: bool,
}

impl TiffDialect {
    /// Detects the dialect from the file header
    ///
    /// Reads the endian marker and the version word, and for BigTIFF
    /// validates the `(8, 0)` word pair that follows. NDPI cannot be
    /// detected here; it is enabled later from tag 65420.
    pub fn detect(stream: &mut dyn SeekableFile) -> RedactResult<Self> {
        let byte_order = ByteOrder::detect(stream)?;
        debug!("Detected byte order: {}", byte_order.name());

        let handler = byte_order.handler();
        let version = Self::header_word(handler.read_u16(stream))?;
        let big_tiff = match version {
            header::TIFF_VERSION => false,
            header::BIG_TIFF_VERSION => {
                let offset_size = Self::header_word(handler.read_u16(stream))?;
                let reserved = Self::header_word(handler.read_u16(stream))?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE
                    || reserved != header::BIGTIFF_RESERVED
                {
                    return Err(RedactError::UnrecognizedFile);
                }
                true
            }
            _ => return Err(RedactError::UnrecognizedFile),
        };
        debug!(
            "Detected {} format",
            if big_tiff { "BigTIFF" } else { "standard TIFF" }
        );

        Ok(TiffDialect {
            byte_order,
            big_tiff,
            ndpi: false,
        })
    }

    /// Maps a short read inside the header to `UnrecognizedFile`
    ///
    /// A file that ends before the header does cannot be a TIFF, so the
    /// dispatcher should keep trying other handlers.
    fn header_word(read: std::io::Result<u16>) -> RedactResult<u16> {
        match read {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(RedactError::UnrecognizedFile)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the byte order handler for this dialect
    pub fn handler(&self) -> &'static dyn ByteOrderHandler {
        self.byte_order.handler()
    }

    /// Size in bytes of a value-offset field
    pub fn offset_size(&self) -> u64 {
        if self.big_tiff {
            8
        } else {
            4
        }
    }

    /// Size in bytes of a directory entry (tag, type, count, value-offset)
    pub fn entry_size(&self) -> u64 {
        2 + 2 + 2 * self.offset_size()
    }

    /// Size in bytes of the fixed entry header before the payload field
    /// (tag, type, count)
    pub fn entry_header_size(&self) -> u64 {
        2 + 2 + self.offset_size()
    }

    /// Reads a directory entry count
    pub fn read_entry_count(&self, stream: &mut dyn SeekableFile) -> RedactResult<u64> {
        if self.big_tiff {
            Ok(self.handler().read_u64(stream)?)
        } else {
            Ok(self.handler().read_u16(stream)? as u64)
        }
    }

    /// Reads a value-offset field
    pub fn read_offset(&self, stream: &mut dyn SeekableFile) -> RedactResult<u64> {
        if self.big_tiff {
            Ok(self.handler().read_u64(stream)?)
        } else {
            Ok(self.handler().read_u32(stream)? as u64)
        }
    }

    /// Reads a directory pointer
    ///
    /// 64-bit for BigTIFF and NDPI, 32-bit for classic TIFF.
    pub fn read_pointer(&self, stream: &mut dyn SeekableFile) -> RedactResult<u64> {
        if self.big_tiff || self.ndpi {
            Ok(self.handler().read_u64(stream)?)
        } else {
            Ok(self.handler().read_u32(stream)? as u64)
        }
    }

    /// Writes a directory pointer
    pub fn write_pointer(&self, stream: &mut dyn SeekableFile, value: u64) -> RedactResult<()> {
        if self.big_tiff || self.ndpi {
            self.handler().write_u64(stream, value)?;
        } else {
            self.handler().write_u32(stream, value as u32)?;
        }
        Ok(())
    }

    /// Resolves an NDPI near-pointer
    ///
    /// NDPI stores 32-bit truncated offsets whose high half is implied by
    /// locality: the full address is the value whose low 32 bits equal
    /// `offset` and which lies within 4 GiB below `base`. For other
    /// dialects the offset is returned unchanged.
    pub fn near_pointer(&self, base: u64, offset: u64) -> u64 {
        if self.ndpi && offset < base {
            offset + ((base - offset) / NDPI_SEGMENT_SIZE) * NDPI_SEGMENT_SIZE
        } else {
            offset
        }
    }
}
