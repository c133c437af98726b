//! Image File Directory (IFD) structures and methods
//!
//! This module implements the TIFF IFD structures: the directory (a map
//! of tag entries plus the file locations of the pointers that link it
//! into the IFD chain) and the entry (tag, field type, count, and a
//! value-or-offset field). Entries remember their own file offset so
//! their payloads can be rewritten in place.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};

use log::{debug, trace};

use crate::errors::{RedactError, RedactResult};
use crate::io::seekable::SeekableFile;
use crate::tiff::constants::{field_types, tags};
use crate::tiff::dialect::TiffDialect;

/// Zeroing is done through a bounded scratch buffer
const ZERO_CHUNK: usize = 64 * 1024;

/// A typed TIFF entry payload
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    /// BYTE payload
    Bytes(Vec<u8>),
    /// ASCII payload with the NUL terminator stripped
    Ascii(Vec<u8>),
    /// SHORT, LONG or LONG8 values widened to u64
    Unsigned(Vec<u64>),
    /// FLOAT or DOUBLE values widened to f64
    Double(Vec<f64>),
}

impl EntryValue {
    /// Returns the ASCII payload, if this is an ASCII value
    pub fn ascii(&self) -> Option<&[u8]> {
        match self {
            EntryValue::Ascii(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the BYTE payload, if this is a BYTE value
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            EntryValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer value
    pub fn unsigned(&self) -> Option<&[u64]> {
        match self {
            EntryValue::Unsigned(values) => Some(values),
            _ => None,
        }
    }
}

/// Represents an entry in an Image File Directory (IFD)
///
/// `start` is the file offset of the entry itself, which together with
/// the dialect determines where the payload lives (inline after the
/// fixed header, or out of line at `value_offset`).
#[derive(Debug, Clone, Copy)]
pub struct TiffEntry {
    /// File offset of this entry
    pub start: u64,
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Value or offset to values, as stored on disk
    pub value_offset: u64,
}

impl TiffEntry {
    /// Reads one entry at the current stream position
    pub fn read(stream: &mut dyn SeekableFile, dialect: &TiffDialect) -> RedactResult<Self> {
        let start = stream.stream_position()?;
        let handler = dialect.handler();
        let tag = handler.read_u16(stream)?;
        let field_type = handler.read_u16(stream)?;
        let count = dialect.read_offset(stream)?;
        let value_offset = dialect.read_offset(stream)?;

        trace!(
            "Read IFD entry: tag={}, type={}, count={}, value/offset={}",
            tag,
            field_type,
            count,
            value_offset
        );

        Ok(TiffEntry {
            start,
            tag,
            field_type,
            count,
            value_offset,
        })
    }

    /// Size in bytes of a single value of this entry's field type
    pub fn type_size(&self) -> RedactResult<u64> {
        match self.field_type {
            field_types::BYTE | field_types::ASCII => Ok(1),
            field_types::SHORT => Ok(2),
            field_types::LONG | field_types::FLOAT => Ok(4),
            field_types::DOUBLE | field_types::LONG8 => Ok(8),
            other => Err(RedactError::UnsupportedFieldType(other)),
        }
    }

    /// File offset of this entry's payload
    ///
    /// The payload lies inside the entry when it fits in the offset
    /// field, otherwise at `value_offset` adjusted by the NDPI
    /// near-pointer rule with the entry itself as the base.
    fn payload_offset(&self, dialect: &TiffDialect) -> RedactResult<u64> {
        let payload_len = self.type_size()?.saturating_mul(self.count);
        if payload_len <= dialect.offset_size() {
            Ok(self.start + dialect.entry_header_size())
        } else {
            Ok(dialect.near_pointer(self.start, self.value_offset))
        }
    }

    /// Reads this entry's payload as a typed value
    pub fn read_value(
        &self,
        stream: &mut dyn SeekableFile,
        dialect: &TiffDialect,
    ) -> RedactResult<EntryValue> {
        let offset = self.payload_offset(dialect)?;
        stream.seek(SeekFrom::Start(offset))?;

        let handler = dialect.handler();
        let count = self.count as usize;
        match self.field_type {
            field_types::BYTE => {
                let mut buffer = vec![0u8; count];
                stream.read_exact(&mut buffer)?;
                Ok(EntryValue::Bytes(buffer))
            }
            field_types::ASCII => {
                let mut buffer = vec![0u8; count];
                stream.read_exact(&mut buffer)?;
                if buffer.pop() != Some(0) {
                    return Err(RedactError::StringNotTerminated);
                }
                Ok(EntryValue::Ascii(buffer))
            }
            field_types::SHORT => {
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(handler.read_u16(stream)? as u64);
                }
                Ok(EntryValue::Unsigned(values))
            }
            field_types::LONG => {
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(handler.read_u32(stream)? as u64);
                }
                Ok(EntryValue::Unsigned(values))
            }
            field_types::LONG8 => {
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(handler.read_u64(stream)?);
                }
                Ok(EntryValue::Unsigned(values))
            }
            field_types::FLOAT => {
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(handler.read_f32(stream)? as f64);
                }
                Ok(EntryValue::Double(values))
            }
            field_types::DOUBLE => {
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(handler.read_f64(stream)?);
                }
                Ok(EntryValue::Double(values))
            }
            other => Err(RedactError::UnsupportedFieldType(other)),
        }
    }

    /// Overwrites this entry's payload in place
    ///
    /// Only BYTE and ASCII entries can be rewritten. The replacement must
    /// fit in the existing payload; the remainder is padded with spaces
    /// (ASCII) or zeros (BYTE), and an ASCII payload keeps its trailing
    /// NUL terminator. `count` and `field_type` are left untouched.
    pub fn overwrite(
        &self,
        stream: &mut dyn SeekableFile,
        dialect: &TiffDialect,
        data: &[u8],
    ) -> RedactResult<()> {
        let (available, fill) = match self.field_type {
            field_types::ASCII => ((self.count as usize).saturating_sub(1), 0x20u8),
            field_types::BYTE => (self.count as usize, 0x00u8),
            other => return Err(RedactError::UnsupportedFieldType(other)),
        };
        if data.len() > available {
            return Err(RedactError::ValueTooLong {
                available,
                given: data.len(),
            });
        }

        let offset = self.payload_offset(dialect)?;
        debug!(
            "Overwriting tag {} payload at {} ({} of {} bytes)",
            self.tag,
            offset,
            data.len(),
            available
        );
        stream.seek(SeekFrom::Start(offset))?;
        stream.write_all(data)?;
        stream.write_all(&vec![fill; available - data.len()])?;
        if self.field_type == field_types::ASCII {
            stream.write_all(&[0])?;
        }
        Ok(())
    }
}

/// Represents an Image File Directory (IFD) in a TIFF file
///
/// Besides its entries, a directory remembers where the pointer that
/// references it lives (`in_pointer_offset`) and where its own trailing
/// next-directory pointer lives (`out_pointer_offset`); the surgeon
/// needs both to splice the directory out of the chain.
#[derive(Debug, Clone)]
pub struct TiffDirectory {
    /// IFD number (0-based)
    pub number: usize,
    /// File offset of the pointer referring to this IFD
    pub in_pointer_offset: u64,
    /// File offset of this IFD's own trailing pointer
    pub out_pointer_offset: u64,
    /// Entries keyed by tag
    entries: HashMap<u16, TiffEntry>,
}

impl TiffDirectory {
    /// Parses a directory at the current stream position
    ///
    /// Leaves the stream positioned at the directory's trailing pointer.
    pub fn parse(
        stream: &mut dyn SeekableFile,
        dialect: &TiffDialect,
        number: usize,
        in_pointer_offset: u64,
    ) -> RedactResult<Self> {
        let count = dialect.read_entry_count(stream)?;
        let mut entries = HashMap::with_capacity(count as usize);
        for _ in 0..count {
            let entry = TiffEntry::read(stream, dialect)?;
            entries.insert(entry.tag, entry);
        }
        let out_pointer_offset = stream.stream_position()?;

        debug!("Read IFD #{} with {} entries", number, entries.len());

        Ok(TiffDirectory {
            number,
            in_pointer_offset,
            out_pointer_offset,
            entries,
        })
    }

    /// Gets an entry by tag
    pub fn entry(&self, tag: u16) -> Option<TiffEntry> {
        self.entries.get(&tag).copied()
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Gets the number of entries in this IFD
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Zeroes this directory's image strips and unlinks it from the chain
    ///
    /// With `expected_prefix`, each strip must begin with those bytes or
    /// the delete aborts before writing that strip. Space is not
    /// reclaimed and later directories are not renumbered; the entry
    /// records stay on disk but nothing references them anymore.
    pub fn delete(
        &self,
        stream: &mut dyn SeekableFile,
        dialect: &TiffDialect,
        expected_prefix: Option<&[u8]>,
    ) -> RedactResult<()> {
        let offsets_entry = self
            .entry(tags::STRIP_OFFSETS)
            .ok_or(RedactError::DirectoryNotStripped)?;
        let counts_entry = self
            .entry(tags::STRIP_BYTE_COUNTS)
            .ok_or(RedactError::DirectoryNotStripped)?;

        let offsets = match offsets_entry.read_value(stream, dialect)? {
            EntryValue::Unsigned(values) => values,
            _ => return Err(RedactError::DirectoryNotStripped),
        };
        let lengths = match counts_entry.read_value(stream, dialect)? {
            EntryValue::Unsigned(values) => values,
            _ => return Err(RedactError::DirectoryNotStripped),
        };

        // Wipe strips
        for (&offset, &length) in offsets.iter().zip(lengths.iter()) {
            let offset = dialect.near_pointer(self.out_pointer_offset, offset);
            if let Some(prefix) = expected_prefix {
                stream.seek(SeekFrom::Start(offset))?;
                let mut buffer = vec![0u8; prefix.len()];
                stream.read_exact(&mut buffer)?;
                if buffer != prefix {
                    return Err(RedactError::UnexpectedStripData);
                }
            }
            debug!("Zeroing {} for {}", offset, length);
            stream.seek(SeekFrom::Start(offset))?;
            let chunk = vec![0u8; ZERO_CHUNK.min(length as usize)];
            let mut remaining = length as usize;
            while remaining > 0 {
                let n = remaining.min(chunk.len());
                stream.write_all(&chunk[..n])?;
                remaining -= n;
            }
        }

        // Remove directory from the chain
        debug!("Deleting directory {}", self.number);
        stream.seek(SeekFrom::Start(self.out_pointer_offset))?;
        let next_pointer = dialect.read_pointer(stream)?;
        stream.seek(SeekFrom::Start(self.in_pointer_offset))?;
        dialect.write_pointer(stream, next_pointer)?;
        Ok(())
    }
}
