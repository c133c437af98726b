//! TIFF file reader and in-place surgeon
//!
//! `TiffFile` opens a TIFF, BigTIFF or NDPI file read-write, walks the
//! IFD chain once, and then exposes the mutation operations the
//! redaction policies need: deleting a directory (zeroing its strips
//! and splicing it out of the chain) and rewriting an entry payload in
//! place. Nothing is ever relocated; the file length never changes.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom};
use std::path::Path;

use log::debug;

use crate::errors::{RedactError, RedactResult};
use crate::io::seekable::SeekableFile;
use crate::tiff::constants::tags;
use crate::tiff::dialect::TiffDialect;
use crate::tiff::ifd::{EntryValue, TiffDirectory, TiffEntry};

/// An open TIFF file with its parsed directory chain
pub struct TiffFile<S: SeekableFile> {
    stream: S,
    dialect: TiffDialect,
    directories: Vec<TiffDirectory>,
}

impl TiffFile<std::fs::File> {
    /// Opens a TIFF file read-write and parses its IFD chain
    pub fn open(path: &Path) -> RedactResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_stream(file)
    }
}

impl<S: SeekableFile> TiffFile<S> {
    /// Parses a TIFF structure from the given stream
    ///
    /// The stream must be positioned at the start. NDPI mode is enabled
    /// after the first directory has been parsed and before its trailing
    /// pointer is read, so that pointer is already read 64-bit wide.
    /// Files whose first directory lies beyond 4 GiB cannot be detected
    /// as NDPI; that limitation is inherent to the format.
    pub fn from_stream(mut stream: S) -> RedactResult<Self> {
        let mut dialect = TiffDialect::detect(&mut stream)?;

        let mut directories: Vec<TiffDirectory> = Vec::new();
        loop {
            let in_pointer_offset = stream.stream_position()?;
            let directory_offset = dialect.read_pointer(&mut stream)?;
            if directory_offset == 0 {
                break;
            }
            stream.seek(SeekFrom::Start(directory_offset))?;
            let directory = TiffDirectory::parse(
                &mut stream,
                &dialect,
                directories.len(),
                in_pointer_offset,
            )?;
            if directories.is_empty() && !dialect.big_tiff && directory.has_tag(tags::NDPI_MAGIC) {
                debug!("Enabling NDPI mode");
                dialect.ndpi = true;
            }
            directories.push(directory);
        }
        if directories.is_empty() {
            return Err(RedactError::NoDirectories);
        }

        debug!("Read {} directories", directories.len());

        Ok(TiffFile {
            stream,
            dialect,
            directories,
        })
    }

    /// Returns the dialect established at open time
    pub fn dialect(&self) -> &TiffDialect {
        &self.dialect
    }

    /// Returns the parsed directories in chain order
    pub fn directories(&self) -> &[TiffDirectory] {
        &self.directories
    }

    /// Reads the typed payload of an entry
    pub fn entry_value(&mut self, entry: TiffEntry) -> RedactResult<EntryValue> {
        entry.read_value(&mut self.stream, &self.dialect)
    }

    /// Reads the typed payload of a tag in a directory
    pub fn tag_value(&mut self, directory: usize, tag: u16) -> RedactResult<EntryValue> {
        let entry = self.directories[directory]
            .entry(tag)
            .ok_or(RedactError::TagNotFound(tag))?;
        self.entry_value(entry)
    }

    /// Deletes a directory: zeroes its strips and unlinks it
    ///
    /// The directory object stays in `directories()` but its on-disk
    /// record is no longer referenced; callers must not keep using
    /// stale directory state after surgery. Reopen to observe the new
    /// chain.
    pub fn delete_directory(
        &mut self,
        index: usize,
        expected_prefix: Option<&[u8]>,
    ) -> RedactResult<()> {
        let directory = &self.directories[index];
        directory.delete(&mut self.stream, &self.dialect, expected_prefix)
    }

    /// Rewrites an entry payload in place, padded to its original length
    pub fn overwrite_entry(&mut self, entry: TiffEntry, data: &[u8]) -> RedactResult<()> {
        entry.overwrite(&mut self.stream, &self.dialect, data)
    }

    /// Consumes the reader and returns the underlying stream
    pub fn into_stream(self) -> S {
        self.stream
    }
}
