//! Hamamatsu NDPI redaction policy
//!
//! NDPI files are classic TIFFs carrying tag 65420 in the first
//! directory. The macro/label image is the directory whose source-lens
//! value is -1. Its strips are JPEG streams, so each strip is checked
//! for the SOI marker before being zeroed.

use std::path::Path;

use crate::errors::{RedactError, RedactResult};
use crate::formats::FormatHandler;
use crate::tiff::constants::{markers, tags};
use crate::tiff::{EntryValue, TiffFile};

pub struct HamamatsuNdpi;

/// Interprets a source-lens payload as its signed first value
///
/// The tag is stored as a SHORT holding a two's-complement value; -1
/// marks the macro image.
fn source_lens(value: &EntryValue) -> Option<i16> {
    value.unsigned()?.first().map(|&v| v as u16 as i16)
}

impl FormatHandler for HamamatsuNdpi {
    fn name(&self) -> &'static str {
        "NDPI"
    }

    fn detect(&self, path: &Path) -> RedactResult<()> {
        let fh = TiffFile::open(path)?;
        if fh.directories()[0].has_tag(tags::NDPI_MAGIC) {
            Ok(())
        } else {
            Err(RedactError::UnrecognizedFile)
        }
    }

    fn redact(&self, path: &Path) -> RedactResult<()> {
        let mut fh = TiffFile::open(path)?;
        for index in 0..fh.directories().len() {
            let entry = match fh.directories()[index].entry(tags::NDPI_SOURCELENS) {
                Some(entry) => entry,
                None => continue,
            };
            let value = fh.entry_value(entry)?;
            if source_lens(&value) == Some(-1) {
                fh.delete_directory(index, Some(&markers::JPEG_SOI))?;
                return Ok(());
            }
        }
        Err(RedactError::NoLabel("NDPI"))
    }
}
