//! Ventana TIF redaction policy
//!
//! Ventana scanners store an iScan XMP packet in tag 700 of the first
//! directory. Detection asks the external TIFF metadata dumper for that
//! packet and looks for `iScan`; anything that keeps the dumper from
//! answering means the file is simply not a Ventana TIF.
//!
//! The label is the directory whose IMAGE_DESCRIPTION first line starts
//! with `Label_Image`. After deleting it, the second directory's XMP
//! packet and description are replaced with fixed anonymized stubs
//! (space- or zero-padded to their original sizes).

use std::path::Path;
use std::process::Command;

use log::debug;

use crate::errors::{RedactError, RedactResult};
use crate::formats::FormatHandler;
use crate::tiff::constants::tags;
use crate::tiff::TiffFile;

/// Replacement XMP packet
const ANONYMIZED_XMP: &[u8] = b"<iScan Magnification='40' ScanRes='0.25'></iScan>";

/// Replacement image description
const ANONYMIZED_DESCRIPTION: &[u8] = b"<Ventana Hopkins Pathology Anonymized Format v1.0.>";

pub struct VentanaTif;

/// Dumps the first directory's metadata via the external TIFF dumper
///
/// Runs `tiffinfo -w -0 FILE`. A dumper that cannot be spawned or exits
/// nonzero is reported as `UnrecognizedFile` so the remaining handlers
/// still get a chance at the file.
fn dump_first_directory(path: &Path) -> RedactResult<String> {
    let output = Command::new("tiffinfo")
        .arg("-w")
        .arg("-0")
        .arg(path)
        .output()
        .map_err(|e| {
            debug!("tiffinfo could not be run: {}", e);
            RedactError::UnrecognizedFile
        })?;
    if !output.status.success() {
        return Err(RedactError::UnrecognizedFile);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whether the description's first line starts with the given prefix
fn first_line_starts_with(desc: &[u8], prefix: &[u8]) -> bool {
    let first = desc.split(|&b| b == b'\n').next().unwrap_or(desc);
    let first = first.strip_suffix(b"\r").unwrap_or(first);
    first.starts_with(prefix)
}

impl FormatHandler for VentanaTif {
    fn name(&self) -> &'static str {
        "Ventana"
    }

    fn detect(&self, path: &Path) -> RedactResult<()> {
        // Must at least be a TIFF before asking the dumper
        TiffFile::open(path)?;
        let dump = dump_first_directory(path)?;
        if dump.contains("iScan") {
            Ok(())
        } else {
            Err(RedactError::UnrecognizedFile)
        }
    }

    fn redact(&self, path: &Path) -> RedactResult<()> {
        let mut fh = TiffFile::open(path)?;

        // Find and delete the label image
        let mut deleted = false;
        for index in 0..fh.directories().len() {
            let entry = match fh.directories()[index].entry(tags::IMAGE_DESCRIPTION) {
                Some(entry) => entry,
                None => continue,
            };
            let value = fh.entry_value(entry)?;
            let desc = match value.ascii() {
                Some(desc) => desc,
                None => continue,
            };
            if first_line_starts_with(desc, b"Label_Image") {
                fh.delete_directory(index, None)?;
                deleted = true;
                break;
            }
        }
        if !deleted {
            return Err(RedactError::NoLabel("TIF"));
        }

        // Replace the scan metadata in the second directory with stubs
        let directory = fh.directories().get(1).ok_or_else(|| {
            RedactError::GenericError("Ventana file has no second directory".to_string())
        })?;
        let xml_entry = directory
            .entry(tags::XMLPACKET)
            .ok_or(RedactError::TagNotFound(tags::XMLPACKET))?;
        let desc_entry = directory
            .entry(tags::IMAGE_DESCRIPTION)
            .ok_or(RedactError::TagNotFound(tags::IMAGE_DESCRIPTION))?;
        fh.overwrite_entry(xml_entry, ANONYMIZED_XMP)?;
        fh.overwrite_entry(desc_entry, ANONYMIZED_DESCRIPTION)?;
        Ok(())
    }
}
