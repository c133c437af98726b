//! Aperio SVS redaction policy
//!
//! SVS files mark themselves with an IMAGE_DESCRIPTION starting with
//! `Aperio` in the first directory. The label image is the directory
//! whose description's second line starts with `label `; the macro
//! image (a whole-slide photograph) uses `macro ` and may be absent.
//! Aperio also embeds the original file name in the pipe-separated
//! description metadata, which is scrubbed to `X`.
//!
//! Each phase reopens the file: directory state is stale after surgery
//! and must not be reused.

use std::path::Path;

use log::info;

use crate::errors::{RedactError, RedactResult};
use crate::formats::FormatHandler;
use crate::tiff::constants::tags;
use crate::tiff::TiffFile;

pub struct AperioSvs;

/// Returns a description's lines with line endings trimmed
fn description_lines(desc: &[u8]) -> Vec<&[u8]> {
    desc.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}

/// Whether the description's second line starts with the given prefix
fn second_line_starts_with(desc: &[u8], prefix: &[u8]) -> bool {
    let lines = description_lines(desc);
    lines.len() >= 2 && lines[1].starts_with(prefix)
}

/// Replaces the value of a `Filename = ...` description block with `X`
fn cleanse_filename(block: &str) -> String {
    match block.split_once(" = ") {
        Some((key, _)) => format!("{} = X", key),
        None => block.to_string(),
    }
}

/// Deletes the first directory whose description's second line starts
/// with the given prefix; reports whether one was found
fn delete_auxiliary_image(path: &Path, prefix: &[u8]) -> RedactResult<bool> {
    let mut fh = TiffFile::open(path)?;
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
        if second_line_starts_with(desc, prefix) {
            fh.delete_directory(index, None)?;
            return Ok(true);
        }
    }
    Ok(false)
}

impl FormatHandler for AperioSvs {
    fn name(&self) -> &'static str {
        "SVS"
    }

    fn detect(&self, path: &Path) -> RedactResult<()> {
        let mut fh = TiffFile::open(path)?;
        let entry = fh.directories()[0]
            .entry(tags::IMAGE_DESCRIPTION)
            .ok_or(RedactError::UnrecognizedFile)?;
        let value = fh.entry_value(entry)?;
        match value.ascii() {
            Some(desc) if desc.starts_with(b"Aperio") => Ok(()),
            _ => Err(RedactError::UnrecognizedFile),
        }
    }

    fn redact(&self, path: &Path) -> RedactResult<()> {
        // Strip label
        if !delete_auxiliary_image(path, b"label ")? {
            return Err(RedactError::NoLabel("SVS"));
        }
        info!("Deleted label");

        // Strip macro, when the scanner captured one
        if delete_auxiliary_image(path, b"macro ")? {
            info!("Deleted macro");
        }

        // Remove the stored file name from the remaining descriptions
        let mut fh = TiffFile::open(path)?;
        for index in 0..fh.directories().len() {
            let entry = match fh.directories()[index].entry(tags::IMAGE_DESCRIPTION) {
                Some(entry) => entry,
                None => continue,
            };
            let value = fh.entry_value(entry)?;
            let desc = match value.ascii() {
                Some(desc) => String::from_utf8_lossy(desc).into_owned(),
                None => continue,
            };
            if !desc.contains("Filename") {
                continue;
            }
            let cleaned = desc
                .split('|')
                .map(|block| {
                    if block.contains("Filename") {
                        cleanse_filename(block)
                    } else {
                        block.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join("|");
            fh.overwrite_entry(entry, cleaned.as_bytes())?;
            info!("Overwrote stored filename");
        }
        Ok(())
    }
}
