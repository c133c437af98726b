//! Custom error types for slide redaction
//!
//! One error enum covers the TIFF surgeon, the MRXS editor and the
//! format dispatcher. `UnrecognizedFile` is the only non-fatal kind:
//! the dispatcher treats it as "try the next handler".

use std::fmt;
use std::io;

/// Redaction error types
#[derive(Debug)]
pub enum RedactError {
    /// I/O error
    IoError(io::Error),
    /// File signature does not match the handler's format
    UnrecognizedFile,
    /// No handler accepted the file
    UnknownFormat,
    /// TIFF file contains no directories
    NoDirectories,
    /// Directory has no strip offsets/byte counts
    DirectoryNotStripped,
    /// Image strip does not begin with the expected bytes
    UnexpectedStripData,
    /// MRXS nonhier payload does not begin with the JPEG SOI marker
    UnexpectedNonhierData,
    /// Tag not found in a directory
    TagNotFound(u16),
    /// Unsupported TIFF field type
    UnsupportedFieldType(u16),
    /// ASCII value is not NUL-terminated
    StringNotTerminated,
    /// MRXS index structure word did not match the expected value
    IndexMismatch { expected: i32, found: i32 },
    /// Replacement payload is longer than the entry's existing payload
    ValueTooLong { available: usize, given: usize },
    /// Slidedat.ini could not be parsed
    SlidedatParse(String),
    /// INI key absent from a section
    MissingKey { section: String, key: String },
    /// INI section absent
    MissingSection(String),
    /// MRXS level not present in the slide
    LevelNotFound { layer: String, level: String },
    /// Detected format carries no label image
    NoLabel(&'static str),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for RedactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedactError::IoError(e) => write!(f, "I/O error: {}", e),
            RedactError::UnrecognizedFile => write!(f, "Unrecognized file"),
            RedactError::UnknownFormat => write!(f, "Unrecognized file type"),
            RedactError::NoDirectories => write!(f, "No directories"),
            RedactError::DirectoryNotStripped => write!(f, "Directory is not stripped"),
            RedactError::UnexpectedStripData => write!(f, "Unexpected data in image strip"),
            RedactError::UnexpectedNonhierData => write!(f, "Unexpected data in nonhier image"),
            RedactError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            RedactError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            RedactError::StringNotTerminated => write!(f, "String not null-terminated"),
            RedactError::IndexMismatch { expected, found } => {
                write!(f, "{} != {}", found, expected)
            }
            RedactError::ValueTooLong { available, given } => {
                write!(f, "Replacement value too long: {} > {}", given, available)
            }
            RedactError::SlidedatParse(msg) => write!(f, "Invalid Slidedat.ini: {}", msg),
            RedactError::MissingKey { section, key } => {
                write!(f, "Missing key [{}] {}", section, key)
            }
            RedactError::MissingSection(section) => write!(f, "Missing section [{}]", section),
            RedactError::LevelNotFound { layer, level } => {
                write!(f, "Level not found: ({}, {})", layer, level)
            }
            RedactError::NoLabel(format) => write!(f, "No label in {} file", format),
            RedactError::GenericError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RedactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RedactError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RedactError {
    fn from(error: io::Error) -> Self {
        RedactError::IoError(error)
    }
}

/// Result type for redaction operations
pub type RedactResult<T> = Result<T, RedactError>;
