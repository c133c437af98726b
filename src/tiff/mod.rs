//! TIFF file format parsing and in-place surgery
//!
//! This module provides structures and functions for reading TIFF,
//! BigTIFF and Hamamatsu NDPI files and for the two mutations the
//! redaction policies perform: directory deletion and entry overwrite.

pub(crate) mod constants;
pub mod dialect;
pub mod file;
pub mod ifd;
#[cfg(test)]
pub(crate) mod tests;

pub use dialect::TiffDialect;
pub use file::TiffFile;
pub use ifd::{EntryValue, TiffDirectory, TiffEntry};
