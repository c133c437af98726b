//! Seekable stream trait and implementations
//!
//! This module provides a unified trait for streams that support
//! reading, writing and seeking, which in-place surgery requires.

use std::io::{Read, Seek, Write};

/// Trait for streams that can read, write and seek
///
/// Implemented for anything combining the three std traits, notably
/// `std::fs::File` opened read-write and `Cursor<Vec<u8>>` in tests.
pub trait SeekableFile: Read + Write + Seek + Send + Sync {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Write + Seek + Send + Sync> SeekableFile for T {}
