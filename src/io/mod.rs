//! Low-level I/O support
//!
//! Byte order strategies and the seekable stream trait used by the
//! TIFF surgeon and the MRXS editor.

pub mod byte_order;
pub mod seekable;

pub use byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use seekable::SeekableFile;
