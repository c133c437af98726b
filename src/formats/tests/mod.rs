//! Tests for the format handlers and the dispatcher

use std::path::PathBuf;


/// Writes a fixture buffer into a fresh temp file
///
/// Returns the guard together with the path; the file disappears when
/// the guard drops.
pub(crate) fn write_fixture(buffer: &[u8]) -> (tempfile::NamedTempFile, PathBuf) {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), buffer).unwrap();
    let path = file.path().to_path_buf();
    (file, path)
}
