//! Format detection and redaction policies
//!
//! Each supported slide format implements the same two-operation
//! interface: `detect` decides whether a file belongs to the handler,
//! `redact` applies the format's label-removal policy. The dispatcher
//! runs the handlers in a fixed order and stops at the first one whose
//! detection does not report `UnrecognizedFile`.

use std::path::Path;

use log::debug;

use crate::errors::{RedactError, RedactResult};

pub mod mrxs;
pub mod ndpi;
pub mod svs;
#[cfg(test)]
mod tests;
pub mod ventana;

pub use mrxs::HistechMrxs;
pub use ndpi::HamamatsuNdpi;
pub use svs::AperioSvs;
pub use ventana::VentanaTif;

/// A slide format with a detection check and a redaction policy
pub trait FormatHandler {
    /// Short format name used in messages
    fn name(&self) -> &'static str;

    /// Checks whether the file belongs to this format
    ///
    /// `UnrecognizedFile` means "not mine, try the next handler"; any
    /// other error is fatal for the file.
    fn detect(&self, path: &Path) -> RedactResult<()>;

    /// Applies the format's redaction policy
    fn redact(&self, path: &Path) -> RedactResult<()>;
}

/// Returns the handlers in dispatch order
pub fn handlers() -> Vec<Box<dyn FormatHandler>> {
    vec![
        Box::new(VentanaTif),
        Box::new(AperioSvs),
        Box::new(HamamatsuNdpi),
        Box::new(HistechMrxs),
    ]
}

/// Redacts a single slide file
///
/// Tries each handler in order; the first one that recognizes the file
/// performs the redaction. If none does, the file type is unknown.
pub fn anonymize_slide(path: &Path) -> RedactResult<()> {
    for handler in handlers() {
        match handler.detect(path) {
            Ok(()) => {
                debug!("{}: {}", path.display(), handler.name());
                return handler.redact(path);
            }
            Err(RedactError::UnrecognizedFile) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(RedactError::UnknownFormat)
}
