pub mod commands;
pub mod errors;
pub mod formats;
pub mod io;
pub mod mrxs;
pub mod tiff;

pub use errors::{RedactError, RedactResult};
pub use formats::anonymize_slide;
pub use mrxs::MrxsFile;
pub use tiff::TiffFile;
