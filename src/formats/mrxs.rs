//! 3DHISTECH MRXS redaction policy
//!
//! MRXS slides store the barcode/label image as the
//! `ScanDataLayer_SlideBarcode` level of the `Scan data layer`
//! hierarchy layer. Redaction deletes that level through the container
//! editor; a slide without it has no label to remove.

use std::path::Path;

use crate::errors::{RedactError, RedactResult};
use crate::formats::FormatHandler;
use crate::mrxs::MrxsFile;

/// Layer holding the scan-time auxiliary images
const BARCODE_LAYER: &str = "Scan data layer";

/// Level holding the slide barcode image
const BARCODE_LEVEL: &str = "ScanDataLayer_SlideBarcode";

pub struct HistechMrxs;

impl FormatHandler for HistechMrxs {
    fn name(&self) -> &'static str {
        "MRXS"
    }

    fn detect(&self, path: &Path) -> RedactResult<()> {
        MrxsFile::open(path)?;
        Ok(())
    }

    fn redact(&self, path: &Path) -> RedactResult<()> {
        let mut mrxs = MrxsFile::open(path)?;
        match mrxs.delete_level(BARCODE_LAYER, BARCODE_LEVEL) {
            Err(RedactError::LevelNotFound { .. }) => Err(RedactError::NoLabel("MRXS")),
            result => result,
        }
    }
}
