//! Fixture builder for MRXS sidecar trees
//!
//! Builds a complete slide on disk: the `.mrxs` sentinel, the sidecar
//! directory with `Slidedat.ini`, a binary index file laid out per the
//! nonhier format, and one data file holding a JPEG-marked payload per
//! record. The fixture has two layers: "Scan data layer" with
//! thumbnail, barcode and preview levels (records 0..2) and
//! "Stitching intensity layer" with one level (record 3, placed at the
//! data file tail so truncation can be exercised).

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

/// Payload sizes per record, SOI marker included
const RECORD_SIZES: [usize; 4] = [64, 48, 32, 40];

/// Options for fixture variation
pub struct SlideOptions {
    /// Name of the second level in the scan data layer
    pub barcode_level_name: String,
    /// Whether record payloads begin with the JPEG SOI marker
    pub soi: bool,
    /// Whether Slidedat.ini carries a UTF-8 BOM
    pub bom: bool,
}

impl Default for SlideOptions {
    fn default() -> Self {
        SlideOptions {
            barcode_level_name: "ScanDataLayer_SlideBarcode".to_string(),
            soi: true,
            bom: true,
        }
    }
}

/// A built slide fixture with the layout facts tests assert against
pub struct MrxsFixture {
    pub mrxs_path: PathBuf,
    pub slidedat_path: PathBuf,
    pub index_path: PathBuf,
    pub datafile_path: PathBuf,
    /// `(position, size)` of each record's payload in the data file
    pub records: Vec<(u64, u64)>,
    /// Offset of the nonhier pointer table in the index file
    pub table_base: u64,
    /// The table's list-head pointers as written
    pub table: Vec<i32>,
}

/// Builds a slide with default options
pub fn build_slide(root: &Path) -> MrxsFixture {
    build_slide_with(root, SlideOptions::default())
}

/// Builds a slide under `root` and returns its layout
pub fn build_slide_with(root: &Path, options: SlideOptions) -> MrxsFixture {
    let slide_dir = root.join("slide");
    fs::create_dir(&slide_dir).unwrap();
    let mrxs_path = root.join("slide.mrxs");
    fs::write(&mrxs_path, b"MIRAX sentinel").unwrap();

    // Data file: one JPEG-marked payload per record, back to back
    let mut data = Vec::new();
    let mut records = Vec::new();
    for (i, &size) in RECORD_SIZES.iter().enumerate() {
        let position = data.len() as u64;
        if options.soi {
            data.extend_from_slice(&[0xff, 0xd8]);
        } else {
            data.extend_from_slice(b"XX");
        }
        data.extend(std::iter::repeat(0x10 + i as u8).take(size - 2));
        records.push((position, size as u64));
    }
    let datafile_path = slide_dir.join("Data0001.dat");
    fs::write(&datafile_path, &data).unwrap();

    // Index file: preamble, table base pointer at offset 41, pointer
    // table, list heads, data pages
    let mut index = Vec::new();
    index.extend_from_slice(b"3DHISTECH.INDEX.V1");
    index.resize(41, 0);
    let table_base = 45u64;
    index.write_i32::<LittleEndian>(table_base as i32).unwrap();

    let record_count = records.len();
    let heads_base = table_base + 4 * record_count as u64;
    let pages_base = heads_base + 8 * record_count as u64;
    let mut table = Vec::new();
    for i in 0..record_count {
        let head = (heads_base + 8 * i as u64) as i32;
        table.push(head);
        index.write_i32::<LittleEndian>(head).unwrap();
    }
    for i in 0..record_count {
        // List head: 0, page pointer
        index.write_i32::<LittleEndian>(0).unwrap();
        index
            .write_i32::<LittleEndian>((pages_base + 28 * i as u64) as i32)
            .unwrap();
    }
    for &(position, size) in &records {
        // Page prologue (1, reserved, 0, 0), then position, size, fileno
        index.write_i32::<LittleEndian>(1).unwrap();
        index.write_i32::<LittleEndian>(0).unwrap();
        index.write_i32::<LittleEndian>(0).unwrap();
        index.write_i32::<LittleEndian>(0).unwrap();
        index.write_i32::<LittleEndian>(position as i32).unwrap();
        index.write_i32::<LittleEndian>(size as i32).unwrap();
        index.write_i32::<LittleEndian>(0).unwrap();
    }
    let index_path = slide_dir.join("Index.dat");
    fs::write(&index_path, &index).unwrap();

    // Slidedat.ini
    let ini = format!(
        "[GENERAL]\r\n\
         SLIDE_NAME = fixture-slide\r\n\
         SLIDE_VERSION = 1.9\r\n\
         \r\n\
         [HIERARCHICAL]\r\n\
         HIER_COUNT = 0\r\n\
         NONHIER_COUNT = 2\r\n\
         NONHIER_0_NAME = Scan data layer\r\n\
         NONHIER_0_COUNT = 3\r\n\
         NONHIER_0_VAL_0 = ScanDataLayer_SlideThumbnail\r\n\
         NONHIER_0_VAL_0_SECTION = THUMBNAIL_SECTION\r\n\
         NONHIER_0_VAL_0_IMAGENUMBER_X = 0\r\n\
         NONHIER_0_VAL_1 = {barcode}\r\n\
         NONHIER_0_VAL_1_SECTION = BARCODE_SECTION\r\n\
         NONHIER_0_VAL_1_IMAGENUMBER_X = 1\r\n\
         NONHIER_0_VAL_2 = ScanDataLayer_SlidePreview\r\n\
         NONHIER_0_VAL_2_SECTION = PREVIEW_SECTION\r\n\
         NONHIER_0_VAL_2_IMAGENUMBER_X = 2\r\n\
         NONHIER_1_NAME = Stitching intensity layer\r\n\
         NONHIER_1_COUNT = 1\r\n\
         NONHIER_1_VAL_0 = StitchingIntensityLevel\r\n\
         NONHIER_1_VAL_0_SECTION = STITCHING_SECTION\r\n\
         INDEXFILE = Index.dat\r\n\
         \r\n\
         [DATAFILE]\r\n\
         FILE_COUNT = 1\r\n\
         FILE_0 = Data0001.dat\r\n\
         \r\n\
         [THUMBNAIL_SECTION]\r\n\
         IMAGE_FORMAT = JPEG\r\n\
         IMAGE_FILL_COLOR_BGR = 0\r\n\
         \r\n\
         [BARCODE_SECTION]\r\n\
         IMAGE_FORMAT = JPEG\r\n\
         BARCODE_VALUE = S12-3456\r\n\
         \r\n\
         [PREVIEW_SECTION]\r\n\
         IMAGE_FORMAT = JPEG\r\n\
         PREVIEW_SCALE = 4\r\n\
         \r\n\
         [STITCHING_SECTION]\r\n\
         IMAGE_FORMAT = JPEG\r\n",
        barcode = options.barcode_level_name
    );
    let mut ini_bytes = Vec::new();
    if options.bom {
        ini_bytes.extend_from_slice(&[0xef, 0xbb, 0xbf]);
    }
    ini_bytes.extend_from_slice(ini.as_bytes());
    let slidedat_path = slide_dir.join("Slidedat.ini");
    fs::write(&slidedat_path, &ini_bytes).unwrap();

    MrxsFixture {
        mrxs_path,
        slidedat_path,
        index_path,
        datafile_path,
        records,
        table_base,
        table,
    }
}
