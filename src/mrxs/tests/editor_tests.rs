//! Tests for MRXS level deletion

use std::fs;

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::RedactError;
use crate::mrxs::file::MrxsFile;
use crate::mrxs::slidedat::{Slidedat, UTF8_BOM};
use crate::mrxs::tests::test_utils::{build_slide, build_slide_with, SlideOptions};

const HIER: &str = "HIERARCHICAL";
const SCAN_LAYER: &str = "Scan data layer";
const BARCODE: &str = "ScanDataLayer_SlideBarcode";

/// Reads the nonhier table entries from the index file
fn read_table(index: &[u8], table_base: u64, count: usize) -> Vec<i32> {
    (0..count)
        .map(|i| LittleEndian::read_i32(&index[table_base as usize + 4 * i..]))
        .collect()
}

#[test]
fn open_builds_the_flat_level_list() {
    let dir = tempfile::tempdir().unwrap();
    let fx = build_slide(dir.path());
    let mrxs = MrxsFile::open(&fx.mrxs_path).unwrap();

    let names: Vec<(String, String, usize)> = mrxs
        .levels()
        .iter()
        .map(|l| (l.layer_name.clone(), l.name.clone(), l.record))
        .collect();
    assert_eq!(
        names,
        vec![
            (
                SCAN_LAYER.to_string(),
                "ScanDataLayer_SlideThumbnail".to_string(),
                0
            ),
            (SCAN_LAYER.to_string(), BARCODE.to_string(), 1),
            (
                SCAN_LAYER.to_string(),
                "ScanDataLayer_SlidePreview".to_string(),
                2
            ),
            (
                "Stitching intensity layer".to_string(),
                "StitchingIntensityLevel".to_string(),
                3
            ),
        ]
    );
}

#[test]
fn wrong_extension_is_unrecognized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slide.svs");
    fs::write(&path, b"whatever").unwrap();
    assert!(matches!(
        MrxsFile::open(&path),
        Err(RedactError::UnrecognizedFile)
    ));
}

#[test]
fn missing_slidedat_is_unrecognized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slide.mrxs");
    fs::write(&path, b"sentinel with no sidecar").unwrap();
    assert!(matches!(
        MrxsFile::open(&path),
        Err(RedactError::UnrecognizedFile)
    ));
}

#[test]
fn delete_middle_level_rewrites_data_index_and_ini() {
    let dir = tempfile::tempdir().unwrap();
    let fx = build_slide(dir.path());
    let data_before = fs::read(&fx.datafile_path).unwrap();

    let mut mrxs = MrxsFile::open(&fx.mrxs_path).unwrap();
    mrxs.delete_level(SCAN_LAYER, BARCODE).unwrap();

    // Data file: the barcode payload is zeroed, neighbors are intact
    let data = fs::read(&fx.datafile_path).unwrap();
    assert_eq!(data.len(), data_before.len());
    let (position, size) = fx.records[1];
    assert!(data[position as usize..(position + size) as usize]
        .iter()
        .all(|&b| b == 0));
    let (p0, s0) = fx.records[0];
    assert_eq!(
        &data[p0 as usize..(p0 + s0) as usize],
        &data_before[p0 as usize..(p0 + s0) as usize]
    );

    // Index: the table tail shifted down one slot, stale last entry kept
    let index = fs::read(&fx.index_path).unwrap();
    let table = read_table(&index, fx.table_base, 4);
    assert_eq!(
        table,
        vec![fx.table[0], fx.table[2], fx.table[3], fx.table[3]]
    );

    // INI: keys renumbered, count decremented, sections shuffled down
    let raw = fs::read(&fx.slidedat_path).unwrap();
    assert!(raw.starts_with(&UTF8_BOM));
    let dat = Slidedat::parse(&raw).unwrap();
    assert_eq!(dat.get_int(HIER, "NONHIER_0_COUNT").unwrap(), 2);
    assert_eq!(
        dat.get(HIER, "NONHIER_0_VAL_1").unwrap(),
        "ScanDataLayer_SlidePreview"
    );
    assert_eq!(
        dat.get(HIER, "NONHIER_0_VAL_1_SECTION").unwrap(),
        "BARCODE_SECTION"
    );
    assert_eq!(dat.get(HIER, "NONHIER_0_VAL_1_IMAGENUMBER_X").unwrap(), "2");
    assert!(dat.get(HIER, "NONHIER_0_VAL_2").is_err());
    assert!(dat.get(HIER, "NONHIER_0_VAL_2_SECTION").is_err());

    // The preview section now lives under the barcode section's name
    assert!(!dat.has_section("PREVIEW_SECTION"));
    assert_eq!(dat.get("BARCODE_SECTION", "PREVIEW_SCALE").unwrap(), "4");
    assert!(dat.get("BARCODE_SECTION", "BARCODE_VALUE").is_err());

    // The other layer is untouched
    assert_eq!(
        dat.get(HIER, "NONHIER_1_VAL_0").unwrap(),
        "StitchingIntensityLevel"
    );
    assert_eq!(dat.get_int(HIER, "NONHIER_1_COUNT").unwrap(), 1);
    assert!(dat.has_section("STITCHING_SECTION"));

    // The in-memory level map was refreshed
    assert_eq!(mrxs.levels().len(), 3);
    assert!(mrxs.level(SCAN_LAYER, BARCODE).is_none());
    let preview = mrxs.level(SCAN_LAYER, "ScanDataLayer_SlidePreview").unwrap();
    assert_eq!(preview.record, 1);
}

#[test]
fn crlf_endings_survive_the_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let fx = build_slide(dir.path());
    let mut mrxs = MrxsFile::open(&fx.mrxs_path).unwrap();
    mrxs.delete_level(SCAN_LAYER, BARCODE).unwrap();

    let raw = fs::read(&fx.slidedat_path).unwrap();
    let text = std::str::from_utf8(&raw[UTF8_BOM.len()..]).unwrap();
    for line in text.split_inclusive('\n') {
        assert!(line.ends_with("\r\n"), "bare newline in {:?}", line);
    }
}

#[test]
fn bom_free_slidedat_stays_bom_free() {
    let dir = tempfile::tempdir().unwrap();
    let fx = build_slide_with(
        dir.path(),
        SlideOptions {
            bom: false,
            ..SlideOptions::default()
        },
    );
    let mut mrxs = MrxsFile::open(&fx.mrxs_path).unwrap();
    mrxs.delete_level(SCAN_LAYER, BARCODE).unwrap();

    let raw = fs::read(&fx.slidedat_path).unwrap();
    assert!(!raw.starts_with(&UTF8_BOM));
}

#[test]
fn delete_tail_level_truncates_the_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let fx = build_slide(dir.path());
    let index_before = fs::read(&fx.index_path).unwrap();

    let mut mrxs = MrxsFile::open(&fx.mrxs_path).unwrap();
    mrxs.delete_level("Stitching intensity layer", "StitchingIntensityLevel")
        .unwrap();

    // The record sat at the file end, so the file shrank to its start
    let (position, _) = fx.records[3];
    let data = fs::read(&fx.datafile_path).unwrap();
    assert_eq!(data.len() as u64, position);

    // Last record: nothing to move in the index table
    assert_eq!(fs::read(&fx.index_path).unwrap(), index_before);

    let raw = fs::read(&fx.slidedat_path).unwrap();
    let dat = Slidedat::parse(&raw).unwrap();
    assert_eq!(dat.get_int(HIER, "NONHIER_1_COUNT").unwrap(), 0);
    assert!(!dat.has_section("STITCHING_SECTION"));
}

#[test]
fn missing_level_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let fx = build_slide(dir.path());
    let mut mrxs = MrxsFile::open(&fx.mrxs_path).unwrap();

    assert!(matches!(
        mrxs.delete_level(SCAN_LAYER, "ScanDataLayer_Nope"),
        Err(RedactError::LevelNotFound { .. })
    ));
}

#[test]
fn unexpected_payload_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let fx = build_slide_with(
        dir.path(),
        SlideOptions {
            soi: false,
            ..SlideOptions::default()
        },
    );
    let data_before = fs::read(&fx.datafile_path).unwrap();
    let index_before = fs::read(&fx.index_path).unwrap();
    let ini_before = fs::read(&fx.slidedat_path).unwrap();

    let mut mrxs = MrxsFile::open(&fx.mrxs_path).unwrap();
    assert!(matches!(
        mrxs.delete_level(SCAN_LAYER, BARCODE),
        Err(RedactError::UnexpectedNonhierData)
    ));

    // The mutation order guarantees nothing was touched yet
    assert_eq!(fs::read(&fx.datafile_path).unwrap(), data_before);
    assert_eq!(fs::read(&fx.index_path).unwrap(), index_before);
    assert_eq!(fs::read(&fx.slidedat_path).unwrap(), ini_before);
}
