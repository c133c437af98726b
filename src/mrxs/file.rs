//! MRXS container editor
//!
//! A `.mrxs` file is only a sentinel; the slide lives in a directory of
//! the same basename holding `Slidedat.ini`, one binary index file and
//! N binary data files. Levels are addressed two ways in parallel: by a
//! flat record number in the index's nonhier table, and by
//! `NONHIER_<layer>_VAL_<level>` key families in the INI. Deleting a
//! level must edit both representations plus the data file payload, in
//! that order, so an interrupted edit degrades to a level that still
//! resolves but points at zeroed pixels.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use crate::errors::{RedactError, RedactResult};
use crate::mrxs::slidedat::Slidedat;
use crate::tiff::constants::markers;

/// Name of the INI section holding the nonhier hierarchy
pub const MRXS_HIERARCHICAL: &str = "HIERARCHICAL";

/// Fixed file offset of the nonhier table-base pointer in the index file
pub const MRXS_NONHIER_ROOT_OFFSET: u64 = 41;

/// Zeroing is done through a bounded scratch buffer
const ZERO_CHUNK: usize = 64 * 1024;

/// One level of the flattened nonhier hierarchy
#[derive(Debug, Clone)]
pub struct NonHierLevel {
    /// Layer index within the hierarchy
    pub layer_id: i64,
    /// Level index within the layer
    pub id: i64,
    /// Flat record number across all layers
    pub record: usize,
    /// Value of `NONHIER_<layer>_NAME`
    pub layer_name: String,
    /// Value of `NONHIER_<layer>_VAL_<level>`
    pub name: String,
    /// `NONHIER_<layer>_VAL_<level>`, the stem of this level's key family
    pub key_prefix: String,
    /// `<key_prefix>_SECTION`
    pub section_key: String,
    /// Name of this level's own INI section
    pub section: String,
}

impl NonHierLevel {
    fn from_slidedat(
        dat: &Slidedat,
        layer_id: i64,
        level_id: i64,
        record: usize,
    ) -> RedactResult<Self> {
        let layer_name = dat
            .get(MRXS_HIERARCHICAL, &format!("NONHIER_{}_NAME", layer_id))?
            .to_string();
        let key_prefix = format!("NONHIER_{}_VAL_{}", layer_id, level_id);
        let name = dat.get(MRXS_HIERARCHICAL, &key_prefix)?.to_string();
        let section_key = format!("{}_SECTION", key_prefix);
        let section = dat.get(MRXS_HIERARCHICAL, &section_key)?.to_string();

        Ok(NonHierLevel {
            layer_id,
            id: level_id,
            record,
            layer_name,
            name,
            key_prefix,
            section_key,
            section,
        })
    }
}

/// An open MRXS slide
pub struct MrxsFile {
    slidedat_path: PathBuf,
    dat: Slidedat,
    indexfile: PathBuf,
    datafiles: Vec<PathBuf>,
    levels: HashMap<(String, String), usize>,
    level_list: Vec<NonHierLevel>,
}

impl MrxsFile {
    /// Opens an MRXS slide from its sentinel file path
    ///
    /// A path without the `.mrxs` extension or without a readable
    /// `Slidedat.ini` in the sidecar directory is not an MRXS slide;
    /// both report `UnrecognizedFile` so the dispatcher moves on.
    pub fn open(path: &Path) -> RedactResult<Self> {
        if path.extension().and_then(|e| e.to_str()) != Some("mrxs") {
            return Err(RedactError::UnrecognizedFile);
        }
        let dirname = path.with_extension("");
        let slidedat_path = dirname.join("Slidedat.ini");
        let data = std::fs::read(&slidedat_path).map_err(|_| RedactError::UnrecognizedFile)?;
        let dat = Slidedat::parse(&data)?;

        let indexfile = dirname.join(dat.get(MRXS_HIERARCHICAL, "INDEXFILE")?);
        let file_count = dat.get_int("DATAFILE", "FILE_COUNT")?;
        let mut datafiles = Vec::with_capacity(file_count as usize);
        for i in 0..file_count {
            datafiles.push(dirname.join(dat.get("DATAFILE", &format!("FILE_{}", i))?));
        }

        let (levels, level_list) = Self::make_levels(&dat)?;
        Ok(MrxsFile {
            slidedat_path,
            dat,
            indexfile,
            datafiles,
            levels,
            level_list,
        })
    }

    /// Builds the flat level list from the INI hierarchy
    ///
    /// Records are numbered by position in the flattened enumeration of
    /// all levels across all layers, which is also how the index file's
    /// nonhier table is addressed.
    fn make_levels(
        dat: &Slidedat,
    ) -> RedactResult<(HashMap<(String, String), usize>, Vec<NonHierLevel>)> {
        let mut levels = HashMap::new();
        let mut level_list = Vec::new();
        let layer_count = dat.get_int(MRXS_HIERARCHICAL, "NONHIER_COUNT")?;
        for layer_id in 0..layer_count {
            let level_count =
                dat.get_int(MRXS_HIERARCHICAL, &format!("NONHIER_{}_COUNT", layer_id))?;
            for level_id in 0..level_count {
                let level =
                    NonHierLevel::from_slidedat(dat, layer_id, level_id, level_list.len())?;
                levels.insert(
                    (level.layer_name.clone(), level.name.clone()),
                    level_list.len(),
                );
                level_list.push(level);
            }
        }
        Ok((levels, level_list))
    }

    /// Returns the flattened level list
    pub fn levels(&self) -> &[NonHierLevel] {
        &self.level_list
    }

    /// Looks up a level by layer name and level name
    pub fn level(&self, layer_name: &str, level_name: &str) -> Option<&NonHierLevel> {
        self.levels
            .get(&(layer_name.to_string(), level_name.to_string()))
            .map(|&i| &self.level_list[i])
    }

    fn read_i32(stream: &mut impl Read) -> RedactResult<i32> {
        Ok(stream.read_i32::<LittleEndian>()?)
    }

    fn assert_i32(stream: &mut impl Read, expected: i32) -> RedactResult<()> {
        let found = Self::read_i32(stream)?;
        if found != expected {
            return Err(RedactError::IndexMismatch { expected, found });
        }
        Ok(())
    }

    /// Walks the index file to a record's payload location
    ///
    /// Offset 41 holds the table base; the table entry points to a list
    /// head `(0, page)`; the page prologue is `(1, _, 0, 0)` followed by
    /// `(position, size, fileno)`.
    fn data_location(&self, record: usize) -> RedactResult<(PathBuf, u64, u64)> {
        let mut fh = File::open(&self.indexfile)?;
        fh.seek(SeekFrom::Start(MRXS_NONHIER_ROOT_OFFSET))?;
        let table_base = Self::read_i32(&mut fh)?;
        fh.seek(SeekFrom::Start(table_base as u64 + record as u64 * 4))?;
        let list_head = Self::read_i32(&mut fh)?;
        fh.seek(SeekFrom::Start(list_head as u64))?;
        Self::assert_i32(&mut fh, 0)?;
        let page = Self::read_i32(&mut fh)?;
        fh.seek(SeekFrom::Start(page as u64))?;
        // Page prologue: pagesize 1, reserved word, two zero words
        Self::assert_i32(&mut fh, 1)?;
        Self::read_i32(&mut fh)?;
        Self::assert_i32(&mut fh, 0)?;
        Self::assert_i32(&mut fh, 0)?;
        let position = Self::read_i32(&mut fh)?;
        let size = Self::read_i32(&mut fh)?;
        let fileno = Self::read_i32(&mut fh)?;

        let datafile = self
            .datafiles
            .get(fileno as usize)
            .ok_or_else(|| {
                RedactError::GenericError(format!("Data file index out of range: {}", fileno))
            })?
            .clone();
        Ok((datafile, position as u64, size as u64))
    }

    /// Zeroes a record's payload, or truncates it away when tail-aligned
    ///
    /// The payload must begin with the JPEG SOI marker; anything else
    /// means the index walk landed somewhere unexpected and nothing is
    /// written.
    fn zero_record(&self, record: usize) -> RedactResult<()> {
        let (path, offset, length) = self.data_location(record)?;
        let mut fh = OpenOptions::new().read(true).write(true).open(&path)?;
        let file_len = fh.seek(SeekFrom::End(0))?;
        let do_truncate = file_len == offset + length;

        fh.seek(SeekFrom::Start(offset))?;
        let mut prefix = [0u8; 2];
        fh.read_exact(&mut prefix)?;
        if prefix != markers::JPEG_SOI {
            return Err(RedactError::UnexpectedNonhierData);
        }

        if do_truncate {
            debug!("Truncating {} to {}", path.display(), offset);
            fh.set_len(offset)?;
        } else {
            debug!("Zeroing {} at {} for {}", path.display(), offset, length);
            fh.seek(SeekFrom::Start(offset))?;
            let chunk = vec![0u8; ZERO_CHUNK.min(length as usize)];
            let mut remaining = length as usize;
            while remaining > 0 {
                let n = remaining.min(chunk.len());
                fh.write_all(&chunk[..n])?;
                remaining -= n;
            }
        }
        Ok(())
    }

    /// Compacts the nonhier table over a deleted record
    ///
    /// Shifts the table tail down one slot. The former last slot keeps
    /// its stale bytes; nothing addresses it once the INI counts are
    /// updated.
    fn delete_index_record(&self, record: usize) -> RedactResult<()> {
        debug!("Deleting record {}", record);
        let entries_to_move = self.level_list.len() - record - 1;
        if entries_to_move == 0 {
            return Ok(());
        }
        let mut fh = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.indexfile)?;
        fh.seek(SeekFrom::Start(MRXS_NONHIER_ROOT_OFFSET))?;
        let table_base = Self::read_i32(&mut fh)? as u64;
        fh.seek(SeekFrom::Start(table_base + (record as u64 + 1) * 4))?;
        let mut tail = vec![0u8; entries_to_move * 4];
        fh.read_exact(&mut tail)?;
        fh.seek(SeekFrom::Start(table_base + record as u64 * 4))?;
        fh.write_all(&tail)?;
        Ok(())
    }

    /// Keys in HIERARCHICAL belonging to a level's family
    fn hier_keys_for_level(&self, level: &NonHierLevel) -> RedactResult<Vec<String>> {
        let prefix_ = format!("{}_", level.key_prefix);
        Ok(self
            .dat
            .section_keys(MRXS_HIERARCHICAL)?
            .into_iter()
            .filter(|k| *k == level.key_prefix || k.starts_with(&prefix_))
            .collect())
    }

    /// Renames an INI section by copying its items
    fn rename_section(&mut self, old: &str, new: &str) -> RedactResult<()> {
        if self.dat.has_section(old) {
            debug!("[{}] -> [{}]", old, new);
            self.dat.add_section(new);
            for (key, value) in self.dat.section_items(old)? {
                self.dat.set(new, &key, &value)?;
            }
            self.dat.remove_section(old);
        } else {
            debug!("[{}] does not exist", old);
        }
        Ok(())
    }

    /// Serializes the INI back to the sidecar file
    fn write(&self) -> RedactResult<()> {
        std::fs::write(&self.slidedat_path, self.dat.serialize())?;
        Ok(())
    }

    /// Deletes a level from the slide
    ///
    /// Zeroes the image payload, compacts the index table, removes the
    /// level's INI keys and section, renumbers the subsequent levels of
    /// the same layer, decrements the layer's level count, rewrites the
    /// INI and refreshes the in-memory level map. Mutation order is
    /// datafile, then index, then INI.
    pub fn delete_level(&mut self, layer_name: &str, level_name: &str) -> RedactResult<()> {
        let index = *self
            .levels
            .get(&(layer_name.to_string(), level_name.to_string()))
            .ok_or_else(|| RedactError::LevelNotFound {
                layer: layer_name.to_string(),
                level: level_name.to_string(),
            })?;
        let level = self.level_list[index].clone();
        let record = level.record;

        // Zero image data
        self.zero_record(record)?;

        // Delete pointer from nonhier table in index
        self.delete_index_record(record)?;

        // Remove slidedat keys
        for key in self.hier_keys_for_level(&level)? {
            debug!("Deleting [{}] {}", MRXS_HIERARCHICAL, key);
            self.dat.remove_key(MRXS_HIERARCHICAL, &key)?;
        }

        // Remove slidedat section
        debug!("Deleting [{}]", level.section);
        self.dat.remove_section(&level.section);

        // Rename section and keys for subsequent levels in the layer
        let mut prev = level.clone();
        let tail: Vec<NonHierLevel> = self.level_list[record + 1..].to_vec();
        for cur in tail {
            if cur.layer_id != prev.layer_id {
                break;
            }
            for key in self.hier_keys_for_level(&cur)? {
                let new_key = key.replacen(&cur.key_prefix, &prev.key_prefix, 1);
                debug!("[{}] {} -> {}", MRXS_HIERARCHICAL, key, new_key);
                self.dat.rename_key(MRXS_HIERARCHICAL, &key, &new_key)?;
            }
            debug!(
                "[{}] {} = {}",
                MRXS_HIERARCHICAL, prev.section_key, prev.section
            );
            self.dat
                .set(MRXS_HIERARCHICAL, &prev.section_key, &prev.section)?;
            self.rename_section(&cur.section, &prev.section)?;
            prev = cur;
        }

        // Update level count within layer
        let count_key = format!("NONHIER_{}_COUNT", level.layer_id);
        let count = self.dat.get_int(MRXS_HIERARCHICAL, &count_key)?;
        debug!(
            "[{}] {}: {} -> {}",
            MRXS_HIERARCHICAL,
            count_key,
            count,
            count - 1
        );
        self.dat
            .set(MRXS_HIERARCHICAL, &count_key, &(count - 1).to_string())?;

        // Write slidedat
        self.write()?;

        // Refresh metadata
        let (levels, level_list) = Self::make_levels(&self.dat)?;
        self.levels = levels;
        self.level_list = level_list;
        Ok(())
    }
}
