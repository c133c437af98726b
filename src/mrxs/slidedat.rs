//! Slidedat.ini document model
//!
//! MRXS slides carry their metadata in a `Slidedat.ini` sidecar: UTF-8,
//! optionally prefixed with a byte-order mark, CRLF line endings, and
//! key names whose case is significant. The model preserves section
//! order, key order and key case so the rewritten file stays readable
//! by third-party consumers. Renaming a key re-adds it at the end of
//! its section.

use indexmap::IndexMap;

use crate::errors::{RedactError, RedactResult};

/// UTF-8 byte-order mark
pub const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Parsed Slidedat.ini contents
#[derive(Debug, Clone)]
pub struct Slidedat {
    sections: IndexMap<String, IndexMap<String, String>>,
    have_bom: bool,
}

impl Slidedat {
    /// Parses a Slidedat.ini byte payload
    ///
    /// Records whether a BOM was present so serialization can restore
    /// it. Blank lines and `;`/`#` comments are skipped; keys and
    /// values are split on the first `=` or `:` and trimmed.
    pub fn parse(data: &[u8]) -> RedactResult<Self> {
        let (have_bom, body) = match data.strip_prefix(&UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, data),
        };
        let text = std::str::from_utf8(body)
            .map_err(|e| RedactError::SlidedatParse(format!("not valid UTF-8: {}", e)))?;

        let mut sections: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        let mut current: Option<String> = None;
        for (lineno, raw) in text.split('\n').enumerate() {
            let line = raw.trim_end_matches('\r').trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }
            let (key, value) = line
                .split_once(['=', ':'])
                .ok_or_else(|| {
                    RedactError::SlidedatParse(format!("line {}: no delimiter", lineno + 1))
                })?;
            let section = current.as_ref().ok_or_else(|| {
                RedactError::SlidedatParse(format!("line {}: key outside any section", lineno + 1))
            })?;
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Slidedat { sections, have_bom })
    }

    /// Whether the parsed file carried a byte-order mark
    pub fn have_bom(&self) -> bool {
        self.have_bom
    }

    /// Checks whether a section exists
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Adds a section if it does not already exist
    pub fn add_section(&mut self, section: &str) {
        self.sections.entry(section.to_string()).or_default();
    }

    /// Removes a section; returns whether it existed
    pub fn remove_section(&mut self, section: &str) -> bool {
        self.sections.shift_remove(section).is_some()
    }

    /// Gets a value
    pub fn get(&self, section: &str, key: &str) -> RedactResult<&str> {
        let entries = self
            .sections
            .get(section)
            .ok_or_else(|| RedactError::MissingSection(section.to_string()))?;
        entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| RedactError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Gets a value parsed as an integer
    pub fn get_int(&self, section: &str, key: &str) -> RedactResult<i64> {
        let value = self.get(section, key)?;
        value.parse().map_err(|_| {
            RedactError::SlidedatParse(format!("[{}] {}: not an integer: {}", section, key, value))
        })
    }

    /// Sets a value in an existing section
    ///
    /// A new key is appended at the end of the section.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> RedactResult<()> {
        let entries = self
            .sections
            .get_mut(section)
            .ok_or_else(|| RedactError::MissingSection(section.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Removes a key and returns its value
    pub fn remove_key(&mut self, section: &str, key: &str) -> RedactResult<String> {
        let entries = self
            .sections
            .get_mut(section)
            .ok_or_else(|| RedactError::MissingSection(section.to_string()))?;
        entries
            .shift_remove(key)
            .ok_or_else(|| RedactError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Renames a key, keeping its value; the key moves to the section end
    pub fn rename_key(&mut self, section: &str, old: &str, new: &str) -> RedactResult<()> {
        let value = self.remove_key(section, old)?;
        self.set(section, new, &value)
    }

    /// Returns the key names of a section in order
    pub fn section_keys(&self, section: &str) -> RedactResult<Vec<String>> {
        let entries = self
            .sections
            .get(section)
            .ok_or_else(|| RedactError::MissingSection(section.to_string()))?;
        Ok(entries.keys().cloned().collect())
    }

    /// Returns the key/value pairs of a section in order
    pub fn section_items(&self, section: &str) -> RedactResult<Vec<(String, String)>> {
        let entries = self
            .sections
            .get(section)
            .ok_or_else(|| RedactError::MissingSection(section.to_string()))?;
        Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Serializes the document back to bytes
    ///
    /// Writes the BOM if one was present, then each section with its
    /// keys as `KEY = VALUE` lines, a blank line after every section,
    /// and CRLF line endings throughout.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.have_bom {
            out.extend_from_slice(&UTF8_BOM);
        }
        for (name, entries) in &self.sections {
            out.extend_from_slice(format!("[{}]\r\n", name).as_bytes());
            for (key, value) in entries {
                out.extend_from_slice(format!("{} = {}\r\n", key, value).as_bytes());
            }
            out.extend_from_slice(b"\r\n");
        }
        out
    }
}
