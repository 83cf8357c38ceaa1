// Zip archive read/rewrite.
//
// Archives are unpacked eagerly into memory. Rewriting walks the original
// entry order and substitutes only the entries the caller changed, so every
// other file passes through with identical content.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::LoadError;

/// Archive contents held in memory, with the original entry order.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    names: Vec<String>,
    entries: HashMap<String, Vec<u8>>,
    directories: HashSet<String>,
}

impl Archive {
    /// Unpack every entry of a zip archive.
    ///
    /// Entries are keyed by name. When the central directory lists a name
    /// twice, the zip reader keeps one entry at the first position with the
    /// bytes of the last record.
    pub fn read(bytes: &[u8]) -> Result<Self, LoadError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| LoadError::InvalidArchive(e.to_string()))?;

        let mut archive = Archive::default();
        for i in 0..zip.len() {
            let mut file = zip
                .by_index(i)
                .map_err(|e| LoadError::InvalidArchive(e.to_string()))?;
            let name = file.name().to_string();

            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| LoadError::InvalidArchive(format!("{name}: {e}")))?;

            if file.is_dir() {
                archive.directories.insert(name.clone());
            }
            archive.names.push(name.clone());
            archive.entries.insert(name, data);
        }

        log::debug!("read archive with {} entries", archive.names.len());
        Ok(archive)
    }

    /// Entry names in original order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `.json` entries directly or transitively under `dir/`, in original order.
    pub fn json_under(&self, dir: &str) -> Vec<&str> {
        let prefix = format!("{dir}/");
        self.names
            .iter()
            .filter(|n| n.starts_with(&prefix) && n.ends_with(".json"))
            .map(|n| n.as_str())
            .collect()
    }

    /// Emit a new archive with the same entries in the same order, taking
    /// bytes from `updated` where present. Names in `updated` that the
    /// original does not contain are ignored.
    pub fn rewrite(&self, updated: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>, LoadError> {
        for name in updated.keys() {
            if !self.entries.contains_key(name) {
                log::warn!("ignoring update for '{name}': not present in the source archive");
            }
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for name in &self.names {
            if self.directories.contains(name) {
                writer
                    .add_directory(name.as_str(), entry_options())
                    .map_err(|e| LoadError::ArchiveWrite(format!("{name}: {e}")))?;
                continue;
            }
            let data = match updated.get(name) {
                Some(data) => data.as_slice(),
                None => self.entries.get(name).map(|v| v.as_slice()).unwrap_or_default(),
            };
            write_entry(&mut writer, name, data)?;
        }
        finish(writer)
    }
}

/// Unpack an archive. See [`Archive::read`].
pub fn read_archive(bytes: &[u8]) -> Result<Archive, LoadError> {
    Archive::read(bytes)
}

/// Names of `.json` entries under `dir/`. See [`Archive::json_under`].
pub fn list_json_under<'a>(archive: &'a Archive, dir: &str) -> Vec<&'a str> {
    archive.json_under(dir)
}

/// Rewrite `original` substituting `updated` entries. See [`Archive::rewrite`].
pub fn write_archive(
    original: &Archive,
    updated: &BTreeMap<String, Vec<u8>>,
) -> Result<Vec<u8>, LoadError> {
    original.rewrite(updated)
}

/// Build a fresh archive from `(name, bytes)` pairs in the given order.
pub fn build_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, LoadError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        write_entry(&mut writer, name, data)?;
    }
    finish(writer)
}

/// Fixed timestamp so identical inputs produce identical archive bytes.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

fn write_entry(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    data: &[u8],
) -> Result<(), LoadError> {
    writer
        .start_file(name, entry_options())
        .map_err(|e| LoadError::ArchiveWrite(format!("{name}: {e}")))?;
    writer
        .write_all(data)
        .map_err(|e| LoadError::ArchiveWrite(format!("{name}: {e}")))
}

fn finish(writer: ZipWriter<Cursor<Vec<u8>>>) -> Result<Vec<u8>, LoadError> {
    let cursor = writer
        .finish()
        .map_err(|e| LoadError::ArchiveWrite(e.to_string()))?;
    Ok(cursor.into_inner())
}
