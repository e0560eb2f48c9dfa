//! Archive access for project files.
//!
//! The extractor only needs named byte buffers, so archives are reached
//! through the small [`ArchiveSource`] trait. [`ZipArchiveSource`] reads real
//! project files; [`MemoryArchive`] holds entries built in memory.

use std::io::{Cursor, Read, Seek};

use indexmap::IndexMap;
use thiserror::Error;
use zip::ZipArchive;

use crate::error::ExtractError;

/// An entry could not be read from an archive.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("entry `{0}` does not exist")]
    Missing(String),

    #[error("failed to read entry `{name}`: {reason}")]
    Read { name: String, reason: String },
}

/// A container of named byte buffers.
pub trait ArchiveSource {
    /// Names of all file entries, in container order.
    fn entry_names(&self) -> Vec<String>;

    /// Reads the full contents of one entry.
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, EntryError>;

    /// Opens an archive embedded as an entry of this one.
    ///
    /// Project files nest their payload (a `.llsp3` holds a `scratch.sb3`),
    /// and both layers are zip containers, so the default reads `bytes` as
    /// a zip archive.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Unreadable`] if `bytes` is not a readable
    /// container.
    fn open_nested(&self, bytes: Vec<u8>) -> Result<Box<dyn ArchiveSource>, ExtractError> {
        Ok(Box::new(ZipArchiveSource::from_bytes(bytes)?))
    }
}

/// A zip container read through the `zip` crate.
pub struct ZipArchiveSource<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipArchiveSource<R> {
    /// Opens a zip container.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Unreadable`] if the central directory cannot
    /// be read.
    pub fn new(reader: R) -> Result<Self, ExtractError> {
        let archive =
            ZipArchive::new(reader).map_err(|err| ExtractError::Unreadable(err.to_string()))?;
        Ok(Self { archive })
    }
}

impl ZipArchiveSource<Cursor<Vec<u8>>> {
    /// Opens a zip container held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExtractError> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> ArchiveSource for ZipArchiveSource<R> {
    fn entry_names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, EntryError> {
        let mut file = self.archive.by_name(name).map_err(|err| match err {
            zip::result::ZipError::FileNotFound => EntryError::Missing(name.to_string()),
            other => EntryError::Read {
                name: name.to_string(),
                reason: other.to_string(),
            },
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| EntryError::Read {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        Ok(bytes)
    }
}

/// An archive whose entries live in memory.
///
/// ```
/// # use blockport_parser::archive::{ArchiveSource, MemoryArchive};
/// let mut archive = MemoryArchive::new()
///     .with_entry("project.json", br#"{"targets": []}"#.to_vec());
///
/// assert_eq!(archive.entry_names(), vec!["project.json"]);
/// assert!(archive.read_entry("missing.svg").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: IndexMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), bytes.into());
    }
}

impl ArchiveSource for MemoryArchive {
    fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, EntryError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| EntryError::Missing(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::{ZipWriter, write::SimpleFileOptions};

    use super::*;

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_zip_entries_and_reads() {
        let bytes = zip_bytes(&[("manifest.json", b"{}"), ("icon.svg", b"<svg/>")]);
        let mut archive = ZipArchiveSource::from_bytes(bytes).unwrap();

        assert_eq!(archive.entry_names(), vec!["manifest.json", "icon.svg"]);
        assert_eq!(archive.read_entry("icon.svg").unwrap(), b"<svg/>");
        assert!(matches!(
            archive.read_entry("nope"),
            Err(EntryError::Missing(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_zip_directories_are_not_entries() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_directory("assets/", SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file("assets/a.svg", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<svg/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let archive = ZipArchiveSource::from_bytes(bytes).unwrap();
        assert_eq!(archive.entry_names(), vec!["assets/a.svg"]);
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let result = ZipArchiveSource::from_bytes(b"definitely not a zip".to_vec());
        assert!(matches!(result, Err(ExtractError::Unreadable(_))));
    }

    #[test]
    fn test_memory_archive_opens_nested_zip() {
        let inner = zip_bytes(&[("project.json", b"{}")]);
        let outer = MemoryArchive::new().with_entry("scratch.sb3", inner.clone());

        let nested = outer.open_nested(inner).unwrap();
        assert_eq!(nested.entry_names(), vec!["project.json"]);
    }
}
