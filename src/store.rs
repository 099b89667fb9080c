use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tempfile::Builder;
use tracing::debug;

use crate::domain::MappingKind;
use crate::error::IdMapError;
use crate::table::{CacheTable, MappingRecord};

/// Directory holding one cache file per mapping kind.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, IdMapError> {
        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir()
                        .join(".cache")
                        .join("kira-idmap")
                        .join("mappings"),
                )
                .ok()
            })
            .ok_or_else(|| {
                IdMapError::Filesystem("unable to resolve cache directory".to_string())
            })?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn table_path(&self, kind: MappingKind) -> Utf8PathBuf {
        self.root.join(kind.file_name())
    }

    pub fn ensure_root(&self) -> Result<(), IdMapError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| IdMapError::Filesystem(err.to_string()))
    }

    /// Reads the persisted table of `R`'s kind. An absent file is an empty table;
    /// an unreadable file or one with a different column set is an error.
    pub fn load<R: MappingRecord>(&self) -> Result<CacheTable<R>, IdMapError> {
        let path = self.table_path(R::KIND);
        if !path.as_std_path().exists() {
            debug!(kind = %R::KIND, path = %path, "no mapping cache yet");
            return Ok(CacheTable::new());
        }

        let read_err = |message: String| IdMapError::CacheRead {
            path: path.to_string(),
            message,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_path(path.as_std_path())
            .map_err(|err| read_err(err.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|err| read_err(err.to_string()))?
            .clone();
        if !headers.iter().eq(R::COLUMNS.iter().copied()) {
            return Err(IdMapError::CacheSchema {
                path: path.to_string(),
                expected: R::COLUMNS.join(", "),
                found: headers.iter().collect::<Vec<_>>().join(", "),
            });
        }

        let mut records = Vec::new();
        for record in reader.deserialize() {
            let record: R = record.map_err(|err| read_err(err.to_string()))?;
            records.push(record);
        }
        debug!(kind = %R::KIND, rows = records.len(), "loaded mapping cache");
        Ok(CacheTable::from_records(records))
    }

    /// Writes the full table with its header row, replacing any previous file atomically.
    pub fn save<R: MappingRecord>(&self, table: &CacheTable<R>) -> Result<(), IdMapError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(R::COLUMNS)
            .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
        for record in table.records() {
            writer
                .serialize(record)
                .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
        }
        let content = writer
            .into_inner()
            .map_err(|err| IdMapError::Filesystem(err.to_string()))?;

        let path = self.table_path(R::KIND);
        Self::write_bytes_atomic(&path, &content)?;
        debug!(kind = %R::KIND, rows = table.len(), path = %path, "saved mapping cache");
        Ok(())
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), IdMapError> {
        let parent = path
            .parent()
            .ok_or_else(|| IdMapError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
        let temp = Builder::new()
            .prefix("kira-idmap")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), content).map_err(|err| IdMapError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
