use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::error::IdMapError;
use crate::store::Store;

/// A delimited table with a header row, every cell kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: &Utf8Path, delimiter: u8) -> Result<Self, IdMapError> {
        let content =
            fs::read(path.as_std_path()).map_err(|err| IdMapError::Filesystem(format!("{path}: {err}")))?;
        Self::parse(&content, delimiter)
    }

    pub fn parse(content: &[u8], delimiter: u8) -> Result<Self, IdMapError> {
        let input_err = |err: csv::Error| IdMapError::Filesystem(format!("invalid input table: {err}"));
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(content);
        let headers = reader
            .headers()
            .map_err(input_err)?
            .iter()
            .map(|header| header.trim().to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(input_err)?;
            if record.len() > headers.len() {
                return Err(IdMapError::RowTooLong {
                    line: record.position().map_or(0, |pos| pos.line()),
                    found: record.len(),
                    expected: headers.len(),
                });
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Result<usize, IdMapError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| IdMapError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<Vec<String>, IdMapError> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<(), IdMapError> {
        let index = self.column_index(name)?;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[index] = value;
        }
        Ok(())
    }

    /// Keeps the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|index| self.rows.get(*index).cloned())
                .collect(),
        }
    }

    pub fn write(&self, path: &Utf8Path) -> Result<(), IdMapError> {
        let mut writer = tab_writer();
        writer
            .write_record(&self.headers)
            .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
        }
        finish(writer, path)
    }
}

/// Writes serializable rows as a tab-delimited file with a header row.
pub fn write_records<T: Serialize>(path: &Utf8Path, records: &[T]) -> Result<(), IdMapError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
    }
    finish(writer, path)
}

/// `<out_dir>/<stem of input>_<suffix>.tsv`
pub fn output_path(input: &Utf8Path, out_dir: Option<&Utf8Path>, suffix: &str) -> Utf8PathBuf {
    let stem = input.file_stem().unwrap_or("output");
    let dir = out_dir
        .map(Utf8Path::to_path_buf)
        .or_else(|| input.parent().map(Utf8Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{stem}_{suffix}.tsv"))
}

fn tab_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>, path: &Utf8Path) -> Result<(), IdMapError> {
    let content = writer
        .into_inner()
        .map_err(|err| IdMapError::Filesystem(err.to_string()))?;
    Store::write_bytes_atomic(path, &content)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_pads_short_rows() {
        let table = Table::parse(b"Protein IDs\tGene names\nP1;P2\n", b'\t').unwrap();
        assert_eq!(table.rows, vec![vec!["P1;P2".to_string(), String::new()]]);
        assert_eq!(table.column("Protein IDs").unwrap(), vec!["P1;P2"]);
    }

    #[test]
    fn parse_rejects_long_rows() {
        let err = Table::parse(b"Protein IDs\tGene names\nP1\tA\nP2\tB\textra\n", b'\t').unwrap_err();
        assert_matches!(
            err,
            IdMapError::RowTooLong {
                line: 3,
                found: 3,
                expected: 2
            }
        );
    }

    #[test]
    fn unknown_column() {
        let table = Table::parse(b"Gene names\nCASQ2\n", b'\t').unwrap();
        assert_matches!(table.column("Protein IDs"), Err(IdMapError::MissingColumn(_)));
    }

    #[test]
    fn output_path_uses_stem() {
        let path = output_path(Utf8Path::new("/data/proteinGroups.txt"), None, "filtered");
        assert_eq!(path, Utf8PathBuf::from("/data/proteinGroups_filtered.tsv"));
    }
}
