//! Per-row before/after comparison of a rewritten column.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::domain::{Organism, is_decoy, split_cell};
use crate::table::ProteinRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Values only in `before`: filtering, ortholog replacement.
    Removed,
    /// Values in either side but not both: gene-name rewrites.
    Symmetric,
}

/// Why a value is missing from the rewritten cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalCause {
    Decoy,
    NotFound,
    WrongOrganism,
    Unreviewed,
    /// Resolved, but under a different name in the output.
    Replaced,
}

impl RemovalCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalCause::Decoy => "decoy",
            RemovalCause::NotFound => "not_found",
            RemovalCause::WrongOrganism => "wrong_organism",
            RemovalCause::Unreviewed => "unreviewed",
            RemovalCause::Replaced => "replaced",
        }
    }
}

/// Classifies a removed protein ID against everything the cache knows about it,
/// regardless of organism.
pub fn classify_removed(
    id: &str,
    known: &[ProteinRecord],
    organism: Option<Organism>,
) -> RemovalCause {
    if is_decoy(id) {
        return RemovalCause::Decoy;
    }
    let rows: Vec<&ProteinRecord> = known.iter().filter(|record| record.protein_id == id).collect();
    if rows.is_empty() {
        return RemovalCause::NotFound;
    }
    let in_organism = |record: &&ProteinRecord| {
        organism.is_none_or(|organism| record.organism == organism.uniprot_name())
    };
    if !rows.iter().any(in_organism) {
        return RemovalCause::WrongOrganism;
    }
    RemovalCause::Unreviewed
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffRow {
    pub row: usize,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub changed: Vec<String>,
    pub n_before: usize,
    pub n_after: usize,
    /// `n_before - n_after`; negative when a rewrite produced more values.
    pub n_changed: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub causes: BTreeMap<String, RemovalCause>,
}

impl DiffRow {
    pub fn new(row: usize, before: &str, after: &str, mode: DiffMode) -> Self {
        let before = split_cell(before);
        let after = split_cell(after);
        let before_set: HashSet<&str> = before.iter().map(String::as_str).collect();
        let after_set: HashSet<&str> = after.iter().map(String::as_str).collect();

        let removed = before
            .iter()
            .filter(|value| !after_set.contains(value.as_str()));
        let added = after
            .iter()
            .filter(|value| mode == DiffMode::Symmetric && !before_set.contains(value.as_str()));
        let mut seen = HashSet::new();
        let changed: Vec<String> = removed
            .chain(added)
            .filter(|value| seen.insert(value.as_str()))
            .cloned()
            .collect();

        Self {
            row,
            n_before: before.len(),
            n_after: after.len(),
            n_changed: before.len() as i64 - after.len() as i64,
            before,
            after,
            changed,
            causes: BTreeMap::new(),
        }
    }
}

/// Flat form of a [`DiffRow`] for delimited log files.
#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    #[serde(rename = "Row")]
    pub row: usize,
    #[serde(rename = "Before")]
    pub before: String,
    #[serde(rename = "After")]
    pub after: String,
    #[serde(rename = "Changed")]
    pub changed: String,
    #[serde(rename = "Nr Before")]
    pub n_before: usize,
    #[serde(rename = "Nr After")]
    pub n_after: usize,
    #[serde(rename = "Nr Changed")]
    pub n_changed: i64,
    #[serde(rename = "Causes")]
    pub causes: String,
}

impl From<&DiffRow> for LogLine {
    fn from(row: &DiffRow) -> Self {
        Self {
            row: row.row,
            before: row.before.join(";"),
            after: row.after.join(";"),
            changed: row.changed.join(";"),
            n_before: row.n_before,
            n_after: row.n_after,
            n_changed: row.n_changed,
            causes: row
                .causes
                .iter()
                .map(|(value, cause)| format!("{value}:{}", cause.as_str()))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub rows: usize,
    pub rows_changed: usize,
    pub rows_emptied: usize,
    pub values_before: usize,
    pub values_after: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub causes: BTreeMap<RemovalCause, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffLog {
    pub mode: DiffMode,
    pub rows: Vec<DiffRow>,
    pub summary: DiffSummary,
}

impl DiffLog {
    /// `pairs` yields `(row index, before cell, after cell)`.
    pub fn build<'a, I>(pairs: I, mode: DiffMode) -> Self
    where
        I: IntoIterator<Item = (usize, &'a str, &'a str)>,
    {
        let rows: Vec<DiffRow> = pairs
            .into_iter()
            .map(|(row, before, after)| DiffRow::new(row, before, after, mode))
            .collect();
        let mut log = Self {
            mode,
            rows,
            summary: DiffSummary::default(),
        };
        log.summarize();
        log
    }

    /// Attaches a cause to every removed value of every row.
    pub fn with_causes(mut self, classify: impl Fn(&str) -> RemovalCause) -> Self {
        for row in &mut self.rows {
            let removed: Vec<&String> = row
                .changed
                .iter()
                .filter(|value| row.before.contains(*value))
                .collect();
            row.causes = removed
                .into_iter()
                .map(|value| (value.clone(), classify(value)))
                .collect();
        }
        self.summarize();
        self
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.rows.iter().map(LogLine::from).collect()
    }

    fn summarize(&mut self) {
        let mut summary = DiffSummary {
            rows: self.rows.len(),
            ..DiffSummary::default()
        };
        for row in &self.rows {
            if !row.changed.is_empty() {
                summary.rows_changed += 1;
            }
            if row.n_before > 0 && row.n_after == 0 {
                summary.rows_emptied += 1;
            }
            summary.values_before += row.n_before;
            summary.values_after += row.n_after;
            for cause in row.causes.values() {
                *summary.causes.entry(*cause).or_default() += 1;
            }
        }
        self.summary = summary;
    }
}
