//! Read-only projections over resolved records. Each is total: no records in,
//! empty string out. Duplicate cache rows are collapsed before counting.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::domain::{HgncSelection, ID_SEPARATOR, ReductionMode, is_decoy, split_cell};
use crate::table::{OrthologRecord, ProteinRecord, ReducedGeneRecord};

fn unique<R: Eq + Hash>(records: &[R]) -> Vec<&R> {
    let mut seen = HashSet::new();
    records.iter().filter(|record| seen.insert(*record)).collect()
}

fn join(values: &[String]) -> String {
    values.join(&ID_SEPARATOR.to_string())
}

/// Keeps first occurrences, comparing case-insensitively.
fn dedup_case_insensitive<I: IntoIterator<Item = String>>(values: I) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| !value.is_empty() && seen.insert(value.to_uppercase()))
        .collect()
}

/// Most frequent value; ties go to the value seen first.
pub fn most_frequent<I: IntoIterator<Item = String>>(values: I) -> Option<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value)
}

/// Protein IDs of one cell that survived the organism filter, plus decoy and
/// contaminant entries passed through verbatim when `keep_decoys` is set.
/// Input order is preserved.
pub fn filtered_ids<S: AsRef<str>>(
    ids: &[S],
    records: &[ProteinRecord],
    keep_decoys: bool,
    reviewed_only: bool,
) -> String {
    let mapped: HashSet<&str> = records
        .iter()
        .filter(|record| !reviewed_only || record.is_reviewed())
        .map(|record| record.protein_id.as_str())
        .collect();
    let mut seen = HashSet::new();
    let kept: Vec<String> = ids
        .iter()
        .map(|id| id.as_ref())
        .filter(|id| {
            let keep = if is_decoy(id) {
                keep_decoys
            } else {
                mapped.contains(id)
            };
            keep && seen.insert(*id)
        })
        .map(str::to_string)
        .collect();
    join(&kept)
}

pub fn primary_gene_names(records: &[ProteinRecord]) -> String {
    let names = unique(records)
        .into_iter()
        .filter_map(|record| record.primary_gene_name.as_deref())
        .flat_map(split_cell);
    join(&dedup_case_insensitive(names))
}

pub fn all_gene_names(records: &[ProteinRecord]) -> String {
    let names = unique(records)
        .into_iter()
        .flat_map(|record| record.gene_name_list())
        .map(|name| name.to_uppercase());
    join(&dedup_case_insensitive(names))
}

/// The one shared primary gene name of the cell if there is exactly one;
/// otherwise the most frequent symbol across all full gene-name lists.
pub fn single_gene_name(records: &[ProteinRecord]) -> String {
    let records = unique(records);
    let primaries: Vec<String> = dedup_case_insensitive(
        records
            .iter()
            .filter_map(|record| record.primary_gene_name.clone()),
    );
    if primaries.len() == 1 {
        return primaries[0].clone();
    }

    let names = records
        .iter()
        .flat_map(|record| record.gene_name_list())
        .map(|name| name.to_uppercase());
    most_frequent(names).unwrap_or_default()
}

pub fn ortholog_names(records: &[OrthologRecord]) -> String {
    let names = unique(records)
        .into_iter()
        .filter_map(|record| record.target_symbol.clone())
        .map(|name| name.trim().to_string());
    join(&dedup_case_insensitive(names))
}

/// Reduced names of a cell with `Not Found` placeholders dropped. For HGNC the
/// `MostFrequent` selection keeps only the most common approved symbol.
pub fn reduced_gene_names(
    records: &[ReducedGeneRecord],
    mode: ReductionMode,
    selection: HgncSelection,
) -> String {
    let names: Vec<String> = unique(records)
        .into_iter()
        .filter(|record| record.is_found())
        .map(|record| record.reduced_gene_name.clone())
        .collect();
    if mode == ReductionMode::Hgnc && selection == HgncSelection::MostFrequent {
        return most_frequent(names).unwrap_or_default();
    }
    join(&dedup_case_insensitive(names))
}
