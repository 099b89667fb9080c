use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{MappingKind, NOT_FOUND, Organism, ReductionMode, split_cell};

/// One resolved row of a mapping kind, as stored in its cache file.
///
/// `Scope` carries the dimensions a lookup is made under. A record is *resolved for*
/// a scope when the resolver call that produced it was made with those parameters;
/// it *matches* a scope when it should be returned to a caller asking under it.
/// The difference matters for proteins: a protein fetched once is known under every
/// organism filter, even when it belongs to another organism.
pub trait MappingRecord: Clone + fmt::Debug + Serialize + DeserializeOwned {
    const KIND: MappingKind;
    const COLUMNS: &'static [&'static str];
    type Scope: fmt::Debug;

    fn key(&self) -> &str;
    fn resolved_for(&self, scope: &Self::Scope) -> bool;
    fn matches(&self, scope: &Self::Scope) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Reviewed,
    Unreviewed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProteinRecord {
    #[serde(rename = "Gene Names")]
    pub gene_names: Option<String>,
    #[serde(rename = "Gene Names (primary)")]
    pub primary_gene_name: Option<String>,
    #[serde(rename = "Reviewed")]
    pub reviewed: ReviewStatus,
    #[serde(rename = "Organism")]
    pub organism: String,
    #[serde(rename = "Protein ID")]
    pub protein_id: String,
}

impl ProteinRecord {
    pub fn gene_name_list(&self) -> Vec<String> {
        self.gene_names.as_deref().map(split_cell).unwrap_or_default()
    }

    pub fn is_reviewed(&self) -> bool {
        self.reviewed == ReviewStatus::Reviewed
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProteinScope {
    pub organism: Option<Organism>,
}

impl MappingRecord for ProteinRecord {
    const KIND: MappingKind = MappingKind::Protein;
    const COLUMNS: &'static [&'static str] = &[
        "Gene Names",
        "Gene Names (primary)",
        "Reviewed",
        "Organism",
        "Protein ID",
    ];
    type Scope = ProteinScope;

    fn key(&self) -> &str {
        &self.protein_id
    }

    fn resolved_for(&self, _scope: &ProteinScope) -> bool {
        true
    }

    fn matches(&self, scope: &ProteinScope) -> bool {
        scope
            .organism
            .is_none_or(|organism| self.organism == organism.uniprot_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrthologRecord {
    pub source_symbol: String,
    pub source_organism: Organism,
    pub ensg: Option<String>,
    pub ortholog_ensg: Option<String>,
    pub target_symbol: Option<String>,
    pub target_organism: Organism,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct OrthologScope {
    pub source: Organism,
    pub target: Organism,
}

impl MappingRecord for OrthologRecord {
    const KIND: MappingKind = MappingKind::Ortholog;
    const COLUMNS: &'static [&'static str] = &[
        "source_symbol",
        "source_organism",
        "ensg",
        "ortholog_ensg",
        "target_symbol",
        "target_organism",
        "description",
    ];
    type Scope = OrthologScope;

    fn key(&self) -> &str {
        &self.source_symbol
    }

    fn resolved_for(&self, scope: &OrthologScope) -> bool {
        self.source_organism == scope.source && self.target_organism == scope.target
    }

    fn matches(&self, scope: &OrthologScope) -> bool {
        self.resolved_for(scope)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReducedGeneRecord {
    #[serde(rename = "Gene Name")]
    pub gene_name: String,
    #[serde(rename = "Reduced Gene Name")]
    pub reduced_gene_name: String,
    #[serde(rename = "Organism")]
    pub organism: Organism,
    #[serde(rename = "Reduction Mode")]
    pub mode: ReductionMode,
}

impl ReducedGeneRecord {
    pub fn not_found(gene_name: &str, organism: Organism, mode: ReductionMode) -> Self {
        Self {
            gene_name: gene_name.to_string(),
            reduced_gene_name: NOT_FOUND.to_string(),
            organism,
            mode,
        }
    }

    pub fn is_found(&self) -> bool {
        !self.reduced_gene_name.is_empty() && self.reduced_gene_name != NOT_FOUND
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReducedGeneScope {
    pub organism: Organism,
    pub mode: ReductionMode,
}

impl MappingRecord for ReducedGeneRecord {
    const KIND: MappingKind = MappingKind::ReducedGene;
    const COLUMNS: &'static [&'static str] =
        &["Gene Name", "Reduced Gene Name", "Organism", "Reduction Mode"];
    type Scope = ReducedGeneScope;

    fn key(&self) -> &str {
        &self.gene_name
    }

    fn resolved_for(&self, scope: &ReducedGeneScope) -> bool {
        self.organism == scope.organism && self.mode == scope.mode
    }

    fn matches(&self, scope: &ReducedGeneScope) -> bool {
        self.resolved_for(scope)
    }
}

/// Result of a cache lookup: rows to answer with and identifiers never resolved.
#[derive(Debug, Clone)]
pub struct Lookup<R> {
    pub found: Vec<R>,
    pub missing: Vec<String>,
}

/// Append-only table of resolved records for one mapping kind.
#[derive(Debug, Clone)]
pub struct CacheTable<R> {
    records: Vec<R>,
}

impl<R> Default for CacheTable<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: MappingRecord> CacheTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<R>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `found` keeps table order; `missing` keeps first-seen input order without duplicates.
    pub fn lookup<S: AsRef<str>>(&self, ids: &[S], scope: &R::Scope) -> Lookup<R> {
        let wanted: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        let mut resolved = HashSet::new();
        let mut found = Vec::new();
        for record in &self.records {
            if !wanted.contains(record.key()) {
                continue;
            }
            if record.resolved_for(scope) {
                resolved.insert(record.key());
            }
            if record.matches(scope) {
                found.push(record.clone());
            }
        }

        let mut seen = HashSet::new();
        let missing = ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| !resolved.contains(id) && seen.insert(*id))
            .map(str::to_string)
            .collect();

        Lookup { found, missing }
    }

    pub fn merge<I: IntoIterator<Item = R>>(&mut self, new_records: I) {
        self.records.extend(new_records);
    }
}
