use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::derive;
use crate::difflog::{DiffLog, DiffMode, RemovalCause, classify_removed};
use crate::domain::{
    EmptyAction, HgncSelection, Organism, ReductionMode, RemapMode, split_cell, split_column,
};
use crate::engine::{MappingCache, MappingEngine};
use crate::error::IdMapError;
use crate::gprofiler::GprofilerClient;
use crate::hgnc::HgncClient;
use crate::mygene::MyGeneClient;
use crate::store::Store;
use crate::table::ProteinRecord;
use crate::uniprot::UniprotClient;

/// Outcome of rewriting one column of `;`-joined cells.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnResult {
    /// New value of every input row, kept or not.
    pub cells: Vec<String>,
    /// Indices of the rows that stay in the output, in input order.
    pub kept: Vec<usize>,
    pub log: DiffLog,
}

impl ColumnResult {
    pub fn kept_cells(&self) -> Vec<String> {
        self.kept.iter().map(|index| self.cells[*index].clone()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FilterOptions {
    pub organism: Option<Organism>,
    pub keep_decoys: bool,
    pub reviewed_only: bool,
    pub empty_action: EmptyAction,
}

#[derive(Debug, Clone, Copy)]
pub struct ReduceOptions {
    pub mode: ReductionMode,
    pub selection: HgncSelection,
    pub organism: Option<Organism>,
    pub keep_empty: bool,
}

/// Row workflows on top of a [`MappingEngine`] whose cache lives in `store`.
/// Nothing is written back until [`App::save`] is called.
pub struct App<U, G, M, H>
where
    U: UniprotClient,
    G: GprofilerClient,
    M: MyGeneClient,
    H: HgncClient,
{
    store: Store,
    engine: MappingEngine<U, G, M, H>,
}

impl<U, G, M, H> App<U, G, M, H>
where
    U: UniprotClient,
    G: GprofilerClient,
    M: MyGeneClient,
    H: HgncClient,
{
    pub fn new(store: Store, engine: MappingEngine<U, G, M, H>) -> Self {
        Self { store, engine }
    }

    /// Loads the persisted cache from `store` and wires the clients around it.
    pub fn open(
        store: Store,
        uniprot: U,
        gprofiler: G,
        mygene: M,
        hgnc: H,
        chunk_size: usize,
    ) -> Result<Self, IdMapError> {
        let cache = MappingCache::load(&store)?;
        let engine =
            MappingEngine::new(cache, uniprot, gprofiler, mygene, hgnc).with_chunk_size(chunk_size);
        Ok(Self::new(store, engine))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn engine(&self) -> &MappingEngine<U, G, M, H> {
        &self.engine
    }

    pub fn save(&self) -> Result<(), IdMapError> {
        self.engine.save(&self.store)
    }

    pub fn filter_protein_ids<S: AsRef<str>>(
        &mut self,
        cells: &[S],
        options: FilterOptions,
    ) -> Result<ColumnResult, IdMapError> {
        let all_ids = split_column(cells);
        self.engine
            .resolve_proteins(&all_ids, options.organism, false)?;

        let mut filtered = Vec::with_capacity(cells.len());
        for cell in cells {
            let ids = split_cell(cell.as_ref());
            let records = self.engine.resolve_proteins(&ids, options.organism, true)?;
            filtered.push(derive::filtered_ids(
                &ids,
                &records,
                options.keep_decoys,
                options.reviewed_only,
            ));
        }

        let kept = kept_rows(&filtered, options.empty_action == EmptyAction::Keep);
        let known = self.engine.resolve_proteins(&all_ids, None, true)?;
        let log = DiffLog::build(pairs(cells, &filtered), DiffMode::Removed)
            .with_causes(|id| classify_removed(id, &known, options.organism));
        info!(
            rows = cells.len(),
            kept = kept.len(),
            removed_ids = log.summary.values_before.saturating_sub(log.summary.values_after),
            "filtered protein ids"
        );
        Ok(ColumnResult {
            cells: filtered,
            kept,
            log,
        })
    }

    pub fn remap_gene_names<S: AsRef<str>, T: AsRef<str>>(
        &mut self,
        protein_cells: &[S],
        gene_cells: &[T],
        mode: RemapMode,
        organism: Option<Organism>,
        skip_filled: bool,
    ) -> Result<ColumnResult, IdMapError> {
        if protein_cells.len() != gene_cells.len() {
            return Err(IdMapError::InvalidConfig(format!(
                "protein column has {} rows but gene column has {}",
                protein_cells.len(),
                gene_cells.len()
            )));
        }
        self.engine
            .resolve_proteins(&split_column(protein_cells), organism, false)?;

        let mut remapped = Vec::with_capacity(gene_cells.len());
        for (proteins, genes) in protein_cells.iter().zip(gene_cells) {
            let genes = genes.as_ref();
            if skip_filled && !genes.trim().is_empty() {
                remapped.push(genes.to_string());
                continue;
            }
            let ids = split_cell(proteins.as_ref());
            let records = self.engine.resolve_proteins(&ids, organism, true)?;
            remapped.push(gene_names_for(&records, mode));
        }

        let log = DiffLog::build(pairs(gene_cells, &remapped), DiffMode::Symmetric);
        info!(rows = remapped.len(), changed = log.summary.rows_changed, mode = ?mode, "remapped gene names");
        Ok(ColumnResult {
            kept: (0..remapped.len()).collect(),
            cells: remapped,
            log,
        })
    }

    /// Fails on an invalid mode/organism combination before anything is fetched.
    pub fn reduce_gene_names<S: AsRef<str>>(
        &mut self,
        cells: &[S],
        options: ReduceOptions,
    ) -> Result<ColumnResult, IdMapError> {
        let organism = options.mode.check_organism(options.organism)?;
        self.engine
            .resolve_reduced_genes(&split_column(cells), organism, options.mode, false)?;

        let mut reduced = Vec::with_capacity(cells.len());
        for cell in cells {
            let genes = split_cell(cell.as_ref());
            let records = self
                .engine
                .resolve_reduced_genes(&genes, organism, options.mode, true)?;
            reduced.push(derive::reduced_gene_names(
                &records,
                options.mode,
                options.selection,
            ));
        }

        let log = DiffLog::build(pairs(cells, &reduced), DiffMode::Symmetric);
        let kept: Vec<usize> = if options.keep_empty {
            (0..cells.len()).collect()
        } else {
            cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| !cell.as_ref().trim().is_empty())
                .map(|(index, _)| index)
                .collect()
        };
        info!(
            rows = cells.len(),
            kept = kept.len(),
            changed = log.summary.rows_changed,
            mode = %options.mode,
            "reduced gene names"
        );
        Ok(ColumnResult {
            cells: reduced,
            kept,
            log,
        })
    }

    pub fn map_orthologs<S: AsRef<str>>(
        &mut self,
        cells: &[S],
        organism: Organism,
        target: Organism,
        keep_empty: bool,
    ) -> Result<ColumnResult, IdMapError> {
        self.engine
            .resolve_orthologs(&split_column(cells), organism, target, false)?;

        let mut mapped = Vec::with_capacity(cells.len());
        for cell in cells {
            let symbols = split_cell(cell.as_ref());
            let records = self
                .engine
                .resolve_orthologs(&symbols, organism, target, true)?;
            mapped.push(derive::ortholog_names(&records));
        }

        let kept = kept_rows(&mapped, keep_empty);
        let log = DiffLog::build(pairs(cells, &mapped), DiffMode::Removed);
        let answered: HashSet<String> = self
            .engine
            .resolve_orthologs(&split_column(cells), organism, target, true)?
            .into_iter()
            .map(|record| record.source_symbol)
            .collect();
        let log = log.with_causes(|symbol| {
            if answered.contains(symbol) {
                RemovalCause::Replaced
            } else {
                RemovalCause::NotFound
            }
        });
        info!(
            rows = cells.len(),
            kept = kept.len(),
            source = %organism,
            target = %target,
            "mapped orthologs"
        );
        Ok(ColumnResult {
            cells: mapped,
            kept,
            log,
        })
    }

    /// Raw protein records for `ids`, fetched where needed.
    pub fn mapping_table<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        organism: Option<Organism>,
    ) -> Result<Vec<ProteinRecord>, IdMapError> {
        let ids = split_column(ids);
        self.engine.resolve_proteins(&ids, organism, false)
    }
}

fn gene_names_for(records: &[ProteinRecord], mode: RemapMode) -> String {
    match mode {
        RemapMode::Uniprot => derive::all_gene_names(records),
        RemapMode::UniprotPrimary => derive::primary_gene_names(records),
        RemapMode::UniprotOne => derive::single_gene_name(records),
    }
}

fn kept_rows(cells: &[String], keep_empty: bool) -> Vec<usize> {
    cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| keep_empty || !cell.is_empty())
        .map(|(index, _)| index)
        .collect()
}

fn pairs<'a, S: AsRef<str>>(
    before: &'a [S],
    after: &'a [String],
) -> impl Iterator<Item = (usize, &'a str, &'a str)> {
    before
        .iter()
        .zip(after)
        .enumerate()
        .map(|(row, (before, after))| (row, before.as_ref(), after.as_str()))
}
