//! Adapters that turn never-resolved identifiers into cache records by calling
//! the external services.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::domain::{ID_SEPARATOR, Organism, ReductionMode, is_decoy};
use crate::error::IdMapError;
use crate::gprofiler::GprofilerClient;
use crate::hgnc::{HgncClient, SEARCH_FIELDS};
use crate::mygene::{MAX_TERMS, MyGeneClient};
use crate::table::{OrthologRecord, ProteinRecord, ReducedGeneRecord, ReviewStatus};
use crate::uniprot::{AccessionLookup, UniprotClient, UniprotRow};

pub struct ProteinResolver<'a, U: UniprotClient> {
    client: &'a U,
    chunk_size: usize,
}

impl<'a, U: UniprotClient> ProteinResolver<'a, U> {
    pub fn new(client: &'a U, chunk_size: usize) -> Self {
        Self {
            client,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Decoys are never sent. Chunks go out in input order; a rejected chunk is
    /// retried one accession at a time so a single bad accession only loses itself.
    pub fn resolve(&self, missing: &[String]) -> Result<Vec<ProteinRecord>, IdMapError> {
        let queryable: Vec<String> = missing.iter().filter(|id| !is_decoy(id)).cloned().collect();
        let mut records = Vec::new();
        for chunk in queryable.chunks(self.chunk_size) {
            match self.client.lookup_accessions(chunk)? {
                AccessionLookup::Rows(rows) => records.extend(rows.into_iter().flat_map(explode_row)),
                AccessionLookup::Rejected(message) => {
                    warn!(
                        accessions = chunk.len(),
                        reason = %message.trim(),
                        "uniprot rejected chunk, retrying accessions one by one"
                    );
                    for accession in chunk {
                        match self.client.lookup_accessions(std::slice::from_ref(accession))? {
                            AccessionLookup::Rows(rows) => {
                                records.extend(rows.into_iter().flat_map(explode_row))
                            }
                            AccessionLookup::Rejected(_) => {
                                debug!(accession = %accession, "uniprot rejected accession");
                            }
                        }
                    }
                }
            }
        }
        Ok(records)
    }
}

/// Normalizes one UniProt row and emits a record per listed accession.
pub fn explode_row(row: UniprotRow) -> Vec<ProteinRecord> {
    let gene_names = normalize_names(row.gene_names.as_deref().unwrap_or(""));
    let primary_gene_name = normalize_names(row.primary_gene_name.as_deref().unwrap_or(""));
    let reviewed = if row.reviewed.trim().eq_ignore_ascii_case("reviewed") {
        ReviewStatus::Reviewed
    } else {
        ReviewStatus::Unreviewed
    };
    let organism = row.organism.as_deref().unwrap_or("").trim().to_string();

    row.entry
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .map(str::trim)
        .filter(|accession| !accession.is_empty())
        .map(|accession| ProteinRecord {
            gene_names: gene_names.clone(),
            primary_gene_name: primary_gene_name.clone(),
            reviewed,
            organism: organism.clone(),
            protein_id: accession.to_string(),
        })
        .collect()
}

/// Joins whitespace- or `;`-separated names with the single `;` separator.
fn normalize_names(raw: &str) -> Option<String> {
    let names: Vec<&str> = raw
        .split(|ch: char| ch == ID_SEPARATOR || ch.is_whitespace())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(";"))
    }
}

pub struct OrthologResolver<'a, G: GprofilerClient> {
    client: &'a G,
}

impl<'a, G: GprofilerClient> OrthologResolver<'a, G> {
    pub fn new(client: &'a G) -> Self {
        Self { client }
    }

    /// Symbols without an ortholog produce no records.
    pub fn resolve(
        &self,
        symbols: &[String],
        source: Organism,
        target: Organism,
    ) -> Result<Vec<OrthologRecord>, IdMapError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.client.orthologs(source, target, symbols)?;
        Ok(hits
            .into_iter()
            .filter(|hit| hit.name.is_some() || hit.ortholog_ensg.is_some())
            .map(|hit| OrthologRecord {
                source_symbol: hit.incoming,
                source_organism: source,
                ensg: hit.converted,
                ortholog_ensg: hit.ortholog_ensg,
                target_symbol: hit.name,
                target_organism: target,
                description: hit.description,
            })
            .collect())
    }
}

pub struct ReducedGeneResolver<'a, G: GprofilerClient, M: MyGeneClient, H: HgncClient> {
    gprofiler: &'a G,
    mygene: &'a M,
    hgnc: &'a H,
}

impl<'a, G: GprofilerClient, M: MyGeneClient, H: HgncClient> ReducedGeneResolver<'a, G, M, H> {
    pub fn new(gprofiler: &'a G, mygene: &'a M, hgnc: &'a H) -> Self {
        Self {
            gprofiler,
            mygene,
            hgnc,
        }
    }

    /// Every input gene yields at least one record; genes the strategy cannot
    /// place get the `Not Found` sentinel so they are not asked for again.
    pub fn resolve(
        &self,
        genes: &[String],
        organism: Organism,
        mode: ReductionMode,
    ) -> Result<Vec<ReducedGeneRecord>, IdMapError> {
        let organism = mode.check_organism(Some(organism))?;
        if genes.is_empty() {
            return Ok(Vec::new());
        }
        let reduced = match mode {
            ReductionMode::Ensembl => self.by_ensembl(genes, organism)?,
            ReductionMode::MyGeneInfo => self.by_mygene(genes, organism)?,
            ReductionMode::Hgnc => self.by_hgnc(genes)?,
            ReductionMode::Enrichment => self.by_enrichment(genes, organism)?,
        };

        let mut records = Vec::new();
        for gene in genes {
            match reduced.get(gene.as_str()) {
                Some(names) if !names.is_empty() => {
                    records.extend(names.iter().map(|name| ReducedGeneRecord {
                        gene_name: gene.clone(),
                        reduced_gene_name: name.clone(),
                        organism,
                        mode,
                    }))
                }
                _ => records.push(ReducedGeneRecord::not_found(gene, organism, mode)),
            }
        }
        Ok(records)
    }

    fn by_ensembl(
        &self,
        genes: &[String],
        organism: Organism,
    ) -> Result<HashMap<String, Vec<String>>, IdMapError> {
        let hits = self.gprofiler.convert(organism, genes, "ENSG")?;
        let mut reduced: HashMap<String, Vec<String>> = HashMap::new();
        for hit in hits {
            if hit.converted.is_none() {
                continue;
            }
            if let Some(name) = hit.name {
                push_unique(reduced.entry(hit.incoming).or_default(), name);
            }
        }
        Ok(reduced)
    }

    fn by_mygene(
        &self,
        genes: &[String],
        organism: Organism,
    ) -> Result<HashMap<String, Vec<String>>, IdMapError> {
        let mut reduced: HashMap<String, Vec<String>> = HashMap::new();
        for chunk in genes.chunks(MAX_TERMS) {
            for hit in self.mygene.query_symbols(organism.taxonomy_id(), chunk)? {
                if let Some(symbol) = hit.symbol {
                    push_unique(reduced.entry(hit.query).or_default(), symbol);
                }
            }
        }
        Ok(reduced)
    }

    fn by_hgnc(&self, genes: &[String]) -> Result<HashMap<String, Vec<String>>, IdMapError> {
        let mut reduced: HashMap<String, Vec<String>> = HashMap::new();
        for gene in genes {
            if reduced.contains_key(gene) {
                continue;
            }
            let mut symbols = Vec::new();
            for field in SEARCH_FIELDS {
                for symbol in self.hgnc.fetch_symbols(field, gene)? {
                    push_unique(&mut symbols, symbol);
                }
            }
            reduced.insert(gene.clone(), symbols);
        }
        Ok(reduced)
    }

    fn by_enrichment(
        &self,
        genes: &[String],
        organism: Organism,
    ) -> Result<HashMap<String, Vec<String>>, IdMapError> {
        let annotated = self.gprofiler.annotated_genes(organism, genes)?;
        Ok(genes
            .iter()
            .filter(|gene| annotated.contains(gene.as_str()))
            .map(|gene| (gene.clone(), vec![gene.clone()]))
            .collect())
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}
