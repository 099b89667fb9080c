use std::collections::HashSet;
use std::hash::Hash;

use tracing::{debug, info};

use crate::config::DEFAULT_UNIPROT_CHUNK_SIZE;
use crate::domain::{MappingKind, Organism, ReductionMode};
use crate::error::IdMapError;
use crate::gprofiler::GprofilerClient;
use crate::hgnc::HgncClient;
use crate::mygene::MyGeneClient;
use crate::resolver::{OrthologResolver, ProteinResolver, ReducedGeneResolver};
use crate::store::Store;
use crate::table::{
    CacheTable, MappingRecord, OrthologRecord, OrthologScope, ProteinRecord, ProteinScope,
    ReducedGeneRecord, ReducedGeneScope,
};
use crate::uniprot::UniprotClient;

/// The three cache tables of a run. Loaded once, mutated in memory, saved only on request.
#[derive(Debug, Clone, Default)]
pub struct MappingCache {
    proteins: CacheTable<ProteinRecord>,
    orthologs: CacheTable<OrthologRecord>,
    reduced_genes: CacheTable<ReducedGeneRecord>,
}

impl MappingCache {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(store: &Store) -> Result<Self, IdMapError> {
        Ok(Self {
            proteins: store.load()?,
            orthologs: store.load()?,
            reduced_genes: store.load()?,
        })
    }

    pub fn save(&self, store: &Store) -> Result<(), IdMapError> {
        store.ensure_root()?;
        store.save(&self.proteins)?;
        store.save(&self.orthologs)?;
        store.save(&self.reduced_genes)?;
        Ok(())
    }

    pub fn proteins(&self) -> &CacheTable<ProteinRecord> {
        &self.proteins
    }

    pub fn orthologs(&self) -> &CacheTable<OrthologRecord> {
        &self.orthologs
    }

    pub fn reduced_genes(&self) -> &CacheTable<ReducedGeneRecord> {
        &self.reduced_genes
    }

    pub fn len(&self, kind: MappingKind) -> usize {
        match kind {
            MappingKind::Protein => self.proteins.len(),
            MappingKind::Ortholog => self.orthologs.len(),
            MappingKind::ReducedGene => self.reduced_genes.len(),
        }
    }
}

/// What to resolve and under which organism/mode dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingRequest {
    Protein {
        organism: Option<Organism>,
    },
    Ortholog {
        source: Organism,
        target: Organism,
    },
    ReducedGene {
        organism: Option<Organism>,
        mode: ReductionMode,
    },
}

impl MappingRequest {
    /// Builds a request from loosely-typed parts, rejecting combinations a kind cannot serve.
    pub fn from_parts(
        kind: MappingKind,
        organism: Option<Organism>,
        target: Option<Organism>,
        mode: Option<ReductionMode>,
    ) -> Result<Self, IdMapError> {
        match kind {
            MappingKind::Protein => Ok(MappingRequest::Protein { organism }),
            MappingKind::Ortholog => {
                let source = organism.ok_or_else(|| {
                    IdMapError::InvalidConfig("ortholog mapping requires a source organism".to_string())
                })?;
                let target = target.ok_or_else(|| {
                    IdMapError::InvalidConfig("ortholog mapping requires a target organism".to_string())
                })?;
                Ok(MappingRequest::Ortholog { source, target })
            }
            MappingKind::ReducedGene => {
                let mode = mode.ok_or_else(|| {
                    IdMapError::InvalidConfig("gene reduction requires a reduction mode".to_string())
                })?;
                mode.check_organism(organism)?;
                Ok(MappingRequest::ReducedGene { organism, mode })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Protein(Vec<ProteinRecord>),
    Ortholog(Vec<OrthologRecord>),
    ReducedGene(Vec<ReducedGeneRecord>),
}

impl Resolved {
    pub fn len(&self) -> usize {
        match self {
            Resolved::Protein(rows) => rows.len(),
            Resolved::Ortholog(rows) => rows.len(),
            Resolved::ReducedGene(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identifiers already sent to a resolver during this run. Keeps repeated
/// resolves of unresolvable identifiers off the network; never persisted.
#[derive(Debug, Default)]
struct Attempted {
    proteins: HashSet<String>,
    orthologs: HashSet<(String, Organism, Organism)>,
    reduced_genes: HashSet<(String, Organism, ReductionMode)>,
}

pub struct MappingEngine<U, G, M, H>
where
    U: UniprotClient,
    G: GprofilerClient,
    M: MyGeneClient,
    H: HgncClient,
{
    cache: MappingCache,
    attempted: Attempted,
    uniprot: U,
    gprofiler: G,
    mygene: M,
    hgnc: H,
    chunk_size: usize,
}

impl<U, G, M, H> MappingEngine<U, G, M, H>
where
    U: UniprotClient,
    G: GprofilerClient,
    M: MyGeneClient,
    H: HgncClient,
{
    pub fn new(cache: MappingCache, uniprot: U, gprofiler: G, mygene: M, hgnc: H) -> Self {
        Self {
            cache,
            attempted: Attempted::default(),
            uniprot,
            gprofiler,
            mygene,
            hgnc,
            chunk_size: DEFAULT_UNIPROT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn cache(&self) -> &MappingCache {
        &self.cache
    }

    pub fn save(&self, store: &Store) -> Result<(), IdMapError> {
        self.cache.save(store)
    }

    pub fn uniprot(&self) -> &U {
        &self.uniprot
    }

    pub fn gprofiler(&self) -> &G {
        &self.gprofiler
    }

    pub fn mygene(&self) -> &M {
        &self.mygene
    }

    pub fn hgnc(&self) -> &H {
        &self.hgnc
    }

    /// Answers `ids` from the cache, fetching never-resolved identifiers first
    /// unless `ignore_missing` is set. Identifiers without any answer are simply
    /// absent from the result.
    pub fn resolve<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        request: &MappingRequest,
        ignore_missing: bool,
    ) -> Result<Resolved, IdMapError> {
        match *request {
            MappingRequest::Protein { organism } => self
                .resolve_proteins(ids, organism, ignore_missing)
                .map(Resolved::Protein),
            MappingRequest::Ortholog { source, target } => self
                .resolve_orthologs(ids, source, target, ignore_missing)
                .map(Resolved::Ortholog),
            MappingRequest::ReducedGene { organism, mode } => {
                let organism = mode.check_organism(organism)?;
                self.resolve_reduced_genes(ids, organism, mode, ignore_missing)
                    .map(Resolved::ReducedGene)
            }
        }
    }

    pub fn resolve_proteins<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        organism: Option<Organism>,
        ignore_missing: bool,
    ) -> Result<Vec<ProteinRecord>, IdMapError> {
        let resolver = ProteinResolver::new(&self.uniprot, self.chunk_size);
        resolve_table(
            &mut self.cache.proteins,
            &mut self.attempted.proteins,
            ids,
            &ProteinScope { organism },
            ignore_missing,
            |id| id.to_string(),
            |missing| resolver.resolve(missing),
        )
    }

    pub fn resolve_orthologs<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        source: Organism,
        target: Organism,
        ignore_missing: bool,
    ) -> Result<Vec<OrthologRecord>, IdMapError> {
        let resolver = OrthologResolver::new(&self.gprofiler);
        resolve_table(
            &mut self.cache.orthologs,
            &mut self.attempted.orthologs,
            ids,
            &OrthologScope { source, target },
            ignore_missing,
            |id| (id.to_string(), source, target),
            |missing| resolver.resolve(missing, source, target),
        )
    }

    pub fn resolve_reduced_genes<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        organism: Organism,
        mode: ReductionMode,
        ignore_missing: bool,
    ) -> Result<Vec<ReducedGeneRecord>, IdMapError> {
        let organism = mode.check_organism(Some(organism))?;
        let resolver = ReducedGeneResolver::new(&self.gprofiler, &self.mygene, &self.hgnc);
        resolve_table(
            &mut self.cache.reduced_genes,
            &mut self.attempted.reduced_genes,
            ids,
            &ReducedGeneScope { organism, mode },
            ignore_missing,
            |id| (id.to_string(), organism, mode),
            |missing| resolver.resolve(missing, organism, mode),
        )
    }
}

fn resolve_table<R, S, K>(
    table: &mut CacheTable<R>,
    attempted: &mut HashSet<K>,
    ids: &[S],
    scope: &R::Scope,
    ignore_missing: bool,
    attempt_key: impl Fn(&str) -> K,
    fetch: impl FnOnce(&[String]) -> Result<Vec<R>, IdMapError>,
) -> Result<Vec<R>, IdMapError>
where
    R: MappingRecord,
    S: AsRef<str>,
    K: Eq + Hash,
{
    let lookup = table.lookup(ids, scope);
    debug!(
        kind = %R::KIND,
        requested = ids.len(),
        found = lookup.found.len(),
        missing = lookup.missing.len(),
        "cache lookup"
    );
    if ignore_missing || lookup.missing.is_empty() {
        return Ok(lookup.found);
    }

    let to_fetch: Vec<String> = lookup
        .missing
        .into_iter()
        .filter(|id| !attempted.contains(&attempt_key(id.as_str())))
        .collect();
    if to_fetch.is_empty() {
        return Ok(lookup.found);
    }

    let fetched = fetch(&to_fetch)?;
    let fetched_rows = fetched.len();
    attempted.extend(to_fetch.iter().map(|id| attempt_key(id.as_str())));
    table.merge(fetched);

    let found = table.lookup(ids, scope).found;
    info!(
        kind = %R::KIND,
        requested = ids.len(),
        fetched_ids = to_fetch.len(),
        fetched_rows,
        found = found.len(),
        "resolved identifiers"
    );
    Ok(found)
}
