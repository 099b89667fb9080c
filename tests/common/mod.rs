#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use camino::Utf8PathBuf;

use kira_idmap::app::App;
use kira_idmap::domain::Organism;
use kira_idmap::engine::{MappingCache, MappingEngine};
use kira_idmap::error::IdMapError;
use kira_idmap::gprofiler::{ConvertHit, GprofilerClient, OrthologHit};
use kira_idmap::hgnc::HgncClient;
use kira_idmap::mygene::{MyGeneClient, MyGeneHit};
use kira_idmap::store::Store;
use kira_idmap::uniprot::{AccessionLookup, UniprotClient, UniprotRow};

/// Answers accessions from a fixed table; any batch holding an `invalid`
/// accession is rejected as a whole.
#[derive(Default)]
pub struct MockUniprot {
    pub rows: HashMap<String, UniprotRow>,
    pub invalid: HashSet<String>,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl MockUniprot {
    pub fn with_protein(mut self, id: &str, genes: &str, primary: &str, organism: Organism) -> Self {
        self.rows.insert(
            id.to_string(),
            UniprotRow {
                gene_names: Some(genes.to_string()),
                primary_gene_name: Some(primary.to_string()),
                reviewed: "reviewed".to_string(),
                organism: Some(organism.uniprot_name().to_string()),
                entry: id.to_string(),
            },
        );
        self
    }

    pub fn with_invalid(mut self, id: &str) -> Self {
        self.invalid.insert(id.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn sent(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().flatten().cloned().collect()
    }
}

impl UniprotClient for MockUniprot {
    fn lookup_accessions(&self, accessions: &[String]) -> Result<AccessionLookup, IdMapError> {
        self.calls.lock().unwrap().push(accessions.to_vec());
        if accessions.iter().any(|id| self.invalid.contains(id)) {
            return Ok(AccessionLookup::Rejected("invalid accession".to_string()));
        }
        Ok(AccessionLookup::Rows(
            accessions
                .iter()
                .filter_map(|id| self.rows.get(id).cloned())
                .collect(),
        ))
    }
}

#[derive(Default)]
pub struct MockGprofiler {
    /// source symbol -> target symbols
    pub orthologs: HashMap<String, Vec<String>>,
    /// input symbol -> converted gene name
    pub converted: HashMap<String, String>,
    pub annotated: HashSet<String>,
    pub calls: Mutex<usize>,
}

impl MockGprofiler {
    pub fn with_ortholog(mut self, source: &str, target: &str) -> Self {
        self.orthologs
            .entry(source.to_string())
            .or_default()
            .push(target.to_string());
        self
    }

    pub fn with_conversion(mut self, input: &str, name: &str) -> Self {
        self.converted.insert(input.to_string(), name.to_string());
        self
    }

    pub fn with_annotation(mut self, symbol: &str) -> Self {
        self.annotated.insert(symbol.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl GprofilerClient for MockGprofiler {
    fn orthologs(
        &self,
        _source: Organism,
        _target: Organism,
        symbols: &[String],
    ) -> Result<Vec<OrthologHit>, IdMapError> {
        *self.calls.lock().unwrap() += 1;
        let mut hits = Vec::new();
        for symbol in symbols {
            match self.orthologs.get(symbol) {
                Some(targets) => hits.extend(targets.iter().map(|target| OrthologHit {
                    incoming: symbol.clone(),
                    converted: Some(format!("ENSG_{symbol}")),
                    ortholog_ensg: Some(format!("ENSORTH_{target}")),
                    name: Some(target.clone()),
                    description: None,
                })),
                None => hits.push(OrthologHit {
                    incoming: symbol.clone(),
                    converted: None,
                    ortholog_ensg: None,
                    name: None,
                    description: None,
                }),
            }
        }
        Ok(hits)
    }

    fn convert(
        &self,
        _organism: Organism,
        symbols: &[String],
        _namespace: &str,
    ) -> Result<Vec<ConvertHit>, IdMapError> {
        *self.calls.lock().unwrap() += 1;
        Ok(symbols
            .iter()
            .map(|symbol| ConvertHit {
                incoming: symbol.clone(),
                converted: self.converted.get(symbol).map(|_| format!("ENSG_{symbol}")),
                name: self.converted.get(symbol).cloned(),
            })
            .collect())
    }

    fn annotated_genes(
        &self,
        _organism: Organism,
        symbols: &[String],
    ) -> Result<HashSet<String>, IdMapError> {
        *self.calls.lock().unwrap() += 1;
        Ok(symbols
            .iter()
            .filter(|symbol| self.annotated.contains(*symbol))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockMyGene {
    pub symbols: HashMap<String, String>,
    /// terms per call
    pub calls: Mutex<Vec<usize>>,
}

impl MockMyGene {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

impl MyGeneClient for MockMyGene {
    fn query_symbols(
        &self,
        _taxonomy_id: u32,
        symbols: &[String],
    ) -> Result<Vec<MyGeneHit>, IdMapError> {
        self.calls.lock().unwrap().push(symbols.len());
        Ok(symbols
            .iter()
            .map(|symbol| MyGeneHit {
                query: symbol.clone(),
                symbol: self.symbols.get(symbol).cloned(),
            })
            .collect())
    }
}

/// `(field, value) -> approved symbols`
#[derive(Default)]
pub struct MockHgnc {
    pub entries: HashMap<(String, String), Vec<String>>,
    pub calls: Mutex<usize>,
}

impl MockHgnc {
    pub fn with_entry(mut self, field: &str, value: &str, symbols: &[&str]) -> Self {
        self.entries.insert(
            (field.to_string(), value.to_string()),
            symbols.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl HgncClient for MockHgnc {
    fn fetch_symbols(&self, field: &str, value: &str) -> Result<Vec<String>, IdMapError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self
            .entries
            .get(&(field.to_string(), value.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

pub type MockEngine = MappingEngine<MockUniprot, MockGprofiler, MockMyGene, MockHgnc>;
pub type MockApp = App<MockUniprot, MockGprofiler, MockMyGene, MockHgnc>;

pub fn engine(uniprot: MockUniprot) -> MockEngine {
    MappingEngine::new(
        MappingCache::empty(),
        uniprot,
        MockGprofiler::default(),
        MockMyGene::default(),
        MockHgnc::default(),
    )
}

pub fn temp_store(temp: &tempfile::TempDir) -> Store {
    let root = Utf8PathBuf::from_path_buf(temp.path().join("mappings")).unwrap();
    Store::new_with_root(root)
}
