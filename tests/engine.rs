mod common;

use std::collections::HashSet;

use assert_matches::assert_matches;

use kira_idmap::derive::reduced_gene_names;
use kira_idmap::domain::{HgncSelection, MappingKind, Organism, ReductionMode};
use kira_idmap::engine::{MappingCache, MappingEngine, MappingRequest, Resolved};
use kira_idmap::error::IdMapError;

use common::{MockGprofiler, MockHgnc, MockMyGene, MockUniprot, engine};

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn second_resolve_makes_no_calls() {
    let uniprot = MockUniprot::default()
        .with_protein("P69905", "HBA1 HBA2", "HBA1", Organism::Human)
        .with_protein("Q9WTR5", "Cdh13", "Cdh13", Organism::Rat);
    let mut engine = engine(uniprot);
    let request = ids(&["P69905", "Q9WTR5", "P00000"]);

    let first = engine
        .resolve_proteins(&request, Some(Organism::Human), false)
        .unwrap();
    let calls = engine.uniprot().call_count();
    let second = engine
        .resolve_proteins(&request, Some(Organism::Human), false)
        .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(engine.uniprot().call_count(), calls);
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].protein_id, "P69905");
}

#[test]
fn resolved_rows_belong_to_request() {
    let uniprot = MockUniprot::default()
        .with_protein("P1", "A", "A", Organism::Mouse)
        .with_protein("P2", "B", "B", Organism::Mouse)
        .with_protein("P3", "C", "C", Organism::Mouse);
    let mut engine = engine(uniprot);
    engine.resolve_proteins(&ids(&["P3"]), None, false).unwrap();

    let found = engine
        .resolve_proteins(&ids(&["P1", "P2"]), Some(Organism::Mouse), false)
        .unwrap();
    let keys: HashSet<&str> = found.iter().map(|r| r.protein_id.as_str()).collect();
    assert_eq!(keys, HashSet::from(["P1", "P2"]));
}

#[test]
fn ignore_missing_never_fetches() {
    let uniprot = MockUniprot::default().with_protein("P1", "A", "A", Organism::Human);
    let mut engine = engine(uniprot);
    let found = engine.resolve_proteins(&ids(&["P1"]), None, true).unwrap();
    assert!(found.is_empty());
    assert_eq!(engine.uniprot().call_count(), 0);
}

#[test]
fn large_batches_are_chunked() {
    let mut uniprot = MockUniprot::default();
    let request: Vec<String> = (0..1200).map(|i| format!("P{i:05}")).collect();
    for id in &request {
        uniprot = uniprot.with_protein(id, "G", "G", Organism::Human);
    }
    let mut engine = engine(uniprot);

    let found = engine.resolve_proteins(&request, None, false).unwrap();

    assert_eq!(engine.uniprot().batch_sizes(), vec![500, 500, 200]);
    assert_eq!(found.len(), 1200);
}

#[test]
fn configured_chunk_size_is_used() {
    let mut engine = engine(MockUniprot::default()).with_chunk_size(2);
    engine
        .resolve_proteins(&ids(&["P1", "P2", "P3"]), None, false)
        .unwrap();
    assert_eq!(engine.uniprot().batch_sizes(), vec![2, 1]);
}

#[test]
fn rejected_chunk_falls_back_to_singletons() {
    let mut uniprot = MockUniprot::default().with_invalid("BAD1");
    let mut request = Vec::new();
    for i in 0..10 {
        let id = format!("P{i:05}");
        uniprot = uniprot.with_protein(&id, "G", "G", Organism::Human);
        request.push(id);
    }
    request.insert(4, "BAD1".to_string());
    let mut engine = engine(uniprot);

    let found = engine.resolve_proteins(&request, None, false).unwrap();

    assert_eq!(engine.uniprot().call_count(), 1 + 11);
    assert_eq!(found.len(), 10);
    assert!(found.iter().all(|record| record.protein_id != "BAD1"));
}

#[test]
fn decoys_are_never_sent() {
    let uniprot = MockUniprot::default().with_protein("P67890", "ALB", "ALB", Organism::Human);
    let mut engine = engine(uniprot);

    engine
        .resolve_proteins(&ids(&["REV__P12345", "CON__P02768", "P67890"]), None, false)
        .unwrap();
    assert_eq!(engine.uniprot().sent(), vec!["P67890".to_string()]);

    engine
        .resolve_proteins(&ids(&["REV__P99999"]), None, false)
        .unwrap();
    assert_eq!(engine.uniprot().call_count(), 1);
}

#[test]
fn explode_alternate_accessions_into_cache() {
    let mut uniprot = MockUniprot::default().with_protein("P01942", "Hba Hba-a1", "Hba", Organism::Mouse);
    if let Some(row) = uniprot.rows.get_mut("P01942") {
        row.entry = "P01942,Q91VB8".to_string();
    }
    let mut engine = engine(uniprot);
    engine.resolve_proteins(&ids(&["P01942"]), None, false).unwrap();

    let alternate = engine.resolve_proteins(&ids(&["Q91VB8"]), None, false).unwrap();
    assert_eq!(engine.uniprot().call_count(), 1);
    assert_eq!(alternate.len(), 1);
    assert_eq!(alternate[0].gene_names.as_deref(), Some("Hba;Hba-a1"));
}

#[test]
fn orthologs_are_keyed_by_organism_pair() {
    let gprofiler = MockGprofiler::default()
        .with_ortholog("CASQ2", "Casq2")
        .with_ortholog("TTN", "Ttn");
    let mut engine = MappingEngine::new(
        MappingCache::empty(),
        MockUniprot::default(),
        gprofiler,
        MockMyGene::default(),
        MockHgnc::default(),
    );
    let symbols = ids(&["CASQ2", "TTN", "NOPE1"]);

    let to_mouse = engine
        .resolve_orthologs(&symbols, Organism::Human, Organism::Mouse, false)
        .unwrap();
    engine
        .resolve_orthologs(&symbols, Organism::Human, Organism::Mouse, false)
        .unwrap();
    assert_eq!(engine.gprofiler().call_count(), 1);
    assert_eq!(to_mouse.len(), 2);

    engine
        .resolve_orthologs(&symbols, Organism::Human, Organism::Rat, false)
        .unwrap();
    assert_eq!(engine.gprofiler().call_count(), 2);
}

#[test]
fn unresolved_genes_are_cached_as_not_found() {
    let gprofiler = MockGprofiler::default().with_conversion("Cox2", "mt-Co2");
    let mut engine = MappingEngine::new(
        MappingCache::empty(),
        MockUniprot::default(),
        gprofiler,
        MockMyGene::default(),
        MockHgnc::default(),
    );
    let genes = ids(&["Cox2", "Fake9"]);

    let records = engine
        .resolve_reduced_genes(&genes, Organism::Rat, ReductionMode::Ensembl, false)
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|r| r.gene_name == "Fake9" && !r.is_found()));
    assert_eq!(engine.cache().len(MappingKind::ReducedGene), 2);

    engine
        .resolve_reduced_genes(&genes, Organism::Rat, ReductionMode::Ensembl, false)
        .unwrap();
    assert_eq!(engine.gprofiler().call_count(), 1);
}

#[test]
fn hgnc_for_rat_is_rejected_without_calls() {
    let mut engine = engine(MockUniprot::default());
    let err = engine
        .resolve(
            &ids(&["CASQ2"]),
            &MappingRequest::ReducedGene {
                organism: Some(Organism::Rat),
                mode: ReductionMode::Hgnc,
            },
            false,
        )
        .unwrap_err();
    assert_matches!(err, IdMapError::HumanOnlyReduction { .. });
    assert!(err.is_configuration());
    assert_eq!(engine.hgnc().call_count(), 0);
}

#[test]
fn hgnc_searches_previous_and_alias_symbols() {
    let hgnc = MockHgnc::default()
        .with_entry("prev_symbol", "COX2", &["MT-CO2"])
        .with_entry("alias_symbol", "COX2", &["PTGS2"]);
    let mut engine = MappingEngine::new(
        MappingCache::empty(),
        MockUniprot::default(),
        MockGprofiler::default(),
        MockMyGene::default(),
        hgnc,
    );
    let resolved = engine
        .resolve(
            &ids(&["COX2"]),
            &MappingRequest::ReducedGene {
                organism: Some(Organism::Human),
                mode: ReductionMode::Hgnc,
            },
            false,
        )
        .unwrap();
    assert_matches!(resolved, Resolved::ReducedGene(ref rows) if rows.len() == 2);
    assert_eq!(engine.hgnc().call_count(), 3);
}

#[test]
fn request_from_parts_validates_kind() {
    let err = MappingRequest::from_parts(MappingKind::Ortholog, Some(Organism::Human), None, None)
        .unwrap_err();
    assert_matches!(err, IdMapError::InvalidConfig(_));

    let err = MappingRequest::from_parts(
        MappingKind::ReducedGene,
        None,
        None,
        Some(ReductionMode::MyGeneInfo),
    )
    .unwrap_err();
    assert_matches!(err, IdMapError::OrganismRequired { .. });
}

#[test]
fn enrichment_keeps_annotated_genes() {
    let gprofiler = MockGprofiler::default().with_annotation("CASQ2");
    let mut engine = MappingEngine::new(
        MappingCache::empty(),
        MockUniprot::default(),
        gprofiler,
        MockMyGene::default(),
        MockHgnc::default(),
    );
    let genes = ids(&["CASQ2", "ORPH1"]);

    let records = engine
        .resolve_reduced_genes(&genes, Organism::Mouse, ReductionMode::Enrichment, false)
        .unwrap();
    let casq2: Vec<_> = records.iter().filter(|r| r.gene_name == "CASQ2").cloned().collect();
    assert_eq!(
        reduced_gene_names(&casq2, ReductionMode::Enrichment, HgncSelection::All),
        "CASQ2"
    );
    assert!(records.iter().any(|r| r.gene_name == "ORPH1" && !r.is_found()));
    assert_eq!(engine.cache().len(MappingKind::ReducedGene), 2);

    engine
        .resolve_reduced_genes(&genes, Organism::Mouse, ReductionMode::Enrichment, false)
        .unwrap();
    assert_eq!(engine.gprofiler().call_count(), 1);
}

#[test]
fn mygene_queries_are_batched() {
    let mut engine = MappingEngine::new(
        MappingCache::empty(),
        MockUniprot::default(),
        MockGprofiler::default(),
        MockMyGene::default(),
        MockHgnc::default(),
    );
    let genes: Vec<String> = (0..2500).map(|i| format!("GENE{i}")).collect();

    engine
        .resolve_reduced_genes(&genes, Organism::Human, ReductionMode::MyGeneInfo, false)
        .unwrap();
    assert_eq!(engine.mygene().batch_sizes(), vec![1000, 1000, 500]);
    assert_eq!(engine.cache().len(MappingKind::ReducedGene), 2500);
}
