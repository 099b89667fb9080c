use std::fs;

use kira_idmap::gprofiler::parse_orth_response;
use kira_idmap::resolver::explode_row;
use kira_idmap::table::ReviewStatus;
use kira_idmap::uniprot::parse_accession_tsv;

#[test]
fn accession_tsv_to_records() {
    let raw = fs::read_to_string("tests/fixtures/uniprot_accessions.tsv").unwrap();
    let rows = parse_accession_tsv(&raw).unwrap();
    assert_eq!(rows.len(), 3);

    let records: Vec<_> = rows.into_iter().flat_map(explode_row).collect();
    let ids: Vec<&str> = records.iter().map(|r| r.protein_id.as_str()).collect();
    assert_eq!(ids, vec!["P69905", "P01942", "Q91VB8", "A0A0G2JSH5"]);

    assert_eq!(records[0].gene_names.as_deref(), Some("HBA1;HBA2"));
    assert_eq!(records[0].primary_gene_name.as_deref(), Some("HBA1;HBA2"));
    assert_eq!(records[2].organism, "Mus musculus (Mouse)");
    assert_eq!(records[3].gene_names, None);
    assert_eq!(records[3].reviewed, ReviewStatus::Unreviewed);
}

#[test]
fn orth_fixture() {
    let raw = fs::read_to_string("tests/fixtures/gprofiler_orth.json").unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let hits = parse_orth_response(&value).unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].name.as_deref(), Some("Casq2"));
    assert_eq!(hits[0].ortholog_ensg.as_deref(), Some("ENSMUSG00000027861"));
    assert!(hits[1].name.is_none() && hits[1].ortholog_ensg.is_none());
}
