use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::error::IdMapError;

const FIELDS: &str = "gene_names,gene_primary,reviewed,organism_name,accession";

/// One row of the UniProt accession TSV, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UniprotRow {
    #[serde(rename = "Gene Names", default)]
    pub gene_names: Option<String>,
    #[serde(rename = "Gene Names (primary)", default)]
    pub primary_gene_name: Option<String>,
    #[serde(rename = "Reviewed")]
    pub reviewed: String,
    #[serde(rename = "Organism", default)]
    pub organism: Option<String>,
    #[serde(rename = "Entry")]
    pub entry: String,
}

/// Outcome of one accession batch. `Rejected` means the service refused the whole
/// batch because at least one accession in it is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessionLookup {
    Rows(Vec<UniprotRow>),
    Rejected(String),
}

pub trait UniprotClient: Send + Sync {
    fn lookup_accessions(&self, accessions: &[String]) -> Result<AccessionLookup, IdMapError>;
}

#[derive(Clone)]
pub struct UniprotHttpClient {
    client: Client,
    base_url: String,
}

impl UniprotHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdMapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-idmap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| IdMapError::UniprotHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| IdMapError::UniprotHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl UniprotClient for UniprotHttpClient {
    fn lookup_accessions(&self, accessions: &[String]) -> Result<AccessionLookup, IdMapError> {
        debug!(accessions = accessions.len(), "uniprot.request");
        let joined = accessions.join(",");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("format", "tsv"), ("accessions", joined.as_str()), ("fields", FIELDS)])
            .send()
            .map_err(|err| IdMapError::UniprotHttp(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let message = response
                .text()
                .unwrap_or_else(|_| "invalid accession in request".to_string());
            return Ok(AccessionLookup::Rejected(message));
        }
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "UniProt request failed".to_string());
            return Err(IdMapError::UniprotStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .map_err(|err| IdMapError::UniprotHttp(err.to_string()))?;
        Ok(AccessionLookup::Rows(parse_accession_tsv(&body)?))
    }
}

pub fn parse_accession_tsv(body: &str) -> Result<Vec<UniprotRow>, IdMapError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(false)
        .quoting(false)
        .from_reader(body.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: UniprotRow = row.map_err(|err| IdMapError::MalformedResponse {
            service: "UniProt",
            message: err.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}
