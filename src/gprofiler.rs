use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::Organism;
use crate::error::IdMapError;

/// A single g:Orth result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrthologHit {
    pub incoming: String,
    pub converted: Option<String>,
    pub ortholog_ensg: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A single g:Convert result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertHit {
    pub incoming: String,
    pub converted: Option<String>,
    pub name: Option<String>,
}

pub trait GprofilerClient: Send + Sync {
    fn orthologs(
        &self,
        source: Organism,
        target: Organism,
        symbols: &[String],
    ) -> Result<Vec<OrthologHit>, IdMapError>;

    fn convert(
        &self,
        organism: Organism,
        symbols: &[String],
        namespace: &str,
    ) -> Result<Vec<ConvertHit>, IdMapError>;

    /// Subset of `symbols` with at least one GO annotation.
    fn annotated_genes(
        &self,
        organism: Organism,
        symbols: &[String],
    ) -> Result<HashSet<String>, IdMapError>;
}

#[derive(Clone)]
pub struct GprofilerHttpClient {
    client: Client,
    base_url: String,
}

impl GprofilerHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdMapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-idmap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| IdMapError::GprofilerHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| IdMapError::GprofilerHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value, IdMapError> {
        let url = format!("{}/{path}", self.base_url);
        debug!(url = %url, "gprofiler.request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|err| IdMapError::GprofilerHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "g:Profiler request failed".to_string());
            return Err(IdMapError::GprofilerStatus { status, message });
        }
        response
            .json()
            .map_err(|err| IdMapError::GprofilerHttp(err.to_string()))
    }
}

impl GprofilerClient for GprofilerHttpClient {
    fn orthologs(
        &self,
        source: Organism,
        target: Organism,
        symbols: &[String],
    ) -> Result<Vec<OrthologHit>, IdMapError> {
        let body = json!({
            "organism": source.gprofiler_code(),
            "target": target.gprofiler_code(),
            "query": symbols,
        });
        let raw = self.post("orth/orth/", &body)?;
        parse_orth_response(&raw)
    }

    fn convert(
        &self,
        organism: Organism,
        symbols: &[String],
        namespace: &str,
    ) -> Result<Vec<ConvertHit>, IdMapError> {
        let body = json!({
            "organism": organism.gprofiler_code(),
            "target": namespace,
            "query": symbols,
        });
        let raw = self.post("convert/convert/", &body)?;
        parse_convert_response(&raw)
    }

    fn annotated_genes(
        &self,
        organism: Organism,
        symbols: &[String],
    ) -> Result<HashSet<String>, IdMapError> {
        let body = json!({
            "organism": organism.gprofiler_code(),
            "query": symbols,
            "sources": ["GO:MF", "GO:BP", "GO:CC"],
            "all_results": true,
            "no_evidences": false,
        });
        let raw = self.post("gost/profile/", &body)?;
        Ok(parse_gost_annotated(&raw))
    }
}

fn result_rows(raw: &Value) -> Result<&Vec<Value>, IdMapError> {
    raw.get("result")
        .and_then(|v| v.as_array())
        .ok_or_else(|| IdMapError::MalformedResponse {
            service: "g:Profiler",
            message: "missing result array".to_string(),
        })
}

/// g:Profiler fills unresolved fields with `N/A` or `None`.
fn field(row: &Value, name: &str) -> Option<String> {
    row.get(name)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "N/A" && *v != "None")
        .map(str::to_string)
}

pub fn parse_orth_response(raw: &Value) -> Result<Vec<OrthologHit>, IdMapError> {
    let mut hits = Vec::new();
    for row in result_rows(raw)? {
        let Some(incoming) = field(row, "incoming") else {
            continue;
        };
        hits.push(OrthologHit {
            incoming,
            converted: field(row, "converted"),
            ortholog_ensg: field(row, "ortholog_ensg"),
            name: field(row, "name"),
            description: field(row, "description"),
        });
    }
    Ok(hits)
}

pub fn parse_convert_response(raw: &Value) -> Result<Vec<ConvertHit>, IdMapError> {
    let mut hits = Vec::new();
    for row in result_rows(raw)? {
        let Some(incoming) = field(row, "incoming") else {
            continue;
        };
        hits.push(ConvertHit {
            incoming,
            converted: field(row, "converted"),
            name: field(row, "name"),
        });
    }
    Ok(hits)
}

/// Every term's `intersections` runs parallel to the query's `ensgs`; a non-empty
/// evidence list at position i means gene i is annotated with that term.
pub fn parse_gost_annotated(raw: &Value) -> HashSet<String> {
    let mut genes = HashSet::new();
    let Some(query) = raw
        .get("meta")
        .and_then(|v| v.get("genes_metadata"))
        .and_then(|v| v.get("query"))
        .and_then(|v| v.as_object())
        .and_then(|queries| queries.values().next())
    else {
        return genes;
    };

    let ensgs: Vec<&str> = query
        .get("ensgs")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let mut annotated = HashSet::new();
    if let Some(terms) = raw.get("result").and_then(|v| v.as_array()) {
        for term in terms {
            let Some(intersections) = term.get("intersections").and_then(|v| v.as_array()) else {
                continue;
            };
            for (idx, evidence) in intersections.iter().enumerate() {
                let has_evidence = evidence.as_array().is_some_and(|codes| !codes.is_empty());
                if has_evidence {
                    if let Some(ensg) = ensgs.get(idx) {
                        annotated.insert(*ensg);
                    }
                }
            }
        }
    }

    if let Some(mapping) = query.get("mapping").and_then(|v| v.as_object()) {
        for (gene, targets) in mapping {
            let hit = targets
                .as_array()
                .is_some_and(|arr| arr.iter().filter_map(|v| v.as_str()).any(|e| annotated.contains(e)));
            if hit {
                genes.insert(gene.clone());
            }
        }
    }
    genes
}
