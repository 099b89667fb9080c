use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::error::IdMapError;

/// The service accepts at most this many terms per POST.
pub const MAX_TERMS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyGeneHit {
    pub query: String,
    pub symbol: Option<String>,
}

pub trait MyGeneClient: Send + Sync {
    /// Matches `symbols` against official symbols and aliases of one species.
    /// One call is one POST; callers keep batches within [`MAX_TERMS`].
    fn query_symbols(&self, taxonomy_id: u32, symbols: &[String])
    -> Result<Vec<MyGeneHit>, IdMapError>;
}

#[derive(Clone)]
pub struct MyGeneHttpClient {
    client: Client,
    base_url: String,
}

impl MyGeneHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdMapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-idmap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| IdMapError::MyGeneHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| IdMapError::MyGeneHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl MyGeneClient for MyGeneHttpClient {
    fn query_symbols(
        &self,
        taxonomy_id: u32,
        symbols: &[String],
    ) -> Result<Vec<MyGeneHit>, IdMapError> {
        let url = format!("{}/query", self.base_url);
        let species = taxonomy_id.to_string();
        debug!(terms = symbols.len(), species = %species, "mygene.request");
        let terms = symbols.join(",");
        let response = self
            .client
            .post(&url)
            .form(&[
                ("q", terms.as_str()),
                ("scopes", "symbol,alias"),
                ("fields", "symbol"),
                ("species", species.as_str()),
            ])
            .send()
            .map_err(|err| IdMapError::MyGeneHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "MyGene.info request failed".to_string());
            return Err(IdMapError::MyGeneStatus { status, message });
        }
        let raw: Value = response
            .json()
            .map_err(|err| IdMapError::MyGeneHttp(err.to_string()))?;
        parse_query_response(&raw)
    }
}

/// Parses the batch query answer: one object per matched or unmatched term,
/// unmatched ones carrying `notfound: true`.
pub fn parse_query_response(raw: &Value) -> Result<Vec<MyGeneHit>, IdMapError> {
    let rows = raw.as_array().ok_or_else(|| IdMapError::MalformedResponse {
        service: "MyGene.info",
        message: "expected a JSON array".to_string(),
    })?;
    let mut hits = Vec::new();
    for row in rows {
        let Some(query) = row.get("query").and_then(|v| v.as_str()) else {
            continue;
        };
        let notfound = row.get("notfound").and_then(|v| v.as_bool()).unwrap_or(false);
        let symbol = if notfound {
            None
        } else {
            row.get("symbol")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        hits.push(MyGeneHit {
            query: query.to_string(),
            symbol,
        });
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_found_and_notfound() {
        let raw = json!([
            {"query": "cdk2", "_id": "1017", "symbol": "CDK2"},
            {"query": "NOPE1", "notfound": true}
        ]);
        let hits = parse_query_response(&raw).unwrap();
        assert_eq!(hits[0].symbol.as_deref(), Some("CDK2"));
        assert_eq!(hits[1].symbol, None);
    }
}
