use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::error::IdMapError;

/// HGNC fields a gene name is searched under, in order of preference.
pub const SEARCH_FIELDS: [&str; 3] = ["symbol", "prev_symbol", "alias_symbol"];

pub trait HgncClient: Send + Sync {
    /// Approved symbols of every HGNC entry whose `field` equals `value`.
    fn fetch_symbols(&self, field: &str, value: &str) -> Result<Vec<String>, IdMapError>;
}

#[derive(Clone)]
pub struct HgncHttpClient {
    client: Client,
    base_url: String,
}

impl HgncHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdMapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-idmap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| IdMapError::HgncHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| IdMapError::HgncHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn fetch_url(&self, field: &str, value: &str) -> Result<Url, IdMapError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|err| IdMapError::HgncHttp(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| IdMapError::HgncHttp(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(["fetch", field, value]);
        Ok(url)
    }
}

impl HgncClient for HgncHttpClient {
    fn fetch_symbols(&self, field: &str, value: &str) -> Result<Vec<String>, IdMapError> {
        let url = self.fetch_url(field, value)?;
        debug!(url = %url, "hgnc.request");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| IdMapError::HgncHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "HGNC request failed".to_string());
            return Err(IdMapError::HgncStatus { status, message });
        }
        let raw: Value = response
            .json()
            .map_err(|err| IdMapError::HgncHttp(err.to_string()))?;
        parse_fetch_response(&raw)
    }
}

pub fn parse_fetch_response(raw: &Value) -> Result<Vec<String>, IdMapError> {
    let docs = raw
        .get("response")
        .and_then(|v| v.get("docs"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| IdMapError::MalformedResponse {
            service: "HGNC",
            message: "missing response.docs".to_string(),
        })?;
    Ok(docs
        .iter()
        .filter_map(|doc| doc.get("symbol").and_then(|v| v.as_str()))
        .map(|symbol| symbol.trim().to_string())
        .filter(|symbol| !symbol.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_docs() {
        let raw = json!({"response": {"numFound": 1, "docs": [
            {"hgnc_id": "HGNC:1513", "symbol": "CASQ2", "alias_symbol": ["PDIB2"]}
        ]}});
        assert_eq!(parse_fetch_response(&raw).unwrap(), vec!["CASQ2"]);
    }

    #[test]
    fn fetch_url_escapes_value() {
        let client = HgncHttpClient::new("https://rest.genenames.org", Duration::from_secs(1)).unwrap();
        let url = client.fetch_url("prev_symbol", "A/B").unwrap();
        assert_eq!(url.as_str(), "https://rest.genenames.org/fetch/prev_symbol/A%2FB");
    }
}
