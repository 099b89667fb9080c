use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::IdMapError;

pub const DEFAULT_CONFIG_FILE: &str = "kira-idmap.json";
pub const DEFAULT_UNIPROT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub mapping_dir: Option<String>,
    #[serde(default)]
    pub uniprot_chunk_size: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub endpoints: EndpointOverrides,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EndpointOverrides {
    #[serde(default)]
    pub uniprot: Option<String>,
    #[serde(default)]
    pub gprofiler: Option<String>,
    #[serde(default)]
    pub mygene: Option<String>,
    #[serde(default)]
    pub hgnc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub uniprot: String,
    pub gprofiler: String,
    pub mygene: String,
    pub hgnc: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            uniprot: "https://rest.uniprot.org/uniprotkb/accessions".to_string(),
            gprofiler: "https://biit.cs.ut.ee/gprofiler/api".to_string(),
            mygene: "https://mygene.info/v3".to_string(),
            hgnc: "https://rest.genenames.org".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    /// `None` means the store's default location.
    pub mapping_dir: Option<Utf8PathBuf>,
    pub uniprot_chunk_size: usize,
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            mapping_dir: None,
            uniprot_chunk_size: DEFAULT_UNIPROT_CHUNK_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            endpoints: Endpoints::default(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `kira-idmap.json` from the working directory when present.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, IdMapError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| IdMapError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| IdMapError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, IdMapError> {
        let defaults = Endpoints::default();
        let uniprot_chunk_size = config
            .uniprot_chunk_size
            .unwrap_or(DEFAULT_UNIPROT_CHUNK_SIZE);
        if uniprot_chunk_size == 0 {
            return Err(IdMapError::InvalidConfig(
                "uniprot_chunk_size must be at least 1".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            mapping_dir: config.mapping_dir.map(Utf8PathBuf::from),
            uniprot_chunk_size,
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            endpoints: Endpoints {
                uniprot: trim_base(config.endpoints.uniprot.unwrap_or(defaults.uniprot)),
                gprofiler: trim_base(config.endpoints.gprofiler.unwrap_or(defaults.gprofiler)),
                mygene: trim_base(config.endpoints.mygene.unwrap_or(defaults.mygene)),
                hgnc: trim_base(config.endpoints.hgnc.unwrap_or(defaults.hgnc)),
            },
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_when_empty() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.uniprot_chunk_size, 500);
        assert!(resolved.mapping_dir.is_none());
        assert_eq!(resolved.endpoints, Endpoints::default());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = Config {
            uniprot_chunk_size: Some(0),
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, IdMapError::InvalidConfig(_));
    }
}
