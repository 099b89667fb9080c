use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;

use kira_idmap::config::{Config, ConfigLoader, EndpointOverrides};
use kira_idmap::error::IdMapError;

#[test]
fn resolve_overrides() {
    let config = Config {
        schema_version: None,
        mapping_dir: Some("/data/mappings".to_string()),
        uniprot_chunk_size: Some(100),
        timeout_secs: Some(5),
        endpoints: EndpointOverrides {
            gprofiler: Some("http://localhost:8080/api/".to_string()),
            ..EndpointOverrides::default()
        },
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.schema_version, 1);
    assert_eq!(resolved.mapping_dir.as_deref().map(|p| p.as_str()), Some("/data/mappings"));
    assert_eq!(resolved.uniprot_chunk_size, 100);
    assert_eq!(resolved.timeout, Duration::from_secs(5));
    assert_eq!(resolved.endpoints.gprofiler, "http://localhost:8080/api");
    assert_eq!(resolved.endpoints.hgnc, "https://rest.genenames.org");
}

#[test]
fn read_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-idmap.json");
    fs::write(&path, r#"{"schema_version": 1, "uniprot_chunk_size": 250}"#).unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.uniprot_chunk_size, 250);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IdMapError::ConfigRead(_));
    assert!(err.is_configuration());
}

#[test]
fn invalid_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-idmap.json");
    fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IdMapError::ConfigParse(_));
}
