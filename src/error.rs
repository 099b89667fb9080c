use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IdMapError {
    #[error("unknown mapping kind: {0}")]
    UnknownMappingKind(String),

    #[error("unknown organism: {0}")]
    UnknownOrganism(String),

    #[error("unknown reduction mode: {0}")]
    UnknownReductionMode(String),

    #[error("reduction mode {mode} is only available for human genes, got {organism}")]
    #[diagnostic(help("use --organism human or pick another reduction mode"))]
    HumanOnlyReduction { mode: String, organism: String },

    #[error("reduction mode {mode} requires an organism")]
    #[diagnostic(help("pass --organism"))]
    OrganismRequired { mode: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read mapping cache {path}: {message}")]
    CacheRead { path: String, message: String },

    #[error("mapping cache {path} has columns [{found}], expected [{expected}]")]
    #[diagnostic(help("the cache file was written by another tool or version; move it away to rebuild it"))]
    CacheSchema {
        path: String,
        expected: String,
        found: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("column not found in input table: {0}")]
    MissingColumn(String),

    #[error("input row {line} has {found} cells but the header has {expected}")]
    #[diagnostic(help("check the delimiter, or quote cells that contain it"))]
    RowTooLong { line: u64, found: usize, expected: usize },

    #[error("uniprot request failed: {0}")]
    UniprotHttp(String),

    #[error("uniprot returned status {status}: {message}")]
    UniprotStatus { status: u16, message: String },

    #[error("g:Profiler request failed: {0}")]
    GprofilerHttp(String),

    #[error("g:Profiler returned status {status}: {message}")]
    GprofilerStatus { status: u16, message: String },

    #[error("MyGene.info request failed: {0}")]
    MyGeneHttp(String),

    #[error("MyGene.info returned status {status}: {message}")]
    MyGeneStatus { status: u16, message: String },

    #[error("HGNC request failed: {0}")]
    HgncHttp(String),

    #[error("HGNC returned status {status}: {message}")]
    HgncStatus { status: u16, message: String },

    #[error("malformed {service} response: {message}")]
    MalformedResponse { service: &'static str, message: String },
}

impl IdMapError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            IdMapError::UnknownMappingKind(_)
                | IdMapError::UnknownOrganism(_)
                | IdMapError::UnknownReductionMode(_)
                | IdMapError::HumanOnlyReduction { .. }
                | IdMapError::OrganismRequired { .. }
                | IdMapError::InvalidConfig(_)
                | IdMapError::ConfigRead(_)
                | IdMapError::ConfigParse(_)
                | IdMapError::MissingColumn(_)
                | IdMapError::RowTooLong { .. }
        )
    }

    pub fn is_service(&self) -> bool {
        matches!(
            self,
            IdMapError::UniprotHttp(_)
                | IdMapError::UniprotStatus { .. }
                | IdMapError::GprofilerHttp(_)
                | IdMapError::GprofilerStatus { .. }
                | IdMapError::MyGeneHttp(_)
                | IdMapError::MyGeneStatus { .. }
                | IdMapError::HgncHttp(_)
                | IdMapError::HgncStatus { .. }
                | IdMapError::MalformedResponse { .. }
        )
    }

    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            IdMapError::CacheRead { .. } | IdMapError::CacheSchema { .. } | IdMapError::Filesystem(_)
        )
    }
}
