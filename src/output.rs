use std::io::{self, Write};

use serde::Serialize;

use crate::difflog::DiffSummary;
use crate::domain::MappingKind;
use crate::engine::MappingCache;

/// Row counts of every cache table after a run.
#[derive(Debug, Clone, Serialize)]
pub struct CacheCounts {
    pub protein: usize,
    pub orthologs: usize,
    pub reduced_genes: usize,
}

impl CacheCounts {
    pub fn of(cache: &MappingCache) -> Self {
        Self {
            protein: cache.len(MappingKind::Protein),
            orthologs: cache.len(MappingKind::Ortholog),
            reduced_genes: cache.len(MappingKind::ReducedGene),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub command: String,
    pub generated_at: String,
    pub input: String,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    pub rows_in: usize,
    pub rows_out: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<DiffSummary>,
    pub cache: CacheCounts,
}

impl RunReport {
    pub fn new(command: &str, input: String, output: String, cache: &MappingCache) -> Self {
        Self {
            command: command.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            input,
            output,
            log: None,
            rows_in: 0,
            rows_out: 0,
            changes: None,
            cache: CacheCounts::of(cache),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
