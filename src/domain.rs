use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::IdMapError;

/// Separator used inside multi-valued cells.
pub const ID_SEPARATOR: char = ';';

/// Prefixes of reversed-decoy and contaminant entries. They never resolve externally.
pub const DECOY_PREFIXES: [&str; 2] = ["REV", "CON"];

/// Gene-name placeholder for genes that a reduction strategy could not resolve.
pub const NOT_FOUND: &str = "Not Found";

pub fn is_decoy(id: &str) -> bool {
    DECOY_PREFIXES.iter().any(|prefix| id.starts_with(prefix))
}

/// Splits a `;`-joined cell into its non-empty, trimmed parts.
pub fn split_cell(cell: &str) -> Vec<String> {
    cell.split(ID_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Flattens a column of `;`-joined cells into one batch of identifiers.
pub fn split_column<S: AsRef<str>>(cells: &[S]) -> Vec<String> {
    cells
        .iter()
        .flat_map(|cell| split_cell(cell.as_ref()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Organism {
    Human,
    Mouse,
    Rat,
    Rabbit,
}

impl Organism {
    pub fn as_str(&self) -> &'static str {
        match self {
            Organism::Human => "human",
            Organism::Mouse => "mouse",
            Organism::Rat => "rat",
            Organism::Rabbit => "rabbit",
        }
    }

    /// Organism label as reported in the UniProt `Organism` column.
    pub fn uniprot_name(&self) -> &'static str {
        match self {
            Organism::Human => "Homo sapiens (Human)",
            Organism::Mouse => "Mus musculus (Mouse)",
            Organism::Rat => "Rattus norvegicus (Rat)",
            Organism::Rabbit => "Oryctolagus cuniculus (Rabbit)",
        }
    }

    pub fn gprofiler_code(&self) -> &'static str {
        match self {
            Organism::Human => "hsapiens",
            Organism::Mouse => "mmusculus",
            Organism::Rat => "rnorvegicus",
            Organism::Rabbit => "ocuniculus",
        }
    }

    pub fn taxonomy_id(&self) -> u32 {
        match self {
            Organism::Human => 9606,
            Organism::Mouse => 10090,
            Organism::Rat => 10116,
            Organism::Rabbit => 9986,
        }
    }
}

impl fmt::Display for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Organism {
    type Err = IdMapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "human" => Ok(Organism::Human),
            "mouse" => Ok(Organism::Mouse),
            "rat" => Ok(Organism::Rat),
            "rabbit" => Ok(Organism::Rabbit),
            _ => Err(IdMapError::UnknownOrganism(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    Protein,
    Ortholog,
    ReducedGene,
}

impl MappingKind {
    pub const ALL: [MappingKind; 3] = [
        MappingKind::Protein,
        MappingKind::Ortholog,
        MappingKind::ReducedGene,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MappingKind::Protein => "protein",
            MappingKind::Ortholog => "orthologs",
            MappingKind::ReducedGene => "reduced_genes",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            MappingKind::Protein => "protein_to_genenames.csv",
            MappingKind::Ortholog => "genenames_to_orthologs.csv",
            MappingKind::ReducedGene => "genenames_reduced.csv",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingKind {
    type Err = IdMapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "protein" => Ok(MappingKind::Protein),
            "orthologs" | "ortholog" => Ok(MappingKind::Ortholog),
            "reduced_genes" | "reduced_gene" => Ok(MappingKind::ReducedGene),
            _ => Err(IdMapError::UnknownMappingKind(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum ReductionMode {
    #[serde(rename = "ensembl")]
    #[value(name = "ensembl")]
    Ensembl,
    #[serde(rename = "mygeneinfo")]
    #[value(name = "mygeneinfo")]
    MyGeneInfo,
    #[serde(rename = "HGNC")]
    #[value(name = "HGNC", alias = "hgnc")]
    Hgnc,
    #[serde(rename = "enrichment")]
    #[value(name = "enrichment")]
    Enrichment,
}

impl ReductionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionMode::Ensembl => "ensembl",
            ReductionMode::MyGeneInfo => "mygeneinfo",
            ReductionMode::Hgnc => "HGNC",
            ReductionMode::Enrichment => "enrichment",
        }
    }

    /// Rejects organism choices the strategy cannot serve and returns the organism to use.
    pub fn check_organism(&self, organism: Option<Organism>) -> Result<Organism, IdMapError> {
        let organism = organism.ok_or_else(|| IdMapError::OrganismRequired {
            mode: self.to_string(),
        })?;
        if *self == ReductionMode::Hgnc && organism != Organism::Human {
            return Err(IdMapError::HumanOnlyReduction {
                mode: self.to_string(),
                organism: organism.to_string(),
            });
        }
        Ok(organism)
    }
}

impl fmt::Display for ReductionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionMode {
    type Err = IdMapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ensembl" => Ok(ReductionMode::Ensembl),
            "mygeneinfo" => Ok(ReductionMode::MyGeneInfo),
            "hgnc" => Ok(ReductionMode::Hgnc),
            "enrichment" => Ok(ReductionMode::Enrichment),
            _ => Err(IdMapError::UnknownReductionMode(value.to_string())),
        }
    }
}

/// How HGNC candidates are collapsed per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HgncSelection {
    #[default]
    #[value(name = "mostfrequent")]
    MostFrequent,
    All,
}

/// Gene-name source used when remapping from protein IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RemapMode {
    #[value(name = "uniprot")]
    Uniprot,
    #[value(name = "uniprot_primary")]
    UniprotPrimary,
    #[value(name = "uniprot_one")]
    UniprotOne,
}

/// What happens to rows whose cell ends up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmptyAction {
    Keep,
    #[default]
    Delete,
}
