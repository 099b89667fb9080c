use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kira_idmap::app::{App, ColumnResult, FilterOptions, ReduceOptions};
use kira_idmap::config::{ConfigLoader, ResolvedConfig};
use kira_idmap::domain::{EmptyAction, HgncSelection, Organism, ReductionMode, RemapMode};
use kira_idmap::error::IdMapError;
use kira_idmap::gprofiler::GprofilerHttpClient;
use kira_idmap::hgnc::HgncHttpClient;
use kira_idmap::io::{Table, output_path, write_records};
use kira_idmap::mygene::MyGeneHttpClient;
use kira_idmap::output::{JsonOutput, RunReport};
use kira_idmap::store::Store;
use kira_idmap::uniprot::UniprotHttpClient;

type HttpApp = App<UniprotHttpClient, GprofilerHttpClient, MyGeneHttpClient, HgncHttpClient>;

#[derive(Parser)]
#[command(name = "kira-idmap")]
#[command(about = "Map protein IDs, gene names and orthologs through a durable local mapping cache")]
#[command(version, author)]
struct Cli {
    /// JSON config file (default: ./kira-idmap.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Directory holding the mapping cache files
    #[arg(long, global = true)]
    mapping_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Filter protein IDs by organism and decoy/contaminant prefixes")]
    Filter(FilterArgs),
    #[command(about = "Rewrite gene names from the protein IDs of each row")]
    Remap(RemapArgs),
    #[command(about = "Reduce gene names to official symbols")]
    Reduce(ReduceArgs),
    #[command(about = "Replace gene names with their orthologs in another organism")]
    Orthologs(OrthologArgs),
    #[command(about = "Export the raw UniProt mapping of protein IDs")]
    Lookup(LookupArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Tab-delimited input table with a header row
    input: Utf8PathBuf,

    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct FilterArgs {
    #[command(flatten)]
    io: InputArgs,

    #[arg(long, default_value = "Protein IDs")]
    column: String,

    #[arg(long, value_enum)]
    organism: Option<Organism>,

    /// Keep REV/CON entries
    #[arg(long)]
    decoy: bool,

    /// Keep only reviewed (Swiss-Prot) entries
    #[arg(long)]
    reviewed: bool,

    #[arg(long, value_enum, default_value_t = EmptyAction::Delete)]
    action: EmptyAction,
}

#[derive(Args)]
struct RemapArgs {
    #[command(flatten)]
    io: InputArgs,

    #[arg(long, default_value = "Protein IDs")]
    protein_column: String,

    #[arg(long, default_value = "Gene names")]
    gene_column: String,

    #[arg(long, value_enum, default_value_t = RemapMode::Uniprot)]
    mode: RemapMode,

    #[arg(long, value_enum)]
    organism: Option<Organism>,

    /// Leave rows with a non-empty gene cell untouched
    #[arg(long)]
    skip_filled: bool,
}

#[derive(Args)]
struct ReduceArgs {
    #[command(flatten)]
    io: InputArgs,

    #[arg(long, default_value = "Gene names")]
    gene_column: String,

    #[arg(long, value_enum)]
    mode: ReductionMode,

    #[arg(long, value_enum, default_value_t = HgncSelection::MostFrequent)]
    hgnc_mode: HgncSelection,

    #[arg(long, value_enum)]
    organism: Option<Organism>,

    #[arg(long)]
    keep_empty: bool,
}

#[derive(Args)]
struct OrthologArgs {
    #[command(flatten)]
    io: InputArgs,

    #[arg(long, default_value = "Gene names")]
    gene_column: String,

    #[arg(long, value_enum)]
    organism: Organism,

    #[arg(long, value_enum)]
    target: Organism,

    #[arg(long)]
    keep_empty: bool,
}

#[derive(Args)]
struct LookupArgs {
    #[command(flatten)]
    io: InputArgs,

    #[arg(long, default_value = "Protein IDs")]
    column: String,

    #[arg(long, value_enum)]
    organism: Option<Organism>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<IdMapError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IdMapError) -> u8 {
    if error.is_configuration() {
        2
    } else if error.is_service() {
        3
    } else if error.is_persistence() {
        4
    } else {
        1
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = match cli.mapping_dir.clone().or_else(|| config.mapping_dir.clone()) {
        Some(root) => Store::new_with_root(root),
        None => Store::new()?,
    };
    info!(mapping_dir = %store.root(), "using mapping cache");

    let mut app = open_app(store, &config)?;
    let report = match cli.command {
        Commands::Filter(args) => run_filter(&mut app, args)?,
        Commands::Remap(args) => run_remap(&mut app, args)?,
        Commands::Reduce(args) => run_reduce(&mut app, args)?,
        Commands::Orthologs(args) => run_orthologs(&mut app, args)?,
        Commands::Lookup(args) => run_lookup(&mut app, args)?,
    };

    app.save()?;
    JsonOutput::print_report(&report).into_diagnostic()?;
    Ok(())
}

fn open_app(store: Store, config: &ResolvedConfig) -> Result<HttpApp, IdMapError> {
    let endpoints = &config.endpoints;
    App::open(
        store,
        UniprotHttpClient::new(&endpoints.uniprot, config.timeout)?,
        GprofilerHttpClient::new(&endpoints.gprofiler, config.timeout)?,
        MyGeneHttpClient::new(&endpoints.mygene, config.timeout)?,
        HgncHttpClient::new(&endpoints.hgnc, config.timeout)?,
        config.uniprot_chunk_size,
    )
}

fn run_filter(app: &mut HttpApp, args: FilterArgs) -> Result<RunReport, IdMapError> {
    let table = read_input(&args.io.input)?;
    let cells = table.column(&args.column)?;
    let result = app.filter_protein_ids(
        &cells,
        FilterOptions {
            organism: args.organism,
            keep_decoys: args.decoy,
            reviewed_only: args.reviewed,
            empty_action: args.action,
        },
    )?;
    write_column_result(app, "filter", "filtered", &args.io, table, &args.column, result)
}

fn run_remap(app: &mut HttpApp, args: RemapArgs) -> Result<RunReport, IdMapError> {
    let mut table = read_input(&args.io.input)?;
    let proteins = table.column(&args.protein_column)?;
    if table.column_index(&args.gene_column).is_err() {
        table.headers.push(args.gene_column.clone());
        for row in &mut table.rows {
            row.push(String::new());
        }
    }
    let genes = table.column(&args.gene_column)?;
    let result = app.remap_gene_names(
        &proteins,
        &genes,
        args.mode,
        args.organism,
        args.skip_filled,
    )?;
    write_column_result(app, "remap", "remapped", &args.io, table, &args.gene_column, result)
}

fn run_reduce(app: &mut HttpApp, args: ReduceArgs) -> Result<RunReport, IdMapError> {
    args.mode.check_organism(args.organism)?;
    let table = read_input(&args.io.input)?;
    let cells = table.column(&args.gene_column)?;
    let result = app.reduce_gene_names(
        &cells,
        ReduceOptions {
            mode: args.mode,
            selection: args.hgnc_mode,
            organism: args.organism,
            keep_empty: args.keep_empty,
        },
    )?;
    write_column_result(app, "reduce", "reduced", &args.io, table, &args.gene_column, result)
}

fn run_orthologs(app: &mut HttpApp, args: OrthologArgs) -> Result<RunReport, IdMapError> {
    let table = read_input(&args.io.input)?;
    let cells = table.column(&args.gene_column)?;
    let result = app.map_orthologs(&cells, args.organism, args.target, args.keep_empty)?;
    let suffix = format!("orthologs_{}", args.target);
    write_column_result(app, "orthologs", &suffix, &args.io, table, &args.gene_column, result)
}

fn run_lookup(app: &mut HttpApp, args: LookupArgs) -> Result<RunReport, IdMapError> {
    let table = read_input(&args.io.input)?;
    let cells = table.column(&args.column)?;
    let records = app.mapping_table(&cells, args.organism)?;

    let output = output_path(&args.io.input, args.io.out_dir.as_deref(), "mapping");
    write_records(&output, &records)?;

    let mut report = RunReport::new(
        "lookup",
        args.io.input.to_string(),
        output.to_string(),
        app.engine().cache(),
    );
    report.rows_in = table.rows.len();
    report.rows_out = records.len();
    Ok(report)
}

fn read_input(path: &Utf8Path) -> Result<Table, IdMapError> {
    Table::read(path, b'\t')
}

fn write_column_result(
    app: &HttpApp,
    command: &str,
    suffix: &str,
    io: &InputArgs,
    table: Table,
    column: &str,
    result: ColumnResult,
) -> Result<RunReport, IdMapError> {
    let mut out = table.select_rows(&result.kept);
    out.set_column(column, result.kept_cells())?;

    let output = output_path(&io.input, io.out_dir.as_deref(), suffix);
    let log_output = output_path(&io.input, io.out_dir.as_deref(), &format!("{suffix}_log"));
    out.write(&output)?;
    write_records(&log_output, &result.log.lines())?;

    let mut report = RunReport::new(
        command,
        io.input.to_string(),
        output.to_string(),
        app.engine().cache(),
    );
    report.log = Some(log_output.to_string());
    report.rows_in = table.rows.len();
    report.rows_out = out.rows.len();
    report.changes = Some(result.log.summary);
    Ok(report)
}
