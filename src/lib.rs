pub mod cli;
pub mod error;
pub mod export;
pub mod fields;
pub mod ingest;
pub mod io_utils;
pub mod mapping;
pub mod projection;
pub mod review;
pub mod session;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

pub use crate::{
    error::{ReconcileError, ValidationError},
    fields::FieldSet,
    ingest::{ParseOptions, ParsedTable, RawRow},
    mapping::{FieldMapping, auto_map, set_mapping},
    projection::{CanonicalRow, edit_cell, project},
    session::{RemapPolicy, Session},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_reconcile", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect(args) => handle_inspect(&args),
        Commands::Fields(args) => handle_fields(&args),
        Commands::Map(args) => review::map(&args),
        Commands::Review(args) => review::execute(&args),
    }
}

fn handle_inspect(args: &cli::InspectArgs) -> Result<()> {
    let options = review::parse_options(&args.input)?;
    let table = ingest::read_csv_file(&args.input.input, &options, args.input.max_bytes)
        .with_context(|| format!("Inspecting {:?}", args.input.input))?;

    println!("Columns ({}):", table.columns.len());
    for (idx, column) in table.columns.iter().enumerate() {
        println!("  {}. {}", idx + 1, column);
    }
    println!();
    let mut grid = table.grid();
    if args.rows > 0 {
        grid.truncate(args.rows);
    }
    table::print(&table::render_table(&table.columns, &grid));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        grid.len(),
        table.row_count(),
        args.input.input
    );
    Ok(())
}

fn handle_fields(args: &cli::FieldsArgs) -> Result<()> {
    let fields = review::load_fields(args.fields.as_deref())?;
    for (idx, field) in fields.iter().enumerate() {
        println!("{}. {}", idx + 1, field);
    }
    if let Some(path) = &args.save {
        fields
            .save(path)
            .with_context(|| format!("Writing field profile to {path:?}"))?;
        info!("Field profile with {} field(s) written to {:?}", fields.len(), path);
    }
    Ok(())
}
