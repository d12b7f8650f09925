//! Command-line interface for airtable-sync
//!
//! # Usage Examples
//!
//! ## Load
//! ```bash
//! # Export a table to stdout
//! AIRTABLE_API_KEY=pat... airtable-sync load --base appXXXXXXXXXXXXXX --table Tasks
//!
//! # Export only the fields of a view, keeping the declared schema
//! airtable-sync load --base appXXXXXXXXXXXXXX --table Tasks --view "Open tasks" \
//!   --output tasks.jsonl --schema-output tasks.schema.json
//! ```
//!
//! ## Dump
//! ```bash
//! # Rows with __airtable_id update that record, all other rows are inserted
//! airtable-sync dump --config tables.toml --input tasks.jsonl --resource tasks
//! ```

use airtable_sync::jsonl::{read_jsonl, write_jsonl};
use airtable_sync::{
    load_from_airtable, AirtableOpts, DumpToAirtable, Flow, Package, Resource, SyncConfig,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "airtable-sync")]
#[command(about = "Load Airtable tables as row streams and dump row streams into Airtable")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a table and write its records as JSON Lines
    Load {
        /// Base id (appXXXXXXXXXXXXXX)
        #[arg(long)]
        base: String,

        /// Table name or id
        #[arg(long)]
        table: String,

        /// Restrict records and columns to this view (name or id)
        #[arg(long)]
        view: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the declared columns as JSON to this file
        #[arg(long)]
        schema_output: Option<PathBuf>,

        #[command(flatten)]
        opts: AirtableOpts,
    },

    /// Push a JSON Lines file to every table mapped to a resource
    Dump {
        /// Table mapping file (TOML)
        #[arg(long)]
        config: PathBuf,

        /// JSON Lines input file
        #[arg(long)]
        input: PathBuf,

        /// Resource name the input is published as
        #[arg(long)]
        resource: String,

        #[command(flatten)]
        opts: AirtableOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            base,
            table,
            view,
            output,
            schema_output,
            opts,
        } => run_load(base, table, view, output, schema_output, opts).await,
        Commands::Dump {
            config,
            input,
            resource,
            opts,
        } => run_dump(config, input, resource, opts).await,
    }
}

async fn run_load(
    base: String,
    table: String,
    view: Option<String>,
    output: Option<PathBuf>,
    schema_output: Option<PathBuf>,
    opts: AirtableOpts,
) -> anyhow::Result<()> {
    let ctx = opts.build_context()?;
    let flow = load_from_airtable(&ctx, &base, &table, view.as_deref()).await?;
    let mut package = flow.process(Package::new())?;
    let resource = package
        .take(&table)
        .with_context(|| format!("Resource {table} missing after load"))?;

    match &resource.schema {
        Some(schema) => {
            tracing::info!(
                "Declared columns of {}: {}",
                table,
                schema.column_names().join(", ")
            );
            if let Some(path) = &schema_output {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                serde_json::to_writer_pretty(BufWriter::new(file), schema)
                    .with_context(|| format!("Failed to write schema to {}", path.display()))?;
            }
        }
        None => {
            tracing::warn!("No schema available for {}/{}", base, table);
            if schema_output.is_some() {
                tracing::warn!("Skipping --schema-output");
            }
        }
    }

    let count = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_jsonl(resource, &mut BufWriter::new(file)).await?
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            let count = write_jsonl(resource, &mut lock).await?;
            lock.flush()?;
            count
        }
    };

    tracing::info!("Loaded {} records from {}/{}", count, base, table);
    Ok(())
}

async fn run_dump(
    config: PathBuf,
    input: PathBuf,
    resource: String,
    opts: AirtableOpts,
) -> anyhow::Result<()> {
    let config = SyncConfig::from_file(&config)?;
    if config.mappings_for(&resource).next().is_none() {
        tracing::warn!("No table is mapped to resource {}", resource);
    }

    let ctx = opts.build_context()?;
    let file =
        File::open(&input).with_context(|| format!("Failed to open {}", input.display()))?;
    let package =
        Package::new().with_resource(Resource::new(&resource, read_jsonl(BufReader::new(file))));

    let package = Flow::new()
        .add(DumpToAirtable::new(ctx, &config.tables))
        .process(package)?;
    for (name, count) in package.drain().await? {
        tracing::info!("Dumped {} rows of resource {}", count, name);
    }
    Ok(())
}
