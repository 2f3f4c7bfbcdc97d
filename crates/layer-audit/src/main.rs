//! layer-audit CLI
//!
//! Command-line tool producing the layer reconciliation report.

use std::path::PathBuf;

use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use layer_audit::prelude::*;

/// Schema and style reconciliation reports for geospatial layer stores.
#[derive(Parser)]
#[command(name = "layer-audit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Current store database URL (SQLite mirror of the production catalog).
    #[arg(long, env = "CURRENT_DATABASE_URL")]
    current: String,

    /// Reference store database URL (GeoPackage path).
    #[arg(long, env = "REFERENCE_DATABASE_URL")]
    reference: String,

    /// Exceptions file: one logical layer name per line.
    #[arg(long, default_value = "exceptions.txt")]
    exceptions: PathBuf,

    /// Report output path.
    #[arg(short, long, default_value = "LayerReport.json")]
    output: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

/// Accepts either a `sqlite:` URL or a bare file path.
fn database_url(raw: &str) -> String {
    if raw.starts_with("sqlite:") {
        raw.to_string()
    } else {
        format!("sqlite:{raw}")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Connect to both stores
    let current_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url(&cli.current))
        .await?;
    let reference_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url(&cli.reference))
        .await?;
    let current = CurrentStore::new(current_pool);
    let reference = ReferenceStore::new(reference_pool);

    let exceptions = ExceptionSet::load(&cli.exceptions);
    info!("Loaded {} exception layer(s)", exceptions.len());

    info!("Building layer catalog...");
    let catalog = CatalogBuilder::new()
        .build(&current, &reference, &exceptions)
        .await?;
    info!(
        "Catalog built: {} current layer(s), {} reference union(s)",
        catalog.current.len(),
        catalog.reference.len()
    );

    info!("Generating report...");
    let report = Reconciler::new().reconcile(&catalog);
    write_report(&cli.output, &report)?;
    info!(
        "Report generated: {} record(s) -> {}",
        report.len(),
        cli.output.display()
    );

    Ok(())
}
