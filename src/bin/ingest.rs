use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use credit_approval_rs::config::Config;
use credit_approval_rs::ingest;
use credit_approval_rs::store::postgres::PgStore;

/// bulk-load customer and loan records from csv exports
#[derive(Parser, Debug)]
#[command(name = "ingest")]
struct Args {
    /// path to the customer export
    #[arg(long, default_value = "customer_data.csv")]
    customers: PathBuf,

    /// path to the loan export
    #[arg(long, default_value = "loan_data.csv")]
    loans: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let store = PgStore::connect(&config.database_url).await?;

    let report = ingest::run(&store, &args.customers, &args.loans).await?;
    store.sync_id_sequences().await?;

    info!(
        "ingestion finished: {} customers, {} loans ({} skipped)",
        report.customers, report.loans, report.skipped_loans
    );
    if !report.missing_files.is_empty() {
        warn!("missing input files: {}", report.missing_files.join(", "));
    }

    Ok(())
}
