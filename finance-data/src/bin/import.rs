use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use finance_core::db::{DbConfig, RepositoryFactory};
use finance_data::LegacyImporter;
use finance_db_sqlite::SqliteRepositoryFactory;
use tracing_subscriber::EnvFilter;

/// Import the legacy flat files into a finance database.
///
/// The directory should contain:
/// - users.csv: username,password,question,answer
/// - tax_<username>.csv: one ledger per user
/// - watchlist_<username>.csv: one symbol per row
///
/// Passwords and security answers are hashed on the way in. Users that
/// already exist in the database are skipped along with their files.
#[derive(Parser, Debug)]
#[command(name = "finance-import")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the legacy CSV files
    #[arg(short = 'D', long)]
    dir: PathBuf,

    /// SQLite database file (created if missing), `:memory:`, or a
    /// `sqlite:` URL
    #[arg(short, long, default_value = "finance.db")]
    database: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = DbConfig::sqlite(args.database.as_str());

    let repo = SqliteRepositoryFactory
        .create(&config)
        .await
        .with_context(|| format!("Failed to open database: {}", args.database))?;

    println!("Importing legacy files from: {}", args.dir.display());

    let importer = LegacyImporter::new().context("Failed to build importer")?;
    let summary = importer
        .import_dir(&*repo, &args.dir)
        .await
        .with_context(|| format!("Failed to import from: {}", args.dir.display()))?;

    println!(
        "Imported {} users ({} already present), {} tax records, {} watchlist entries.",
        summary.users, summary.skipped_users, summary.tax_records, summary.watchlist_entries
    );

    Ok(())
}
