use anyhow::Context as _;
use chrono::Local;
use clap::Parser;
use tracing::debug;

use finance_cli::commands::resolve_db_config;
use finance_cli::{AppConfig, Cli, Context, build_registry, execute, logging};

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    logging::init_logging(&config.logging)?;

    let db_config = resolve_db_config(&config, &cli);
    debug!("connecting to {} backend", db_config.backend);
    let registry = build_registry();
    let repo = registry
        .create(&db_config)
        .await
        .with_context(|| format!("cannot open {} database", db_config.backend))?;

    let mut ctx = Context::new(&config, Local::now().date_naive(), rand::thread_rng());
    let mut stdout = std::io::stdout().lock();
    execute(&*repo, &mut ctx, &cli, &mut stdout).await
}
