use std::fs::File;
use std::io::Write;

use anyhow::{Context as _, Result, bail};
use chrono::NaiveDate;
use finance_core::db::{DbConfig, InMemoryRepositoryFactory, RepositoryRegistry};
use finance_core::market::{PriceSimulator, StockCatalog};
use finance_core::services::{
    self, Registration, TaxRequest, add_to_watchlist, calculate_tax, remove_from_watchlist,
    tax_history,
};
use finance_core::{FinanceRepository, PageRequest, Session, TaxEngine, TaxRegime, UserStore};
use finance_data::LedgerExporter;
use finance_db_sqlite::SqliteRepositoryFactory;
use rand::Rng;
use tracing::debug;

use crate::cli::{AccountCommand, Cli, Command, StockCommand, TaxCommand, WatchlistCommand};
use crate::config::AppConfig;
use crate::report;

/// Page size used when walking the whole ledger for an export.
const EXPORT_BATCH: u32 = 100;

/// Every backend the binary can open.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(InMemoryRepositoryFactory));
    registry
}

/// The config file's database settings with `--backend` / `--db` applied.
pub fn resolve_db_config(
    config: &AppConfig,
    cli: &Cli,
) -> DbConfig {
    let mut db = config.database.clone();
    if let Some(backend) = &cli.backend {
        db.backend = backend.trim().to_ascii_lowercase();
    }
    if let Some(connection_string) = &cli.db {
        db.connection_string = connection_string.clone();
    }
    db
}

/// Per-run collaborators for [`execute`].
pub struct Context<G> {
    pub engine: TaxEngine,
    pub stocks: StockCatalog,
    pub page_size: u32,
    /// Date stamped on new ledger lines.
    pub today: NaiveDate,
    pub rng: G,
}

impl<G: Rng> Context<G> {
    pub fn new(
        config: &AppConfig,
        today: NaiveDate,
        rng: G,
    ) -> Self {
        Self {
            engine: TaxEngine::default(),
            stocks: StockCatalog::standard(),
            page_size: config.report.page_size,
            today,
            rng,
        }
    }
}

async fn require_session(
    repo: &dyn FinanceRepository,
    cli: &Cli,
) -> Result<Session> {
    let Some(user) = cli.user.as_deref() else {
        bail!("this command needs --user");
    };
    let Some(password) = cli.password.as_deref() else {
        bail!("this command needs --password (or FINANCE_PASSWORD)");
    };
    Ok(services::login(repo, user, password).await?)
}

/// Runs one parsed command against `repo`, writing human-readable output
/// to `out`.
pub async fn execute<W, G>(
    repo: &dyn FinanceRepository,
    ctx: &mut Context<G>,
    cli: &Cli,
    out: &mut W,
) -> Result<()>
where
    W: Write,
    G: Rng,
{
    match &cli.command {
        Command::Register(args) => {
            let user = services::register(
                repo,
                Registration {
                    username: args.username.clone(),
                    password: args.password.clone(),
                    security_question: args.question.clone(),
                    security_answer: args.answer.clone(),
                },
            )
            .await?;
            writeln!(out, "Account '{}' created.", user.username)?;
        }

        Command::SecurityQuestion { username } => {
            let question = services::security_question(repo, username).await?;
            writeln!(out, "{question}")?;
        }

        Command::ResetPassword {
            username,
            answer,
            new_password,
        } => {
            services::reset_password(repo, username, answer, new_password).await?;
            writeln!(out, "Password updated for '{}'.", username.trim())?;
        }

        Command::Account(command) => {
            let session = require_session(repo, cli).await?;
            let password = cli.password.as_deref().unwrap_or_default();
            match command {
                AccountCommand::Show => {
                    let user = repo.get_user(session.username()).await?;
                    writeln!(out, "Username:          {}", user.username)?;
                    writeln!(out, "Security question: {}", user.security_question)?;
                    writeln!(
                        out,
                        "Member since:      {}",
                        user.created_at.format("%Y-%m-%d")
                    )?;
                }
                AccountCommand::Password { new_password } => {
                    services::change_password(repo, &session, password, new_password).await?;
                    writeln!(out, "Password updated for '{}'.", session.username())?;
                }
                AccountCommand::Rename { new_username } => {
                    let renamed =
                        services::rename_account(repo, &session, password, new_username).await?;
                    writeln!(
                        out,
                        "Account '{}' is now '{}'.",
                        session.username(),
                        renamed.username()
                    )?;
                }
                AccountCommand::Delete { yes } => {
                    if !yes {
                        bail!(
                            "deleting '{}' removes its ledger and watchlist; pass --yes to confirm",
                            session.username()
                        );
                    }
                    services::delete_account(repo, &session, password).await?;
                    writeln!(out, "Account '{}' deleted.", session.username())?;
                }
            }
        }

        Command::Deductions => {
            report::write_deductions(out, ctx.engine.catalog())?;
        }

        Command::Tax(TaxCommand::Calculate {
            income,
            regime,
            deductions,
        }) => {
            let session = require_session(repo, cli).await?;
            let request = TaxRequest {
                income: *income,
                regime: *regime,
                deductions: deductions.clone(),
            };
            let (result, record) =
                calculate_tax(repo, &ctx.engine, &session, request, ctx.today).await?;

            if *regime == TaxRegime::New && !deductions.is_empty() {
                writeln!(out, "Note: deductions are ignored under the New Regime.")?;
            } else {
                for code in deductions {
                    if !ctx.engine.catalog().contains(code) {
                        writeln!(out, "Note: unknown deduction '{code}' counted as zero.")?;
                    }
                }
            }
            report::write_tax_result(out, &result)?;
            debug!(record_id = record.id, "recorded");
        }

        Command::Tax(TaxCommand::History { page, per_page }) => {
            let session = require_session(repo, cli).await?;
            let request = PageRequest::new(*page, per_page.unwrap_or(ctx.page_size));
            let page = tax_history(repo, &session, request).await?;
            report::write_history(out, &page)?;
        }

        Command::Tax(TaxCommand::Export { output }) => {
            let session = require_session(repo, cli).await?;

            let mut records = Vec::new();
            let mut request = PageRequest::new(1, EXPORT_BATCH);
            loop {
                let page = tax_history(repo, &session, request).await?;
                let more = page.has_next();
                records.extend(page.items);
                if !more {
                    break;
                }
                request = PageRequest::new(request.page + 1, EXPORT_BATCH);
            }

            let file = File::create(output)
                .with_context(|| format!("cannot create '{}'", output.display()))?;
            let written = LedgerExporter::write_csv(&records, file)?;
            writeln!(out, "Exported {} records to {}", written, output.display())?;
        }

        Command::Stock(StockCommand::List) => {
            report::write_stock_list(out, &ctx.stocks)?;
        }

        Command::Stock(StockCommand::Show { symbol }) => {
            let mut simulator = PriceSimulator::new(ctx.stocks, &mut ctx.rng);
            let history = simulator.history(symbol)?;
            report::write_price_history(out, &history)?;
        }

        Command::Watchlist(WatchlistCommand::Add { symbol }) => {
            let session = require_session(repo, cli).await?;
            let symbol = ctx.stocks.get(symbol)?.symbol;
            if add_to_watchlist(repo, &ctx.stocks, &session, symbol).await? {
                writeln!(out, "Added {symbol} to your watchlist.")?;
            } else {
                writeln!(out, "{symbol} is already on your watchlist.")?;
            }
        }

        Command::Watchlist(WatchlistCommand::Remove { symbol }) => {
            let session = require_session(repo, cli).await?;
            let symbol = symbol.trim().to_ascii_uppercase();
            if remove_from_watchlist(repo, &session, &symbol).await? {
                writeln!(out, "Removed {symbol} from your watchlist.")?;
            } else {
                writeln!(out, "{symbol} was not on your watchlist.")?;
            }
        }

        Command::Watchlist(WatchlistCommand::List) => {
            let session = require_session(repo, cli).await?;
            let symbols = services::watchlist(repo, &session).await?;
            if symbols.is_empty() {
                writeln!(out, "Your watchlist is empty.")?;
            }
            let mut simulator = PriceSimulator::new(ctx.stocks, &mut ctx.rng);
            for symbol in symbols {
                match simulator.history(&symbol) {
                    Ok(history) => {
                        let current = history.current().unwrap_or_default();
                        writeln!(
                            out,
                            "{:<6} {:>6}  {}",
                            history.symbol,
                            crate::utils::rupees(current),
                            report::sparkline(&history.points)
                        )?;
                    }
                    // Imported lists may hold symbols the catalog dropped.
                    Err(_) => writeln!(out, "{symbol:<6} (no price data)")?,
                }
            }
        }
    }

    Ok(())
}
