use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use finance_core::TaxRegime;
use rust_decimal::Decimal;

use crate::utils::parse_income;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Personal finance manager: income-tax calculator (old and new Indian
/// regimes), tax ledger, and a simulated stock tracker with a watchlist.
///
/// Settings come from `finance.toml` when present; flags override them.
#[derive(Debug, Parser)]
#[command(name = "finance", version)]
pub struct Cli {
    /// Config file (defaults to `finance.toml` when it exists).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database backend to use (`sqlite` or `memory`).
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `finance.db`) or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Account to act as, for commands that need one.
    #[arg(long, short, global = true)]
    pub user: Option<String>,

    /// Password for `--user`.
    #[arg(long, short, global = true, env = "FINANCE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account.
    Register(RegisterArgs),

    /// Show the security question chosen for an account.
    SecurityQuestion {
        #[arg(long)]
        username: String,
    },

    /// Set a new password after answering the security question.
    ResetPassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        answer: String,
        #[arg(long)]
        new_password: String,
    },

    /// Manage the account given by `--user` / `--password`.
    #[command(subcommand)]
    Account(AccountCommand),

    /// List the deductions available under the old regime.
    Deductions,

    /// Income-tax calculator and ledger.
    #[command(subcommand)]
    Tax(TaxCommand),

    /// Simulated stock prices.
    #[command(subcommand)]
    Stock(StockCommand),

    /// Symbols you follow.
    #[command(subcommand)]
    Watchlist(WatchlistCommand),
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub question: String,
    #[arg(long)]
    pub answer: String,
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Show the username, security question and creation time.
    Show,

    /// Change the password; `--password` must hold the current one.
    Password {
        #[arg(long)]
        new_password: String,
    },

    /// Change the username. Ledger and watchlist move with the account.
    Rename {
        #[arg(long)]
        new_username: String,
    },

    /// Delete the account with its ledger and watchlist.
    Delete {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum TaxCommand {
    /// Compute the tax for an income and record it in your ledger.
    Calculate {
        /// Annual income in rupees; commas are accepted.
        #[arg(long, value_parser = parse_income, allow_hyphen_values = true)]
        income: Decimal,

        /// `old` or `new`.
        #[arg(long)]
        regime: TaxRegime,

        /// Deduction code (repeatable): 80C, 80D, 80E. Ignored under the new regime.
        #[arg(long = "deduction", short = 'd')]
        deductions: Vec<String>,
    },

    /// Show your recorded calculations, oldest first.
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Rows per page (defaults to `[report] page_size`).
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Write your ledger as CSV.
    Export {
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// List tracked symbols.
    List,

    /// Show a simulated price history.
    Show { symbol: String },
}

#[derive(Debug, Subcommand)]
pub enum WatchlistCommand {
    Add { symbol: String },
    Remove { symbol: String },
    /// Your symbols with a simulated current price.
    List,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_tax_calculate() {
        let cli = Cli::try_parse_from([
            "finance",
            "--user",
            "asha",
            "tax",
            "calculate",
            "--income",
            "8,00,000",
            "--regime",
            "old",
            "-d",
            "80C",
            "--deduction",
            "80D",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("asha"));
        match cli.command {
            Command::Tax(TaxCommand::Calculate {
                income,
                regime,
                deductions,
            }) => {
                assert_eq!(income, dec!(800000));
                assert_eq!(regime, TaxRegime::Old);
                assert_eq!(deductions, vec!["80C", "80D"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_income() {
        for income in ["", "abc", "-100"] {
            let result = Cli::try_parse_from([
                "finance", "tax", "calculate", "--income", income, "--regime", "new",
            ]);
            assert!(result.is_err(), "accepted income {income:?}");
        }
    }

    #[test]
    fn rejects_unknown_regime() {
        let result = Cli::try_parse_from([
            "finance", "tax", "calculate", "--income", "100", "--regime", "flat",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_account_commands() {
        let cli = Cli::try_parse_from([
            "finance", "-u", "asha", "account", "rename", "--new-username", "asha_k",
        ])
        .unwrap();
        match cli.command {
            Command::Account(AccountCommand::Rename { new_username }) => {
                assert_eq!(new_username, "asha_k");
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["finance", "account", "delete"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Account(AccountCommand::Delete { yes: false })
        ));
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "finance",
            "watchlist",
            "list",
            "--backend",
            "memory",
            "--db",
            ":memory:",
        ])
        .unwrap();

        assert_eq!(cli.backend.as_deref(), Some("memory"));
        assert_eq!(cli.db.as_deref(), Some(":memory:"));
        assert!(matches!(cli.command, Command::Watchlist(WatchlistCommand::List)));
    }
}
