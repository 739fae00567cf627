use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use finance_core::credentials::hash_secret;
use finance_core::services::normalize_answer;
use finance_core::{
    FinanceRepository, NewTaxRecord, NewUser, RepositoryError, TaxRegime, split_deductions,
};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const USERS_FILE: &str = "users.csv";

/// Errors that can occur when importing legacy flat files.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid regime '{0}' (expected 'Old Regime' or 'New Regime')")]
    InvalidRegime(String),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParse(err.to_string())
    }
}

/// A row of `users.csv`. Secrets are plaintext in the legacy format.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LegacyUserRow {
    pub username: String,
    pub password: String,
    pub question: String,
    pub answer: String,
}

/// A row of `tax_<username>.csv`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacyLedgerRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Income")]
    pub income: Decimal,
    #[serde(rename = "Regime")]
    pub regime: String,
    #[serde(rename = "Deductions", default)]
    pub deductions: String,
    #[serde(rename = "Taxable")]
    pub taxable: Decimal,
    #[serde(rename = "Base Tax")]
    pub base_tax: Decimal,
    #[serde(rename = "Cess")]
    pub cess: Decimal,
    #[serde(rename = "Final Tax")]
    pub final_tax: Decimal,
}

impl LegacyLedgerRow {
    pub fn into_record(
        self,
        username: &str,
    ) -> Result<NewTaxRecord, ImportError> {
        let regime = self
            .regime
            .parse::<TaxRegime>()
            .map_err(|_| ImportError::InvalidRegime(self.regime.clone()))?;

        Ok(NewTaxRecord {
            username: username.to_string(),
            date: self.date,
            income: self.income,
            regime,
            deductions: split_deductions(&self.deductions),
            taxable_income: self.taxable,
            base_tax: self.base_tax,
            cess: self.cess,
            final_tax: self.final_tax,
        })
    }
}

/// Counts reported by [`LegacyImporter::import_dir`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub users: usize,
    pub skipped_users: usize,
    pub tax_records: usize,
    pub watchlist_entries: usize,
}

/// Importer for the legacy one-directory flat-file layout:
///
/// - `users.csv` with header `username,password,question,answer`
/// - `tax_<username>.csv` ledgers
/// - `watchlist_<username>.csv`, one symbol per row, no header
///
/// Works against any [`FinanceRepository`] backend.
pub struct LegacyImporter {
    tax_file: Regex,
    watchlist_file: Regex,
}

impl LegacyImporter {
    pub fn new() -> Result<Self, ImportError> {
        Ok(Self {
            tax_file: Regex::new(r"^tax_(.+)\.csv$")?,
            watchlist_file: Regex::new(r"^watchlist_(.+)\.csv$")?,
        })
    }

    /// Parse account rows from a `users.csv` reader.
    ///
    /// Usernames and questions are trimmed. Passwords are kept byte for
    /// byte since logins compare them exactly.
    pub fn parse_users<R: Read>(reader: R) -> Result<Vec<LegacyUserRow>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let mut rows = Vec::new();

        for result in csv_reader.deserialize() {
            let mut row: LegacyUserRow = result?;
            row.username = row.username.trim().to_string();
            row.question = row.question.trim().to_string();
            rows.push(row);
        }

        Ok(rows)
    }

    /// Parse a ledger into records owned by `username`.
    pub fn parse_ledger<R: Read>(
        username: &str,
        reader: R,
    ) -> Result<Vec<NewTaxRecord>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let row: LegacyLedgerRow = result?;
            records.push(row.into_record(username)?);
        }

        Ok(records)
    }

    /// Parse a headerless watchlist. Blank rows are skipped; symbols are
    /// uppercased.
    pub fn parse_watchlist<R: Read>(reader: R) -> Result<Vec<String>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut symbols = Vec::new();

        for result in csv_reader.records() {
            let record = result?;
            if let Some(symbol) = record.get(0).filter(|s| !s.is_empty()) {
                symbols.push(symbol.to_ascii_uppercase());
            }
        }

        Ok(symbols)
    }

    /// Import every legacy file in `dir`.
    ///
    /// Every file belonging to a user that will be imported is parsed
    /// before the first write, so a malformed file leaves the store
    /// untouched. A user whose ledger or watchlist fails to store is
    /// removed again before the error is returned.
    ///
    /// Users that already exist are skipped together with their ledger and
    /// watchlist, so running the import twice changes nothing. Files for
    /// users missing from `users.csv` are ignored.
    pub async fn import_dir<R>(
        &self,
        repo: &R,
        dir: &Path,
    ) -> Result<ImportSummary, ImportError>
    where
        R: FinanceRepository + ?Sized,
    {
        let mut summary = ImportSummary::default();

        let users_path = dir.join(USERS_FILE);
        let users = Self::parse_users(open(&users_path)?)?;
        info!(path = %users_path.display(), count = users.len(), "parsed legacy users");

        let mut known: HashSet<String> = HashSet::new();
        let mut pending: BTreeMap<String, PendingUser> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();

        for row in users {
            if !known.insert(row.username.clone()) {
                warn!(username = %row.username, "duplicate row in users file, skipping");
                summary.skipped_users += 1;
                continue;
            }
            match repo.get_user(&row.username).await {
                Ok(_) => {
                    debug!(username = %row.username, "user already present, skipping");
                    summary.skipped_users += 1;
                }
                Err(RepositoryError::NotFound) => {
                    order.push(row.username.clone());
                    pending.insert(
                        row.username.clone(),
                        PendingUser {
                            row,
                            records: Vec::new(),
                            symbols: Vec::new(),
                        },
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|source| ImportError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        for path in entries {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if let Some(owner) = capture_owner(&self.tax_file, file_name) {
                if let Some(user) = Self::pending_owner(&owner, &known, &mut pending, &path) {
                    user.records = Self::parse_ledger(&owner, open(&path)?)?;
                }
            } else if let Some(owner) = capture_owner(&self.watchlist_file, file_name) {
                if let Some(user) = Self::pending_owner(&owner, &known, &mut pending, &path) {
                    user.symbols = Self::parse_watchlist(open(&path)?)?;
                }
            }
        }

        for username in order {
            let Some(user) = pending.remove(&username) else {
                continue;
            };
            let (records, symbols) = Self::store_user(repo, user).await?;
            summary.users += 1;
            summary.tax_records += records;
            summary.watchlist_entries += symbols;
        }

        info!(
            users = summary.users,
            skipped_users = summary.skipped_users,
            tax_records = summary.tax_records,
            watchlist_entries = summary.watchlist_entries,
            "legacy import finished"
        );
        Ok(summary)
    }

    /// The parsed-but-unwritten user a legacy file belongs to, if any.
    fn pending_owner<'a>(
        owner: &str,
        known: &HashSet<String>,
        pending: &'a mut BTreeMap<String, PendingUser>,
        path: &Path,
    ) -> Option<&'a mut PendingUser> {
        if !known.contains(owner) {
            warn!(path = %path.display(), owner, "no such user in users file, ignoring");
            return None;
        }
        pending.get_mut(owner)
    }

    /// Writes one user with their ledger and watchlist. On failure after
    /// the account exists, the account (and whatever was stored for it) is
    /// deleted so a later run imports the user from scratch.
    async fn store_user<R>(
        repo: &R,
        user: PendingUser,
    ) -> Result<(usize, usize), ImportError>
    where
        R: FinanceRepository + ?Sized,
    {
        let username = user.row.username.clone();
        let new_user = NewUser {
            username: username.clone(),
            password_hash: hash_secret(&user.row.password),
            security_question: user.row.question,
            answer_hash: hash_secret(&normalize_answer(&user.row.answer)),
        };
        repo.create_user(new_user).await?;

        match Self::store_data(repo, &username, user.records, user.symbols).await {
            Ok(counts) => Ok(counts),
            Err(err) => {
                warn!(username = %username, error = %err, "import failed, removing partial user");
                if let Err(cleanup) = repo.delete_user(&username).await {
                    warn!(username = %username, error = %cleanup, "could not remove partial user");
                }
                Err(err.into())
            }
        }
    }

    async fn store_data<R>(
        repo: &R,
        username: &str,
        records: Vec<NewTaxRecord>,
        symbols: Vec<String>,
    ) -> Result<(usize, usize), RepositoryError>
    where
        R: FinanceRepository + ?Sized,
    {
        let mut stored_records = 0;
        for record in records {
            repo.append_record(record).await?;
            stored_records += 1;
        }

        let mut stored_symbols = 0;
        for symbol in symbols {
            if repo.add_symbol(username, &symbol).await? {
                stored_symbols += 1;
            }
        }

        Ok((stored_records, stored_symbols))
    }
}

/// A `users.csv` row with its parsed files, waiting to be written.
struct PendingUser {
    row: LegacyUserRow,
    records: Vec<NewTaxRecord>,
    symbols: Vec<String>,
}

fn capture_owner(
    pattern: &Regex,
    file_name: &str,
) -> Option<String> {
    pattern
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn open(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
