use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewTaxRecord, NewUser, Page, PageRequest, TaxRecord, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the username is taken.
    async fn create_user(
        &self,
        user: NewUser,
    ) -> Result<User, RepositoryError>;

    async fn get_user(
        &self,
        username: &str,
    ) -> Result<User, RepositoryError>;

    async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// Moves the account and everything keyed by it (ledger, watchlist) to
    /// `new_username`. [`RepositoryError::NotFound`] when `username` is
    /// absent, [`RepositoryError::Conflict`] when `new_username` is taken.
    async fn rename_user(
        &self,
        username: &str,
        new_username: &str,
    ) -> Result<User, RepositoryError>;

    /// Removes the account together with its ledger and watchlist.
    async fn delete_user(
        &self,
        username: &str,
    ) -> Result<(), RepositoryError>;

    /// All usernames, sorted.
    async fn list_usernames(&self) -> Result<Vec<String>, RepositoryError>;
}

/// Per-user append-only log of tax computations.
#[async_trait]
pub trait TaxLedger: Send + Sync {
    /// Fails with [`RepositoryError::NotFound`] when the user does not exist.
    async fn append_record(
        &self,
        record: NewTaxRecord,
    ) -> Result<TaxRecord, RepositoryError>;

    /// Records oldest first.
    async fn list_records(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<TaxRecord>, RepositoryError>;

    async fn count_records(
        &self,
        username: &str,
    ) -> Result<u64, RepositoryError>;
}

/// Per-user ordered set of stock symbols.
#[async_trait]
pub trait Watchlist: Send + Sync {
    /// Returns `false` when the symbol was already present.
    async fn add_symbol(
        &self,
        username: &str,
        symbol: &str,
    ) -> Result<bool, RepositoryError>;

    /// Returns `false` when the symbol was not present.
    async fn remove_symbol(
        &self,
        username: &str,
        symbol: &str,
    ) -> Result<bool, RepositoryError>;

    /// Symbols in insertion order.
    async fn list_symbols(
        &self,
        username: &str,
    ) -> Result<Vec<String>, RepositoryError>;
}

/// A backend providing every store.
pub trait FinanceRepository: UserStore + TaxLedger + Watchlist {}

impl<T> FinanceRepository for T where T: UserStore + TaxLedger + Watchlist {}
