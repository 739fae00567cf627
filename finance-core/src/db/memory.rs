use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{FinanceRepository, RepositoryError, TaxLedger, UserStore, Watchlist};
use crate::models::{NewTaxRecord, NewUser, Page, PageRequest, TaxRecord, User};

#[derive(Debug, Default)]
struct Ledger {
    next_id: i64,
    records: Vec<TaxRecord>,
}

/// A thread-safe, non-persistent backend.
///
/// Cloning shares the underlying state. Suitable for tests and one-shot
/// runs where nothing needs to survive the process.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    users: Arc<RwLock<BTreeMap<String, User>>>,
    ledger: Arc<RwLock<Ledger>>,
    watchlists: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn ensure_user(
        &self,
        username: &str,
    ) -> Result<(), RepositoryError> {
        if self.users.read().await.contains_key(username) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

#[async_trait]
impl UserStore for InMemoryRepository {
    async fn create_user(
        &self,
        user: NewUser,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(RepositoryError::Conflict(format!(
                "user '{}' already exists",
                user.username
            )));
        }
        let user = user.into_user(Utc::now());
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(
        &self,
        username: &str,
    ) -> Result<User, RepositoryError> {
        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(username).ok_or(RepositoryError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn rename_user(
        &self,
        username: &str,
        new_username: &str,
    ) -> Result<User, RepositoryError> {
        // Lock order: users, ledger, watchlists.
        let mut users = self.users.write().await;
        if !users.contains_key(username) {
            return Err(RepositoryError::NotFound);
        }
        if users.contains_key(new_username) {
            return Err(RepositoryError::Conflict(format!(
                "user '{new_username}' already exists"
            )));
        }
        let mut ledger = self.ledger.write().await;
        let mut watchlists = self.watchlists.write().await;

        let Some(mut user) = users.remove(username) else {
            return Err(RepositoryError::NotFound);
        };
        user.username = new_username.to_string();
        users.insert(user.username.clone(), user.clone());

        for record in ledger.records.iter_mut().filter(|r| r.username == username) {
            record.username = new_username.to_string();
        }
        if let Some(symbols) = watchlists.remove(username) {
            watchlists.insert(new_username.to_string(), symbols);
        }
        Ok(user)
    }

    async fn delete_user(
        &self,
        username: &str,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if users.remove(username).is_none() {
            return Err(RepositoryError::NotFound);
        }
        self.ledger
            .write()
            .await
            .records
            .retain(|r| r.username != username);
        self.watchlists.write().await.remove(username);
        Ok(())
    }

    async fn list_usernames(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.users.read().await.keys().cloned().collect())
    }
}

#[async_trait]
impl TaxLedger for InMemoryRepository {
    async fn append_record(
        &self,
        record: NewTaxRecord,
    ) -> Result<TaxRecord, RepositoryError> {
        self.ensure_user(&record.username).await?;

        let mut ledger = self.ledger.write().await;
        ledger.next_id += 1;
        let record = record.with_id(ledger.next_id);
        ledger.records.push(record.clone());
        Ok(record)
    }

    async fn list_records(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<TaxRecord>, RepositoryError> {
        let ledger = self.ledger.read().await;
        let mine: Vec<TaxRecord> = ledger
            .records
            .iter()
            .filter(|r| r.username == username)
            .cloned()
            .collect();
        Ok(Page::from_slice(&mine, page))
    }

    async fn count_records(
        &self,
        username: &str,
    ) -> Result<u64, RepositoryError> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .records
            .iter()
            .filter(|r| r.username == username)
            .count() as u64)
    }
}

#[async_trait]
impl Watchlist for InMemoryRepository {
    async fn add_symbol(
        &self,
        username: &str,
        symbol: &str,
    ) -> Result<bool, RepositoryError> {
        self.ensure_user(username).await?;

        let mut watchlists = self.watchlists.write().await;
        let symbols = watchlists.entry(username.to_string()).or_default();
        if symbols.iter().any(|s| s == symbol) {
            return Ok(false);
        }
        symbols.push(symbol.to_string());
        Ok(true)
    }

    async fn remove_symbol(
        &self,
        username: &str,
        symbol: &str,
    ) -> Result<bool, RepositoryError> {
        let mut watchlists = self.watchlists.write().await;
        let Some(symbols) = watchlists.get_mut(username) else {
            return Ok(false);
        };
        let before = symbols.len();
        symbols.retain(|s| s != symbol);
        Ok(symbols.len() != before)
    }

    async fn list_symbols(
        &self,
        username: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .watchlists
            .read()
            .await
            .get(username)
            .cloned()
            .unwrap_or_default())
    }
}

/// [`RepositoryFactory`] for the `"memory"` backend. The connection string
/// is ignored; every call yields a fresh, empty repository.
pub struct InMemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for InMemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn FinanceRepository>, RepositoryError> {
        Ok(Box::new(InMemoryRepository::new()))
    }
}
