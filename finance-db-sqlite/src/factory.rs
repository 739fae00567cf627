use async_trait::async_trait;
use finance_core::db::{DbConfig, RepositoryFactory};
use finance_core::{FinanceRepository, RepositoryError};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::debug;

use crate::repository::SqliteRepository;

const MEMORY: &str = ":memory:";

/// Map a configured connection string to a sqlx URL.
///
/// * `":memory:"` stays ephemeral.
/// * `"sqlite:..."` URLs pass through untouched.
/// * Anything else is a file path, created when missing.
fn database_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed == MEMORY {
        "sqlite::memory:".to_string()
    } else if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", trimmed)
    }
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`finance_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use finance_core::db::RepositoryRegistry;
/// use finance_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and bring
    /// its schema up to date.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn FinanceRepository>, RepositoryError> {
        let url = database_url(&config.connection_string);

        // Every pooled connection to `sqlite::memory:` is its own database.
        let repo = if url == "sqlite::memory:" {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect(&url)
                .await
                .map_err(|e| RepositoryError::Connection(e.to_string()))?;
            SqliteRepository::new_with_pool(pool).await
        } else {
            SqliteRepository::new(&url)
                .await
                .map_err(|e| RepositoryError::Connection(format!("{:#}", e)))?
        };

        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{:#}", e)))?;

        debug!(url = %url, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}
