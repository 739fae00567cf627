use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::repository::{FinanceRepository, RepositoryError};

/// Where accounts, ledgers and watchlists live: the `[database]` table of
/// `finance.toml`, or the `--backend` / `--db` flags.
///
/// The finance tools ship two backends:
///
/// | backend  | connection_string                                        |
/// |----------|----------------------------------------------------------|
/// | `sqlite` | a file path (`finance.db`), `:memory:`, or a `sqlite:` URL |
/// | `memory` | unused; the data lasts as long as the process             |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl DbConfig {
    /// A SQLite database at `connection_string`.
    pub fn sqlite(connection_string: impl Into<String>) -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: connection_string.into(),
        }
    }

    /// The process-local `memory` backend.
    pub fn memory() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: String::new(),
        }
    }
}

impl Default for DbConfig {
    /// An empty SQLite database that vanishes with the process.
    fn default() -> Self {
        Self::sqlite(":memory:")
    }
}

/// Opens one kind of finance store. `finance-core` provides the `memory`
/// factory and `finance-db-sqlite` the `sqlite` one.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// The `backend` value in [`DbConfig`] this factory answers to.
    fn backend_name(&self) -> &'static str;

    /// Returns a store with its schema in place, ready for the services.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn FinanceRepository>, RepositoryError>;
}

/// The backends a binary was built with. `finance` registers both;
/// the config decides which one a run opens.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`; a later factory with the same name wins.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens the store named by `config.backend`.
    ///
    /// An unregistered name is a [`RepositoryError::Configuration`] that
    /// lists the backends this binary does know.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn FinanceRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        debug!(
            backend = %config.backend,
            connection_string = %config.connection_string,
            "opening finance store"
        );
        factory.create(config).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::{DbConfig, FinanceRepository, RepositoryError, RepositoryFactory, RepositoryRegistry};
    use crate::db::memory::{InMemoryRepository, InMemoryRepositoryFactory};

    // =========================================================================
    // Test factories
    // =========================================================================

    /// Remembers whether it was asked to open a store.
    struct RecordingFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for RecordingFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn FinanceRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(InMemoryRepository::new()))
        }
    }

    /// Always fails with a `Connection` error.
    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn FinanceRepository>, RepositoryError> {
            Err(RepositoryError::Connection("intentional failure".to_string()))
        }
    }

    fn recording_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(RecordingFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            ..DbConfig::default()
        }
    }

    // =========================================================================
    // DbConfig
    // =========================================================================

    #[test]
    fn dbconfig_default_is_sqlite_memory() {
        let cfg = DbConfig::default();
        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, ":memory:");
    }

    #[test]
    fn dbconfig_constructors() {
        assert_eq!(
            DbConfig::sqlite("finance.db"),
            DbConfig {
                backend: "sqlite".to_string(),
                connection_string: "finance.db".to_string(),
            }
        );
        assert_eq!(DbConfig::memory().backend, "memory");
    }

    // =========================================================================
    // Registration
    // =========================================================================

    #[test]
    fn new_registry_has_no_backends() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = RepositoryRegistry::new();
        let (f1, _) = recording_factory("sqlite");
        reg.register(f1);
        reg.register(Box::new(InMemoryRepositoryFactory));
        assert_eq!(reg.available_backends(), vec!["memory", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = RepositoryRegistry::new();
        let (old, _) = recording_factory("sqlite");
        let (new, _) = recording_factory("sqlite");
        reg.register(old);
        reg.register(new);
        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    #[tokio::test]
    async fn create_calls_only_matching_factory() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, sqlite_called) = recording_factory("sqlite");
        let (other, other_called) = recording_factory("postgres");
        reg.register(sqlite);
        reg.register(other);

        let result = reg.create(&config("sqlite")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!other_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn configuration_error_names_requested_and_available_backends() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(InMemoryRepositoryFactory));

        match reg.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "error should name the requested backend");
                assert!(msg.ends_with("available: memory"), "got: {msg}");
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        let result = reg.create(&config("failing")).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Connection(ref msg)) if msg == "intentional failure"
        ));
    }
}
