use tracing::debug;

use super::ServiceError;
use crate::db::Watchlist;
use crate::market::StockCatalog;
use crate::models::Session;

/// Adds a catalog symbol to the session user's watchlist. Returns `false`
/// when it was already listed.
pub async fn add_to_watchlist<R>(
    repo: &R,
    catalog: &StockCatalog,
    session: &Session,
    symbol: &str,
) -> Result<bool, ServiceError>
where
    R: Watchlist + ?Sized,
{
    let stock = catalog.get(symbol)?;
    let added = repo.add_symbol(session.username(), stock.symbol).await?;
    debug!(username = session.username(), symbol = stock.symbol, added, "watchlist add");
    Ok(added)
}

/// Returns `false` when the symbol was not listed.
pub async fn remove_from_watchlist<R>(
    repo: &R,
    session: &Session,
    symbol: &str,
) -> Result<bool, ServiceError>
where
    R: Watchlist + ?Sized,
{
    let symbol = symbol.trim().to_ascii_uppercase();
    let removed = repo.remove_symbol(session.username(), &symbol).await?;
    debug!(username = session.username(), %symbol, removed, "watchlist remove");
    Ok(removed)
}

pub async fn watchlist<R>(
    repo: &R,
    session: &Session,
) -> Result<Vec<String>, ServiceError>
where
    R: Watchlist + ?Sized,
{
    Ok(repo.list_symbols(session.username()).await?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::InMemoryRepository;
    use crate::market::MarketError;
    use crate::services::{Registration, login, register};

    async fn logged_in(repo: &InMemoryRepository) -> Session {
        register(
            repo,
            Registration {
                username: "ravi".to_string(),
                password: "pa55word".to_string(),
                security_question: "City?".to_string(),
                security_answer: "Pune".to_string(),
            },
        )
        .await
        .unwrap();
        login(repo, "ravi", "pa55word").await.unwrap()
    }

    #[tokio::test]
    async fn add_normalises_symbol_case() {
        let repo = InMemoryRepository::new();
        let session = logged_in(&repo).await;
        let catalog = StockCatalog::standard();

        assert!(add_to_watchlist(&repo, &catalog, &session, "tcs").await.unwrap());
        assert!(!add_to_watchlist(&repo, &catalog, &session, "TCS").await.unwrap());
        assert_eq!(watchlist(&repo, &session).await.unwrap(), vec!["TCS"]);
    }

    #[tokio::test]
    async fn add_rejects_symbol_outside_catalog() {
        let repo = InMemoryRepository::new();
        let session = logged_in(&repo).await;

        let result = add_to_watchlist(&repo, &StockCatalog::standard(), &session, "NFLX").await;

        assert_eq!(
            result,
            Err(ServiceError::Market(MarketError::UnknownSymbol("NFLX".to_string())))
        );
    }

    #[tokio::test]
    async fn remove_reports_whether_symbol_was_listed() {
        let repo = InMemoryRepository::new();
        let session = logged_in(&repo).await;
        let catalog = StockCatalog::standard();
        add_to_watchlist(&repo, &catalog, &session, "INFY").await.unwrap();
        add_to_watchlist(&repo, &catalog, &session, "MSFT").await.unwrap();

        assert!(remove_from_watchlist(&repo, &session, "infy").await.unwrap());
        assert!(!remove_from_watchlist(&repo, &session, "INFY").await.unwrap());
        assert_eq!(watchlist(&repo, &session).await.unwrap(), vec!["MSFT"]);
    }
}
