pub mod calculations;
pub mod credentials;
pub mod db;
pub mod market;
pub mod models;
pub mod services;

pub use calculations::TaxEngine;
pub use db::repository::{FinanceRepository, RepositoryError, TaxLedger, UserStore, Watchlist};
pub use models::*;
pub use services::ServiceError;
