//! Operations behind every user-facing action.
//!
//! Functions are generic over the store traits they need, so they accept
//! a concrete backend or a `&dyn FinanceRepository` alike. Anything acting
//! on behalf of a user takes the [`Session`](crate::Session) issued by
//! [`login`].

mod accounts;
mod tax;
mod watchlist;

use thiserror::Error;

use crate::db::RepositoryError;
use crate::market::MarketError;

pub use accounts::{
    Registration, change_password, delete_account, login, normalize_answer, register,
    rename_account, reset_password, security_question,
};
pub use tax::{TaxRequest, calculate_tax, tax_history};
pub use watchlist::{add_to_watchlist, remove_from_watchlist, watchlist};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("incorrect security answer")]
    IncorrectAnswer,

    #[error("no account named '{0}'")]
    UnknownUser(String),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
