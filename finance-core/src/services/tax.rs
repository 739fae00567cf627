use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::ServiceError;
use crate::calculations::TaxEngine;
use crate::db::TaxLedger;
use crate::models::{NewTaxRecord, Page, PageRequest, Session, TaxComputationResult, TaxRecord, TaxRegime};

/// A validated calculator submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxRequest {
    pub income: Decimal,
    pub regime: TaxRegime,
    pub deductions: Vec<String>,
}

/// Computes the tax for `request` and appends it to the session user's
/// ledger.
///
/// The selected deduction codes are recorded as submitted, including under
/// the new regime where they do not affect the result.
pub async fn calculate_tax<R>(
    repo: &R,
    engine: &TaxEngine,
    session: &Session,
    request: TaxRequest,
    date: NaiveDate,
) -> Result<(TaxComputationResult, TaxRecord), ServiceError>
where
    R: TaxLedger + ?Sized,
{
    if request.income < Decimal::ZERO {
        return Err(ServiceError::Validation(
            "income must not be negative".to_string(),
        ));
    }

    let result = engine.compute(request.income, request.regime, &request.deductions);
    let record = NewTaxRecord::from_computation(
        session.username(),
        date,
        request.income,
        request.deductions,
        &result,
    );
    let record = repo.append_record(record).await?;

    info!(
        username = session.username(),
        record_id = record.id,
        regime = request.regime.as_str(),
        final_tax = %record.final_tax,
        "tax calculation recorded"
    );

    Ok((result, record))
}

/// A page of the session user's ledger, oldest first.
pub async fn tax_history<R>(
    repo: &R,
    session: &Session,
    page: PageRequest,
) -> Result<Page<TaxRecord>, ServiceError>
where
    R: TaxLedger + ?Sized,
{
    Ok(repo.list_records(session.username(), page).await?)
}
