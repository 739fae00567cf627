use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{TaxComputationResult, TaxRegime};

/// Separator used when a record's deduction codes are flattened to text.
pub const DEDUCTION_SEPARATOR: char = '+';

/// One line of a user's append-only tax ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRecord {
    pub id: i64,
    pub username: String,
    pub date: NaiveDate,
    pub income: Decimal,
    pub regime: TaxRegime,
    pub deductions: Vec<String>,
    pub taxable_income: Decimal,
    pub base_tax: Decimal,
    pub cess: Decimal,
    pub final_tax: Decimal,
}

/// For appending new ledger lines (no id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxRecord {
    pub username: String,
    pub date: NaiveDate,
    pub income: Decimal,
    pub regime: TaxRegime,
    pub deductions: Vec<String>,
    pub taxable_income: Decimal,
    pub base_tax: Decimal,
    pub cess: Decimal,
    pub final_tax: Decimal,
}

impl NewTaxRecord {
    /// Builds a ledger line from a computation, storing the truncated
    /// rupee amounts.
    pub fn from_computation(
        username: impl Into<String>,
        date: NaiveDate,
        income: Decimal,
        deductions: Vec<String>,
        result: &TaxComputationResult,
    ) -> Self {
        let shown = result.truncated();
        Self {
            username: username.into(),
            date,
            income,
            regime: result.regime,
            deductions,
            taxable_income: shown.taxable_income,
            base_tax: shown.base_tax,
            cess: shown.cess,
            final_tax: shown.final_tax,
        }
    }

    pub fn with_id(
        self,
        id: i64,
    ) -> TaxRecord {
        TaxRecord {
            id,
            username: self.username,
            date: self.date,
            income: self.income,
            regime: self.regime,
            deductions: self.deductions,
            taxable_income: self.taxable_income,
            base_tax: self.base_tax,
            cess: self.cess,
            final_tax: self.final_tax,
        }
    }
}

/// Joins deduction codes with [`DEDUCTION_SEPARATOR`].
pub fn join_deductions(codes: &[String]) -> String {
    codes.join(&DEDUCTION_SEPARATOR.to_string())
}

/// Inverse of [`join_deductions`]; empty input yields no codes.
pub fn split_deductions(joined: &str) -> Vec<String> {
    joined
        .split(DEDUCTION_SEPARATOR)
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}
