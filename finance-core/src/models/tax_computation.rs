use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TaxRegime;

/// Outcome of a single tax computation.
///
/// Values are exact; `final_tax == base_tax + cess` and
/// `cess == base_tax * 4%` hold without rounding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationResult {
    pub regime: TaxRegime,
    pub taxable_income: Decimal,
    pub base_tax: Decimal,
    pub cess: Decimal,
    pub final_tax: Decimal,
}

impl TaxComputationResult {
    /// The amounts as the ledger stores and displays them: base tax, cess
    /// and final tax truncated toward zero to whole rupees. Taxable income
    /// is kept as computed.
    ///
    /// Each field is truncated on its own, so `final_tax` of the truncated
    /// view may exceed `base_tax + cess` of the same view by one rupee.
    pub fn truncated(&self) -> Self {
        Self {
            regime: self.regime,
            taxable_income: self.taxable_income,
            base_tax: self.base_tax.trunc(),
            cess: self.cess.trunc(),
            final_tax: self.final_tax.trunc(),
        }
    }
}
