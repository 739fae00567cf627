//! Orchestrates a full tax computation: deductions, slab tax and cess.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use finance_core::TaxRegime;
//! use finance_core::calculations::TaxEngine;
//!
//! let engine = TaxEngine::default();
//! let result = engine.compute(dec!(800000), TaxRegime::Old, ["80C"]);
//!
//! assert_eq!(result.taxable_income, dec!(650000));
//! assert_eq!(result.base_tax, dec!(42500));
//! assert_eq!(result.cess, dec!(1700));
//! assert_eq!(result.final_tax, dec!(44200));
//! ```

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::calculations::common::non_negative;
use crate::calculations::slabs::{new_regime_tax, old_regime_tax};
use crate::models::{DeductionCatalog, TaxComputationResult, TaxRegime};

/// Health and education cess applied to the base tax.
pub const CESS_RATE: Decimal = dec!(0.04);

/// Stateless calculator bound to a deduction catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxEngine {
    catalog: DeductionCatalog,
}

impl TaxEngine {
    pub fn new(catalog: DeductionCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &DeductionCatalog {
        &self.catalog
    }

    /// Sum of the capped amounts for `codes`.
    ///
    /// Each category counts once however often it is listed. Codes missing
    /// from the catalog contribute nothing and are logged.
    pub fn deduction_total<I, S>(
        &self,
        codes: I,
    ) -> Decimal
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut total = Decimal::ZERO;

        for code in codes {
            let code = code.as_ref();
            match self.catalog.get(code) {
                Some(deduction) => {
                    if seen.insert(deduction.code) {
                        total += deduction.cap;
                    }
                }
                None => warn!(code, "ignoring unknown deduction code"),
            }
        }

        total
    }

    /// Computes taxable income, base tax, cess and final tax.
    ///
    /// Negative income is treated as zero. Under [`TaxRegime::New`] the
    /// selected deductions are ignored.
    pub fn compute<I, S>(
        &self,
        gross_income: Decimal,
        regime: TaxRegime,
        deductions: I,
    ) -> TaxComputationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if gross_income < Decimal::ZERO {
            warn!(%gross_income, "negative income clamped to zero");
        }
        let gross_income = non_negative(gross_income);

        let (taxable_income, base_tax) = match regime {
            TaxRegime::Old => {
                let deduction_total = self.deduction_total(deductions);
                let taxable = non_negative(gross_income - deduction_total);
                (taxable, old_regime_tax(taxable))
            }
            TaxRegime::New => (gross_income, new_regime_tax(gross_income)),
        };

        let cess = base_tax * CESS_RATE;
        let final_tax = base_tax + cess;

        debug!(
            regime = regime.as_str(),
            %taxable_income,
            %base_tax,
            %final_tax,
            "tax computed"
        );

        TaxComputationResult {
            regime,
            taxable_income,
            base_tax,
            cess,
            final_tax,
        }
    }
}

/// Convenience wrapper over [`TaxEngine::compute`] with the standard catalog.
pub fn compute_final_tax<I, S>(
    gross_income: Decimal,
    regime: TaxRegime,
    deductions: I,
) -> TaxComputationResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TaxEngine::default().compute(gross_income, regime, deductions)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const NONE: [&str; 0] = [];

    // =========================================================================
    // deduction_total tests
    // =========================================================================

    #[test]
    fn deduction_total_sums_all_categories() {
        let engine = TaxEngine::default();

        assert_eq!(engine.deduction_total(["80C", "80D", "80E"]), dec!(225000));
    }

    #[test]
    fn deduction_total_counts_repeated_code_once() {
        let engine = TaxEngine::default();

        assert_eq!(engine.deduction_total(["80C", "80C", "80D"]), dec!(175000));
    }

    #[test]
    fn deduction_codes_are_case_sensitive() {
        let engine = TaxEngine::default();

        assert_eq!(engine.deduction_total(["80c", "80d"]), Decimal::ZERO);
    }

    #[test]
    fn deduction_total_ignores_unknown_code() {
        let engine = TaxEngine::default();

        assert_eq!(engine.deduction_total(["80G", "80D"]), dec!(25000));
    }

    // =========================================================================
    // compute tests
    // =========================================================================

    #[test]
    fn old_regime_with_80c() {
        let result = compute_final_tax(dec!(800000), TaxRegime::Old, ["80C"]);

        assert_eq!(
            result,
            TaxComputationResult {
                regime: TaxRegime::Old,
                taxable_income: dec!(650000),
                base_tax: dec!(42500),
                cess: dec!(1700),
                final_tax: dec!(44200),
            }
        );
    }

    #[test]
    fn new_regime_ignores_deductions() {
        let result = compute_final_tax(dec!(800000), TaxRegime::New, ["80C", "80D", "80E"]);

        assert_eq!(result.taxable_income, dec!(800000));
        assert_eq!(result.base_tax, dec!(35000));
        assert_eq!(result.cess, dec!(1400));
        assert_eq!(result.final_tax, dec!(36400));
    }

    #[test]
    fn new_regime_same_result_with_or_without_deductions() {
        let with = compute_final_tax(dec!(1234567), TaxRegime::New, ["80C"]);
        let without = compute_final_tax(dec!(1234567), TaxRegime::New, NONE);

        assert_eq!(with, without);
    }

    #[test]
    fn unknown_deduction_does_not_fail_and_adds_nothing() {
        let with_unknown = compute_final_tax(dec!(800000), TaxRegime::Old, ["80C", "80Z"]);
        let known_only = compute_final_tax(dec!(800000), TaxRegime::Old, ["80C"]);

        assert_eq!(with_unknown, known_only);
    }

    #[test]
    fn deductions_larger_than_income_floor_at_zero() {
        let result = compute_final_tax(dec!(100000), TaxRegime::Old, ["80C", "80D", "80E"]);

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.final_tax, dec!(0));
    }

    #[test]
    fn negative_income_is_clamped() {
        let result = compute_final_tax(dec!(-500000), TaxRegime::New, NONE);

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.base_tax, dec!(0));
        assert_eq!(result.final_tax, dec!(0));
    }

    #[test]
    fn cess_is_exactly_four_percent() {
        for income in [dec!(260000), dec!(777777.77), dec!(1500000), dec!(3000001)] {
            for regime in TaxRegime::all() {
                let result = compute_final_tax(income, *regime, ["80D"]);

                assert_eq!(result.cess, result.base_tax * dec!(0.04));
                assert_eq!(result.final_tax, result.base_tax + result.cess);
                assert!(result.taxable_income >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn truncated_view_matches_ledger_values() {
        // base = 10000.05 * 0.05 = 500.0025, cess = 20.0001
        let result = compute_final_tax(dec!(260000.05), TaxRegime::Old, NONE);
        let shown = result.truncated();

        assert_eq!(shown.base_tax, dec!(500));
        assert_eq!(shown.cess, dec!(20));
        assert_eq!(shown.final_tax, dec!(520));
    }
}
