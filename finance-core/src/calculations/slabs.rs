//! Marginal-rate slab schedules for the old and new regimes.
//!
//! # Old regime
//!
//! | Taxable income            | Rate |
//! |---------------------------|------|
//! | up to 2,50,000            | 0%   |
//! | 2,50,000 – 5,00,000       | 5%   |
//! | 5,00,000 – 10,00,000      | 20%  |
//! | above 10,00,000           | 30%  |
//!
//! # New regime
//!
//! | Income                    | Rate |
//! |---------------------------|------|
//! | up to 3,00,000            | 0%   |
//! | 3,00,000 – 6,00,000       | 5%   |
//! | 6,00,000 – 9,00,000       | 10%  |
//! | 9,00,000 – 12,00,000      | 15%  |
//! | 12,00,000 – 15,00,000     | 20%  |
//! | above 15,00,000           | 30%  |
//!
//! Income exactly at a boundary is taxed wholly at the lower band's rate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculations::common::non_negative;

/// A band of the new-regime schedule. `upper` is `None` for the top band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slab {
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

/// Old-regime thresholds, highest first, with the rate applied above each.
pub const OLD_REGIME_THRESHOLDS: [(Decimal, Decimal); 3] = [
    (dec!(1000000), dec!(0.30)),
    (dec!(500000), dec!(0.20)),
    (dec!(250000), dec!(0.05)),
];

/// New-regime slabs in ascending order.
pub const NEW_REGIME_SLABS: [Slab; 6] = [
    Slab {
        upper: Some(dec!(300000)),
        rate: dec!(0),
    },
    Slab {
        upper: Some(dec!(600000)),
        rate: dec!(0.05),
    },
    Slab {
        upper: Some(dec!(900000)),
        rate: dec!(0.10),
    },
    Slab {
        upper: Some(dec!(1200000)),
        rate: dec!(0.15),
    },
    Slab {
        upper: Some(dec!(1500000)),
        rate: dec!(0.20),
    },
    Slab {
        upper: None,
        rate: dec!(0.30),
    },
];

/// Tax under the old regime on income already reduced by deductions.
///
/// Works top-down: the slice above each threshold is taxed at that band's
/// rate and the remainder is clamped to the threshold before moving on.
/// Negative input is treated as zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_core::calculations::old_regime_tax;
///
/// assert_eq!(old_regime_tax(dec!(650000)), dec!(42500));
/// ```
pub fn old_regime_tax(taxable_income: Decimal) -> Decimal {
    let mut remaining = non_negative(taxable_income);
    let mut tax = Decimal::ZERO;

    for (threshold, rate) in OLD_REGIME_THRESHOLDS {
        if remaining > threshold {
            tax += (remaining - threshold) * rate;
            remaining = threshold;
        }
    }

    tax
}

/// Tax under the new regime. Deductions never apply here.
///
/// Walks the slabs in ascending order; every slab the income passes is
/// taxed in full, the slab containing the income is taxed on the part up to
/// the income, and the walk stops there. Negative input is treated as zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_core::calculations::new_regime_tax;
///
/// assert_eq!(new_regime_tax(dec!(800000)), dec!(35000));
/// ```
pub fn new_regime_tax(income: Decimal) -> Decimal {
    let income = non_negative(income);
    let mut tax = Decimal::ZERO;
    let mut previous = Decimal::ZERO;

    for slab in NEW_REGIME_SLABS {
        match slab.upper {
            Some(upper) if income > upper => {
                tax += (upper - previous) * slab.rate;
                previous = upper;
            }
            _ => {
                tax += (income - previous) * slab.rate;
                break;
            }
        }
    }

    tax
}
