//! Common utility functions for tax calculations.

use rust_decimal::Decimal;

/// Returns `value`, or zero when it is negative.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(1250.50)), dec!(1250.50));
/// assert_eq!(non_negative(dec!(-40)), dec!(0));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Truncates toward zero to whole rupees. Fractions are dropped, never
/// rounded.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_core::calculations::common::truncate_rupees;
///
/// assert_eq!(truncate_rupees(dec!(1700.99)), dec!(1700));
/// assert_eq!(truncate_rupees(dec!(-3.7)), dec!(-3));
/// ```
pub fn truncate_rupees(value: Decimal) -> Decimal {
    value.trunc()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // non_negative tests
    // =========================================================================

    #[test]
    fn non_negative_keeps_positive_values() {
        assert_eq!(non_negative(dec!(100.00)), dec!(100.00));
    }

    #[test]
    fn non_negative_keeps_zero() {
        assert_eq!(non_negative(dec!(0)), dec!(0));
    }

    #[test]
    fn non_negative_clamps_negative_values() {
        assert_eq!(non_negative(dec!(-0.01)), Decimal::ZERO);
    }

    // =========================================================================
    // truncate_rupees tests
    // =========================================================================

    #[test]
    fn truncate_rupees_drops_fraction_below_midpoint() {
        assert_eq!(truncate_rupees(dec!(42500.49)), dec!(42500));
    }

    #[test]
    fn truncate_rupees_does_not_round_up_at_midpoint() {
        assert_eq!(truncate_rupees(dec!(42500.5)), dec!(42500));
    }

    #[test]
    fn truncate_rupees_does_not_round_up_above_midpoint() {
        assert_eq!(truncate_rupees(dec!(42500.99)), dec!(42500));
    }

    #[test]
    fn truncate_rupees_preserves_whole_values() {
        assert_eq!(truncate_rupees(dec!(1400)), dec!(1400));
    }
}
