use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string is not a usable annual income.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIncomeError {
    #[error("enter an income")]
    Empty,

    #[error("invalid income '{input}': {reason}")]
    NotANumber { input: String, reason: String },

    #[error("income must not be negative (got '{0}')")]
    Negative(String),
}

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses an annual income in rupees.
///
/// Handles comma as thousands separator, in either western (`"1,500,000"`)
/// or Indian (`"15,00,000"`) grouping. Empty, non-numeric and negative
/// input is rejected so the engine only ever sees a valid amount.
pub fn parse_income(s: &str) -> Result<Decimal, ParseIncomeError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Err(ParseIncomeError::Empty);
    }
    let income: Decimal = normalized.parse().map_err(|e: rust_decimal::Error| {
        tracing::debug!(input = %s, "invalid income: {}", e);
        ParseIncomeError::NotANumber {
            input: s.to_string(),
            reason: e.to_string(),
        }
    })?;
    if income < Decimal::ZERO {
        return Err(ParseIncomeError::Negative(s.trim().to_string()));
    }
    Ok(income)
}

/// Formats a rupee amount, dropping any trailing zero fraction.
pub fn rupees(amount: Decimal) -> String {
    format!("₹{}", amount.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_income_accepts_comma_thousands_separator() {
        assert_eq!(parse_income("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_income("15,00,000").unwrap(), dec!(1500000));
    }

    #[test]
    fn parse_income_trim_whitespace() {
        assert_eq!(parse_income("  800000  ").unwrap(), dec!(800000));
    }

    #[test]
    fn parse_income_rejects_empty() {
        assert_eq!(parse_income(""), Err(ParseIncomeError::Empty));
        assert_eq!(parse_income("   "), Err(ParseIncomeError::Empty));
    }

    #[test]
    fn parse_income_rejects_garbage() {
        assert!(matches!(
            parse_income("ten lakh"),
            Err(ParseIncomeError::NotANumber { .. })
        ));
    }

    #[test]
    fn parse_income_rejects_negative() {
        assert_eq!(
            parse_income("-5000"),
            Err(ParseIncomeError::Negative("-5000".to_string()))
        );
        assert_eq!(parse_income("-0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn rupees_strips_trailing_zeros() {
        assert_eq!(rupees(dec!(42500.00)), "₹42500");
        assert_eq!(rupees(dec!(1700.5)), "₹1700.5");
    }
}
