use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// A deduction category with its statutory cap in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deduction {
    pub code: &'static str,
    pub cap: Decimal,
    pub description: &'static str,
}

const STANDARD_DEDUCTIONS: &[Deduction] = &[
    Deduction {
        code: "80C",
        cap: dec!(150000),
        description: "Investments (PPF, ELSS, life insurance premiums)",
    },
    Deduction {
        code: "80D",
        cap: dec!(25000),
        description: "Health insurance premiums",
    },
    Deduction {
        code: "80E",
        cap: dec!(50000),
        description: "Interest on education loans",
    },
];

/// Read-only mapping from deduction code to capped amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeductionCatalog {
    deductions: &'static [Deduction],
}

impl DeductionCatalog {
    /// The fixed catalog: 80C, 80D and 80E.
    pub const fn standard() -> Self {
        Self {
            deductions: STANDARD_DEDUCTIONS,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Deduction> + '_ {
        self.deductions.iter()
    }

    /// Looks up a code exactly as listed (`80C`, not `80c`).
    pub fn get(
        &self,
        code: &str,
    ) -> Option<&'static Deduction> {
        self.deductions.iter().find(|d| d.code == code)
    }

    pub fn contains(
        &self,
        code: &str,
    ) -> bool {
        self.get(code).is_some()
    }

    /// Capped amount for `code`, or zero when the code is not in the catalog.
    pub fn amount(
        &self,
        code: &str,
    ) -> Decimal {
        self.get(code).map_or(Decimal::ZERO, |d| d.cap)
    }
}

impl Default for DeductionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
