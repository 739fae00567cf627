use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Income-tax regime chosen by the taxpayer.
///
/// The old regime permits itemised deductions and uses four marginal bands;
/// the new regime ignores deductions and uses six.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxRegime {
    Old,
    New,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised tax regime '{0}' (expected 'old' or 'new')")]
pub struct ParseRegimeError(pub String);

impl TaxRegime {
    pub fn all() -> &'static [TaxRegime] {
        &[TaxRegime::Old, TaxRegime::New]
    }

    /// Short identifier used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
        }
    }

    /// Human-readable label, also the value written to legacy ledger files.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Old => "Old Regime",
            Self::New => "New Regime",
        }
    }

    pub fn allows_deductions(&self) -> bool {
        matches!(self, Self::Old)
    }
}

impl FromStr for TaxRegime {
    type Err = ParseRegimeError;

    /// Accepts the short form (`old`, `new`) or the label (`Old Regime`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "old" | "old regime" => Ok(Self::Old),
            "new" | "new regime" => Ok(Self::New),
            _ => Err(ParseRegimeError(s.to_string())),
        }
    }
}

impl fmt::Display for TaxRegime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}
