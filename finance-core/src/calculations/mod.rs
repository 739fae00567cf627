//! Tax calculation for the old and new Indian income-tax regimes.
//!
//! [`slabs`] holds the two marginal-rate schedules; [`engine`] applies
//! deductions and cess on top of them.

pub mod common;
pub mod engine;
pub mod slabs;

pub use engine::{CESS_RATE, TaxEngine, compute_final_tax};
pub use slabs::{NEW_REGIME_SLABS, OLD_REGIME_THRESHOLDS, Slab, new_regime_tax, old_regime_tax};
