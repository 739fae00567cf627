mod deduction;
mod page;
mod regime;
mod session;
mod tax_computation;
mod tax_record;
mod user;

pub use deduction::{Deduction, DeductionCatalog};
pub use page::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use regime::{ParseRegimeError, TaxRegime};
pub use session::Session;
pub use tax_computation::TaxComputationResult;
pub use tax_record::{DEDUCTION_SEPARATOR, NewTaxRecord, TaxRecord, join_deductions, split_deductions};
pub use user::{NewUser, User};
