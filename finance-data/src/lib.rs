pub mod export;
pub mod loader;

pub use export::LedgerExporter;
pub use loader::{ImportError, ImportSummary, LegacyImporter, LegacyLedgerRow, LegacyUserRow};
