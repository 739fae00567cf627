use std::io::Write;

use finance_core::{TaxRecord, join_deductions};

use crate::loader::{ImportError, LegacyLedgerRow};

/// Writes tax ledgers in the legacy `tax_<username>.csv` layout, so an
/// export can be fed back to [`crate::LegacyImporter`].
pub struct LedgerExporter;

impl LedgerExporter {
    pub fn row(record: &TaxRecord) -> LegacyLedgerRow {
        LegacyLedgerRow {
            date: record.date,
            income: record.income,
            regime: record.regime.label().to_string(),
            deductions: join_deductions(&record.deductions),
            taxable: record.taxable_income,
            base_tax: record.base_tax,
            cess: record.cess,
            final_tax: record.final_tax,
        }
    }

    /// Returns the number of rows written. The header is written even when
    /// `records` is empty.
    pub fn write_csv<W: Write>(
        records: &[TaxRecord],
        writer: W,
    ) -> Result<usize, ImportError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record([
            "Date",
            "Income",
            "Regime",
            "Deductions",
            "Taxable",
            "Base Tax",
            "Cess",
            "Final Tax",
        ])?;
        for record in records {
            csv_writer.serialize(Self::row(record))?;
        }
        csv_writer.flush().map_err(|source| ImportError::Io {
            path: "<export>".into(),
            source,
        })?;

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use finance_core::TaxRegime;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::LegacyImporter;

    fn record() -> TaxRecord {
        TaxRecord {
            id: 7,
            username: "asha".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            income: dec!(800000),
            regime: TaxRegime::Old,
            deductions: vec!["80C".to_string(), "80D".to_string()],
            taxable_income: dec!(625000),
            base_tax: dec!(37500),
            cess: dec!(1500),
            final_tax: dec!(39000),
        }
    }

    #[test]
    fn test_write_csv_legacy_layout() {
        let mut out = Vec::new();

        let written = LedgerExporter::write_csv(&[record()], &mut out).unwrap();

        assert_eq!(written, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Date,Income,Regime,Deductions,Taxable,Base Tax,Cess,Final Tax\n\
             2024-04-01,800000,Old Regime,80C+80D,625000,37500,1500,39000\n"
        );
    }

    #[test]
    fn test_write_csv_empty_ledger_has_header() {
        let mut out = Vec::new();

        LedgerExporter::write_csv(&[], &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Date,Income,Regime,Deductions,Taxable,Base Tax,Cess,Final Tax\n"
        );
    }

    #[test]
    fn test_export_can_be_reimported() {
        let mut out = Vec::new();
        LedgerExporter::write_csv(&[record()], &mut out).unwrap();

        let parsed = LegacyImporter::parse_ledger("asha", out.as_slice()).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].clone().with_id(7), record());
    }
}
