//! Plain-text rendering for command output.

use std::io::{self, Write};

use finance_core::market::{PriceHistory, StockCatalog};
use finance_core::{DeductionCatalog, Page, TaxComputationResult, TaxRecord, join_deductions};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::utils::rupees;

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

const HISTORY_HEADERS: [&str; 8] = [
    "Date",
    "Income",
    "Regime",
    "Deductions",
    "Taxable",
    "Base Tax",
    "Cess",
    "Final Tax",
];

/// One bar per point, scaled between the series' low and high. A flat
/// series renders at mid height.
pub fn sparkline(points: &[Decimal]) -> String {
    let (Some(low), Some(high)) = (points.iter().min(), points.iter().max()) else {
        return String::new();
    };
    let span = *high - *low;
    let top = Decimal::from(SPARK_BARS.len() - 1);

    points
        .iter()
        .map(|p| {
            if span.is_zero() {
                return SPARK_BARS[SPARK_BARS.len() / 2];
            }
            let scaled = ((*p - *low) / span * top).round();
            let index = scaled.to_usize().unwrap_or(0);
            SPARK_BARS[index.min(SPARK_BARS.len() - 1)]
        })
        .collect()
}

pub fn write_tax_result<W: Write>(
    out: &mut W,
    result: &TaxComputationResult,
) -> io::Result<()> {
    let shown = result.truncated();
    writeln!(out, "Regime:         {}", result.regime)?;
    writeln!(out, "Taxable Income: {}", rupees(shown.taxable_income))?;
    writeln!(out, "Base Tax:       {}", rupees(shown.base_tax))?;
    writeln!(out, "Cess (4%):      {}", rupees(shown.cess))?;
    writeln!(out, "Final Tax:      {}", rupees(shown.final_tax))
}

fn history_row(record: &TaxRecord) -> [String; 8] {
    let deductions = if record.deductions.is_empty() {
        "-".to_string()
    } else {
        join_deductions(&record.deductions)
    };
    [
        record.date.to_string(),
        rupees(record.income),
        record.regime.label().to_string(),
        deductions,
        rupees(record.taxable_income),
        rupees(record.base_tax),
        rupees(record.cess),
        rupees(record.final_tax),
    ]
}

/// A column-aligned ledger page with a position footer.
pub fn write_history<W: Write>(
    out: &mut W,
    page: &Page<TaxRecord>,
) -> io::Result<()> {
    if page.total == 0 {
        return writeln!(out, "No tax calculations recorded yet.");
    }

    let rows: Vec<[String; 8]> = page.items.iter().map(history_row).collect();
    let mut widths = HISTORY_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = HISTORY_HEADERS.iter().map(|h| h.to_string()).collect();
    write_row(out, &header, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(out, &rule, &widths)?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }

    if page.items.is_empty() {
        writeln!(out, "(no records on this page)")?;
    }
    write!(
        out,
        "Page {} of {} ({} records)",
        page.page,
        page.total_pages(),
        page.total
    )?;
    if page.has_next() {
        write!(out, ", next: --page {}", page.page + 1)?;
    }
    writeln!(out)
}

fn write_row<W: Write>(
    out: &mut W,
    cells: &[String],
    widths: &[usize],
) -> io::Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    writeln!(out, "{}", line.join(" | ").trim_end())
}

pub fn write_deductions<W: Write>(
    out: &mut W,
    catalog: &DeductionCatalog,
) -> io::Result<()> {
    writeln!(out, "Deductions (Old Regime only):")?;
    for deduction in catalog.iter() {
        writeln!(
            out,
            "  {:<4} up to {:<9} {}",
            deduction.code,
            rupees(deduction.cap),
            deduction.description
        )?;
    }
    Ok(())
}

pub fn write_stock_list<W: Write>(
    out: &mut W,
    catalog: &StockCatalog,
) -> io::Result<()> {
    for stock in catalog.iter() {
        writeln!(out, "{:<6} base {}", stock.symbol, rupees(stock.base_price))?;
    }
    Ok(())
}

pub fn write_price_history<W: Write>(
    out: &mut W,
    history: &PriceHistory,
) -> io::Result<()> {
    let points: Vec<String> = history.points.iter().map(|p| p.to_string()).collect();
    writeln!(out, "{}", history.symbol)?;
    writeln!(out, "  {}", sparkline(&history.points))?;
    writeln!(out, "  History: {}", points.join(" "))?;
    if let (Some(current), Some(low), Some(high)) =
        (history.current(), history.low(), history.high())
    {
        writeln!(
            out,
            "  Current Price: {}  (low {}, high {})",
            rupees(current),
            rupees(low),
            rupees(high)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use finance_core::{PageRequest, TaxRegime};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn record(id: i64) -> TaxRecord {
        TaxRecord {
            id,
            username: "asha".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            income: dec!(800000),
            regime: TaxRegime::Old,
            deductions: vec!["80C".to_string()],
            taxable_income: dec!(650000),
            base_tax: dec!(42500),
            cess: dec!(1700),
            final_tax: dec!(44200),
        }
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn sparkline_spans_low_to_high() {
        assert_eq!(sparkline(&[dec!(1), dec!(8)]), "▁█");
        assert_eq!(sparkline(&[dec!(115), dec!(120), dec!(125)]), "▁▅█");
    }

    #[test]
    fn sparkline_flat_and_empty() {
        assert_eq!(sparkline(&[dec!(5), dec!(5)]), "▅▅");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn tax_result_shows_truncated_amounts() {
        let result = TaxComputationResult {
            regime: TaxRegime::New,
            taxable_income: dec!(800000),
            base_tax: dec!(35000),
            cess: dec!(1400),
            final_tax: dec!(36400),
        };

        let text = render(|out| write_tax_result(out, &result));

        assert_eq!(
            text,
            "Regime:         New Regime\n\
             Taxable Income: ₹800000\n\
             Base Tax:       ₹35000\n\
             Cess (4%):      ₹1400\n\
             Final Tax:      ₹36400\n"
        );
    }

    #[test]
    fn history_table_and_footer() {
        let all: Vec<TaxRecord> = (1..=3).map(record).collect();
        let page = Page::from_slice(&all, PageRequest::new(1, 2));

        let text = render(|out| write_history(out, &page));
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Date"));
        assert!(lines[0].contains("Final Tax"));
        assert!(lines[2].contains("Old Regime"));
        assert!(lines[2].contains("₹44200"));
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "Page 1 of 2 (3 records), next: --page 2");
    }

    #[test]
    fn empty_history() {
        let page: Page<TaxRecord> = Page::from_slice(&[], PageRequest::default());

        let text = render(|out| write_history(out, &page));

        assert_eq!(text, "No tax calculations recorded yet.\n");
    }

    #[test]
    fn deductions_listing() {
        let text = render(|out| write_deductions(out, &DeductionCatalog::standard()));

        assert!(text.contains("80C"));
        assert!(text.contains("₹150000"));
        assert!(text.contains("Interest on education loans"));
    }

    #[test]
    fn price_history_summary() {
        let history = PriceHistory {
            symbol: "TCS",
            points: vec![dec!(90), dec!(100), dec!(95)],
        };

        let text = render(|out| write_price_history(out, &history));

        assert!(text.starts_with("TCS\n"));
        assert!(text.contains("History: 90 100 95"));
        assert!(text.contains("Current Price: ₹95  (low ₹90, high ₹100)"));
    }
}
