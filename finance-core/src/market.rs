//! Simulated stock prices for the tracker and watchlist views.
//!
//! Prices are mock data: each point is the stock's base price plus a
//! uniform integer offset in `[-MAX_OFFSET, MAX_OFFSET]`.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

pub const HISTORY_POINTS: usize = 10;
pub const MAX_OFFSET: i64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("unknown stock symbol '{0}'")]
    UnknownSymbol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stock {
    pub symbol: &'static str,
    pub base_price: Decimal,
}

const STANDARD_STOCKS: &[Stock] = &[
    Stock {
        symbol: "AAPL",
        base_price: dec!(120),
    },
    Stock {
        symbol: "GOOGL",
        base_price: dec!(140),
    },
    Stock {
        symbol: "MSFT",
        base_price: dec!(110),
    },
    Stock {
        symbol: "TSLA",
        base_price: dec!(180),
    },
    Stock {
        symbol: "INFY",
        base_price: dec!(75),
    },
    Stock {
        symbol: "TCS",
        base_price: dec!(95),
    },
];

/// The fixed set of tradable symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockCatalog {
    stocks: &'static [Stock],
}

impl StockCatalog {
    pub const fn standard() -> Self {
        Self {
            stocks: STANDARD_STOCKS,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Stock> + '_ {
        self.stocks.iter()
    }

    /// Case-insensitive lookup.
    pub fn get(
        &self,
        symbol: &str,
    ) -> Result<&'static Stock, MarketError> {
        let symbol = symbol.trim();
        self.stocks
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| MarketError::UnknownSymbol(symbol.to_string()))
    }
}

impl Default for StockCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceHistory {
    pub symbol: &'static str,
    pub points: Vec<Decimal>,
}

impl PriceHistory {
    /// The most recent point.
    pub fn current(&self) -> Option<Decimal> {
        self.points.last().copied()
    }

    pub fn low(&self) -> Option<Decimal> {
        self.points.iter().min().copied()
    }

    pub fn high(&self) -> Option<Decimal> {
        self.points.iter().max().copied()
    }
}

/// Generates mock price histories from a caller-supplied RNG.
pub struct PriceSimulator<R> {
    catalog: StockCatalog,
    rng: R,
}

impl<R: Rng> PriceSimulator<R> {
    pub fn new(
        catalog: StockCatalog,
        rng: R,
    ) -> Self {
        Self { catalog, rng }
    }

    pub fn catalog(&self) -> &StockCatalog {
        &self.catalog
    }

    pub fn history(
        &mut self,
        symbol: &str,
    ) -> Result<PriceHistory, MarketError> {
        let stock = self.catalog.get(symbol)?;
        let points = (0..HISTORY_POINTS)
            .map(|_| stock.base_price + Decimal::from(self.rng.gen_range(-MAX_OFFSET..=MAX_OFFSET)))
            .collect();

        Ok(PriceHistory {
            symbol: stock.symbol,
            points,
        })
    }
}
