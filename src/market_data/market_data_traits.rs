use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::market_data::market_data_errors::Result;
use crate::market_data::market_data_model::Quote;

pub trait MarketDataRepositoryTrait: Send + Sync {
    fn get_quote(&self, symbol: &str, date: NaiveDate) -> Result<Option<Quote>>;

    /// Most recent quote at or before `date`, bounded by `lookback_days`.
    fn get_latest_quote_at_or_before(
        &self,
        symbol: &str,
        date: NaiveDate,
        lookback_days: i64,
    ) -> Result<Option<Quote>>;

    /// Bulk variant of the above: one query covering every symbol, newest row
    /// per symbol wins.
    fn get_latest_quotes_at_or_before(
        &self,
        symbols: &HashSet<String>,
        date: NaiveDate,
        lookback_days: i64,
    ) -> Result<HashMap<String, Quote>>;

    fn save_quotes(&self, quotes: &[Quote]) -> Result<()>;

    fn get_quotes_for_symbol(&self, symbol: &str) -> Result<Vec<Quote>>;
}

/// Best-known closing price for (symbol, date). Wraps the quote store; never
/// calls external providers and never retries; gap filling is the
/// provider-facing collector's job.
pub trait PriceResolverTrait: Send + Sync {
    fn resolve_price(&self, symbol: &str, date: NaiveDate) -> Result<Option<Quote>>;

    fn resolve_prices(
        &self,
        symbols: &HashSet<String>,
        date: NaiveDate,
    ) -> Result<HashMap<String, Quote>>;
}
