use chrono::NaiveDate;
use dashmap::DashMap;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::constants::MAX_PRICE_LOOKBACK_DAYS;
use crate::market_data::market_data_errors::Result;
use crate::market_data::market_data_model::Quote;
use crate::market_data::market_data_traits::{MarketDataRepositoryTrait, PriceResolverTrait};

/// Resolves the best-known closing price for (symbol, date) from the quote
/// store, walking back up to `MAX_PRICE_LOOKBACK_DAYS` when the exact date is
/// missing. Repeated lookups within a batch run hit an in-process memo.
pub struct PriceResolver {
    repository: Arc<dyn MarketDataRepositoryTrait>,
    memo: DashMap<(String, NaiveDate), Option<Quote>>,
}

impl PriceResolver {
    pub fn new(repository: Arc<dyn MarketDataRepositoryTrait>) -> Self {
        Self {
            repository,
            memo: DashMap::new(),
        }
    }
}

impl PriceResolverTrait for PriceResolver {
    fn resolve_price(&self, symbol: &str, date: NaiveDate) -> Result<Option<Quote>> {
        let key = (symbol.to_string(), date);
        if let Some(cached) = self.memo.get(&key) {
            return Ok(cached.value().clone());
        }

        let resolved =
            self.repository
                .get_latest_quote_at_or_before(symbol, date, MAX_PRICE_LOOKBACK_DAYS)?;
        if resolved.is_none() {
            debug!("No price resolvable for {} at or before {}", symbol, date);
        }
        self.memo.insert(key, resolved.clone());
        Ok(resolved)
    }

    fn resolve_prices(
        &self,
        symbols: &HashSet<String>,
        date: NaiveDate,
    ) -> Result<HashMap<String, Quote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let mut resolved: HashMap<String, Quote> = HashMap::new();
        let mut misses: HashSet<String> = HashSet::new();
        for sym in symbols {
            match self.memo.get(&(sym.clone(), date)) {
                Some(entry) => {
                    if let Some(quote) = entry.value() {
                        resolved.insert(sym.clone(), quote.clone());
                    }
                }
                None => {
                    misses.insert(sym.clone());
                }
            }
        }

        if !misses.is_empty() {
            let fetched = self.repository.get_latest_quotes_at_or_before(
                &misses,
                date,
                MAX_PRICE_LOOKBACK_DAYS,
            )?;
            for sym in &misses {
                let quote = fetched.get(sym).cloned();
                self.memo.insert((sym.clone(), date), quote.clone());
                if let Some(quote) = quote {
                    resolved.insert(sym.clone(), quote);
                }
            }
        }

        Ok(resolved)
    }
}
