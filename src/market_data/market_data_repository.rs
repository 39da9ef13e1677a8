use chrono::{Duration, NaiveDate};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::constants::QUOTE_INSERT_CHUNK_SIZE;
use crate::market_data::market_data_errors::Result;
use crate::market_data::market_data_model::{Quote, QuoteDb};
use crate::market_data::market_data_traits::MarketDataRepositoryTrait;
use crate::schema::quotes;
use crate::schema::quotes::dsl::*;

pub struct MarketDataRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl MarketDataRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl MarketDataRepositoryTrait for MarketDataRepository {
    fn get_quote(&self, input_symbol: &str, date: NaiveDate) -> Result<Option<Quote>> {
        let mut conn = self.pool.get()?;
        let row = quotes
            .filter(symbol.eq(input_symbol))
            .filter(quote_date.eq(date))
            .first::<QuoteDb>(&mut conn)
            .optional()?;
        Ok(row.map(Quote::from))
    }

    fn get_latest_quote_at_or_before(
        &self,
        input_symbol: &str,
        date: NaiveDate,
        lookback_days: i64,
    ) -> Result<Option<Quote>> {
        let mut conn = self.pool.get()?;
        let window_start = date - Duration::days(lookback_days);
        let row = quotes
            .filter(symbol.eq(input_symbol))
            .filter(quote_date.le(date))
            .filter(quote_date.ge(window_start))
            .order(quote_date.desc())
            .first::<QuoteDb>(&mut conn)
            .optional()?;
        Ok(row.map(Quote::from))
    }

    fn get_latest_quotes_at_or_before(
        &self,
        symbols: &HashSet<String>,
        date: NaiveDate,
        lookback_days: i64,
    ) -> Result<HashMap<String, Quote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get()?;
        let window_start = date - Duration::days(lookback_days);
        let symbol_list: Vec<&String> = symbols.iter().collect();

        // Single range query per (portfolio, date); newest row per symbol
        // wins in the fold below.
        let rows = quotes
            .filter(symbol.eq_any(symbol_list))
            .filter(quote_date.le(date))
            .filter(quote_date.ge(window_start))
            .order((symbol.asc(), quote_date.asc()))
            .load::<QuoteDb>(&mut conn)?;

        let mut latest: HashMap<String, Quote> = HashMap::new();
        for row in rows {
            let quote = Quote::from(row);
            match latest.get(&quote.symbol) {
                Some(existing) if existing.quote_date >= quote.quote_date => {}
                _ => {
                    latest.insert(quote.symbol.clone(), quote);
                }
            }
        }
        Ok(latest)
    }

    fn save_quotes(&self, new_quotes: &[Quote]) -> Result<()> {
        if new_quotes.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get()?;
        conn.transaction::<_, diesel::result::Error, _>(|tx_conn| {
            for chunk in new_quotes.chunks(QUOTE_INSERT_CHUNK_SIZE) {
                let db_models: Vec<QuoteDb> =
                    chunk.iter().cloned().map(QuoteDb::from).collect();
                diesel::replace_into(quotes::table)
                    .values(&db_models)
                    .execute(tx_conn)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn get_quotes_for_symbol(&self, input_symbol: &str) -> Result<Vec<Quote>> {
        let mut conn = self.pool.get()?;
        let rows = quotes
            .filter(symbol.eq(input_symbol))
            .order(quote_date.asc())
            .load::<QuoteDb>(&mut conn)?;
        Ok(rows.into_iter().map(Quote::from).collect())
    }
}
