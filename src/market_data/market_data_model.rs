use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::DECIMAL_PRECISION;
use crate::market_data::market_data_constants::DATA_SOURCE_PROVIDER;

/// One closing price for (symbol, date).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub symbol: String,
    pub quote_date: NaiveDate,
    pub close: Decimal,
    pub data_source: String,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    pub fn quote_id(symbol: &str, date: NaiveDate) -> String {
        format!("{}_{}", symbol, date.format("%Y-%m-%d"))
    }

    pub fn new(symbol: &str, date: NaiveDate, close: Decimal) -> Self {
        Self {
            id: Self::quote_id(symbol, date),
            symbol: symbol.to_string(),
            quote_date: date,
            close,
            data_source: DATA_SOURCE_PROVIDER.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Queryable, QueryableByName, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::quotes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct QuoteDb {
    pub id: String,
    pub symbol: String,
    pub quote_date: NaiveDate,
    pub close: String,
    pub data_source: String,
    pub created_at: String,
}

impl From<QuoteDb> for Quote {
    fn from(db: QuoteDb) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            quote_date: db.quote_date,
            close: Decimal::from_str(&db.close).unwrap_or_default(),
            data_source: db.data_source,
            created_at: DateTime::parse_from_rfc3339(&db.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<Quote> for QuoteDb {
    fn from(domain: Quote) -> Self {
        Self {
            id: domain.id,
            symbol: domain.symbol,
            quote_date: domain.quote_date,
            close: domain.close.round_dp(DECIMAL_PRECISION).to_string(),
            data_source: domain.data_source,
            created_at: domain.created_at.to_rfc3339(),
        }
    }
}
