use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::DECIMAL_PRECISION;
use crate::valuation::Valuation;

/// A holding in a portfolio. `quantity` is signed; negative means short.
///
/// `last_price`, `market_value` and `unrealized_pnl` are cached by the daily
/// valuation pass and are only ever written together through
/// [`Position::apply_valuation`]. There are no independent setters, so the
/// pair can never drift apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub portfolio_id: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_date: NaiveDate,
    pub multiplier: i32,
    pub last_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub priced_at: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub is_deleted: bool,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// `quantity x entry_price x multiplier`, signed.
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.entry_price * Decimal::from(self.multiplier)
    }

    /// Open as of `date`: entered on or before it and not exited before it.
    pub fn is_open_as_of(&self, date: NaiveDate) -> bool {
        !self.is_deleted
            && self.entry_date <= date
            && self.exit_date.map_or(true, |exit| exit >= date)
    }

    /// Writes the cached valuation fields as one unit.
    pub fn apply_valuation(&mut self, price: Decimal, valuation: &Valuation, as_of: NaiveDate) {
        self.last_price = Some(price);
        self.market_value = Some(valuation.market_value);
        self.unrealized_pnl = Some(valuation.unrealized_pnl);
        self.priced_at = Some(as_of);
        self.updated_at = Utc::now();
    }

    /// True when the cached fields do not reflect `date`'s close.
    pub fn is_stale_as_of(&self, date: NaiveDate) -> bool {
        self.priced_at.map_or(true, |priced| priced < date)
    }
}

#[derive(Debug, Clone, Queryable, QueryableByName, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PositionDb {
    pub id: String,
    pub portfolio_id: String,
    pub symbol: String,
    pub quantity: String,
    pub entry_price: String,
    pub entry_date: NaiveDate,
    pub multiplier: i32,
    pub last_price: Option<String>,
    pub market_value: Option<String>,
    pub unrealized_pnl: Option<String>,
    pub priced_at: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub is_deleted: bool,
    pub updated_at: String,
}

impl From<PositionDb> for Position {
    fn from(db: PositionDb) -> Self {
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            symbol: db.symbol,
            quantity: Decimal::from_str(&db.quantity).unwrap_or_default(),
            entry_price: Decimal::from_str(&db.entry_price).unwrap_or_default(),
            entry_date: db.entry_date,
            multiplier: db.multiplier,
            last_price: db.last_price.and_then(|v| Decimal::from_str(&v).ok()),
            market_value: db.market_value.and_then(|v| Decimal::from_str(&v).ok()),
            unrealized_pnl: db.unrealized_pnl.and_then(|v| Decimal::from_str(&v).ok()),
            priced_at: db.priced_at,
            exit_date: db.exit_date,
            is_deleted: db.is_deleted,
            updated_at: DateTime::parse_from_rfc3339(&db.updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<Position> for PositionDb {
    fn from(domain: Position) -> Self {
        Self {
            id: domain.id,
            portfolio_id: domain.portfolio_id,
            symbol: domain.symbol,
            quantity: domain.quantity.round_dp(DECIMAL_PRECISION).to_string(),
            entry_price: domain.entry_price.round_dp(DECIMAL_PRECISION).to_string(),
            entry_date: domain.entry_date,
            multiplier: domain.multiplier,
            last_price: domain
                .last_price
                .map(|v| v.round_dp(DECIMAL_PRECISION).to_string()),
            market_value: domain
                .market_value
                .map(|v| v.round_dp(DECIMAL_PRECISION).to_string()),
            unrealized_pnl: domain
                .unrealized_pnl
                .map(|v| v.round_dp(DECIMAL_PRECISION).to_string()),
            priced_at: domain.priced_at,
            exit_date: domain.exit_date,
            is_deleted: domain.is_deleted,
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }
}
