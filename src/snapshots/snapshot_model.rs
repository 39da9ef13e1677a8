use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::DECIMAL_PRECISION;

/// One immutable ledger record per (portfolio, trading date).
///
/// Rows are append-only; recomputing a date means deleting the row and
/// regenerating it, never patching in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub id: String,
    pub portfolio_id: String,
    pub snapshot_date: NaiveDate,
    pub equity_balance: Decimal,
    pub daily_pnl: Decimal,
    pub cumulative_pnl: Decimal,
    pub daily_return: Decimal,
    pub long_value: Decimal,
    /// Aggregate market value of short positions; naturally negative.
    pub short_value: Decimal,
    pub has_partial_data: bool,
    pub calculated_at: DateTime<Utc>,
}

impl PortfolioSnapshot {
    pub fn snapshot_id(portfolio_id: &str, date: NaiveDate) -> String {
        format!("{}_{}", portfolio_id, date.format("%Y-%m-%d"))
    }

    pub fn total_market_value(&self) -> Decimal {
        self.long_value + self.short_value
    }

    /// Derived, not stored: positive = cash (buying power), negative = margin.
    pub fn cash_or_margin(&self) -> Decimal {
        self.equity_balance - self.total_market_value()
    }
}

#[derive(Debug, Clone, Queryable, QueryableByName, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::portfolio_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshotDb {
    pub id: String,
    pub portfolio_id: String,
    pub snapshot_date: NaiveDate,
    pub equity_balance: String,
    pub daily_pnl: String,
    pub cumulative_pnl: String,
    pub daily_return: String,
    pub long_value: String,
    pub short_value: String,
    pub has_partial_data: bool,
    pub calculated_at: String,
}

impl From<PortfolioSnapshotDb> for PortfolioSnapshot {
    fn from(db: PortfolioSnapshotDb) -> Self {
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            snapshot_date: db.snapshot_date,
            equity_balance: Decimal::from_str(&db.equity_balance).unwrap_or_default(),
            daily_pnl: Decimal::from_str(&db.daily_pnl).unwrap_or_default(),
            cumulative_pnl: Decimal::from_str(&db.cumulative_pnl).unwrap_or_default(),
            daily_return: Decimal::from_str(&db.daily_return).unwrap_or_default(),
            long_value: Decimal::from_str(&db.long_value).unwrap_or_default(),
            short_value: Decimal::from_str(&db.short_value).unwrap_or_default(),
            has_partial_data: db.has_partial_data,
            calculated_at: DateTime::parse_from_rfc3339(&db.calculated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<PortfolioSnapshot> for PortfolioSnapshotDb {
    fn from(domain: PortfolioSnapshot) -> Self {
        Self {
            id: domain.id,
            portfolio_id: domain.portfolio_id,
            snapshot_date: domain.snapshot_date,
            equity_balance: domain
                .equity_balance
                .round_dp(DECIMAL_PRECISION)
                .to_string(),
            daily_pnl: domain.daily_pnl.round_dp(DECIMAL_PRECISION).to_string(),
            cumulative_pnl: domain
                .cumulative_pnl
                .round_dp(DECIMAL_PRECISION)
                .to_string(),
            daily_return: domain.daily_return.round_dp(DECIMAL_PRECISION).to_string(),
            long_value: domain.long_value.round_dp(DECIMAL_PRECISION).to_string(),
            short_value: domain.short_value.round_dp(DECIMAL_PRECISION).to_string(),
            has_partial_data: domain.has_partial_data,
            calculated_at: domain.calculated_at.to_rfc3339(),
        }
    }
}
