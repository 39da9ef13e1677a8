use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::DECIMAL_PRECISION;

/// An account holding positions.
///
/// `starting_capital` is user-declared metadata. Actual capital deployed is
/// derived from entry costs; see the rollforward engine's bootstrap rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub starting_capital: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, QueryableByName, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::portfolios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDb {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub starting_capital: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<PortfolioDb> for Portfolio {
    fn from(db: PortfolioDb) -> Self {
        Self {
            id: db.id,
            name: db.name,
            currency: db.currency,
            starting_capital: Decimal::from_str(&db.starting_capital).unwrap_or_default(),
            is_active: db.is_active,
            created_at: DateTime::parse_from_rfc3339(&db.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<Portfolio> for PortfolioDb {
    fn from(domain: Portfolio) -> Self {
        Self {
            id: domain.id,
            name: domain.name,
            currency: domain.currency,
            starting_capital: domain
                .starting_capital
                .round_dp(DECIMAL_PRECISION)
                .to_string(),
            is_active: domain.is_active,
            created_at: domain.created_at.to_rfc3339(),
        }
    }
}
