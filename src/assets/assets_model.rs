use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assets::assets_constants::{INSTRUMENT_TYPE_EQUITY, INSTRUMENT_TYPE_OPTION};
use crate::constants::{DEFAULT_CONTRACT_MULTIPLIER, OPTION_CONTRACT_MULTIPLIER};

/// A registered symbol. Every symbol referenced by an open position must have
/// a row here before per-symbol analytics run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub sector_override: Option<String>,
    pub instrument_type: String,
    pub registered_at: DateTime<Utc>,
    pub profile_synced_at: Option<DateTime<Utc>>,
}

impl Asset {
    pub fn new_registration(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: None,
            sector: None,
            sector_override: None,
            instrument_type: INSTRUMENT_TYPE_EQUITY.to_string(),
            registered_at: Utc::now(),
            profile_synced_at: None,
        }
    }
}

/// Contract multiplier fixed at position-open time from the instrument type.
pub fn multiplier_for_instrument(instrument_type: &str) -> i32 {
    if instrument_type == INSTRUMENT_TYPE_OPTION {
        OPTION_CONTRACT_MULTIPLIER
    } else {
        DEFAULT_CONTRACT_MULTIPLIER
    }
}

/// Company profile delivered by the metadata-sync collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Queryable, QueryableByName, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct AssetDb {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub sector_override: Option<String>,
    pub instrument_type: String,
    pub registered_at: String,
    pub profile_synced_at: Option<String>,
}

impl From<AssetDb> for Asset {
    fn from(db: AssetDb) -> Self {
        Self {
            symbol: db.symbol,
            name: db.name,
            sector: db.sector,
            sector_override: db.sector_override,
            instrument_type: db.instrument_type,
            registered_at: DateTime::parse_from_rfc3339(&db.registered_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            profile_synced_at: db.profile_synced_at.and_then(|ts| {
                DateTime::parse_from_rfc3339(&ts)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
            }),
        }
    }
}

impl From<Asset> for AssetDb {
    fn from(domain: Asset) -> Self {
        Self {
            symbol: domain.symbol,
            name: domain.name,
            sector: domain.sector,
            sector_override: domain.sector_override,
            instrument_type: domain.instrument_type,
            registered_at: domain.registered_at.to_rfc3339(),
            profile_synced_at: domain.profile_synced_at.map(|ts| ts.to_rfc3339()),
        }
    }
}
