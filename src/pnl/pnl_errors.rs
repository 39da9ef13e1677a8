use chrono::NaiveDate;
use thiserror::Error;

/// Ledger-integrity failures. Fatal for the affected (portfolio, date) unit:
/// no snapshot row is written when one of these fires.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Cannot establish an equity seed for portfolio {0}")]
    SeedUnavailable(String),

    #[error("Snapshot already exists for portfolio {portfolio_id} on {date}")]
    DuplicateSnapshot {
        portfolio_id: String,
        date: NaiveDate,
    },

    #[error("No current price resolvable for {symbol} (portfolio {portfolio_id}) on {date}")]
    MissingCurrentPrice {
        portfolio_id: String,
        symbol: String,
        date: NaiveDate,
    },
}
