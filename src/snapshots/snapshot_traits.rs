use chrono::NaiveDate;
use std::collections::HashMap;

use crate::errors::Result;
use crate::snapshots::snapshot_model::PortfolioSnapshot;

pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Inserts a new ledger row. The unique (portfolio, date) index makes a
    /// second insert for the same date a hard error, by design.
    fn save_snapshot(&self, snapshot: &PortfolioSnapshot) -> Result<()>;

    fn get_snapshot_on_date(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioSnapshot>>;

    /// Most recent snapshot strictly before `date`; the rollforward seed.
    fn get_latest_snapshot_before(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioSnapshot>>;

    fn get_latest_snapshot_date(&self, portfolio_id: &str) -> Result<Option<NaiveDate>>;

    /// The first snapshot ever taken; anchors cumulative P&L.
    fn get_earliest_snapshot(&self, portfolio_id: &str) -> Result<Option<PortfolioSnapshot>>;

    fn get_snapshots_in_range(
        &self,
        portfolio_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PortfolioSnapshot>>;

    fn get_latest_snapshots(
        &self,
        portfolio_ids: &[String],
    ) -> Result<HashMap<String, PortfolioSnapshot>>;

    /// Removes the row for one date so it can be regenerated. The only
    /// sanctioned mutation of the ledger.
    fn delete_snapshot_for_date(&self, portfolio_id: &str, date: NaiveDate) -> Result<usize>;
}
