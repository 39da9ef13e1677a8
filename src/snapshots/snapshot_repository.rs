use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::Result;
use crate::schema::portfolio_snapshots;
use crate::schema::portfolio_snapshots::dsl::*;
use crate::snapshots::snapshot_model::{PortfolioSnapshot, PortfolioSnapshotDb};
use crate::snapshots::snapshot_traits::SnapshotRepositoryTrait;

pub struct SnapshotRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl SnapshotRepositoryTrait for SnapshotRepository {
    fn save_snapshot(&self, snapshot: &PortfolioSnapshot) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let db_model = PortfolioSnapshotDb::from(snapshot.clone());
        diesel::insert_into(portfolio_snapshots::table)
            .values(&db_model)
            .execute(&mut conn)?;
        debug!(
            "Persisted snapshot {} (equity {})",
            snapshot.id, snapshot.equity_balance
        );
        Ok(())
    }

    fn get_snapshot_on_date(
        &self,
        input_portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let row = portfolio_snapshots
            .filter(portfolio_id.eq(input_portfolio_id))
            .filter(snapshot_date.eq(date))
            .first::<PortfolioSnapshotDb>(&mut conn)
            .optional()?;
        Ok(row.map(PortfolioSnapshot::from))
    }

    fn get_latest_snapshot_before(
        &self,
        input_portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let row = portfolio_snapshots
            .filter(portfolio_id.eq(input_portfolio_id))
            .filter(snapshot_date.lt(date))
            .order(snapshot_date.desc())
            .first::<PortfolioSnapshotDb>(&mut conn)
            .optional()?;
        Ok(row.map(PortfolioSnapshot::from))
    }

    fn get_latest_snapshot_date(&self, input_portfolio_id: &str) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let result: Option<Option<NaiveDate>> = portfolio_snapshots
            .filter(portfolio_id.eq(input_portfolio_id))
            .select(diesel::dsl::max(snapshot_date))
            .first::<Option<NaiveDate>>(&mut conn)
            .optional()?;
        Ok(result.flatten())
    }

    fn get_earliest_snapshot(
        &self,
        input_portfolio_id: &str,
    ) -> Result<Option<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let row = portfolio_snapshots
            .filter(portfolio_id.eq(input_portfolio_id))
            .order(snapshot_date.asc())
            .first::<PortfolioSnapshotDb>(&mut conn)
            .optional()?;
        Ok(row.map(PortfolioSnapshot::from))
    }

    fn get_snapshots_in_range(
        &self,
        input_portfolio_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = portfolio_snapshots
            .filter(portfolio_id.eq(input_portfolio_id))
            .order(snapshot_date.asc())
            .into_boxed();

        if let Some(start) = start_date {
            query = query.filter(snapshot_date.ge(start));
        }
        if let Some(end) = end_date {
            query = query.filter(snapshot_date.le(end));
        }

        let rows = query.load::<PortfolioSnapshotDb>(&mut conn)?;
        Ok(rows.into_iter().map(PortfolioSnapshot::from).collect())
    }

    fn get_latest_snapshots(
        &self,
        portfolio_ids: &[String],
    ) -> Result<HashMap<String, PortfolioSnapshot>> {
        if portfolio_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let mut results = HashMap::new();

        for input_portfolio_id in portfolio_ids {
            let latest = portfolio_snapshots
                .filter(portfolio_id.eq(input_portfolio_id))
                .order(snapshot_date.desc())
                .first::<PortfolioSnapshotDb>(&mut conn)
                .optional()?;
            if let Some(row) = latest {
                results.insert(input_portfolio_id.clone(), PortfolioSnapshot::from(row));
            }
        }

        Ok(results)
    }

    fn delete_snapshot_for_date(
        &self,
        input_portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        let deleted = diesel::delete(
            portfolio_snapshots
                .filter(portfolio_id.eq(input_portfolio_id))
                .filter(snapshot_date.eq(date)),
        )
        .execute(&mut conn)?;
        if deleted > 0 {
            debug!(
                "Deleted snapshot for {} on {} ahead of recompute",
                input_portfolio_id, date
            );
        }
        Ok(deleted)
    }
}
