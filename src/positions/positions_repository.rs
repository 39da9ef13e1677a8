use chrono::{NaiveDate, Utc};
use diesel::connection::Connection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::DECIMAL_PRECISION;
use crate::db::get_connection;
use crate::errors::Result;
use crate::positions::positions_model::{Position, PositionDb};
use crate::positions::positions_traits::PositionRepositoryTrait;
use crate::schema::positions;
use crate::schema::positions::dsl::*;

pub struct PositionRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl PositionRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl PositionRepositoryTrait for PositionRepository {
    fn get_open_positions_as_of(
        &self,
        input_portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = positions
            .filter(portfolio_id.eq(input_portfolio_id))
            .filter(is_deleted.eq(false))
            .filter(entry_date.le(date))
            .filter(exit_date.is_null().or(exit_date.ge(date)))
            .order(symbol.asc())
            .load::<PositionDb>(&mut conn)?;
        Ok(rows.into_iter().map(Position::from).collect())
    }

    fn get_positions_for_portfolio(&self, input_portfolio_id: &str) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = positions
            .filter(portfolio_id.eq(input_portfolio_id))
            .filter(is_deleted.eq(false))
            .order(symbol.asc())
            .load::<PositionDb>(&mut conn)?;
        Ok(rows.into_iter().map(Position::from).collect())
    }

    fn get_open_symbols(
        &self,
        portfolio_ids: &[String],
        date: NaiveDate,
    ) -> Result<HashSet<String>> {
        if portfolio_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let symbols: Vec<String> = positions
            .filter(portfolio_id.eq_any(portfolio_ids))
            .filter(is_deleted.eq(false))
            .filter(entry_date.le(date))
            .filter(exit_date.is_null().or(exit_date.ge(date)))
            .select(symbol)
            .distinct()
            .load::<String>(&mut conn)?;
        Ok(symbols.into_iter().collect())
    }

    fn create_position(&self, position: Position) -> Result<Position> {
        let mut conn = get_connection(&self.pool)?;
        let db_model = PositionDb::from(position);
        let inserted = diesel::insert_into(positions::table)
            .values(&db_model)
            .get_result::<PositionDb>(&mut conn)?;
        Ok(Position::from(inserted))
    }

    fn close_position(&self, position_id: &str, exit: NaiveDate) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        diesel::update(positions.filter(id.eq(position_id)))
            .set((
                exit_date.eq(Some(exit)),
                updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn save_valuations(&self, revalued: &[Position]) -> Result<()> {
        if revalued.is_empty() {
            return Ok(());
        }
        let mut conn = get_connection(&self.pool)?;
        debug!("Persisting valuations for {} positions", revalued.len());

        conn.transaction::<_, diesel::result::Error, _>(|tx_conn| {
            for position in revalued {
                diesel::update(positions.filter(id.eq(&position.id)))
                    .set((
                        last_price.eq(position
                            .last_price
                            .map(|v| v.round_dp(DECIMAL_PRECISION).to_string())),
                        market_value.eq(position
                            .market_value
                            .map(|v| v.round_dp(DECIMAL_PRECISION).to_string())),
                        unrealized_pnl.eq(position
                            .unrealized_pnl
                            .map(|v| v.round_dp(DECIMAL_PRECISION).to_string())),
                        priced_at.eq(position.priced_at),
                        updated_at.eq(position.updated_at.to_rfc3339()),
                    ))
                    .execute(tx_conn)?;
            }
            Ok(())
        })?;

        Ok(())
    }
}
