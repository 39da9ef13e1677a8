use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::Result;
use crate::portfolios::portfolios_model::{Portfolio, PortfolioDb};
use crate::portfolios::portfolios_traits::PortfolioRepositoryTrait;
use crate::schema::portfolios;
use crate::schema::portfolios::dsl::*;

pub struct PortfolioRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl PortfolioRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl PortfolioRepositoryTrait for PortfolioRepository {
    fn get_active_portfolios(&self) -> Result<Vec<Portfolio>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = portfolios
            .filter(is_active.eq(true))
            .order(id.asc())
            .load::<PortfolioDb>(&mut conn)?;
        Ok(rows.into_iter().map(Portfolio::from).collect())
    }

    fn get_portfolios_by_ids(&self, ids: &[String]) -> Result<Vec<Portfolio>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let rows = portfolios
            .filter(id.eq_any(ids))
            .order(id.asc())
            .load::<PortfolioDb>(&mut conn)?;
        Ok(rows.into_iter().map(Portfolio::from).collect())
    }

    fn get_portfolio_by_id(&self, portfolio_id: &str) -> Result<Portfolio> {
        let mut conn = get_connection(&self.pool)?;
        let row = portfolios
            .filter(id.eq(portfolio_id))
            .first::<PortfolioDb>(&mut conn)?;
        Ok(Portfolio::from(row))
    }

    fn create_portfolio(&self, portfolio: Portfolio) -> Result<Portfolio> {
        let mut conn = get_connection(&self.pool)?;
        let db_model = PortfolioDb::from(portfolio);
        let inserted = diesel::insert_into(portfolios::table)
            .values(&db_model)
            .get_result::<PortfolioDb>(&mut conn)?;
        Ok(Portfolio::from(inserted))
    }
}
