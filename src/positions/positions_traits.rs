use chrono::NaiveDate;
use std::collections::HashSet;

use crate::errors::Result;
use crate::positions::positions_model::Position;

pub trait PositionRepositoryTrait: Send + Sync {
    /// Positions open as of `date` for one portfolio.
    fn get_open_positions_as_of(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Position>>;

    fn get_positions_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<Position>>;

    /// Distinct symbols referenced by open positions across portfolios.
    fn get_open_symbols(
        &self,
        portfolio_ids: &[String],
        date: NaiveDate,
    ) -> Result<HashSet<String>>;

    fn create_position(&self, position: Position) -> Result<Position>;

    /// Logically closes a position; quantity is never mutated retroactively.
    fn close_position(&self, position_id: &str, exit: NaiveDate) -> Result<()>;

    /// Persists the cached valuation trio (plus `priced_at`) for each
    /// position in a single transaction. Partial updates of the trio are not
    /// expressible through this interface.
    fn save_valuations(&self, positions: &[Position]) -> Result<()>;
}
