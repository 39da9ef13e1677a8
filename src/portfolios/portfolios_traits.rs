use crate::errors::Result;
use crate::portfolios::portfolios_model::Portfolio;

pub trait PortfolioRepositoryTrait: Send + Sync {
    fn get_active_portfolios(&self) -> Result<Vec<Portfolio>>;
    fn get_portfolios_by_ids(&self, ids: &[String]) -> Result<Vec<Portfolio>>;
    fn get_portfolio_by_id(&self, portfolio_id: &str) -> Result<Portfolio>;
    fn create_portfolio(&self, portfolio: Portfolio) -> Result<Portfolio>;
}
