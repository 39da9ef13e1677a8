use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::Result;
use crate::market_data::PriceResolverTrait;
use crate::positions::{Position, PositionRepositoryTrait};
use crate::valuation::valuation_calculator::value_position;
use crate::valuation::valuation_model::RevaluationOutcome;

#[async_trait]
pub trait PositionValuationServiceTrait: Send + Sync {
    /// Revalues every open position of a portfolio against `date`'s resolved
    /// prices and persists the cached fields in one pass.
    async fn revalue_portfolio(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<RevaluationOutcome>;
}

#[derive(Clone)]
pub struct PositionValuationService {
    position_repository: Arc<dyn PositionRepositoryTrait>,
    price_resolver: Arc<dyn PriceResolverTrait>,
}

impl PositionValuationService {
    pub fn new(
        position_repository: Arc<dyn PositionRepositoryTrait>,
        price_resolver: Arc<dyn PriceResolverTrait>,
    ) -> Self {
        Self {
            position_repository,
            price_resolver,
        }
    }
}

#[async_trait]
impl PositionValuationServiceTrait for PositionValuationService {
    async fn revalue_portfolio(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<RevaluationOutcome> {
        let mut open_positions = self
            .position_repository
            .get_open_positions_as_of(portfolio_id, date)?;
        if open_positions.is_empty() {
            debug!("No open positions for {} on {}", portfolio_id, date);
            return Ok(RevaluationOutcome::default());
        }

        let symbols: HashSet<String> = open_positions
            .iter()
            .map(|p| p.symbol.clone())
            .collect();
        let prices = self.price_resolver.resolve_prices(&symbols, date)?;

        let mut outcome = RevaluationOutcome {
            total: open_positions.len(),
            ..Default::default()
        };
        let mut revalued: Vec<Position> = Vec::with_capacity(open_positions.len());

        for position in open_positions.iter_mut() {
            match prices.get(&position.symbol) {
                Some(quote) => {
                    let valuation = value_position(position, quote.close);
                    position.apply_valuation(quote.close, &valuation, quote.quote_date);
                    if quote.quote_date < date {
                        warn!(
                            "Valued {} against a {} quote (wanted {}); marking stale",
                            position.symbol, quote.quote_date, date
                        );
                        outcome.stale.push(position.symbol.clone());
                    }
                    revalued.push(position.clone());
                }
                None => {
                    // No fabricated values: the cached fields keep whatever
                    // the last successful pass wrote.
                    warn!(
                        "No resolvable price for {} on {}; leaving cached valuation untouched",
                        position.symbol, date
                    );
                    outcome.unpriced.push(position.symbol.clone());
                }
            }
        }

        outcome.revalued = revalued.len();
        self.position_repository.save_valuations(&revalued)?;

        debug!(
            "Revalued {}/{} positions for {} on {} ({} stale, {} unpriced)",
            outcome.revalued,
            outcome.total,
            portfolio_id,
            date,
            outcome.stale.len(),
            outcome.unpriced.len()
        );
        Ok(outcome)
    }
}
