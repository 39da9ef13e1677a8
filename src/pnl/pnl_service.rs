use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use crate::calendar::TradingCalendar;
use crate::errors::Result;
use crate::market_data::PriceResolverTrait;
use crate::pnl::pnl_errors::LedgerError;
use crate::positions::{Position, PositionRepositoryTrait};
use crate::snapshots::{PortfolioSnapshot, SnapshotRepositoryTrait};
use crate::valuation::value_position;

#[async_trait]
pub trait PnlServiceTrait: Send + Sync {
    /// Computes the ledger record for (portfolio, date) without persisting it.
    async fn compute_snapshot(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        has_partial_data: bool,
    ) -> Result<PortfolioSnapshot>;

    /// Computes and persists. A snapshot already present for the date is a
    /// [`LedgerError::DuplicateSnapshot`] unless `recompute` is set, in which
    /// case the existing row is deleted first and the date regenerated.
    async fn compute_and_persist(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        recompute: bool,
        has_partial_data: bool,
    ) -> Result<PortfolioSnapshot>;
}

pub struct PnlService {
    position_repository: Arc<dyn PositionRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    price_resolver: Arc<dyn PriceResolverTrait>,
    calendar: Arc<TradingCalendar>,
}

impl PnlService {
    pub fn new(
        position_repository: Arc<dyn PositionRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        price_resolver: Arc<dyn PriceResolverTrait>,
        calendar: Arc<TradingCalendar>,
    ) -> Self {
        Self {
            position_repository,
            snapshot_repository,
            price_resolver,
            calendar,
        }
    }

    /// Daily P&L of one position between the prior session and `date`.
    ///
    /// When no prior price resolves (new position, first day of history, data
    /// gap) the current price stands in for it, pinning the day's P&L to
    /// zero. Substituting the entry price here would book the position's
    /// entire unrealized gain as one day's move.
    fn position_daily_pnl(
        position: &Position,
        current_price: Decimal,
        previous_price: Option<Decimal>,
    ) -> Decimal {
        let previous = previous_price.unwrap_or(current_price);
        (current_price - previous) * position.quantity * Decimal::from(position.multiplier)
    }
}

#[async_trait]
impl PnlServiceTrait for PnlService {
    async fn compute_snapshot(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        has_partial_data: bool,
    ) -> Result<PortfolioSnapshot> {
        let open_positions = self
            .position_repository
            .get_open_positions_as_of(portfolio_id, date)?;

        let symbols: HashSet<String> = open_positions
            .iter()
            .map(|p| p.symbol.clone())
            .collect();
        let previous_day = self.calendar.previous_trading_day(date);
        let current_prices = self.price_resolver.resolve_prices(&symbols, date)?;
        let previous_prices = self.price_resolver.resolve_prices(&symbols, previous_day)?;

        let prior_snapshot = self
            .snapshot_repository
            .get_latest_snapshot_before(portfolio_id, date)?;

        let mut long_value = Decimal::ZERO;
        let mut short_value = Decimal::ZERO;
        let mut portfolio_daily_pnl = Decimal::ZERO;

        for position in &open_positions {
            // A snapshot with unknown market value is worse than no snapshot.
            let current = current_prices.get(&position.symbol).ok_or_else(|| {
                LedgerError::MissingCurrentPrice {
                    portfolio_id: portfolio_id.to_string(),
                    symbol: position.symbol.clone(),
                    date,
                }
            })?;

            let valuation = value_position(position, current.close);
            if position.quantity >= Decimal::ZERO {
                long_value += valuation.market_value;
            } else {
                short_value += valuation.market_value;
            }

            if prior_snapshot.is_some() {
                let previous = previous_prices.get(&position.symbol).map(|q| q.close);
                if previous.is_none() {
                    debug!(
                        "No prior price for {} on {}; day contributes zero P&L",
                        position.symbol, previous_day
                    );
                }
                portfolio_daily_pnl +=
                    Self::position_daily_pnl(position, current.close, previous);
            }
        }

        let previous_equity = match &prior_snapshot {
            Some(snapshot) => snapshot.equity_balance,
            None => {
                // Bootstrap: actual capital deployed, not the user-declared
                // starting-capital figure (the difference is uninvested cash).
                let entry_costs: Decimal =
                    open_positions.iter().map(|p| p.cost_basis()).sum();
                info!(
                    "Bootstrapping equity for {} on {} from {} entry costs: {}",
                    portfolio_id,
                    date,
                    open_positions.len(),
                    entry_costs
                );
                portfolio_daily_pnl = Decimal::ZERO;
                entry_costs
            }
        };

        let equity_balance = previous_equity + portfolio_daily_pnl;

        let cumulative_pnl = match self.snapshot_repository.get_earliest_snapshot(portfolio_id)? {
            Some(first) if first.snapshot_date < date => {
                equity_balance - first.equity_balance
            }
            _ => Decimal::ZERO,
        };

        let daily_return = if previous_equity.is_zero() {
            Decimal::ZERO
        } else {
            portfolio_daily_pnl / previous_equity
        };

        Ok(PortfolioSnapshot {
            id: PortfolioSnapshot::snapshot_id(portfolio_id, date),
            portfolio_id: portfolio_id.to_string(),
            snapshot_date: date,
            equity_balance,
            daily_pnl: portfolio_daily_pnl,
            cumulative_pnl,
            daily_return,
            long_value,
            short_value,
            has_partial_data,
            calculated_at: Utc::now(),
        })
    }

    async fn compute_and_persist(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
        recompute: bool,
        has_partial_data: bool,
    ) -> Result<PortfolioSnapshot> {
        if let Some(existing) = self
            .snapshot_repository
            .get_snapshot_on_date(portfolio_id, date)?
        {
            if !recompute {
                return Err(LedgerError::DuplicateSnapshot {
                    portfolio_id: portfolio_id.to_string(),
                    date,
                }
                .into());
            }
            warn!(
                "Recomputing snapshot {}: deleting existing row before regeneration",
                existing.id
            );
            self.snapshot_repository
                .delete_snapshot_for_date(portfolio_id, date)?;
        }

        let snapshot = self
            .compute_snapshot(portfolio_id, date, has_partial_data)
            .await?;
        self.snapshot_repository.save_snapshot(&snapshot)?;
        Ok(snapshot)
    }
}
