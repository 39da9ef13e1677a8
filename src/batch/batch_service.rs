//! Daily batch orchestration.
//!
//! ```text
//! BatchOrchestrator
//!       │
//!       ├─► TradingCalendar (date adjustment, backfill worklist)
//!       ├─► MetadataSyncer / QuoteCollector / FundamentalsCollector (collaborators)
//!       ├─► AssetService (symbol-universe registration, tag restore)
//!       ├─► PositionValuationService (cached field refresh)
//!       ├─► PnlService (equity rollforward + snapshot persistence)
//!       └─► AnalyticsRunner (downstream, last)
//! ```
//!
//! Phases execute in the fixed order of [`PHASE_PIPELINE`]. Dates replay
//! oldest-first and strictly sequentially per portfolio, because each date's equity
//! seed is the previous date's persisted snapshot. Portfolios are independent
//! for a given date and fan out concurrently under a semaphore sized to the
//! database-connection budget.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::assets::AssetServiceTrait;
use crate::batch::batch_model::{BatchRun, PhaseKind, PhaseOutcome, PhaseStatus, RunSummary};
use crate::batch::batch_phases::{FailurePolicy, PHASE_PIPELINE};
use crate::batch::batch_traits::{
    AnalyticsRunnerTrait, BatchOrchestratorTrait, FundamentalsCollectorTrait, FundamentalsOutcome,
    MetadataSyncerTrait, QuoteCollectorTrait,
};
use crate::calendar::TradingCalendar;
use crate::errors::{Error, Result, ValidationError};
use crate::pnl::PnlServiceTrait;
use crate::portfolios::{Portfolio, PortfolioRepositoryTrait};
use crate::positions::PositionRepositoryTrait;
use crate::snapshots::SnapshotRepositoryTrait;
use crate::valuation::PositionValuationServiceTrait;

/// External suppliers the pipeline drives but does not implement.
#[derive(Clone)]
pub struct BatchCollaborators {
    pub metadata_syncer: Arc<dyn MetadataSyncerTrait>,
    pub quote_collector: Arc<dyn QuoteCollectorTrait>,
    pub fundamentals_collector: Arc<dyn FundamentalsCollectorTrait>,
    pub analytics_runner: Arc<dyn AnalyticsRunnerTrait>,
}

pub struct BatchOrchestrator {
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    position_repository: Arc<dyn PositionRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    asset_service: Arc<dyn AssetServiceTrait>,
    valuation_service: Arc<dyn PositionValuationServiceTrait>,
    pnl_service: Arc<dyn PnlServiceTrait>,
    collaborators: BatchCollaborators,
    calendar: Arc<TradingCalendar>,
    max_concurrent_portfolios: usize,
}

impl BatchOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        position_repository: Arc<dyn PositionRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        asset_service: Arc<dyn AssetServiceTrait>,
        valuation_service: Arc<dyn PositionValuationServiceTrait>,
        pnl_service: Arc<dyn PnlServiceTrait>,
        collaborators: BatchCollaborators,
        calendar: Arc<TradingCalendar>,
        max_concurrent_portfolios: usize,
    ) -> Self {
        Self {
            portfolio_repository,
            position_repository,
            snapshot_repository,
            asset_service,
            valuation_service,
            pnl_service,
            collaborators,
            calendar,
            max_concurrent_portfolios: max_concurrent_portfolios.max(1),
        }
    }

    /// Runs every unprocessed trading day for one portfolio, oldest first.
    ///
    /// A fatal failure on one date stops this portfolio's remaining dates
    /// (the next date's seed would be missing) but never touches other
    /// portfolios.
    async fn process_portfolio(
        &self,
        portfolio: &Portfolio,
        target_date: NaiveDate,
        recompute: bool,
        single_date: bool,
        run: &BatchRun,
    ) {
        let dates = if single_date {
            Ok(vec![target_date])
        } else {
            self.backfill_dates(&portfolio.id, target_date)
        };
        let dates = match dates {
            Ok(dates) => dates,
            Err(e) => {
                error!(
                    "Could not determine work dates for {}: {}",
                    portfolio.id, e
                );
                self.record_unit_failure(run, &portfolio.id, target_date, &e.to_string());
                return;
            }
        };

        if dates.is_empty() {
            debug!(
                "Portfolio {} already snapshotted through {}",
                portfolio.id, target_date
            );
            return;
        }
        if dates.len() > 1 {
            info!(
                "Backfilling {} trading days for {} ({} .. {})",
                dates.len(),
                portfolio.id,
                dates[0],
                target_date
            );
        }

        let final_date = dates[dates.len() - 1];
        for date in dates {
            let is_final = date == final_date;
            if !self.process_unit(portfolio, date, is_final, recompute, run).await {
                warn!(
                    "Abandoning remaining dates for {} after failure on {}",
                    portfolio.id, date
                );
                break;
            }
        }
    }

    /// Trading days this portfolio still needs, oldest first. Bootstrap
    /// portfolios (no snapshot yet) start at the target date itself.
    fn backfill_dates(&self, portfolio_id: &str, target_date: NaiveDate) -> Result<Vec<NaiveDate>> {
        match self
            .snapshot_repository
            .get_latest_snapshot_date(portfolio_id)?
        {
            Some(last) => Ok(self.calendar.trading_days_between(last, target_date)),
            None => {
                if self.calendar.is_trading_day(target_date) {
                    Ok(vec![target_date])
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    /// Executes the phase pipeline for one (portfolio, date). Returns false
    /// when a fatal phase failed and the unit was abandoned.
    async fn process_unit(
        &self,
        portfolio: &Portfolio,
        date: NaiveDate,
        is_final_date: bool,
        recompute: bool,
        run: &BatchRun,
    ) -> bool {
        debug!(
            "Processing {} for {} (final date: {})",
            portfolio.id, date, is_final_date
        );
        let mut unit_partial = false;

        for descriptor in PHASE_PIPELINE {
            if descriptor.final_date_only && !is_final_date {
                continue;
            }

            let started = Instant::now();
            let result = self
                .execute_phase(descriptor.kind, portfolio, date, recompute, unit_partial)
                .await;
            let duration = started.elapsed();

            match result {
                Ok(status) => {
                    if status == PhaseStatus::CompletedPartial {
                        unit_partial = true;
                    }
                    run.record(PhaseOutcome {
                        phase: descriptor.kind,
                        portfolio_id: portfolio.id.clone(),
                        date,
                        status,
                        error: None,
                        duration,
                    });
                }
                Err(e) => {
                    run.record(PhaseOutcome {
                        phase: descriptor.kind,
                        portfolio_id: portfolio.id.clone(),
                        date,
                        status: PhaseStatus::Failed,
                        error: Some(e.to_string()),
                        duration,
                    });
                    match descriptor.failure_policy {
                        FailurePolicy::Tolerated => {
                            warn!(
                                "Phase {} failed for {} on {} (continuing): {}",
                                descriptor.name, portfolio.id, date, e
                            );
                            unit_partial = true;
                        }
                        FailurePolicy::Fatal => {
                            error!(
                                "Phase {} failed for {} on {}; no ledger row written: {}",
                                descriptor.name, portfolio.id, date, e
                            );
                            return false;
                        }
                    }
                }
            }
        }

        true
    }

    async fn execute_phase(
        &self,
        kind: PhaseKind,
        portfolio: &Portfolio,
        date: NaiveDate,
        recompute: bool,
        unit_partial: bool,
    ) -> Result<PhaseStatus> {
        let portfolio_ids = [portfolio.id.clone()];

        match kind {
            PhaseKind::MetadataSync => {
                let symbols = self.position_repository.get_open_symbols(&portfolio_ids, date)?;
                if symbols.is_empty() {
                    return Ok(PhaseStatus::Skipped);
                }
                let (profiles, failures) = self
                    .collaborators
                    .metadata_syncer
                    .sync_profiles(&symbols)
                    .await?;
                self.asset_service.apply_profiles(&profiles).await?;
                for (symbol, reason) in &failures {
                    warn!("Profile sync failed for {}: {}", symbol, reason);
                }
                Ok(if failures.is_empty() {
                    PhaseStatus::Completed
                } else {
                    PhaseStatus::CompletedPartial
                })
            }
            PhaseKind::MarketDataCollection => {
                let symbols = self.position_repository.get_open_symbols(&portfolio_ids, date)?;
                if symbols.is_empty() {
                    return Ok(PhaseStatus::Skipped);
                }
                let failures = self
                    .collaborators
                    .quote_collector
                    .collect_quotes(&symbols, date)
                    .await?;
                for (symbol, reason) in &failures {
                    // Unpriced symbols degrade downstream via the
                    // no-prior-price policy instead of aborting the run.
                    warn!("Quote collection failed for {} on {}: {}", symbol, date, reason);
                }
                Ok(if failures.is_empty() {
                    PhaseStatus::Completed
                } else {
                    PhaseStatus::CompletedPartial
                })
            }
            PhaseKind::UniverseRegistration => {
                // Required on every entry path; downstream per-symbol
                // analytics assume the registry is complete.
                let symbols = self.position_repository.get_open_symbols(&portfolio_ids, date)?;
                self.asset_service.ensure_assets_registered(&symbols).await?;
                Ok(PhaseStatus::Completed)
            }
            PhaseKind::FundamentalsCollection => {
                let symbols = self.position_repository.get_open_symbols(&portfolio_ids, date)?;
                if symbols.is_empty() {
                    return Ok(PhaseStatus::Skipped);
                }
                match self
                    .collaborators
                    .fundamentals_collector
                    .collect_fundamentals(&symbols, date)
                    .await?
                {
                    FundamentalsOutcome::Collected(count) => {
                        debug!("Collected fundamentals for {} symbols", count);
                        Ok(PhaseStatus::Completed)
                    }
                    FundamentalsOutcome::Skipped(reason) => {
                        debug!("Fundamentals collection skipped: {}", reason);
                        Ok(PhaseStatus::Skipped)
                    }
                }
            }
            PhaseKind::PositionValuation => {
                let outcome = self
                    .valuation_service
                    .revalue_portfolio(&portfolio.id, date)
                    .await?;
                Ok(if outcome.is_complete() {
                    PhaseStatus::Completed
                } else {
                    PhaseStatus::CompletedPartial
                })
            }
            PhaseKind::SnapshotCreation => {
                self.pnl_service
                    .compute_and_persist(&portfolio.id, date, recompute, unit_partial)
                    .await?;
                Ok(PhaseStatus::Completed)
            }
            PhaseKind::CategoryRestore => {
                self.asset_service.restore_category_tags().await?;
                Ok(PhaseStatus::Completed)
            }
            PhaseKind::Analytics => {
                self.collaborators
                    .analytics_runner
                    .run_analytics(&portfolio.id, date)
                    .await?;
                Ok(PhaseStatus::Completed)
            }
        }
    }

    /// The ledger row for this unit was not produced; surface that as a hard
    /// failure in the run summary.
    fn record_unit_failure(&self, run: &BatchRun, portfolio_id: &str, date: NaiveDate, error: &str) {
        run.record(PhaseOutcome {
            phase: PhaseKind::SnapshotCreation,
            portfolio_id: portfolio_id.to_string(),
            date,
            status: PhaseStatus::Failed,
            error: Some(error.to_string()),
            duration: std::time::Duration::ZERO,
        });
    }

    async fn process_portfolios(
        &self,
        portfolios: Vec<Portfolio>,
        target_date: NaiveDate,
        recompute: bool,
        single_date: bool,
        run: Arc<BatchRun>,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_portfolios));

        stream::iter(portfolios)
            .map(|portfolio| {
                let run = run.clone();
                let semaphore = semaphore.clone();
                async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return,
                    };
                    self.process_portfolio(&portfolio, target_date, recompute, single_date, &run)
                        .await;
                }
            })
            .buffer_unordered(self.max_concurrent_portfolios)
            .collect::<Vec<()>>()
            .await;
    }

    fn finish(run: Arc<BatchRun>) -> Result<RunSummary> {
        let run = Arc::try_unwrap(run)
            .map_err(|_| Error::Batch("run context still shared after completion".to_string()))?;
        let summary = run.summarize();
        info!(
            "Batch run {} for {} finished: {:?} ({} phase outcomes)",
            summary.run_id,
            summary.target_date,
            summary.status,
            summary.outcomes.len()
        );
        Ok(summary)
    }
}

#[async_trait]
impl BatchOrchestratorTrait for BatchOrchestrator {
    async fn run_daily_batch(
        &self,
        requested_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<RunSummary> {
        let target_date = self.calendar.adjust_to_valid_date(requested_date, now);
        if target_date != requested_date {
            info!(
                "Adjusted requested date {} to {} (closed session or market still open)",
                requested_date, target_date
            );
        }

        let portfolios = self.portfolio_repository.get_active_portfolios()?;
        info!(
            "Starting daily batch for {} across {} portfolios",
            target_date,
            portfolios.len()
        );

        let run = Arc::new(BatchRun::new(target_date));
        self.process_portfolios(portfolios, target_date, false, false, run.clone())
            .await;
        Self::finish(run)
    }

    async fn run_for_date(
        &self,
        portfolio_ids: &[String],
        date: NaiveDate,
        recompute: bool,
    ) -> Result<RunSummary> {
        if !self.calendar.is_trading_day(date) {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "{} is not a trading day",
                date
            ))));
        }

        let portfolios = self.portfolio_repository.get_portfolios_by_ids(portfolio_ids)?;
        info!(
            "Replaying {} for {} portfolios (recompute: {})",
            date,
            portfolios.len(),
            recompute
        );

        let run = Arc::new(BatchRun::new(date));
        self.process_portfolios(portfolios, date, recompute, true, run.clone())
            .await;
        Self::finish(run)
    }
}
