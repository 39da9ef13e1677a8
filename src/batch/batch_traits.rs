use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;

use crate::assets::AssetProfile;
use crate::batch::batch_model::RunSummary;
use crate::errors::Result;

/// (symbol, reason) pairs for per-symbol degradations that do not abort a
/// phase.
pub type SymbolFailures = Vec<(String, String)>;

/// Company-profile refresh, supplied by the fundamental-data layer.
#[async_trait]
pub trait MetadataSyncerTrait: Send + Sync {
    async fn sync_profiles(
        &self,
        symbols: &HashSet<String>,
    ) -> Result<(Vec<AssetProfile>, SymbolFailures)>;
}

/// Fills the quote store for (symbols, date). Provider fallback, retries and
/// backoff all live behind this boundary.
#[async_trait]
pub trait QuoteCollectorTrait: Send + Sync {
    async fn collect_quotes(
        &self,
        symbols: &HashSet<String>,
        date: NaiveDate,
    ) -> Result<SymbolFailures>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundamentalsOutcome {
    Collected(usize),
    /// Not yet available, e.g. too soon after an earnings event.
    Skipped(String),
}

#[async_trait]
pub trait FundamentalsCollectorTrait: Send + Sync {
    async fn collect_fundamentals(
        &self,
        symbols: &HashSet<String>,
        date: NaiveDate,
    ) -> Result<FundamentalsOutcome>;
}

/// Downstream factor/correlation/stress analytics. Invoked last because it
/// reads the freshly reconciled positions and snapshot for the date.
#[async_trait]
pub trait AnalyticsRunnerTrait: Send + Sync {
    async fn run_analytics(&self, portfolio_id: &str, date: NaiveDate) -> Result<()>;
}

#[async_trait]
pub trait BatchOrchestratorTrait: Send + Sync {
    /// Scheduled entry point. Adjusts `requested_date` to a session with
    /// reliable closing data, backfills every unprocessed trading day since
    /// each portfolio's last snapshot, then processes the final date.
    async fn run_daily_batch(
        &self,
        requested_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<RunSummary>;

    /// Replays one date for specific portfolios. With `recompute`, existing
    /// snapshots for that date are deleted and regenerated.
    async fn run_for_date(
        &self,
        portfolio_ids: &[String],
        date: NaiveDate,
        recompute: bool,
    ) -> Result<RunSummary>;
}
