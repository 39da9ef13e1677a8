use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::assets::{AssetProfile, AssetServiceTrait, Result as AssetResult};
use crate::batch::{
    AnalyticsRunnerTrait, BatchCollaborators, BatchOrchestrator, BatchOrchestratorTrait,
    FundamentalsCollectorTrait, FundamentalsOutcome, MetadataSyncerTrait, PhaseKind, PhaseStatus,
    QuoteCollectorTrait, RunStatus, SymbolFailures,
};
use crate::calendar::TradingCalendar;
use crate::errors::{Error, Result as AppResult};
use crate::market_data::{PriceResolverTrait, Quote, Result as MarketDataResult};
use crate::pnl::PnlService;
use crate::portfolios::{Portfolio, PortfolioRepositoryTrait};
use crate::positions::{Position, PositionRepositoryTrait};
use crate::snapshots::{PortfolioSnapshot, SnapshotRepositoryTrait};
use crate::valuation::PositionValuationService;

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockPortfolioRepository {
    portfolios: RwLock<Vec<Portfolio>>,
}

impl PortfolioRepositoryTrait for MockPortfolioRepository {
    fn get_active_portfolios(&self) -> AppResult<Vec<Portfolio>> {
        Ok(self
            .portfolios
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    fn get_portfolios_by_ids(&self, ids: &[String]) -> AppResult<Vec<Portfolio>> {
        Ok(self
            .portfolios
            .read()
            .unwrap()
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    fn get_portfolio_by_id(&self, portfolio_id: &str) -> AppResult<Portfolio> {
        self.portfolios
            .read()
            .unwrap()
            .iter()
            .find(|p| p.id == portfolio_id)
            .cloned()
            .ok_or_else(|| Error::Batch(format!("portfolio {} not found", portfolio_id)))
    }

    fn create_portfolio(&self, portfolio: Portfolio) -> AppResult<Portfolio> {
        self.portfolios.write().unwrap().push(portfolio.clone());
        Ok(portfolio)
    }
}

#[derive(Default)]
struct MockPositionRepository {
    positions: RwLock<Vec<Position>>,
}

impl PositionRepositoryTrait for MockPositionRepository {
    fn get_open_positions_as_of(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<Position>> {
        Ok(self
            .positions
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.portfolio_id == portfolio_id && p.is_open_as_of(date))
            .cloned()
            .collect())
    }

    fn get_positions_for_portfolio(&self, portfolio_id: &str) -> AppResult<Vec<Position>> {
        Ok(self
            .positions
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }

    fn get_open_symbols(
        &self,
        portfolio_ids: &[String],
        date: NaiveDate,
    ) -> AppResult<HashSet<String>> {
        Ok(self
            .positions
            .read()
            .unwrap()
            .iter()
            .filter(|p| portfolio_ids.contains(&p.portfolio_id) && p.is_open_as_of(date))
            .map(|p| p.symbol.clone())
            .collect())
    }

    fn create_position(&self, position: Position) -> AppResult<Position> {
        self.positions.write().unwrap().push(position.clone());
        Ok(position)
    }

    fn close_position(&self, position_id: &str, exit: NaiveDate) -> AppResult<()> {
        let mut positions = self.positions.write().unwrap();
        if let Some(position) = positions.iter_mut().find(|p| p.id == position_id) {
            position.exit_date = Some(exit);
        }
        Ok(())
    }

    fn save_valuations(&self, revalued: &[Position]) -> AppResult<()> {
        let mut positions = self.positions.write().unwrap();
        for updated in revalued {
            if let Some(position) = positions.iter_mut().find(|p| p.id == updated.id) {
                *position = updated.clone();
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct MockSnapshotRepository {
    snapshots: RwLock<Vec<PortfolioSnapshot>>,
}

impl SnapshotRepositoryTrait for MockSnapshotRepository {
    fn save_snapshot(&self, snapshot: &PortfolioSnapshot) -> AppResult<()> {
        let mut snapshots = self.snapshots.write().unwrap();
        if snapshots.iter().any(|s| {
            s.portfolio_id == snapshot.portfolio_id && s.snapshot_date == snapshot.snapshot_date
        }) {
            return Err(Error::Batch(format!(
                "unique constraint violated for {}",
                snapshot.id
            )));
        }
        snapshots.push(snapshot.clone());
        Ok(())
    }

    fn get_snapshot_on_date(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> AppResult<Option<PortfolioSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .unwrap()
            .iter()
            .find(|s| s.portfolio_id == portfolio_id && s.snapshot_date == date)
            .cloned())
    }

    fn get_latest_snapshot_before(
        &self,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> AppResult<Option<PortfolioSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.portfolio_id == portfolio_id && s.snapshot_date < date)
            .max_by_key(|s| s.snapshot_date)
            .cloned())
    }

    fn get_latest_snapshot_date(&self, portfolio_id: &str) -> AppResult<Option<NaiveDate>> {
        Ok(self
            .snapshots
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.portfolio_id == portfolio_id)
            .map(|s| s.snapshot_date)
            .max())
    }

    fn get_earliest_snapshot(&self, portfolio_id: &str) -> AppResult<Option<PortfolioSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.portfolio_id == portfolio_id)
            .min_by_key(|s| s.snapshot_date)
            .cloned())
    }

    fn get_snapshots_in_range(
        &self,
        portfolio_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Vec<PortfolioSnapshot>> {
        let mut rows: Vec<PortfolioSnapshot> = self
            .snapshots
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.portfolio_id == portfolio_id)
            .filter(|s| start_date.map_or(true, |start| s.snapshot_date >= start))
            .filter(|s| end_date.map_or(true, |end| s.snapshot_date <= end))
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.snapshot_date);
        Ok(rows)
    }

    fn get_latest_snapshots(
        &self,
        portfolio_ids: &[String],
    ) -> AppResult<HashMap<String, PortfolioSnapshot>> {
        let mut results = HashMap::new();
        for portfolio_id in portfolio_ids {
            if let Some(snapshot) = self
                .snapshots
                .read()
                .unwrap()
                .iter()
                .filter(|s| &s.portfolio_id == portfolio_id)
                .max_by_key(|s| s.snapshot_date)
            {
                results.insert(portfolio_id.clone(), snapshot.clone());
            }
        }
        Ok(results)
    }

    fn delete_snapshot_for_date(&self, portfolio_id: &str, date: NaiveDate) -> AppResult<usize> {
        let mut snapshots = self.snapshots.write().unwrap();
        let before = snapshots.len();
        snapshots.retain(|s| !(s.portfolio_id == portfolio_id && s.snapshot_date == date));
        Ok(before - snapshots.len())
    }
}

struct MockPriceResolver {
    quotes: RwLock<HashMap<(String, NaiveDate), Quote>>,
}

impl MockPriceResolver {
    fn new() -> Self {
        Self {
            quotes: RwLock::new(HashMap::new()),
        }
    }

    fn add_quote(&self, symbol: &str, date: NaiveDate, close: Decimal) {
        self.quotes
            .write()
            .unwrap()
            .insert((symbol.to_string(), date), Quote::new(symbol, date, close));
    }
}

impl PriceResolverTrait for MockPriceResolver {
    fn resolve_price(&self, symbol: &str, date: NaiveDate) -> MarketDataResult<Option<Quote>> {
        let quotes = self.quotes.read().unwrap();
        let mut lookup = date;
        for _ in 0..30 {
            if let Some(quote) = quotes.get(&(symbol.to_string(), lookup)) {
                return Ok(Some(quote.clone()));
            }
            match lookup.pred_opt() {
                Some(prev) => lookup = prev,
                None => break,
            }
        }
        Ok(None)
    }

    fn resolve_prices(
        &self,
        symbols: &HashSet<String>,
        date: NaiveDate,
    ) -> MarketDataResult<HashMap<String, Quote>> {
        let mut resolved = HashMap::new();
        for symbol in symbols {
            if let Some(quote) = self.resolve_price(symbol, date)? {
                resolved.insert(symbol.clone(), quote);
            }
        }
        Ok(resolved)
    }
}

#[derive(Default)]
struct MockAssetService {
    registrations: Mutex<Vec<Vec<String>>>,
    profile_batches: AtomicUsize,
    tag_restores: AtomicUsize,
}

#[async_trait]
impl AssetServiceTrait for MockAssetService {
    async fn ensure_assets_registered(
        &self,
        symbols: &HashSet<String>,
    ) -> AssetResult<Vec<String>> {
        let mut sorted: Vec<String> = symbols.iter().cloned().collect();
        sorted.sort();
        self.registrations.lock().unwrap().push(sorted.clone());
        Ok(sorted)
    }

    async fn apply_profiles(&self, _profiles: &[AssetProfile]) -> AssetResult<()> {
        self.profile_batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn restore_category_tags(&self) -> AssetResult<usize> {
        self.tag_restores.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

struct MockMetadataSyncer {
    calls: AtomicUsize,
    fail: bool,
}

impl MockMetadataSyncer {
    fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }
}

#[async_trait]
impl MetadataSyncerTrait for MockMetadataSyncer {
    async fn sync_profiles(
        &self,
        symbols: &HashSet<String>,
    ) -> AppResult<(Vec<AssetProfile>, SymbolFailures)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Batch("profile provider unavailable".to_string()));
        }
        let profiles = symbols
            .iter()
            .map(|s| AssetProfile {
                symbol: s.clone(),
                name: Some(format!("{} Inc", s)),
                sector: Some("Technology".to_string()),
            })
            .collect();
        Ok((profiles, Vec::new()))
    }
}

#[derive(Default)]
struct MockQuoteCollector {
    calls: Mutex<Vec<NaiveDate>>,
}

#[async_trait]
impl QuoteCollectorTrait for MockQuoteCollector {
    async fn collect_quotes(
        &self,
        _symbols: &HashSet<String>,
        date: NaiveDate,
    ) -> AppResult<SymbolFailures> {
        self.calls.lock().unwrap().push(date);
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct MockFundamentalsCollector {
    calls: AtomicUsize,
}

#[async_trait]
impl FundamentalsCollectorTrait for MockFundamentalsCollector {
    async fn collect_fundamentals(
        &self,
        symbols: &HashSet<String>,
        _date: NaiveDate,
    ) -> AppResult<FundamentalsOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FundamentalsOutcome::Collected(symbols.len()))
    }
}

#[derive(Default)]
struct MockAnalyticsRunner {
    calls: Mutex<Vec<(String, NaiveDate)>>,
}

#[async_trait]
impl AnalyticsRunnerTrait for MockAnalyticsRunner {
    async fn run_analytics(&self, portfolio_id: &str, date: NaiveDate) -> AppResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((portfolio_id.to_string(), date));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 2024-03-13 18:00 Eastern: well past the close-plus-buffer cutoff.
fn after_close() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 13, 22, 0, 0).unwrap()
}

fn portfolio(id: &str) -> Portfolio {
    Portfolio {
        id: id.to_string(),
        name: format!("Portfolio {}", id),
        currency: "USD".to_string(),
        starting_capital: dec!(1000000),
        is_active: true,
        created_at: Utc::now(),
    }
}

fn position(id: &str, portfolio_id: &str, symbol: &str, quantity: Decimal, entry_price: Decimal) -> Position {
    Position {
        id: id.to_string(),
        portfolio_id: portfolio_id.to_string(),
        symbol: symbol.to_string(),
        quantity,
        entry_price,
        entry_date: date(2024, 2, 1),
        multiplier: 1,
        last_price: None,
        market_value: None,
        unrealized_pnl: None,
        priced_at: None,
        exit_date: None,
        is_deleted: false,
        updated_at: Utc::now(),
    }
}

struct Fixture {
    portfolios: Arc<MockPortfolioRepository>,
    positions: Arc<MockPositionRepository>,
    snapshots: Arc<MockSnapshotRepository>,
    resolver: Arc<MockPriceResolver>,
    asset_service: Arc<MockAssetService>,
    metadata_syncer: Arc<MockMetadataSyncer>,
    quote_collector: Arc<MockQuoteCollector>,
    fundamentals: Arc<MockFundamentalsCollector>,
    analytics: Arc<MockAnalyticsRunner>,
    orchestrator: BatchOrchestrator,
}

fn fixture(metadata_fails: bool) -> Fixture {
    let portfolios = Arc::new(MockPortfolioRepository::default());
    let positions = Arc::new(MockPositionRepository::default());
    let snapshots = Arc::new(MockSnapshotRepository::default());
    let resolver = Arc::new(MockPriceResolver::new());
    let asset_service = Arc::new(MockAssetService::default());
    let metadata_syncer = Arc::new(MockMetadataSyncer::new(metadata_fails));
    let quote_collector = Arc::new(MockQuoteCollector::default());
    let fundamentals = Arc::new(MockFundamentalsCollector::default());
    let analytics = Arc::new(MockAnalyticsRunner::default());
    let calendar = Arc::new(TradingCalendar::new());

    let valuation_service = Arc::new(PositionValuationService::new(
        positions.clone(),
        resolver.clone(),
    ));
    let pnl_service = Arc::new(PnlService::new(
        positions.clone(),
        snapshots.clone(),
        resolver.clone(),
        calendar.clone(),
    ));

    let orchestrator = BatchOrchestrator::new(
        portfolios.clone(),
        positions.clone(),
        snapshots.clone(),
        asset_service.clone(),
        valuation_service,
        pnl_service,
        BatchCollaborators {
            metadata_syncer: metadata_syncer.clone(),
            quote_collector: quote_collector.clone(),
            fundamentals_collector: fundamentals.clone(),
            analytics_runner: analytics.clone(),
        },
        calendar,
        4,
    );

    Fixture {
        portfolios,
        positions,
        snapshots,
        resolver,
        asset_service,
        metadata_syncer,
        quote_collector,
        fundamentals,
        analytics,
        orchestrator,
    }
}

impl Fixture {
    fn seed_portfolio(&self, id: &str, symbol: &str, quantity: Decimal, entry_price: Decimal) {
        self.portfolios.create_portfolio(portfolio(id)).unwrap();
        self.positions
            .create_position(position(&format!("{}-{}", id, symbol), id, symbol, quantity, entry_price))
            .unwrap();
    }

    fn quote_week(&self, symbol: &str, closes: &[(NaiveDate, Decimal)]) {
        for (day, close) in closes {
            self.resolver.add_quote(symbol, *day, *close);
        }
    }
}

// 2024-03-08 is a Friday; 2024-03-11..15 an uninterrupted trading week.

#[tokio::test]
async fn daily_batch_backfills_the_gap_oldest_first() {
    let fx = fixture(false);
    fx.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));
    fx.quote_week(
        "AAPL",
        &[
            (date(2024, 3, 8), dec!(150)),
            (date(2024, 3, 11), dec!(152)),
            (date(2024, 3, 12), dec!(151)),
            (date(2024, 3, 13), dec!(156)),
        ],
    );
    // Friday is already in the ledger; Monday through Wednesday are missing.
    fx.orchestrator
        .run_for_date(&["pf-1".to_string()], date(2024, 3, 8), false)
        .await
        .unwrap();

    let summary = fx
        .orchestrator
        .run_daily_batch(date(2024, 3, 13), after_close())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    let ledger = fx
        .snapshots
        .get_snapshots_in_range("pf-1", None, None)
        .unwrap();
    let dates: Vec<NaiveDate> = ledger.iter().map(|s| s.snapshot_date).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 3, 8),
            date(2024, 3, 11),
            date(2024, 3, 12),
            date(2024, 3, 13)
        ]
    );

    // Equity rolled forward through the gap: 14_000 seed, then +200, -100, +500.
    assert_eq!(ledger[3].equity_balance, dec!(14600));
    assert_eq!(ledger[3].cumulative_pnl, dec!(600));

    // Quote collection ran per missing date; oldest first.
    let collected = fx.quote_collector.calls.lock().unwrap().clone();
    assert_eq!(
        collected,
        vec![
            date(2024, 3, 8),
            date(2024, 3, 11),
            date(2024, 3, 12),
            date(2024, 3, 13)
        ]
    );
}

#[tokio::test]
async fn final_date_only_phases_run_once_per_backfill() {
    let fx = fixture(false);
    fx.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));
    fx.quote_week(
        "AAPL",
        &[
            (date(2024, 3, 8), dec!(150)),
            (date(2024, 3, 11), dec!(152)),
            (date(2024, 3, 12), dec!(151)),
            (date(2024, 3, 13), dec!(156)),
        ],
    );
    fx.orchestrator
        .run_for_date(&["pf-1".to_string()], date(2024, 3, 8), false)
        .await
        .unwrap();
    // run_for_date hit the final-date-only phases once already.
    let metadata_before = fx.metadata_syncer.calls.load(Ordering::SeqCst);
    let fundamentals_before = fx.fundamentals.calls.load(Ordering::SeqCst);

    let summary = fx
        .orchestrator
        .run_daily_batch(date(2024, 3, 13), after_close())
        .await
        .unwrap();

    // Three backfilled dates, but metadata and fundamentals ran only for the
    // final one.
    assert_eq!(
        fx.metadata_syncer.calls.load(Ordering::SeqCst),
        metadata_before + 1
    );
    assert_eq!(
        fx.fundamentals.calls.load(Ordering::SeqCst),
        fundamentals_before + 1
    );
    assert_eq!(summary.outcomes_for(PhaseKind::SnapshotCreation).len(), 3);
    assert_eq!(summary.outcomes_for(PhaseKind::MetadataSync).len(), 1);
}

#[tokio::test]
async fn backfill_matches_one_date_at_a_time_processing() {
    let week = [
        (date(2024, 3, 11), dec!(150)),
        (date(2024, 3, 12), dec!(147)),
        (date(2024, 3, 13), dec!(153)),
    ];

    // Both ledgers share the same first snapshot, then diverge in how the
    // remaining two days are processed.
    let spanned = fixture(false);
    spanned.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));
    spanned.quote_week("AAPL", &week);
    spanned
        .orchestrator
        .run_for_date(&["pf-1".to_string()], date(2024, 3, 11), false)
        .await
        .unwrap();
    // One backfill call spanning the rest of the gap.
    spanned
        .orchestrator
        .run_daily_batch(date(2024, 3, 13), after_close())
        .await
        .unwrap();

    // Identical inputs, one single-date run at a time.
    let stepped = fixture(false);
    stepped.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));
    stepped.quote_week("AAPL", &week);
    for (day, _) in week {
        stepped
            .orchestrator
            .run_for_date(&["pf-1".to_string()], day, false)
            .await
            .unwrap();
    }

    let spanned_ledger = spanned
        .snapshots
        .get_snapshots_in_range("pf-1", None, None)
        .unwrap();
    let stepped_ledger = stepped
        .snapshots
        .get_snapshots_in_range("pf-1", None, None)
        .unwrap();
    assert_eq!(spanned_ledger.len(), 3);
    for (a, b) in spanned_ledger.iter().zip(stepped_ledger.iter()) {
        assert_eq!(a.snapshot_date, b.snapshot_date);
        assert_eq!(a.equity_balance, b.equity_balance);
        assert_eq!(a.daily_pnl, b.daily_pnl);
        assert_eq!(a.cumulative_pnl, b.cumulative_pnl);
        assert_eq!(a.long_value, b.long_value);
        assert_eq!(a.short_value, b.short_value);
    }
}

#[tokio::test]
async fn one_portfolio_failing_does_not_abort_the_other() {
    let fx = fixture(false);
    fx.seed_portfolio("pf-good", "AAPL", dec!(100), dec!(140));
    fx.seed_portfolio("pf-bad", "GHOST", dec!(10), dec!(50));
    fx.resolver.add_quote("AAPL", date(2024, 3, 13), dec!(150));
    // GHOST never gets a quote: pf-bad's snapshot must hard-fail.

    let summary = fx
        .orchestrator
        .run_daily_batch(date(2024, 3, 13), after_close())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Failed);
    assert!(fx
        .snapshots
        .get_snapshot_on_date("pf-good", date(2024, 3, 13))
        .unwrap()
        .is_some());
    assert!(fx
        .snapshots
        .get_snapshot_on_date("pf-bad", date(2024, 3, 13))
        .unwrap()
        .is_none());

    let failures = summary.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].portfolio_id, "pf-bad");
    assert_eq!(failures[0].phase, PhaseKind::SnapshotCreation);

    // Analytics still ran for the healthy portfolio only.
    let analytics_calls = fx.analytics.calls.lock().unwrap().clone();
    assert_eq!(analytics_calls, vec![("pf-good".to_string(), date(2024, 3, 13))]);
}

#[tokio::test]
async fn metadata_failure_degrades_but_does_not_block_the_ledger() {
    let fx = fixture(true);
    fx.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));
    fx.resolver.add_quote("AAPL", date(2024, 3, 13), dec!(150));

    let summary = fx
        .orchestrator
        .run_daily_batch(date(2024, 3, 13), after_close())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::CompletedWithPartialData);

    let metadata = summary.outcomes_for(PhaseKind::MetadataSync);
    assert_eq!(metadata[0].status, PhaseStatus::Failed);

    // The ledger row exists and carries the partial-data caveat.
    let snapshot = fx
        .snapshots
        .get_snapshot_on_date("pf-1", date(2024, 3, 13))
        .unwrap()
        .unwrap();
    assert!(snapshot.has_partial_data);
    assert_eq!(snapshot.equity_balance, dec!(14000));
}

#[tokio::test]
async fn universe_registration_runs_on_every_entry_path() {
    let fx = fixture(false);
    fx.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));
    fx.quote_week(
        "AAPL",
        &[(date(2024, 3, 12), dec!(150)), (date(2024, 3, 13), dec!(152))],
    );

    fx.orchestrator
        .run_for_date(&["pf-1".to_string()], date(2024, 3, 12), false)
        .await
        .unwrap();
    fx.orchestrator
        .run_daily_batch(date(2024, 3, 13), after_close())
        .await
        .unwrap();

    let registrations = fx.asset_service.registrations.lock().unwrap().clone();
    assert_eq!(registrations.len(), 2);
    assert!(registrations.iter().all(|r| r == &vec!["AAPL".to_string()]));
}

#[tokio::test]
async fn current_portfolio_is_left_untouched() {
    let fx = fixture(false);
    fx.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));
    fx.resolver.add_quote("AAPL", date(2024, 3, 13), dec!(150));

    fx.orchestrator
        .run_daily_batch(date(2024, 3, 13), after_close())
        .await
        .unwrap();
    let summary = fx
        .orchestrator
        .run_daily_batch(date(2024, 3, 13), after_close())
        .await
        .unwrap();

    // Second run found nothing to do: no phases executed, nothing recomputed.
    assert_eq!(summary.status, RunStatus::Completed);
    assert!(summary.outcomes.is_empty());
    assert_eq!(
        fx.snapshots
            .get_snapshots_in_range("pf-1", None, None)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn replaying_a_snapshotted_date_requires_recompute() {
    let fx = fixture(false);
    fx.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));
    fx.resolver.add_quote("AAPL", date(2024, 3, 13), dec!(150));

    fx.orchestrator
        .run_for_date(&["pf-1".to_string()], date(2024, 3, 13), false)
        .await
        .unwrap();

    // Without recompute the duplicate is refused and the run reports failure.
    let refused = fx
        .orchestrator
        .run_for_date(&["pf-1".to_string()], date(2024, 3, 13), false)
        .await
        .unwrap();
    assert_eq!(refused.status, RunStatus::Failed);

    // With recompute the date is deleted and regenerated.
    let recomputed = fx
        .orchestrator
        .run_for_date(&["pf-1".to_string()], date(2024, 3, 13), true)
        .await
        .unwrap();
    assert_eq!(recomputed.status, RunStatus::Completed);
    assert_eq!(
        fx.snapshots
            .get_snapshots_in_range("pf-1", None, None)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn weekend_request_is_rejected_for_replay() {
    let fx = fixture(false);
    fx.seed_portfolio("pf-1", "AAPL", dec!(100), dec!(140));

    let result = fx
        .orchestrator
        .run_for_date(&["pf-1".to_string()], date(2024, 3, 9), false)
        .await;
    assert!(result.is_err());
}
