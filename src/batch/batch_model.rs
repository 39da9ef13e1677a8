use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// The eight pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    MetadataSync,
    MarketDataCollection,
    UniverseRegistration,
    FundamentalsCollection,
    PositionValuation,
    SnapshotCreation,
    CategoryRestore,
    Analytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseStatus {
    Completed,
    /// Ran, but some symbols or inputs were degraded.
    CompletedPartial,
    /// Declined to run (e.g. fundamentals not yet available).
    Skipped,
    Failed,
}

/// One phase execution for one (portfolio, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseOutcome {
    pub phase: PhaseKind,
    pub portfolio_id: String,
    pub date: NaiveDate,
    pub status: PhaseStatus,
    pub error: Option<String>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Every phase completed cleanly; the ledger is sound.
    Completed,
    /// The ledger is sound but some phases or symbols were degraded;
    /// consumers should surface a caveat.
    CompletedWithPartialData,
    /// At least one (portfolio, date) produced no ledger row.
    Failed,
}

/// Ephemeral per-run state, passed explicitly through the pipeline rather
/// than kept in a process-wide tracker, so concurrent portfolio processing
/// cannot leak outcomes across runs.
#[derive(Debug)]
pub struct BatchRun {
    pub id: Uuid,
    pub target_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    outcomes: Mutex<Vec<PhaseOutcome>>,
}

impl BatchRun {
    pub fn new(target_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_date,
            started_at: Utc::now(),
            outcomes: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, outcome: PhaseOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(outcome);
        }
    }

    pub fn summarize(self) -> RunSummary {
        let outcomes = self.outcomes.into_inner().unwrap_or_default();

        let ledger_failed = outcomes
            .iter()
            .any(|o| o.phase == PhaseKind::SnapshotCreation && o.status == PhaseStatus::Failed);
        let degraded = outcomes.iter().any(|o| {
            matches!(
                o.status,
                PhaseStatus::Failed | PhaseStatus::CompletedPartial
            )
        });

        let status = if ledger_failed {
            RunStatus::Failed
        } else if degraded {
            RunStatus::CompletedWithPartialData
        } else {
            RunStatus::Completed
        };

        RunSummary {
            run_id: self.id,
            target_date: self.target_date,
            started_at: self.started_at,
            finished_at: Utc::now(),
            status,
            outcomes,
        }
    }
}

/// What operational monitoring consumes. Not part of the financial ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: Uuid,
    pub target_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub outcomes: Vec<PhaseOutcome>,
}

impl RunSummary {
    pub fn outcomes_for(&self, phase: PhaseKind) -> Vec<&PhaseOutcome> {
        self.outcomes.iter().filter(|o| o.phase == phase).collect()
    }

    pub fn failures(&self) -> Vec<&PhaseOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == PhaseStatus::Failed)
            .collect()
    }
}
