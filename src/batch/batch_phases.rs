use crate::batch::batch_model::PhaseKind;

/// How the runner reacts when a phase returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep going; later phases run with whatever
    /// state exists.
    Tolerated,
    /// The (portfolio, date) unit is abandoned. Other portfolios and dates
    /// are unaffected.
    Fatal,
}

/// A phase as data: order, skip rules and failure handling live here instead
/// of being scattered across control flow.
#[derive(Debug, Clone, Copy)]
pub struct PhaseDescriptor {
    pub kind: PhaseKind,
    pub name: &'static str,
    /// Runs only when processing the final date of the run, never on
    /// backfilled historical dates.
    pub final_date_only: bool,
    pub failure_policy: FailurePolicy,
}

/// The pipeline, in execution order.
pub const PHASE_PIPELINE: &[PhaseDescriptor] = &[
    PhaseDescriptor {
        kind: PhaseKind::MetadataSync,
        name: "metadata-sync",
        final_date_only: true,
        failure_policy: FailurePolicy::Tolerated,
    },
    PhaseDescriptor {
        kind: PhaseKind::MarketDataCollection,
        name: "market-data-collection",
        final_date_only: false,
        failure_policy: FailurePolicy::Tolerated,
    },
    PhaseDescriptor {
        kind: PhaseKind::UniverseRegistration,
        name: "universe-registration",
        final_date_only: false,
        failure_policy: FailurePolicy::Tolerated,
    },
    PhaseDescriptor {
        kind: PhaseKind::FundamentalsCollection,
        name: "fundamentals-collection",
        final_date_only: true,
        failure_policy: FailurePolicy::Tolerated,
    },
    PhaseDescriptor {
        kind: PhaseKind::PositionValuation,
        name: "position-valuation",
        final_date_only: false,
        failure_policy: FailurePolicy::Tolerated,
    },
    PhaseDescriptor {
        kind: PhaseKind::SnapshotCreation,
        name: "snapshot-creation",
        final_date_only: false,
        failure_policy: FailurePolicy::Fatal,
    },
    PhaseDescriptor {
        kind: PhaseKind::CategoryRestore,
        name: "category-restore",
        final_date_only: false,
        failure_policy: FailurePolicy::Tolerated,
    },
    PhaseDescriptor {
        kind: PhaseKind::Analytics,
        name: "analytics",
        final_date_only: false,
        failure_policy: FailurePolicy::Tolerated,
    },
];
