//! Read-only views returned by the orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::badge::phase_label;
use crate::planner::{GroupCounts, PhaseOutlook};

/// Progress of one phase group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseStatus {
    /// `None` for the manual group
    pub phase: Option<u8>,
    pub earned: usize,
    pub total: usize,
    pub actionable: usize,
    pub outlook: PhaseOutlook,
}

impl PhaseStatus {
    pub fn from_counts(phase: Option<u8>, counts: GroupCounts) -> Self {
        Self {
            phase,
            earned: counts.earned,
            total: counts.total,
            actionable: counts.actionable,
            outlook: counts.outlook(),
        }
    }

    pub fn label(&self) -> String {
        phase_label(self.phase)
    }
}

/// Snapshot returned by `status()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Phases 1 through 5, in order
    pub phases: Vec<PhaseStatus>,
    /// Badges without a phase
    pub manual: PhaseStatus,
    pub earned: usize,
    pub total: usize,
    pub automatable_earned: usize,
    pub automatable_total: usize,
}

impl StatusReport {
    pub fn is_complete(&self) -> bool {
        self.earned == self.total
    }

    pub fn percent_earned(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.earned as f64 * 100.0 / self.total as f64
    }

    /// Total actionable badges across every automated phase.
    pub fn actionable(&self) -> usize {
        self.phases.iter().map(|p| p.actionable).sum()
    }
}

/// A failed or skipped attempt with its diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptNote {
    pub badge: String,
    pub detail: Option<String>,
}

/// Outcome of one `execute()` pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub phase: Option<u8>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Badges planned for this pass, in execution order
    pub planned: Vec<String>,
    pub earned: Vec<String>,
    pub failed: Vec<AttemptNote>,
    pub skipped: Vec<AttemptNote>,
}

impl RunReport {
    pub(crate) fn start(phase: Option<u8>, planned: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            phase,
            started_at: now,
            finished_at: now,
            planned,
            earned: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn attempted(&self) -> usize {
        self.earned.len() + self.failed.len() + self.skipped.len()
    }

    /// True when nothing failed. Skips do not count as failures.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
