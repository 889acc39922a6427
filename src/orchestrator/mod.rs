//! Orchestrator: ties the catalog, planner and state store together.
//!
//! Progress is loaded once when the orchestrator is built. Every mutation
//! goes through [`BadgeProgress::record_attempt`] and is saved immediately.
//! Each badge is also marked in flight and saved before its action starts,
//! so a crash mid-attempt is visible on the next load.

pub mod preflight;
pub mod report;
pub mod runner;

pub use preflight::{KagglePreflight, Preflight, SkipPreflight};
pub use report::{AttemptNote, PhaseStatus, RunReport, StatusReport};
pub use runner::{ActionOutcome, ActionRunner, CommandRunner};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::badge::{Badge, FIRST_PHASE, LAST_PHASE};
use crate::catalog::{Catalog, PrerequisiteGraph};
use crate::errors::OrchestratorError;
use crate::planner::{PlanRequest, Planner};
use crate::state::{AttemptLog, AttemptResult, BadgeProgress, EntrySource, HistoryEntry, StateStore};

/// Hooks for rendering a run as it happens. All methods default to no-ops.
pub trait RunObserver {
    fn run_started(&self, _planned: &[Badge]) {}
    fn attempt_started(&self, _badge: &Badge) {}
    fn attempt_finished(&self, _badge: &Badge, _outcome: &ActionOutcome) {}
    fn run_finished(&self, _report: &RunReport) {}
}

/// Observer that ignores every event.
pub struct Silent;

impl RunObserver for Silent {}

pub struct Orchestrator<S: StateStore> {
    catalog: Catalog,
    graph: PrerequisiteGraph,
    store: S,
    progress: BadgeProgress,
    history: Option<AttemptLog>,
}

impl<S: StateStore> Orchestrator<S> {
    /// Validate the prerequisite graph and load progress from `store`.
    pub fn new(catalog: Catalog, store: S) -> Result<Self, OrchestratorError> {
        let graph = PrerequisiteGraph::build(&catalog)?;
        let progress = store.load(&catalog)?;
        let interrupted = progress.interrupted();
        if !interrupted.is_empty() {
            warn!(
                badges = ?interrupted,
                "Previous run stopped mid-attempt; these badges will be retried"
            );
        }
        debug!(
            badges = catalog.len(),
            earned = progress.iter().filter(|(_, s)| s.earned).count(),
            "Orchestrator ready"
        );
        Ok(Self {
            catalog,
            graph,
            store,
            progress,
            history: None,
        })
    }

    /// Append every attempt and verification to `log`.
    pub fn with_history(mut self, log: AttemptLog) -> Self {
        self.history = Some(log);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn progress(&self) -> &BadgeProgress {
        &self.progress
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn history(&self) -> Option<&AttemptLog> {
        self.history.as_ref()
    }

    fn planner(&self) -> Planner<'_, '_> {
        Planner::new(&self.catalog, &self.graph)
    }

    /// Per-phase and overall progress. Pure read.
    pub fn status(&self) -> StatusReport {
        let planner = self.planner();
        let phases = (FIRST_PHASE..=LAST_PHASE)
            .map(|p| PhaseStatus::from_counts(Some(p), planner.group_counts(&self.progress, Some(p))))
            .collect();
        let manual = PhaseStatus::from_counts(None, planner.group_counts(&self.progress, None));

        let badges = self.catalog.badges();
        let earned = |b: &&Badge| self.progress.is_earned(&b.id);
        StatusReport {
            phases,
            manual,
            earned: badges.iter().filter(earned).count(),
            total: badges.len(),
            automatable_earned: self.catalog.automatable().filter(earned).count(),
            automatable_total: self.catalog.automatable().count(),
        }
    }

    /// Automatable badges that would be attempted next. No side effects.
    pub fn dry_run(&self, phase: Option<u8>) -> Vec<&Badge> {
        self.plan(&PlanRequest::for_phase(phase))
    }

    pub fn plan(&self, request: &PlanRequest) -> Vec<&Badge> {
        self.planner().plan(&self.progress, request)
    }

    /// Unearned prerequisites standing between a badge and an attempt.
    pub fn blockers(&self, badge_id: &str) -> Result<Vec<&Badge>, OrchestratorError> {
        if !self.catalog.contains(badge_id) {
            return Err(OrchestratorError::UnknownBadge(badge_id.to_string()));
        }
        Ok(self.planner().blockers(badge_id, &self.progress))
    }

    /// Attempt every currently actionable badge once, in plan order.
    ///
    /// The plan is computed once up front: a badge unlocked during this pass
    /// waits for the next invocation. Failed and skipped attempts are
    /// recorded and the pass continues.
    pub fn execute(
        &mut self,
        phase: Option<u8>,
        preflight: &dyn Preflight,
        runner: &mut dyn ActionRunner,
        observer: &dyn RunObserver,
    ) -> Result<RunReport, OrchestratorError> {
        preflight.check()?;

        let planned: Vec<Badge> = self.dry_run(phase).into_iter().cloned().collect();
        let mut report = RunReport::start(phase, planned.iter().map(|b| b.id.clone()).collect());
        info!(run_id = %report.run_id, badges = planned.len(), "Starting badge run");
        observer.run_started(&planned);

        for badge in &planned {
            observer.attempt_started(badge);
            info!(badge = %badge.id, kind = %badge.action.kind, "Attempting badge");
            self.progress.mark_attempting(&badge.id, Utc::now());
            self.store.save(&self.progress)?;

            let outcome = runner.run(badge);
            let now = Utc::now();
            self.progress
                .record_attempt(&badge.id, outcome.result, outcome.detail.as_deref(), now);
            self.store.save(&self.progress)?;
            self.append_history(
                &badge.id,
                outcome.result,
                EntrySource::Run,
                Some(report.run_id),
                outcome.detail.as_deref(),
                now,
            );

            match outcome.result {
                AttemptResult::Success => {
                    info!(badge = %badge.id, "Badge earned");
                    report.earned.push(badge.id.clone());
                }
                AttemptResult::Failure => {
                    warn!(badge = %badge.id, detail = ?outcome.detail, "Badge attempt failed");
                    report.failed.push(AttemptNote {
                        badge: badge.id.clone(),
                        detail: outcome.detail.clone(),
                    });
                }
                AttemptResult::Skipped => {
                    info!(badge = %badge.id, detail = ?outcome.detail, "Badge skipped");
                    report.skipped.push(AttemptNote {
                        badge: badge.id.clone(),
                        detail: outcome.detail.clone(),
                    });
                }
            }
            observer.attempt_finished(badge, &outcome);
        }

        report.finished_at = Utc::now();
        info!(
            run_id = %report.run_id,
            earned = report.earned.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Badge run finished"
        );
        observer.run_finished(&report);
        Ok(report)
    }

    /// Record an outcome observed outside `execute`, e.g. a badge earned by
    /// hand in the browser.
    ///
    /// Returns true when the badge was newly earned.
    pub fn verify(
        &mut self,
        badge_id: &str,
        earned: bool,
        detail: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<bool, OrchestratorError> {
        if !self.catalog.contains(badge_id) {
            return Err(OrchestratorError::UnknownBadge(badge_id.to_string()));
        }
        if earned {
            let missing: Vec<String> = self
                .planner()
                .blockers(badge_id, &self.progress)
                .into_iter()
                .map(|b| b.id.clone())
                .collect();
            if !missing.is_empty() {
                return Err(OrchestratorError::PrerequisitesUnmet {
                    badge: badge_id.to_string(),
                    missing,
                });
            }
        }

        let result = if earned {
            AttemptResult::Success
        } else {
            AttemptResult::Failure
        };
        let newly = self.progress.record_attempt(badge_id, result, detail, at);
        self.store.save(&self.progress)?;
        self.append_history(badge_id, result, EntrySource::Verify, None, detail, at);
        info!(badge = %badge_id, %result, "Recorded verification");
        Ok(newly)
    }

    /// Reinitialise every badge to unearned and persist the blank state.
    ///
    /// The attempt history is left alone.
    pub fn reset(&mut self) -> Result<(), OrchestratorError> {
        self.progress = BadgeProgress::for_catalog(&self.catalog);
        self.store.save(&self.progress)?;
        info!("Badge progress reset");
        Ok(())
    }

    fn append_history(
        &self,
        badge: &str,
        result: AttemptResult,
        source: EntrySource,
        run_id: Option<Uuid>,
        detail: Option<&str>,
        timestamp: DateTime<Utc>,
    ) {
        let Some(ref log) = self.history else {
            return;
        };
        let entry = HistoryEntry {
            badge: badge.to_string(),
            result,
            source,
            run_id,
            detail: detail.map(str::to_string),
            timestamp,
        };
        // History is advisory; the progress file is already saved.
        if let Err(e) = log.append(&entry) {
            warn!(error = %e, path = %log.path().display(), "Failed to append attempt history");
        }
    }
}
