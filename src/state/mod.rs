//! Per-badge progress state and its persistence.

pub mod history;
pub mod store;

pub use history::{AttemptLog, EntrySource, HistoryEntry};
pub use store::{FileStateStore, MemoryStateStore, StateStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Catalog;

/// Current on-disk format version of the progress file.
pub const STATE_VERSION: u32 = 1;

/// Outcome of one attempt at a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptResult {
    Success,
    Failure,
    /// No automation was available; a human has to act. Retryable.
    Skipped,
}

impl AttemptResult {
    pub fn is_success(self) -> bool {
        matches!(self, AttemptResult::Success)
    }
}

impl std::fmt::Display for AttemptResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptResult::Success => write!(f, "success"),
            AttemptResult::Failure => write!(f, "failure"),
            AttemptResult::Skipped => write!(f, "skipped"),
        }
    }
}

/// Persisted record for a single badge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BadgeState {
    pub earned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<AttemptResult>,
    /// Diagnostic detail from the last attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Set while an action runs; still set on load means the run died mid-attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempting_since: Option<DateTime<Utc>>,
}

/// Mapping badge id -> state, keyed in sorted order so the file diffs cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeProgress {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    badges: BTreeMap<String, BadgeState>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for BadgeProgress {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            badges: BTreeMap::new(),
        }
    }
}

impl BadgeProgress {
    /// Fresh progress with every catalog badge unearned.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let mut progress = Self::default();
        progress.reconcile(catalog);
        progress
    }

    /// Add an unearned entry for every catalog badge missing from the map.
    ///
    /// Returns ids present in the map but unknown to the catalog. Those
    /// entries are kept so a catalog downgrade does not lose history, but
    /// nothing counts them.
    pub fn reconcile(&mut self, catalog: &Catalog) -> Vec<String> {
        for badge in catalog.badges() {
            self.badges.entry(badge.id.clone()).or_default();
        }
        self.badges
            .keys()
            .filter(|id| !catalog.contains(id))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&BadgeState> {
        self.badges.get(id)
    }

    pub fn is_earned(&self, id: &str) -> bool {
        self.badges.get(id).is_some_and(|s| s.earned)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BadgeState)> {
        self.badges.iter()
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Mark a badge as in flight. Cleared by the next `record_attempt`.
    pub fn mark_attempting(&mut self, badge_id: &str, at: DateTime<Utc>) {
        self.badges.entry(badge_id.to_string()).or_default().attempting_since = Some(at);
    }

    /// Badges whose last attempt never recorded an outcome.
    pub fn interrupted(&self) -> Vec<&str> {
        self.badges
            .iter()
            .filter(|(_, s)| s.attempting_since.is_some())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Record an attempt. A success marks the badge earned; earned-at keeps
    /// its first value and a later failure never un-earns a badge.
    ///
    /// Returns true when this call newly earned the badge.
    pub fn record_attempt(
        &mut self,
        badge_id: &str,
        result: AttemptResult,
        detail: Option<&str>,
        at: DateTime<Utc>,
    ) -> bool {
        let state = self.badges.entry(badge_id.to_string()).or_default();
        state.last_attempt_at = Some(at);
        state.last_result = Some(result);
        state.detail = detail.map(str::to_string);
        state.attempting_since = None;

        if result.is_success() && !state.earned {
            state.earned = true;
            state.earned_at = Some(at);
            return true;
        }
        false
    }

    /// Pairs (badge, prerequisite) where the badge is earned but the
    /// prerequisite is not. Empty for any consistent progress map.
    pub fn prerequisite_violations(&self, catalog: &Catalog) -> Vec<(String, String)> {
        catalog
            .badges()
            .iter()
            .filter(|b| self.is_earned(&b.id))
            .flat_map(|b| {
                b.prerequisites
                    .iter()
                    .filter(move |p| !self.is_earned(p))
                    .map(move |p| (b.id.clone(), p.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::{ActionKind, Badge, BadgeAction, BadgeCategory};
    use chrono::TimeZone;

    fn catalog() -> Catalog {
        let action = BadgeAction {
            kind: ActionKind::Api,
            summary: "x".into(),
        };
        Catalog::from_badges(vec![
            Badge::new("a", "A", BadgeCategory::Datasets, 1, vec![], action.clone()),
            Badge::new("b", "B", BadgeCategory::Datasets, 1, vec!["a".into()], action),
        ])
        .unwrap()
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_for_catalog_starts_unearned() {
        let progress = BadgeProgress::for_catalog(&catalog());
        assert_eq!(progress.len(), 2);
        assert!(progress.iter().all(|(_, s)| *s == BadgeState::default()));
    }

    #[test]
    fn test_record_success_sets_earned() {
        let mut progress = BadgeProgress::for_catalog(&catalog());
        let newly = progress.record_attempt("a", AttemptResult::Success, Some("ok"), t(0));
        assert!(newly);

        let state = progress.get("a").unwrap();
        assert!(state.earned);
        assert_eq!(state.earned_at, Some(t(0)));
        assert_eq!(state.last_attempt_at, Some(t(0)));
        assert_eq!(state.detail.as_deref(), Some("ok"));
    }

    #[test]
    fn test_record_success_twice_is_idempotent() {
        let mut progress = BadgeProgress::for_catalog(&catalog());
        progress.record_attempt("a", AttemptResult::Success, None, t(0));
        let first = progress.clone();

        let newly = progress.record_attempt("a", AttemptResult::Success, None, t(60));
        assert!(!newly);

        let state = progress.get("a").unwrap();
        assert_eq!(state.earned_at, Some(t(0)));
        assert_eq!(state.last_attempt_at, Some(t(60)));

        // Only the last-attempt timestamp differs.
        let mut normalized = progress.clone();
        normalized.badges.get_mut("a").unwrap().last_attempt_at = Some(t(0));
        assert_eq!(normalized, first);
    }

    #[test]
    fn test_failure_after_earned_keeps_badge() {
        let mut progress = BadgeProgress::for_catalog(&catalog());
        progress.record_attempt("a", AttemptResult::Success, None, t(0));
        progress.record_attempt("a", AttemptResult::Failure, Some("rate limited"), t(5));

        let state = progress.get("a").unwrap();
        assert!(state.earned);
        assert_eq!(state.last_result, Some(AttemptResult::Failure));
    }

    #[test]
    fn test_failure_records_last_attempt() {
        let mut progress = BadgeProgress::for_catalog(&catalog());
        progress.record_attempt("a", AttemptResult::Failure, Some("401"), t(0));

        let state = progress.get("a").unwrap();
        assert!(!state.earned);
        assert!(state.earned_at.is_none());
        assert_eq!(state.last_result, Some(AttemptResult::Failure));
        assert_eq!(state.detail.as_deref(), Some("401"));
    }

    #[test]
    fn test_attempt_marker_cleared_by_outcome() {
        let mut progress = BadgeProgress::for_catalog(&catalog());
        progress.mark_attempting("a", t(0));
        assert_eq!(progress.interrupted(), vec!["a"]);

        let json = serde_json::to_string(&progress).unwrap();
        let reloaded: BadgeProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.get("a").unwrap().attempting_since, Some(t(0)));

        progress.record_attempt("a", AttemptResult::Failure, Some("timeout"), t(30));
        assert!(progress.interrupted().is_empty());
        assert!(!progress.get("a").unwrap().earned);
    }

    #[test]
    fn test_reconcile_reports_unknown_ids() {
        let mut progress = BadgeProgress::default();
        progress.record_attempt("retired_badge", AttemptResult::Success, None, t(0));

        let unknown = progress.reconcile(&catalog());
        assert_eq!(unknown, vec!["retired_badge".to_string()]);
        assert_eq!(progress.len(), 3);
        assert!(progress.get("a").is_some());
    }

    #[test]
    fn test_prerequisite_violations() {
        let cat = catalog();
        let mut progress = BadgeProgress::for_catalog(&cat);
        assert!(progress.prerequisite_violations(&cat).is_empty());

        progress.record_attempt("b", AttemptResult::Success, None, t(0));
        assert_eq!(
            progress.prerequisite_violations(&cat),
            vec![("b".to_string(), "a".to_string())]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut progress = BadgeProgress::for_catalog(&catalog());
        progress.record_attempt("a", AttemptResult::Skipped, None, t(0));

        let json: serde_json::Value = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["badges"]["a"]["last_result"], "skipped");
        assert_eq!(json["badges"]["b"]["earned"], false);
        assert!(json["badges"]["b"].get("earned_at").is_none());
    }
}
