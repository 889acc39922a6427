//! Phase planner: which badges can be attempted right now.
//!
//! The planner does not topologically sort the whole catalog. It returns
//! only badges that are immediately actionable against the current state:
//! unearned, prerequisites earned, matching the phase filter, and
//! automatable unless manual badges were requested. Results are ordered by
//! phase, then by catalog declaration order.

use serde::Serialize;
use std::collections::HashSet;

use crate::badge::Badge;
use crate::catalog::graph::BadgeIndex;
use crate::catalog::{Catalog, PrerequisiteGraph};
use crate::errors::PlanningError;
use crate::state::BadgeProgress;

/// Parameters for a single planning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanRequest {
    /// Only return badges from this phase
    pub phase: Option<u8>,
    /// Also return badges that cannot be automated
    pub include_non_automatable: bool,
}

impl PlanRequest {
    pub fn all_phases() -> Self {
        Self::default()
    }

    pub fn for_phase(phase: Option<u8>) -> Self {
        Self {
            phase,
            include_non_automatable: false,
        }
    }

    pub fn with_non_automatable(mut self, include: bool) -> Self {
        self.include_non_automatable = include;
        self
    }
}

/// Whether a phase still has work, and whether that work can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum PhaseOutlook {
    /// Every badge in the phase is earned
    Done,
    /// Unearned badges remain but none is actionable yet
    Blocked { remaining: usize },
    /// Some badges can be attempted now
    Ready { actionable: usize },
}

/// Earned / total / actionable counts for one phase group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupCounts {
    pub total: usize,
    pub earned: usize,
    pub actionable: usize,
}

impl GroupCounts {
    pub fn outlook(&self) -> PhaseOutlook {
        if self.earned >= self.total {
            PhaseOutlook::Done
        } else if self.actionable > 0 {
            PhaseOutlook::Ready {
                actionable: self.actionable,
            }
        } else {
            PhaseOutlook::Blocked {
                remaining: self.total - self.earned,
            }
        }
    }
}

/// Planner over a validated catalog.
pub struct Planner<'a, 'g> {
    catalog: &'a Catalog,
    graph: &'g PrerequisiteGraph,
}

impl<'a, 'g> Planner<'a, 'g> {
    pub fn new(catalog: &'a Catalog, graph: &'g PrerequisiteGraph) -> Self {
        Self { catalog, graph }
    }

    /// Ordered actionable badges for `request`.
    pub fn plan(&self, progress: &BadgeProgress, request: &PlanRequest) -> Vec<&'a Badge> {
        let catalog = self.catalog;
        let earned = self.earned_indices(progress);
        let mut selected: Vec<(usize, &'a Badge)> = catalog
            .badges()
            .iter()
            .enumerate()
            .filter(|(i, _)| !earned.contains(i))
            .filter(|(_, b)| request.phase.is_none_or(|p| b.phase == Some(p)))
            .filter(|(_, b)| b.automatable || request.include_non_automatable)
            .filter(|(i, _)| self.graph.dependencies_satisfied(*i, &earned))
            .collect();

        selected.sort_by_key(|(i, b)| (b.phase_rank(), *i));
        selected.into_iter().map(|(_, b)| b).collect()
    }

    /// Counts for a phase, or for the manual group when `phase` is `None`.
    ///
    /// Phased groups count only automatable badges as actionable; the manual
    /// group counts every ready badge since none of them is automatable.
    pub fn group_counts(&self, progress: &BadgeProgress, phase: Option<u8>) -> GroupCounts {
        let earned = self.earned_indices(progress);
        let mut counts = GroupCounts::default();
        for (i, badge) in self.catalog.badges().iter().enumerate() {
            if badge.phase != phase {
                continue;
            }
            counts.total += 1;
            if earned.contains(&i) {
                counts.earned += 1;
            } else if (badge.automatable || phase.is_none())
                && self.graph.dependencies_satisfied(i, &earned)
            {
                counts.actionable += 1;
            }
        }
        counts
    }

    pub fn outlook(&self, progress: &BadgeProgress, phase: u8) -> PhaseOutlook {
        self.group_counts(progress, Some(phase)).outlook()
    }

    /// Unearned prerequisites of a badge, in catalog order.
    pub fn blockers(&self, badge_id: &str, progress: &BadgeProgress) -> Vec<&'a Badge> {
        let catalog = self.catalog;
        let Some(index) = catalog.index_of(badge_id) else {
            return Vec::new();
        };
        self.graph
            .dependencies(index)
            .iter()
            .filter_map(|&dep| catalog.badges().get(dep))
            .filter(|b| !progress.is_earned(&b.id))
            .collect()
    }

    /// Catalog indices of earned badges. Ids unknown to the catalog are ignored.
    fn earned_indices(&self, progress: &BadgeProgress) -> HashSet<BadgeIndex> {
        self.catalog
            .badges()
            .iter()
            .enumerate()
            .filter(|(_, b)| progress.is_earned(&b.id))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Validate the catalog's prerequisite graph and plan in one call.
pub fn plan<'a>(
    catalog: &'a Catalog,
    progress: &BadgeProgress,
    phase_filter: Option<u8>,
    include_non_automatable: bool,
) -> Result<Vec<&'a Badge>, PlanningError> {
    let graph = PrerequisiteGraph::build(catalog)?;
    let request = PlanRequest::for_phase(phase_filter).with_non_automatable(include_non_automatable);
    Ok(Planner::new(catalog, &graph).plan(progress, &request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::{ActionKind, BadgeAction, BadgeCategory};
    use crate::state::AttemptResult;
    use chrono::Utc;

    fn badge(id: &str, phase: u8, prereqs: &[&str]) -> Badge {
        Badge::new(
            id,
            id,
            BadgeCategory::Competitions,
            phase,
            prereqs.iter().map(|s| s.to_string()).collect(),
            BadgeAction {
                kind: ActionKind::Cli,
                summary: format!("earn {id}"),
            },
        )
    }

    fn abc() -> Catalog {
        Catalog::from_badges(vec![
            badge("A", 1, &[]),
            badge("B", 1, &["A"]),
            badge("C", 2, &["B"]),
        ])
        .unwrap()
    }

    fn ids(badges: &[&Badge]) -> Vec<String> {
        badges.iter().map(|b| b.id.clone()).collect()
    }

    fn earn(progress: &mut BadgeProgress, id: &str) {
        progress.record_attempt(id, AttemptResult::Success, None, Utc::now());
    }

    #[test]
    fn test_abc_scenario() {
        let catalog = abc();
        let mut progress = BadgeProgress::for_catalog(&catalog);

        assert_eq!(ids(&plan(&catalog, &progress, None, false).unwrap()), vec!["A"]);

        earn(&mut progress, "A");
        assert_eq!(ids(&plan(&catalog, &progress, None, false).unwrap()), vec!["B"]);

        earn(&mut progress, "B");
        assert!(plan(&catalog, &progress, Some(1), false).unwrap().is_empty());
        assert_eq!(ids(&plan(&catalog, &progress, Some(2), false).unwrap()), vec!["C"]);
    }

    #[test]
    fn test_phase_filter_never_leaks_other_phases() {
        let catalog = Catalog::builtin().unwrap();
        let graph = PrerequisiteGraph::build(&catalog).unwrap();
        let planner = Planner::new(&catalog, &graph);
        let mut progress = BadgeProgress::for_catalog(&catalog);
        earn(&mut progress, "python_coder");
        earn(&mut progress, "model_creator");

        for phase in 1..=5u8 {
            let planned = planner.plan(&progress, &PlanRequest::for_phase(Some(phase)));
            assert!(planned.iter().all(|b| b.phase == Some(phase)));
        }
    }

    #[test]
    fn test_ordering_is_phase_then_declaration() {
        let catalog = Catalog::from_badges(vec![
            badge("late", 3, &[]),
            badge("first", 1, &[]),
            badge("mid", 2, &[]),
            badge("second", 1, &[]),
        ])
        .unwrap();
        let progress = BadgeProgress::for_catalog(&catalog);
        let planned = plan(&catalog, &progress, None, false).unwrap();
        assert_eq!(ids(&planned), vec!["first", "second", "mid", "late"]);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let catalog = Catalog::builtin().unwrap();
        let mut progress = BadgeProgress::for_catalog(&catalog);
        earn(&mut progress, "dataset_creator");
        let first = ids(&plan(&catalog, &progress, None, false).unwrap());
        for _ in 0..10 {
            assert_eq!(ids(&plan(&catalog, &progress, None, false).unwrap()), first);
        }
    }

    #[test]
    fn test_manual_badges_only_on_request() {
        let catalog = Catalog::builtin().unwrap();
        let progress = BadgeProgress::for_catalog(&catalog);

        let automated = plan(&catalog, &progress, None, false).unwrap();
        assert!(automated.iter().all(|b| b.automatable));

        let everything = plan(&catalog, &progress, None, true).unwrap();
        assert!(everything.iter().any(|b| b.id == "voter"));
        // Expert needs Contributor first.
        assert!(!everything.iter().any(|b| b.id == "expert"));
        // Manual badges come after every phase.
        let first_manual = everything.iter().position(|b| b.phase.is_none()).unwrap();
        assert!(everything[first_manual..].iter().all(|b| b.phase.is_none()));
    }

    #[test]
    fn test_outlook_distinguishes_blocked_from_done() {
        let catalog = abc();
        let graph = PrerequisiteGraph::build(&catalog).unwrap();
        let planner = Planner::new(&catalog, &graph);
        let mut progress = BadgeProgress::for_catalog(&catalog);

        assert_eq!(planner.outlook(&progress, 1), PhaseOutlook::Ready { actionable: 1 });
        assert_eq!(planner.outlook(&progress, 2), PhaseOutlook::Blocked { remaining: 1 });

        earn(&mut progress, "A");
        earn(&mut progress, "B");
        assert_eq!(planner.outlook(&progress, 1), PhaseOutlook::Done);
        assert_eq!(planner.outlook(&progress, 2), PhaseOutlook::Ready { actionable: 1 });
        // A phase with no badges at all is trivially done.
        assert_eq!(planner.outlook(&progress, 4), PhaseOutlook::Done);
    }

    #[test]
    fn test_blockers_lists_unearned_prerequisites() {
        let catalog = Catalog::builtin().unwrap();
        let graph = PrerequisiteGraph::build(&catalog).unwrap();
        let planner = Planner::new(&catalog, &graph);
        let mut progress = BadgeProgress::for_catalog(&catalog);

        let blockers = planner.blockers("competition_modeler", &progress);
        assert_eq!(ids(&blockers), vec!["model_creator", "notebook_modeler"]);

        earn(&mut progress, "model_creator");
        let blockers = planner.blockers("competition_modeler", &progress);
        assert_eq!(ids(&blockers), vec!["notebook_modeler"]);
        assert!(planner.blockers("no_such_badge", &progress).is_empty());
    }

    #[test]
    fn test_forward_reference_fails_planning() {
        let catalog = Catalog::from_badges(vec![badge("X", 2, &[]), badge("Y", 1, &["X"])]).unwrap();
        let progress = BadgeProgress::for_catalog(&catalog);
        assert!(matches!(
            plan(&catalog, &progress, None, false),
            Err(PlanningError::ForwardReference { .. })
        ));
    }
}
