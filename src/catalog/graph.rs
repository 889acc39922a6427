//! Prerequisite graph integrity checks.
//!
//! Edges run from a prerequisite to the badge that needs it. The graph is
//! built once per process and rejects two kinds of catalog bugs:
//! - forward references (a badge depending on a later phase)
//! - cycles among badges of the same phase

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::errors::PlanningError;

/// Index into the catalog's badge list.
pub type BadgeIndex = usize;

/// Validated prerequisite edges over a catalog.
#[derive(Debug, Clone)]
pub struct PrerequisiteGraph {
    /// index -> badges that require it
    dependents: Vec<Vec<BadgeIndex>>,
    /// index -> badges it requires
    dependencies: Vec<Vec<BadgeIndex>>,
}

impl PrerequisiteGraph {
    /// Build and validate the graph for `catalog`.
    pub fn build(catalog: &Catalog) -> Result<Self, PlanningError> {
        let badges = catalog.badges();
        let mut dependents: Vec<Vec<BadgeIndex>> = vec![Vec::new(); badges.len()];
        let mut dependencies: Vec<Vec<BadgeIndex>> = vec![Vec::new(); badges.len()];

        for (to_idx, badge) in badges.iter().enumerate() {
            for prereq in &badge.prerequisites {
                // Dangling ids were already rejected by the catalog loader.
                let Some(from_idx) = catalog.index_of(prereq) else {
                    continue;
                };
                let from = &badges[from_idx];
                if from.phase_rank() > badge.phase_rank() {
                    return Err(PlanningError::ForwardReference {
                        badge: badge.id.clone(),
                        phase: badge.phase_label(),
                        prerequisite: from.id.clone(),
                        prerequisite_phase: from.phase_label(),
                    });
                }
                dependents[from_idx].push(to_idx);
                dependencies[to_idx].push(from_idx);
            }
        }

        let graph = Self {
            dependents,
            dependencies,
        };
        graph.validate_no_cycles(catalog)?;
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Badges the given badge requires.
    pub fn dependencies(&self, index: BadgeIndex) -> &[BadgeIndex] {
        self.dependencies.get(index).map_or(&[], |v| v.as_slice())
    }

    /// Badges that require the given badge.
    pub fn dependents(&self, index: BadgeIndex) -> &[BadgeIndex] {
        self.dependents.get(index).map_or(&[], |v| v.as_slice())
    }

    /// Check if every prerequisite of `index` is in `earned`.
    pub fn dependencies_satisfied(&self, index: BadgeIndex, earned: &HashSet<BadgeIndex>) -> bool {
        self.dependencies(index)
            .iter()
            .all(|dep| earned.contains(dep))
    }

    /// Kahn's algorithm; any node left with in-degree > 0 sits on a cycle.
    fn validate_no_cycles(&self, catalog: &Catalog) -> Result<(), PlanningError> {
        let mut in_degree: Vec<usize> = self.dependencies.iter().map(|deps| deps.len()).collect();

        let mut queue: Vec<BadgeIndex> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut processed = 0;
        while let Some(node) = queue.pop() {
            processed += 1;
            for &dependent in self.dependents(node) {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        if processed != self.len() {
            let badges = in_degree
                .iter()
                .enumerate()
                .filter(|&(_, deg)| *deg > 0)
                .filter_map(|(i, _)| catalog.badges().get(i).map(|b| b.id.clone()))
                .collect();
            return Err(PlanningError::Cycle { badges });
        }

        Ok(())
    }
}
