//! Badge definitions.
//!
//! This module provides:
//! - `Badge`, the immutable record loaded from the catalog
//! - `BadgeAction` / `ActionKind`, describing what attempt earns a badge
//! - `BadgeDef`, the loosely typed on-disk shape validated into a `Badge`

use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// Lowest automation phase.
pub const FIRST_PHASE: u8 = 1;
/// Highest automation phase.
pub const LAST_PHASE: u8 = 5;

/// Human label for an optional phase ("1".."5", or "manual").
pub fn phase_label(phase: Option<u8>) -> String {
    match phase {
        Some(p) => p.to_string(),
        None => "manual".to_string(),
    }
}

/// Area of Kaggle a badge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Notebooks,
    Datasets,
    Models,
    Competitions,
    Community,
    Account,
}

impl std::fmt::Display for BadgeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadgeCategory::Notebooks => write!(f, "notebooks"),
            BadgeCategory::Datasets => write!(f, "datasets"),
            BadgeCategory::Models => write!(f, "models"),
            BadgeCategory::Competitions => write!(f, "competitions"),
            BadgeCategory::Community => write!(f, "community"),
            BadgeCategory::Account => write!(f, "account"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

/// How an attempt at a badge is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Kaggle REST API call
    Api,
    /// `kaggle` CLI invocation
    Cli,
    /// Browser automation step
    Browser,
    /// Repeated daily action (login or submission streak)
    Streak,
    /// Requires a human; never automated
    Manual,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Api => write!(f, "api"),
            ActionKind::Cli => write!(f, "cli"),
            ActionKind::Browser => write!(f, "browser"),
            ActionKind::Streak => write!(f, "streak"),
            ActionKind::Manual => write!(f, "manual"),
        }
    }
}

/// Action descriptor: what operation attempts to earn the badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeAction {
    pub kind: ActionKind,
    /// Short instruction, e.g. "Push a Python notebook via API"
    pub summary: String,
}

/// A single Kaggle badge. Immutable after catalog load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub category: BadgeCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    /// Automation phase (1-5). Only non-automatable badges may omit it.
    #[serde(default)]
    pub phase: Option<u8>,
    pub automatable: bool,
    /// Ids of badges that must be earned first
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub action: BadgeAction,
}

impl Badge {
    /// Create an automatable badge in the given phase.
    pub fn new(
        id: &str,
        name: &str,
        category: BadgeCategory,
        phase: u8,
        prerequisites: Vec<String>,
        action: BadgeAction,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            tier: None,
            phase: Some(phase),
            automatable: true,
            prerequisites,
            action,
        }
    }

    /// Create a badge that can only be earned by hand.
    pub fn manual(id: &str, name: &str, category: BadgeCategory, summary: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            tier: None,
            phase: None,
            automatable: false,
            prerequisites: Vec::new(),
            action: BadgeAction {
                kind: ActionKind::Manual,
                summary: summary.to_string(),
            },
        }
    }

    /// Sort key for phase ordering; unphased badges rank after the last phase.
    pub fn phase_rank(&self) -> u8 {
        self.phase.unwrap_or(LAST_PHASE + 1)
    }

    pub fn phase_label(&self) -> String {
        phase_label(self.phase)
    }
}

/// On-disk badge entry before validation.
///
/// Every field is optional so that a missing one is reported with the
/// badge it belongs to instead of a bare serde error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BadgeDef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub category: Option<BadgeCategory>,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub phase: Option<u8>,
    pub automatable: Option<bool>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub action: Option<BadgeAction>,
}

impl BadgeDef {
    /// Validate a single entry. `index` is its position in the catalog.
    ///
    /// Cross-badge checks (duplicates, dangling prerequisites) live in the
    /// catalog loader.
    pub fn into_badge(self, index: usize) -> Result<Badge, CatalogError> {
        let id = non_empty(self.id).ok_or_else(|| CatalogError::MissingField {
            index,
            badge: "<unnamed>".to_string(),
            field: "id",
        })?;
        let missing = |field: &'static str| CatalogError::MissingField {
            index,
            badge: id.clone(),
            field,
        };

        let name = non_empty(self.name).ok_or_else(|| missing("name"))?;
        let category = self.category.ok_or_else(|| missing("category"))?;
        let automatable = self.automatable.ok_or_else(|| missing("automatable"))?;
        let action = self.action.ok_or_else(|| missing("action"))?;
        if action.summary.trim().is_empty() {
            return Err(missing("action.summary"));
        }

        if let Some(phase) = self.phase
            && !(FIRST_PHASE..=LAST_PHASE).contains(&phase)
        {
            return Err(CatalogError::InvalidPhase { badge: id, phase });
        }
        if automatable && self.phase.is_none() {
            return Err(CatalogError::AutomatableWithoutPhase { badge: id });
        }

        Ok(Badge {
            id,
            name,
            category,
            tier: self.tier,
            phase: self.phase,
            automatable,
            prerequisites: self.prerequisites,
            action,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_def() -> BadgeDef {
        BadgeDef {
            id: Some("python_coder".into()),
            name: Some("Python Coder".into()),
            category: Some(BadgeCategory::Notebooks),
            tier: None,
            phase: Some(1),
            automatable: Some(true),
            prerequisites: vec![],
            action: Some(BadgeAction {
                kind: ActionKind::Api,
                summary: "Push a Python notebook via API".into(),
            }),
        }
    }

    #[test]
    fn test_valid_def_becomes_badge() {
        let badge = full_def().into_badge(0).unwrap();
        assert_eq!(badge.id, "python_coder");
        assert_eq!(badge.phase, Some(1));
        assert!(badge.automatable);
        assert_eq!(badge.action.kind, ActionKind::Api);
    }

    #[test]
    fn test_missing_name_reports_badge_and_field() {
        let def = BadgeDef {
            name: None,
            ..full_def()
        };
        let err = def.into_badge(3).unwrap_err();
        match err {
            CatalogError::MissingField { index, badge, field } => {
                assert_eq!(index, 3);
                assert_eq!(badge, "python_coder");
                assert_eq!(field, "name");
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_id_is_missing() {
        let def = BadgeDef {
            id: Some("   ".into()),
            ..full_def()
        };
        assert!(matches!(
            def.into_badge(0),
            Err(CatalogError::MissingField { field: "id", .. })
        ));
    }

    #[test]
    fn test_phase_out_of_range() {
        let def = BadgeDef {
            phase: Some(6),
            ..full_def()
        };
        assert!(matches!(
            def.into_badge(0),
            Err(CatalogError::InvalidPhase { phase: 6, .. })
        ));
    }

    #[test]
    fn test_automatable_requires_phase() {
        let def = BadgeDef {
            phase: None,
            ..full_def()
        };
        assert!(matches!(
            def.into_badge(0),
            Err(CatalogError::AutomatableWithoutPhase { .. })
        ));
    }

    #[test]
    fn test_manual_badge_without_phase_is_fine() {
        let def = BadgeDef {
            phase: None,
            automatable: Some(false),
            ..full_def()
        };
        let badge = def.into_badge(0).unwrap();
        assert_eq!(badge.phase_rank(), LAST_PHASE + 1);
        assert_eq!(badge.phase_label(), "manual");
    }

    #[test]
    fn test_deserialization_with_defaults() {
        let json = r#"{
            "id": "voter",
            "name": "Voter",
            "category": "community",
            "automatable": false,
            "action": {"kind": "manual", "summary": "Upvote content on Kaggle"}
        }"#;
        let def: BadgeDef = serde_json::from_str(json).unwrap();
        let badge = def.into_badge(0).unwrap();
        assert!(badge.prerequisites.is_empty());
        assert!(badge.tier.is_none());
        assert!(badge.phase.is_none());
    }
}
