//! Badge catalog loading and lookup.
//!
//! The default catalog ships inside the binary (`catalog/badges.json`); a
//! user catalog with the same JSON shape can replace it:
//!
//! ```json
//! {
//!   "version": 1,
//!   "badges": [
//!     {
//!       "id": "python_coder",
//!       "name": "Python Coder",
//!       "category": "notebooks",
//!       "phase": 1,
//!       "automatable": true,
//!       "prerequisites": [],
//!       "action": { "kind": "api", "summary": "Push a Python notebook via API" }
//!     }
//!   ]
//! }
//! ```
//!
//! Loading is all-or-nothing: any malformed entry or dangling prerequisite
//! rejects the whole catalog with a [`CatalogError`].

pub mod graph;

pub use graph::PrerequisiteGraph;

use rust_embed::RustEmbed;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::badge::{Badge, BadgeDef};
use crate::errors::CatalogError;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/catalog/"]
struct CatalogAssets;

/// File name of the embedded default catalog.
pub const BUILTIN_CATALOG: &str = "badges.json";
/// Catalog format version this build reads. A missing version means 1.
pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    version: Option<u32>,
    badges: Vec<BadgeDef>,
}

impl CatalogFile {
    fn into_catalog(self) -> Result<Catalog, CatalogError> {
        if let Some(found) = self.version
            && found != CATALOG_VERSION
        {
            return Err(CatalogError::UnsupportedVersion {
                found,
                supported: CATALOG_VERSION,
            });
        }
        Catalog::from_defs(self.badges)
    }
}

/// Validated, ordered set of badges.
#[derive(Debug, Clone)]
pub struct Catalog {
    badges: Vec<Badge>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Load the catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        let file = CatalogAssets::get(BUILTIN_CATALOG)
            .ok_or_else(|| CatalogError::EmbeddedMissing(BUILTIN_CATALOG.to_string()))?;
        let parsed: CatalogFile = serde_json::from_slice(&file.data).map_err(CatalogError::Parse)?;
        parsed.into_catalog()
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load `path` when given, the embedded catalog otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    /// Parse catalog JSON.
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let parsed: CatalogFile = serde_json::from_str(content).map_err(CatalogError::Parse)?;
        parsed.into_catalog()
    }

    fn from_defs(defs: Vec<BadgeDef>) -> Result<Self, CatalogError> {
        let badges = defs
            .into_iter()
            .enumerate()
            .map(|(i, def)| def.into_badge(i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_badges(badges)
    }

    /// Build a catalog from already typed badges, checking cross-badge
    /// consistency (unique ids, no dangling prerequisites).
    pub fn from_badges(badges: Vec<Badge>) -> Result<Self, CatalogError> {
        if badges.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(badges.len());
        for (i, badge) in badges.iter().enumerate() {
            if index.insert(badge.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(badge.id.clone()));
            }
        }

        for badge in &badges {
            if let Some(missing) = badge
                .prerequisites
                .iter()
                .find(|p| !index.contains_key(p.as_str()))
            {
                return Err(CatalogError::DanglingPrerequisite {
                    badge: badge.id.clone(),
                    prerequisite: missing.clone(),
                });
            }
        }

        Ok(Self { badges, index })
    }

    /// All badges in declaration order.
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Badge> {
        self.index.get(id).map(|&i| &self.badges[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Declaration position of a badge.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Badges assigned to `phase`, in declaration order.
    pub fn in_phase(&self, phase: u8) -> impl Iterator<Item = &Badge> {
        self.badges.iter().filter(move |b| b.phase == Some(phase))
    }

    /// Badges with no phase (the manual group).
    pub fn unphased(&self) -> impl Iterator<Item = &Badge> {
        self.badges.iter().filter(|b| b.phase.is_none())
    }

    pub fn automatable(&self) -> impl Iterator<Item = &Badge> {
        self.badges.iter().filter(|b| b.automatable)
    }
}
