//! Typed error hierarchy for the badge collector.
//!
//! Each enum maps to one failure class:
//! - `CatalogError`: malformed or inconsistent badge definitions (fatal)
//! - `PlanningError`: prerequisite graph violates phase ordering (fatal)
//! - `StoreError` / `StoreCorruptError`: progress store I/O and parse failures
//! - `PreflightError`: credentials or network missing, aborts a single run
//! - `OrchestratorError`: everything surfaced by the public orchestrator API

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the badge catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read badge catalog at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Badge catalog is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Embedded badge catalog '{0}' is missing from the binary")]
    EmbeddedMissing(String),

    #[error("Badge catalog version {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Badge catalog contains no badges")]
    Empty,

    #[error("Badge #{index} ({badge}) is missing required field '{field}'")]
    MissingField {
        index: usize,
        badge: String,
        field: &'static str,
    },

    #[error("Badge '{badge}' has phase {phase}; phases must be between 1 and 5")]
    InvalidPhase { badge: String, phase: u8 },

    #[error("Badge '{badge}' is automatable but has no phase")]
    AutomatableWithoutPhase { badge: String },

    #[error("Duplicate badge id: {0}")]
    DuplicateId(String),

    #[error("Badge '{badge}' requires unknown badge '{prerequisite}'")]
    DanglingPrerequisite { badge: String, prerequisite: String },
}

/// Integrity faults in the prerequisite graph.
///
/// These indicate a data bug in the catalog and are never retried.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error(
        "Badge '{badge}' (phase {phase}) depends on '{prerequisite}' from a later phase ({prerequisite_phase})"
    )]
    ForwardReference {
        badge: String,
        phase: String,
        prerequisite: String,
        prerequisite_phase: String,
    },

    #[error("Cycle detected in badge prerequisites. Involved badges: {badges:?}")]
    Cycle { badges: Vec<String> },
}

/// The persisted progress file exists but cannot be parsed.
#[derive(Debug, Error)]
#[error("Badge progress store at {path} is unreadable: {reason}")]
pub struct StoreCorruptError {
    pub path: PathBuf,
    pub reason: String,
}

/// Errors from a [`crate::state::StateStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Corrupt(#[from] StoreCorruptError),

    #[error("Failed to read badge progress at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write badge progress at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize badge progress: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    /// True when the caller may recover by reinitialising the store.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt(_))
    }
}

/// Preflight failures abort the current run only; state stays untouched.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error(
        "Kaggle credentials not found. Set KAGGLE_USERNAME and KAGGLE_KEY, or create ~/.kaggle/kaggle.json from https://www.kaggle.com/settings"
    )]
    MissingCredentials,

    #[error("Kaggle credentials file {path} is invalid: {reason}")]
    InvalidCredentials { path: PathBuf, reason: String },

    #[error("Host {host} is unreachable: {reason}. Check your network connection and retry")]
    HostUnreachable { host: String, reason: String },
}

/// Errors surfaced by the orchestrator's public operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Preflight failed, run aborted: {0}")]
    Preflight(#[from] PreflightError),

    #[error("Unknown badge id: {0}")]
    UnknownBadge(String),

    #[error("Badge '{badge}' cannot be marked earned before its prerequisites: {missing:?}")]
    PrerequisitesUnmet { badge: String, missing: Vec<String> },
}
