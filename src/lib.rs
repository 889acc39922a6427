//! Kaggle badge collection planner and orchestrator.
//!
//! The library tracks which badges are earned, works out which ones can be
//! attempted next, and drives attempts through pluggable runners. The
//! `badge-collector` binary is a thin CLI over [`orchestrator::Orchestrator`].

pub mod badge;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod planner;
pub mod state;
pub mod ui;

pub use badge::Badge;
pub use catalog::Catalog;
pub use orchestrator::Orchestrator;
pub use planner::{PlanRequest, plan};
