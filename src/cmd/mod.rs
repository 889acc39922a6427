//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled      |
//! |------------|-----------------------|
//! | `progress` | `Status`, `Plan`      |
//! | `run`      | `Run`                 |
//! | `record`   | `Record`, `History`   |
//! | `reset`    | `Reset`               |
//! | `catalog`  | `Catalog`             |

pub mod catalog;
pub mod progress;
pub mod record;
pub mod reset;
pub mod run;

pub use catalog::cmd_catalog;
pub use progress::{cmd_plan, cmd_status};
pub use record::{cmd_history, cmd_record};
pub use reset::cmd_reset;
pub use run::cmd_run;

use anyhow::{Context, Result, bail};
use badge_collector::config::BadgeConfig;
use badge_collector::errors::OrchestratorError;
use badge_collector::orchestrator::Orchestrator;
use badge_collector::state::{AttemptLog, FileStateStore};

use super::Cli;

pub fn load_config(cli: &Cli) -> Result<BadgeConfig> {
    BadgeConfig::with_cli_args(
        cli.config.as_deref(),
        cli.state_file.clone(),
        cli.catalog.clone(),
        cli.verbose,
    )
}

/// Build the orchestrator over the configured progress file.
///
/// An unreadable progress file is an error unless `reset_corrupt` is set,
/// in which case the file is moved aside and progress starts fresh.
pub fn open_orchestrator(
    config: &BadgeConfig,
    reset_corrupt: bool,
) -> Result<Orchestrator<FileStateStore>> {
    let catalog = config.load_catalog()?;
    let store = FileStateStore::new(config.state_file());

    let orchestrator = match Orchestrator::new(catalog.clone(), store.clone()) {
        Ok(orch) => orch,
        Err(OrchestratorError::Store(e)) if e.is_corrupt() => {
            if !reset_corrupt {
                bail!(
                    "{}\nRun again with --reset-corrupt to move it aside and start from scratch.",
                    e
                );
            }
            if let Some(backup) = store.quarantine()? {
                eprintln!("Moved unreadable progress file to {}", backup.display());
            }
            Orchestrator::new(catalog, store)?
        }
        Err(e) => return Err(e).context("Failed to start badge orchestrator"),
    };

    Ok(match config.history_file() {
        Some(path) => orchestrator.with_history(AttemptLog::new(path)),
        None => orchestrator,
    })
}
