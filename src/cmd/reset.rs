//! Progress reset: `badge-collector reset`.

use anyhow::Result;
use dialoguer::Confirm;

use super::super::Cli;
use super::{load_config, open_orchestrator};

pub fn cmd_reset(cli: &Cli, force: bool) -> Result<()> {
    let config = load_config(cli)?;

    if !force {
        let confirm = Confirm::new()
            .with_prompt("This will mark every badge unearned. Are you sure?")
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirm {
            println!("Reset cancelled");
            return Ok(());
        }
    }

    // Resetting discards progress anyway, so an unreadable file is moved aside.
    let mut orch = open_orchestrator(&config, true)?;
    orch.reset()?;

    println!("Reset complete: {}", config.state_file().display());
    Ok(())
}
