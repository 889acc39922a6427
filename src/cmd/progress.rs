//! Read-only views: `status` and `plan`.

use anyhow::Result;
use badge_collector::planner::PlanRequest;
use badge_collector::ui::{render_badges, render_plan, render_status};

use super::super::Cli;
use super::{load_config, open_orchestrator};

pub fn cmd_status(cli: &Cli, badges: bool) -> Result<()> {
    let config = load_config(cli)?;
    let orch = open_orchestrator(&config, cli.reset_corrupt)?;

    print!("{}", render_status(&orch.status()));
    if badges {
        print!("{}", render_badges(orch.catalog(), orch.progress()));
    }
    if cli.verbose {
        println!("State file: {}", config.state_file().display());
    }
    println!();
    Ok(())
}

pub fn cmd_plan(cli: &Cli, phase: Option<u8>, all: bool) -> Result<()> {
    let config = load_config(cli)?;
    let orch = open_orchestrator(&config, cli.reset_corrupt)?;

    let request = PlanRequest::for_phase(phase).with_non_automatable(all);
    let plan = orch.plan(&request);

    println!();
    print!("{}", render_plan(&plan, orch.progress()));
    println!();
    Ok(())
}
