//! Badge run command: `badge-collector run`.

use anyhow::Result;
use badge_collector::orchestrator::{KagglePreflight, Preflight, RunReport, SkipPreflight};
use badge_collector::ui::icons::{CROSS, SKIP, WARN};
use badge_collector::ui::{RunProgress, render_plan};
use console::style;

use super::super::Cli;
use super::{load_config, open_orchestrator};

pub fn cmd_run(cli: &Cli, phase: Option<u8>, dry_run: bool, skip_preflight: bool) -> Result<()> {
    let config = load_config(cli)?;
    let mut orch = open_orchestrator(&config, cli.reset_corrupt)?;

    if dry_run {
        let plan = orch.dry_run(phase);
        println!();
        print!("{}", render_plan(&plan, orch.progress()));
        println!();
        println!("Dry run: no actions executed");
        return Ok(());
    }

    let kaggle: KagglePreflight;
    let preflight: &dyn Preflight = if skip_preflight {
        &SkipPreflight
    } else {
        kaggle = config.preflight();
        &kaggle
    };
    let mut runner = config.command_runner();

    let interactive = console::user_attended();
    let ui = if interactive {
        RunProgress::new(cli.verbose)
    } else {
        RunProgress::hidden()
    };

    let report = orch.execute(phase, preflight, &mut runner, &ui)?;
    print_report(&report, !interactive);
    Ok(())
}

fn print_report(report: &RunReport, per_badge: bool) {
    println!();
    if report.planned.is_empty() {
        println!("Nothing actionable right now. Run 'badge-collector status' to see what is blocked.");
        println!();
        return;
    }

    if per_badge {
        for badge in &report.earned {
            println!("  earned   {}", badge);
        }
    }
    if per_badge || !report.failed.is_empty() {
        for note in &report.failed {
            println!(
                "  {}failed   {} {}",
                CROSS,
                note.badge,
                style(note.detail.as_deref().unwrap_or("")).dim()
            );
        }
    }
    if per_badge {
        for note in &report.skipped {
            println!(
                "  {}skipped  {} {}",
                SKIP,
                note.badge,
                style(note.detail.as_deref().unwrap_or("")).dim()
            );
        }
    }

    println!(
        "Run {}: {} earned, {} failed, {} skipped",
        report.run_id,
        report.earned.len(),
        report.failed.len(),
        report.skipped.len()
    );
    if !report.is_clean() {
        println!(
            "{}Failed badges stay actionable; run again to retry.",
            WARN
        );
    }
    println!();
}
