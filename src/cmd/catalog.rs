//! Catalog listing and validation: `badge-collector catalog`.

use anyhow::{Context, Result, bail};
use badge_collector::badge::phase_label;
use badge_collector::catalog::PrerequisiteGraph;
use console::style;

use super::super::Cli;
use super::load_config;

pub fn cmd_catalog(cli: &Cli, check: bool) -> Result<()> {
    let config = load_config(cli)?;
    let catalog = config.load_catalog()?;
    let source = match config.catalog_path() {
        Some(path) => path.display().to_string(),
        None => "built-in".to_string(),
    };

    if check {
        println!();
        println!("Validating catalog ({})...", source);
        PrerequisiteGraph::build(&catalog).context("Prerequisite graph is invalid")?;
        println!(
            "  {} badges, {} automatable, prerequisite graph OK",
            catalog.len(),
            catalog.automatable().count()
        );

        let warnings = config.toml.validate(&catalog);
        if warnings.is_empty() {
            println!("Configuration is valid.");
            println!();
            return Ok(());
        }
        println!("Configuration warnings:");
        for warning in &warnings {
            println!("  - {}", warning);
        }
        println!();
        bail!("{} configuration warning(s)", warnings.len());
    }

    println!();
    println!("Badge catalog ({}, {} badges)", source, catalog.len());
    println!();
    println!(
        "{:<7} {:<28} {:<13} {:<8} Requires",
        "Phase", "Badge", "Category", "Kind"
    );
    let mut badges: Vec<_> = catalog.badges().iter().collect();
    badges.sort_by_key(|b| b.phase_rank());
    for badge in badges {
        println!(
            "{:<7} {:<28} {:<13} {:<8} {}",
            phase_label(badge.phase),
            badge.id,
            badge.category.to_string(),
            badge.action.kind.to_string(),
            style(badge.prerequisites.join(", ")).dim()
        );
    }
    println!();
    Ok(())
}
