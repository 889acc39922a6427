//! Manual verification and history: `record`, `history`.

use anyhow::Result;
use badge_collector::state::{AttemptLog, EntrySource};
use chrono::Utc;
use console::style;

use super::super::Cli;
use super::{load_config, open_orchestrator};

pub fn cmd_record(cli: &Cli, badge: &str, earned: bool, detail: Option<&str>) -> Result<()> {
    let config = load_config(cli)?;
    let mut orch = open_orchestrator(&config, cli.reset_corrupt)?;

    let newly = orch.verify(badge, earned, detail, Utc::now())?;
    if earned && newly {
        println!("Recorded {} as earned", style(badge).green().bold());
    } else if earned {
        println!("{} was already earned", badge);
    } else if orch.progress().is_earned(badge) {
        println!(
            "Recorded failure for {} (badge stays earned)",
            style(badge).yellow()
        );
    } else {
        println!("Recorded failure for {}", style(badge).red());
    }
    Ok(())
}

pub fn cmd_history(cli: &Cli, badge: Option<&str>, limit: usize) -> Result<()> {
    let config = load_config(cli)?;
    let Some(path) = config.history_file() else {
        println!("Attempt history is disabled ([state] history = false).");
        return Ok(());
    };

    let log = AttemptLog::new(path);
    let entries = match badge {
        Some(id) => log.for_badge(id)?,
        None => log.entries()?,
    };

    if entries.is_empty() {
        println!("No attempts recorded yet.");
        return Ok(());
    }

    let start = entries.len().saturating_sub(limit);
    println!();
    println!(
        "{:<20} {:<28} {:<8} {:<7} Detail",
        "When", "Badge", "Result", "Source"
    );
    for entry in &entries[start..] {
        let source = match entry.source {
            EntrySource::Run => "run",
            EntrySource::Verify => "record",
        };
        println!(
            "{:<20} {:<28} {:<8} {:<7} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.badge,
            entry.result.to_string(),
            source,
            style(entry.detail.as_deref().unwrap_or("")).dim()
        );
    }
    println!();
    if start > 0 {
        println!("({} older entries not shown)", start);
        println!();
    }
    Ok(())
}
