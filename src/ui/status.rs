//! Plain tables for `status`, `status --badges` and `plan`.
//!
//! Rendering returns a `String` so commands decide where it goes; colour is
//! applied by `console` and dropped automatically when stdout is not a tty.

use console::style;
use std::fmt::Write;

use crate::badge::{Badge, FIRST_PHASE, LAST_PHASE};
use crate::catalog::Catalog;
use crate::orchestrator::{PhaseStatus, StatusReport};
use crate::planner::PhaseOutlook;
use crate::state::{AttemptResult, BadgeProgress, BadgeState};
use crate::ui::icons::{BLOCKER, DONE, MANUAL, PROGRESS, READY};

fn outlook_cell(status: &PhaseStatus) -> String {
    match status.outlook {
        PhaseOutlook::Done => format!("{}{}", DONE, style("done").green()),
        PhaseOutlook::Ready { actionable } if status.phase.is_none() => {
            format!("{}{} by hand", MANUAL, style(actionable).yellow())
        }
        PhaseOutlook::Ready { actionable } => {
            format!("{}{} ready", READY, style(actionable).cyan())
        }
        PhaseOutlook::Blocked { remaining } => {
            format!("{}{} blocked", BLOCKER, style(remaining).red())
        }
    }
}

fn phase_row(out: &mut String, status: &PhaseStatus) {
    let name = match status.phase {
        Some(p) => format!("Phase {}", p),
        None => "Manual".to_string(),
    };
    let _ = writeln!(
        out,
        "{:<8} {:>3}/{:<3} {:>10}   {}",
        name,
        status.earned,
        status.total,
        status.actionable,
        outlook_cell(status)
    );
}

/// Table of per-phase progress plus totals.
pub fn render_status(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "Kaggle Badge Progress");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<8} {:>7} {:>10}   Outlook",
        "Group", "Earned", "Actionable"
    );
    let _ = writeln!(
        out,
        "{:<8} {:>7} {:>10}   -------",
        "-----", "------", "----------"
    );
    for phase in &report.phases {
        phase_row(&mut out, phase);
    }
    phase_row(&mut out, &report.manual);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}Earned {}/{} badges ({:.0}%), automatable {}/{}",
        PROGRESS,
        style(report.earned).green().bold(),
        report.total,
        report.percent_earned(),
        report.automatable_earned,
        report.automatable_total
    );
    out
}

fn badge_marker(state: Option<&BadgeState>) -> &'static str {
    match state {
        Some(s) if s.earned => "[x]",
        Some(s) if s.attempting_since.is_some() => "[~]",
        Some(s) => match s.last_result {
            Some(AttemptResult::Failure) => "[!]",
            Some(AttemptResult::Skipped) => "[-]",
            _ => "[ ]",
        },
        None => "[ ]",
    }
}

fn badge_group(out: &mut String, title: &str, badges: &[&Badge], progress: &BadgeProgress) {
    if badges.is_empty() {
        return;
    }
    let earned = badges.iter().filter(|b| progress.is_earned(&b.id)).count();
    let _ = writeln!(out, "{} ({}/{})", style(title).bold(), earned, badges.len());
    for badge in badges {
        let state = progress.get(&badge.id);
        let detail = state.and_then(|s| s.detail.as_deref()).unwrap_or("");
        let _ = writeln!(
            out,
            "  {} {:<28} {:<32} {}",
            badge_marker(state),
            badge.id,
            badge.name,
            style(detail).dim()
        );
    }
    let _ = writeln!(out);
}

/// Every catalog badge under its phase, marked earned `[x]`, interrupted
/// `[~]`, failed `[!]`, skipped `[-]` or untried `[ ]`.
pub fn render_badges(catalog: &Catalog, progress: &BadgeProgress) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    for phase in FIRST_PHASE..=LAST_PHASE {
        let badges: Vec<&Badge> = catalog.in_phase(phase).collect();
        badge_group(&mut out, &format!("Phase {}", phase), &badges, progress);
    }
    let manual: Vec<&Badge> = catalog.unphased().collect();
    badge_group(&mut out, "Manual", &manual, progress);
    out
}

/// Numbered list of planned badges with their last recorded result.
pub fn render_plan(badges: &[&Badge], progress: &BadgeProgress) -> String {
    let mut out = String::new();
    if badges.is_empty() {
        let _ = writeln!(out, "Nothing actionable right now.");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<4} {:<7} {:<28} {:<8} Last result",
        "#", "Phase", "Badge", "Kind"
    );
    for (i, badge) in badges.iter().enumerate() {
        let last = progress
            .get(&badge.id)
            .and_then(|s| s.last_result)
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<4} {:<7} {:<28} {:<8} {}",
            i + 1,
            badge.phase_label(),
            badge.id,
            badge.action.kind.to_string(),
            style(last).dim()
        );
        let _ = writeln!(out, "     {}", style(&badge.action.summary).dim());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{} badge(s) actionable", badges.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::orchestrator::Orchestrator;
    use crate::state::MemoryStateStore;

    #[test]
    fn test_render_status_lists_every_group() {
        let orch = Orchestrator::new(Catalog::builtin().unwrap(), MemoryStateStore::new()).unwrap();
        let text = render_status(&orch.status());
        for label in ["Phase 1", "Phase 2", "Phase 3", "Phase 4", "Phase 5", "Manual"] {
            assert!(text.contains(label), "missing {label}");
        }
        assert!(text.contains("/55 badges"));
        assert!(text.contains("automatable 0/38"));
    }

    #[test]
    fn test_render_plan() {
        let orch = Orchestrator::new(Catalog::builtin().unwrap(), MemoryStateStore::new()).unwrap();
        let plan = orch.dry_run(Some(5));
        let text = render_plan(&plan, orch.progress());
        assert!(text.contains("seven_day_login_streak"));
        assert!(!text.contains("thirty_day_login_streak"));
        assert!(text.contains("badge(s) actionable"));
    }

    #[test]
    fn test_render_badges_marks_each_state() {
        let catalog = Catalog::builtin().unwrap();
        let mut progress = BadgeProgress::for_catalog(&catalog);
        let at = chrono::Utc::now();
        progress.record_attempt("vampire", AttemptResult::Success, None, at);
        progress.record_attempt("r_coder", AttemptResult::Failure, Some("kernel push exit 1"), at);
        progress.record_attempt("stylish", AttemptResult::Skipped, Some("no command configured"), at);
        progress.mark_attempting("collector", at);

        let text = render_badges(&catalog, &progress);
        let line = |id: &str| {
            text.lines()
                .find(|l| l.split_whitespace().any(|w| w == id))
                .unwrap_or_else(|| panic!("no row for {id}"))
                .to_string()
        };
        assert!(line("vampire").trim_start().starts_with("[x]"));
        assert!(line("r_coder").trim_start().starts_with("[!]"));
        assert!(line("r_coder").contains("kernel push exit 1"));
        assert!(line("stylish").trim_start().starts_with("[-]"));
        assert!(line("collector").trim_start().starts_with("[~]"));
        assert!(line("bookmarker").trim_start().starts_with("[ ]"));
        assert!(text.contains("Manual"));
        assert!(text.find("Phase 1").unwrap() < text.find("Phase 5").unwrap());
    }

    #[test]
    fn test_render_empty_plan() {
        let progress = BadgeProgress::default();
        assert_eq!(render_plan(&[], &progress), "Nothing actionable right now.\n");
    }
}
