use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::badge::Badge;
use crate::orchestrator::{ActionOutcome, RunObserver, RunReport};
use crate::state::AttemptResult;
use crate::ui::icons::{CHECK, CLOCK, CROSS, SKIP, SPARKLE};

/// Terminal UI for a badge run, rendered via `indicatif` progress bars.
///
/// Two bars are stacked vertically:
/// - Badge bar: how many planned badges have been attempted
/// - Attempt spinner: the badge currently being attempted
///
/// Per-badge result lines are printed above the bars through
/// `MultiProgress` so they do not tear the display.
pub struct RunProgress {
    multi: MultiProgress,
    badge_bar: ProgressBar,
    attempt_bar: ProgressBar,
    verbose: bool,
}

impl RunProgress {
    /// Create the UI. Bars are sized once the plan is known.
    pub fn new(verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let badge_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let badge_bar = multi.add(ProgressBar::new(0));
        badge_bar.set_style(badge_style);
        badge_bar.set_prefix("Badges");

        let attempt_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg} {elapsed:.dim}")
            .expect("progress bar template is a valid static string");

        let attempt_bar = multi.add(ProgressBar::new_spinner());
        attempt_bar.set_style(attempt_style);
        attempt_bar.set_prefix("   Now");

        Self {
            multi,
            badge_bar,
            attempt_bar,
            verbose,
        }
    }

    /// Hidden UI for non-interactive output.
    pub fn hidden() -> Self {
        let ui = Self::new(false);
        ui.multi
            .set_draw_target(indicatif::ProgressDrawTarget::hidden());
        ui
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }
}

impl RunObserver for RunProgress {
    fn run_started(&self, planned: &[Badge]) {
        self.badge_bar.set_length(planned.len() as u64);
        if planned.is_empty() {
            self.badge_bar.set_message("nothing actionable");
        }
    }

    fn attempt_started(&self, badge: &Badge) {
        self.badge_bar.set_message(format!(
            "phase {}",
            style(badge.phase_label()).yellow()
        ));
        self.attempt_bar.set_message(format!(
            "{} {}",
            style(&badge.name).cyan(),
            style(format!("({})", badge.action.kind)).dim()
        ));
        self.attempt_bar
            .enable_steady_tick(Duration::from_millis(100));
    }

    fn attempt_finished(&self, badge: &Badge, outcome: &ActionOutcome) {
        self.badge_bar.inc(1);
        let detail = outcome.detail.as_deref().unwrap_or("");
        let line = match outcome.result {
            AttemptResult::Success => {
                format!("  {} {}", CHECK, style(&badge.name).green().bold())
            }
            AttemptResult::Failure => format!(
                "  {} {} {}",
                CROSS,
                style(&badge.name).red().bold(),
                style(detail).dim()
            ),
            AttemptResult::Skipped => format!(
                "  {} {} {}",
                SKIP,
                style(&badge.name).yellow(),
                style(detail).dim()
            ),
        };
        self.print_line(line);
        if self.verbose && outcome.result.is_success() && !detail.is_empty() {
            self.print_line(format!("    {} {}", style("→").dim(), style(detail).dim()));
        }
    }

    fn run_finished(&self, report: &RunReport) {
        self.attempt_bar.finish_and_clear();
        self.badge_bar.finish_with_message(format!(
            "{} earned, {} failed, {} skipped",
            style(report.earned.len()).green(),
            style(report.failed.len()).red(),
            style(report.skipped.len()).yellow()
        ));
        if !report.earned.is_empty() {
            self.print_line(format!(
                "\n{} {} new badge(s) earned!",
                SPARKLE,
                style(report.earned.len()).green().bold()
            ));
        }
        if self.verbose {
            let secs = report.duration().num_seconds();
            self.print_line(format!("{} {}s (run {})", CLOCK, secs, report.run_id));
        }
    }
}
