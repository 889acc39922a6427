//! Action runners: the seam through which a badge attempt is carried out.
//!
//! The orchestrator never talks to Kaggle directly. It hands each planned
//! badge to an [`ActionRunner`] and records whatever outcome comes back.
//! [`CommandRunner`] is the stock implementation: it maps badge ids (or
//! glob patterns over them) to external commands.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::badge::Badge;
use crate::state::AttemptResult;

/// Maximum number of stderr lines kept as failure detail.
const STDERR_TAIL_LINES: usize = 5;

/// Result of a single action attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub result: AttemptResult,
    pub detail: Option<String>,
}

impl ActionOutcome {
    pub fn success(detail: Option<String>) -> Self {
        Self {
            result: AttemptResult::Success,
            detail,
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            result: AttemptResult::Failure,
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            result: AttemptResult::Skipped,
            detail: Some(detail.into()),
        }
    }
}

/// Performs the attempt for one badge.
///
/// Implementations report problems through the returned outcome rather than
/// an error: a failed attempt is recorded and the pass moves on.
pub trait ActionRunner {
    fn run(&mut self, badge: &Badge) -> ActionOutcome;
}

/// Runs a configured external command per badge.
///
/// Commands are looked up by exact badge id first, then by the first glob
/// pattern (in sorted order) that matches. Arguments may contain `{badge}`,
/// `{kind}` and `{phase}` placeholders. Badges with no command are skipped
/// with the catalog's manual instructions as detail.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    commands: BTreeMap<String, Vec<String>>,
    working_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new(commands: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            commands,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Command template configured for a badge, if any.
    pub fn command_for(&self, badge_id: &str) -> Option<&[String]> {
        if let Some(cmd) = self.commands.get(badge_id) {
            return Some(cmd.as_slice());
        }
        self.commands
            .iter()
            .find(|(pattern, _)| pattern_matches(pattern, badge_id))
            .map(|(_, cmd)| cmd.as_slice())
    }

    /// Command with placeholders filled in for `badge`.
    pub fn resolve(&self, badge: &Badge) -> Option<Vec<String>> {
        let template = self.command_for(&badge.id)?;
        let phase = badge.phase_label();
        let kind = badge.action.kind.to_string();
        Some(
            template
                .iter()
                .map(|arg| {
                    arg.replace("{badge}", &badge.id)
                        .replace("{kind}", &kind)
                        .replace("{phase}", &phase)
                })
                .collect(),
        )
    }
}

impl ActionRunner for CommandRunner {
    fn run(&mut self, badge: &Badge) -> ActionOutcome {
        let Some(argv) = self.resolve(badge) else {
            return ActionOutcome::skipped(format!(
                "No action configured; manual step: {}",
                badge.action.summary
            ));
        };
        let Some((program, args)) = argv.split_first() else {
            return ActionOutcome::failure("Configured command is empty");
        };

        debug!(badge = %badge.id, command = %argv.join(" "), "Spawning action");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => return ActionOutcome::failure(format!("Failed to spawn '{program}': {e}")),
        };

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let last = stdout.lines().rev().find(|l| !l.trim().is_empty());
            ActionOutcome::success(last.map(|l| l.trim().to_string()))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = tail_lines(&stderr, STDERR_TAIL_LINES);
            let status = match output.status.code() {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
            if tail.is_empty() {
                ActionOutcome::failure(status)
            } else {
                ActionOutcome::failure(format!("{status}: {tail}"))
            }
        }
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Case-insensitive glob match of a badge id.
///
/// - `*` matches any sequence of characters
/// - `?` matches any single character
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();
    glob_match(&pattern, &name)
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => {
            // Collapse runs of stars.
            let rest = {
                let skip = rest.iter().take_while(|&&c| c == '*').count();
                &rest[skip..]
            };
            if rest.is_empty() {
                return true;
            }
            (0..=text.len()).any(|i| glob_match(rest, &text[i..]))
        }
        Some(('?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::{ActionKind, BadgeAction, BadgeCategory};

    fn badge(id: &str) -> Badge {
        Badge::new(
            id,
            id,
            BadgeCategory::Models,
            1,
            vec![],
            BadgeAction {
                kind: ActionKind::Api,
                summary: "Publish a model".into(),
            },
        )
    }

    fn runner(entries: &[(&str, &[&str])]) -> CommandRunner {
        CommandRunner::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        )
    }

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("model_*", "model_creator"));
        assert!(pattern_matches("*_creator", "dataset_creator"));
        assert!(pattern_matches("MODEL_*", "model_tagger"));
        assert!(pattern_matches("r_?oder", "r_coder"));
        assert!(pattern_matches("*", "anything"));
        assert!(pattern_matches("a**b", "axxb"));
        assert!(!pattern_matches("model_*", "dataset_creator"));
        assert!(!pattern_matches("r_?oder", "r_oder"));
        assert!(!pattern_matches("python_coder", "python_coder_x"));
    }

    #[test]
    fn test_exact_id_wins_over_pattern() {
        let r = runner(&[("model_*", &["glob"]), ("model_creator", &["exact"])]);
        assert_eq!(r.command_for("model_creator").unwrap(), &["exact".to_string()]);
        assert_eq!(r.command_for("model_tagger").unwrap(), &["glob".to_string()]);
        assert!(r.command_for("python_coder").is_none());
    }

    #[test]
    fn test_placeholders_are_filled() {
        let r = runner(&[("*", &["earn", "--id={badge}", "{kind}", "{phase}"])]);
        let argv = r.resolve(&badge("model_creator")).unwrap();
        assert_eq!(argv, vec!["earn", "--id=model_creator", "api", "1"]);
    }

    #[test]
    fn test_unconfigured_badge_is_skipped() {
        let mut r = CommandRunner::default();
        let outcome = r.run(&badge("model_creator"));
        assert_eq!(outcome.result, AttemptResult::Skipped);
        assert!(outcome.detail.unwrap().contains("Publish a model"));
    }

    #[test]
    fn test_empty_command_fails() {
        let mut r = runner(&[("model_creator", &[])]);
        assert_eq!(r.run(&badge("model_creator")).result, AttemptResult::Failure);
    }

    #[test]
    fn test_missing_program_fails() {
        let mut r = runner(&[("*", &["definitely-not-a-real-program-8d1f"])]);
        let outcome = r.run(&badge("model_creator"));
        assert_eq!(outcome.result, AttemptResult::Failure);
        assert!(outcome.detail.unwrap().contains("Failed to spawn"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_maps_to_result() {
        let mut ok = runner(&[("*", &["sh", "-c", "echo done {badge}"])]);
        let outcome = ok.run(&badge("model_creator"));
        assert_eq!(outcome.result, AttemptResult::Success);
        assert_eq!(outcome.detail.as_deref(), Some("done model_creator"));

        let mut bad = runner(&[("*", &["sh", "-c", "echo line1 >&2; echo 401 Unauthorized >&2; exit 3"])]);
        let outcome = bad.run(&badge("model_creator"));
        assert_eq!(outcome.result, AttemptResult::Failure);
        let detail = outcome.detail.unwrap();
        assert!(detail.starts_with("exit code 3"));
        assert!(detail.contains("401 Unauthorized"));
    }

    #[test]
    fn test_tail_lines_keeps_last_lines() {
        let text = "a\n\nb\nc\nd\ne\nf\n";
        assert_eq!(tail_lines(text, 2), "e\nf");
        assert_eq!(tail_lines("", 5), "");
    }
}
