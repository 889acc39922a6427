//! Configuration for the badge collector.
//!
//! Settings are read from `~/.badge-collector/config.toml` and layered
//! file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [state]
//! path = "~/.badge-collector/badge-progress.json"
//! history = true
//!
//! [catalog]
//! path = "my-badges.json"
//!
//! [preflight]
//! hosts = ["https://www.kaggle.com"]
//! timeout_secs = 10
//!
//! [actions."python_coder"]
//! command = ["kaggle", "kernels", "push", "-p", "templates/python"]
//!
//! [actions."model_*"]
//! command = ["./scripts/earn.sh", "{badge}"]
//! ```
//!
//! Relative paths in the file are resolved against the file's directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::orchestrator::preflight::{DEFAULT_HOST, KagglePreflight};
use crate::orchestrator::runner::{CommandRunner, pattern_matches};

/// Overrides the base directory (`~/.badge-collector`).
pub const ENV_HOME: &str = "BADGE_COLLECTOR_HOME";
/// Overrides the progress file path.
pub const ENV_STATE: &str = "BADGE_COLLECTOR_STATE";
/// Overrides the catalog path.
pub const ENV_CATALOG: &str = "BADGE_COLLECTOR_CATALOG";

const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "badge-progress.json";
const HISTORY_FILE: &str = "history.jsonl";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSection {
    /// Progress file (default: `<home>/badge-progress.json`)
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Keep `history.jsonl` next to the progress file
    #[serde(default = "default_true")]
    pub history: bool,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: None,
            history: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSection {
    /// User catalog; the embedded catalog is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightSection {
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Alternative to `~/.kaggle/kaggle.json`
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

impl Default for PreflightSection {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            timeout_secs: default_timeout_secs(),
            credentials_file: None,
        }
    }
}

/// Command attached to a badge id or glob pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionSection {
    #[serde(default)]
    pub command: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_hosts() -> Vec<String> {
    vec![DEFAULT_HOST.to_string()]
}

fn default_timeout_secs() -> u64 {
    10
}

/// Parsed `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BadgeToml {
    #[serde(default)]
    pub state: StateSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub preflight: PreflightSection,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionSection>,
}

impl BadgeToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config.toml")
    }

    /// Command templates keyed by badge id or pattern.
    pub fn action_commands(&self) -> BTreeMap<String, Vec<String>> {
        self.actions
            .iter()
            .map(|(k, v)| (k.clone(), v.command.clone()))
            .collect()
    }

    /// Check the configuration against a catalog and return any warnings.
    pub fn validate(&self, catalog: &Catalog) -> Vec<String> {
        let mut warnings = Vec::new();

        for (pattern, action) in &self.actions {
            if action.command.is_empty() {
                warnings.push(format!("Action '{}' has an empty command", pattern));
            }
            let matches_any = catalog
                .badges()
                .iter()
                .any(|b| pattern_matches(pattern, &b.id));
            if !matches_any {
                warnings.push(format!(
                    "Action '{}' does not match any badge in the catalog",
                    pattern
                ));
            }
            if let Some(badge) = catalog.get(pattern)
                && !badge.automatable
            {
                warnings.push(format!(
                    "Action '{}' targets a badge that is not automatable and will never run",
                    pattern
                ));
            }
        }

        if self.preflight.timeout_secs == 0 {
            warnings.push("preflight.timeout_secs is 0; every host check will time out".into());
        }
        for host in &self.preflight.hosts {
            if !host.starts_with("http://") && !host.starts_with("https://") {
                warnings.push(format!(
                    "Preflight host '{}' should start with http:// or https://",
                    host
                ));
            }
        }

        warnings
    }
}

/// Effective configuration: `config.toml` plus environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct BadgeConfig {
    /// Base directory (`~/.badge-collector`)
    pub home: PathBuf,
    /// Config file in effect, if one was read
    pub source: Option<PathBuf>,
    pub toml: BadgeToml,
    pub verbose: bool,
    cli_state_file: Option<PathBuf>,
    cli_catalog: Option<PathBuf>,
}

impl BadgeConfig {
    /// Load from `config_path`, or from `<home>/config.toml` when it exists.
    ///
    /// An explicitly given path must exist; the default one is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let home = default_home();
        let (toml, source) = match config_path {
            Some(path) => (BadgeToml::load(path)?, Some(path.to_path_buf())),
            None => {
                let path = home.join(CONFIG_FILE);
                if path.exists() {
                    (BadgeToml::load(&path)?, Some(path))
                } else {
                    (BadgeToml::default(), None)
                }
            }
        };

        Ok(Self {
            home,
            source,
            toml,
            verbose: false,
            cli_state_file: None,
            cli_catalog: None,
        })
    }

    /// Load and apply CLI overrides.
    pub fn with_cli_args(
        config_path: Option<&Path>,
        state_file: Option<PathBuf>,
        catalog: Option<PathBuf>,
        verbose: bool,
    ) -> Result<Self> {
        let mut config = Self::load(config_path)?;
        config.cli_state_file = state_file;
        config.cli_catalog = catalog;
        config.verbose = verbose;
        Ok(config)
    }

    fn file_path(&self, path: &Path) -> PathBuf {
        let base = self.source.as_deref().and_then(Path::parent);
        resolve_path(base, path)
    }

    /// Progress file (CLI → env → file → default).
    pub fn state_file(&self) -> PathBuf {
        layered(
            self.cli_state_file.clone(),
            env_path(ENV_STATE),
            self.toml.state.path.as_deref().map(|p| self.file_path(p)),
        )
        .unwrap_or_else(|| self.home.join(STATE_FILE))
    }

    /// User catalog (CLI → env → file), `None` for the embedded catalog.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        layered(
            self.cli_catalog.clone(),
            env_path(ENV_CATALOG),
            self.toml.catalog.path.as_deref().map(|p| self.file_path(p)),
        )
    }

    /// `history.jsonl` beside the progress file, unless disabled.
    pub fn history_file(&self) -> Option<PathBuf> {
        if !self.toml.state.history {
            return None;
        }
        let state = self.state_file();
        Some(match state.parent() {
            Some(dir) => dir.join(HISTORY_FILE),
            None => PathBuf::from(HISTORY_FILE),
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.home.join("logs")
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        let path = self.catalog_path();
        Catalog::load_or_builtin(path.as_deref()).context("Failed to load badge catalog")
    }

    pub fn preflight(&self) -> KagglePreflight {
        let section = &self.toml.preflight;
        let preflight = KagglePreflight::new(
            section.hosts.clone(),
            Duration::from_secs(section.timeout_secs),
        );
        match section.credentials_file {
            Some(ref path) => preflight.with_credentials_file(self.file_path(path)),
            None => preflight,
        }
    }

    pub fn command_runner(&self) -> CommandRunner {
        let runner = CommandRunner::new(self.toml.action_commands());
        match self.source.as_deref().and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => runner.with_working_dir(dir.to_path_buf()),
            _ => runner,
        }
    }
}

/// `$BADGE_COLLECTOR_HOME`, else `~/.badge-collector`.
pub fn default_home() -> PathBuf {
    if let Some(home) = env_path(ENV_HOME) {
        return home;
    }
    dirs::home_dir()
        .map(|h| h.join(".badge-collector"))
        .unwrap_or_else(|| PathBuf::from(".badge-collector"))
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(|v| expand_tilde(Path::new(&v)))
}

/// First of CLI, environment, file that is set.
fn layered(cli: Option<PathBuf>, env: Option<PathBuf>, file: Option<PathBuf>) -> Option<PathBuf> {
    cli.or(env).or(file)
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn resolve_path(base: Option<&Path>, path: &Path) -> PathBuf {
    let path = expand_tilde(path);
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_empty_config() {
        let config = BadgeToml::parse("").unwrap();
        assert!(config.state.history);
        assert!(config.state.path.is_none());
        assert_eq!(config.preflight.hosts, vec!["https://www.kaggle.com"]);
        assert_eq!(config.preflight.timeout_secs, 10);
        assert!(config.actions.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[state]
path = "/tmp/progress.json"
history = false

[catalog]
path = "badges.json"

[preflight]
hosts = ["https://www.kaggle.com", "https://storage.googleapis.com"]
timeout_secs = 3

[actions."python_coder"]
command = ["kaggle", "kernels", "push", "-p", "nb"]

[actions."model_*"]
command = ["./earn.sh", "{badge}"]
"#;
        let config = BadgeToml::parse(content).unwrap();
        assert!(!config.state.history);
        assert_eq!(config.preflight.hosts.len(), 2);
        assert_eq!(config.preflight.timeout_secs, 3);

        let commands = config.action_commands();
        assert_eq!(commands["model_*"], vec!["./earn.sh", "{badge}"]);
        assert_eq!(commands["python_coder"][0], "kaggle");
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(BadgeToml::parse("[state\npath=").is_err());
        assert!(BadgeToml::parse("[preflight]\ntimeout_secs = \"ten\"").is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let catalog = Catalog::builtin().unwrap();
        let content = r#"
[preflight]
hosts = ["www.kaggle.com"]
timeout_secs = 0

[actions."python_coder"]
command = ["true"]

[actions."nothing_*"]
command = ["true"]

[actions."voter"]
command = []
"#;
        let warnings = BadgeToml::parse(content).unwrap().validate(&catalog);
        assert!(warnings.iter().any(|w| w.contains("'nothing_*' does not match")));
        assert!(warnings.iter().any(|w| w.contains("'voter' has an empty command")));
        assert!(warnings.iter().any(|w| w.contains("'voter' targets a badge that is not automatable")));
        assert!(warnings.iter().any(|w| w.contains("timeout_secs is 0")));
        assert!(warnings.iter().any(|w| w.contains("www.kaggle.com")));
        assert!(!warnings.iter().any(|w| w.contains("python_coder")));
    }

    #[test]
    fn test_default_config_is_clean() {
        let catalog = Catalog::builtin().unwrap();
        assert!(BadgeToml::default().validate(&catalog).is_empty());
    }

    #[test]
    fn test_layered_precedence() {
        let cli = Some(PathBuf::from("cli.json"));
        let env = Some(PathBuf::from("env.json"));
        let file = Some(PathBuf::from("file.json"));

        assert_eq!(layered(cli.clone(), env.clone(), file.clone()), cli);
        assert_eq!(layered(None, env.clone(), file.clone()), env);
        assert_eq!(layered(None, None, file.clone()), file);
        assert_eq!(layered(None, None, None), None);
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let base = Path::new("/etc/badges");
        assert_eq!(
            resolve_path(Some(base), Path::new("catalog.json")),
            PathBuf::from("/etc/badges/catalog.json")
        );
        assert_eq!(
            resolve_path(Some(base), Path::new("/abs/catalog.json")),
            PathBuf::from("/abs/catalog.json")
        );
        assert_eq!(
            resolve_path(None, Path::new("catalog.json")),
            PathBuf::from("catalog.json")
        );
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(BadgeConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_cli_overrides_and_history_location() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[catalog]\npath = \"my-badges.json\"\n").unwrap();

        let state = dir.path().join("run").join("progress.json");
        let config =
            BadgeConfig::with_cli_args(Some(&config_path), Some(state.clone()), None, true).unwrap();

        assert!(config.verbose);
        assert_eq!(config.state_file(), state);
        assert_eq!(
            config.history_file(),
            Some(dir.path().join("run").join("history.jsonl"))
        );
        // Only checked when no env override is present in the test environment.
        if std::env::var_os(ENV_CATALOG).is_none() {
            assert_eq!(config.catalog_path(), Some(dir.path().join("my-badges.json")));
        }
    }

    #[test]
    fn test_history_can_be_disabled() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[state]\nhistory = false\n").unwrap();
        let config = BadgeConfig::load(Some(&config_path)).unwrap();
        assert!(config.history_file().is_none());
    }

    #[test]
    fn test_command_runner_from_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[actions.\"model_*\"]\ncommand = [\"./earn.sh\", \"{badge}\"]\n",
        )
        .unwrap();
        let config = BadgeConfig::load(Some(&config_path)).unwrap();
        let runner = config.command_runner();
        assert!(runner.command_for("model_creator").is_some());
        assert!(runner.command_for("python_coder").is_none());
    }
}
