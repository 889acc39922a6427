//! Preflight checks run once before any badge attempt.
//!
//! A failed preflight aborts the whole run before state is touched, so a
//! missing API token surfaces as one clear message instead of thirty-eight
//! identical per-badge failures.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::errors::PreflightError;

/// Default host checked for network reachability.
pub const DEFAULT_HOST: &str = "https://www.kaggle.com";
/// Default per-host reachability timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment checks that gate `execute`.
pub trait Preflight {
    fn check(&self) -> Result<(), PreflightError>;
}

/// Preflight that always passes. Used for `--skip-preflight` and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipPreflight;

impl Preflight for SkipPreflight {
    fn check(&self) -> Result<(), PreflightError> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct KaggleJson {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

/// Where usable Kaggle credentials were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    File(PathBuf),
}

/// Checks Kaggle credentials and network reachability.
#[derive(Debug, Clone)]
pub struct KagglePreflight {
    hosts: Vec<String>,
    timeout: Duration,
    credentials_file: Option<PathBuf>,
}

impl Default for KagglePreflight {
    fn default() -> Self {
        Self {
            hosts: vec![DEFAULT_HOST.to_string()],
            timeout: DEFAULT_TIMEOUT,
            credentials_file: None,
        }
    }
}

impl KagglePreflight {
    pub fn new(hosts: Vec<String>, timeout: Duration) -> Self {
        Self {
            hosts,
            timeout,
            credentials_file: None,
        }
    }

    /// Read credentials from `path` instead of `~/.kaggle/kaggle.json`.
    pub fn with_credentials_file(mut self, path: PathBuf) -> Self {
        self.credentials_file = Some(path);
        self
    }

    fn credentials_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.credentials_file {
            return Some(path.clone());
        }
        if let Ok(dir) = std::env::var("KAGGLE_CONFIG_DIR")
            && !dir.is_empty()
        {
            return Some(PathBuf::from(dir).join("kaggle.json"));
        }
        dirs::home_dir().map(|home| home.join(".kaggle").join("kaggle.json"))
    }

    /// Locate credentials: `KAGGLE_USERNAME` + `KAGGLE_KEY`, else kaggle.json.
    pub fn find_credentials(&self) -> Result<CredentialSource, PreflightError> {
        let env_set = |name: &str| std::env::var(name).is_ok_and(|v| !v.trim().is_empty());
        if env_set("KAGGLE_USERNAME") && env_set("KAGGLE_KEY") {
            return Ok(CredentialSource::Environment);
        }

        let path = self
            .credentials_path()
            .ok_or(PreflightError::MissingCredentials)?;
        if !path.exists() {
            return Err(PreflightError::MissingCredentials);
        }
        validate_kaggle_json(&path)?;
        Ok(CredentialSource::File(path))
    }

    fn check_hosts(&self) -> Result<(), PreflightError> {
        if self.hosts.is_empty() {
            return Ok(());
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| PreflightError::HostUnreachable {
                host: self.hosts[0].clone(),
                reason: e.to_string(),
            })?;

        for host in &self.hosts {
            // Any HTTP response proves reachability; only transport errors fail.
            let response = client
                .head(host)
                .send()
                .map_err(|e| PreflightError::HostUnreachable {
                    host: host.clone(),
                    reason: e.to_string(),
                })?;
            debug!(%host, status = %response.status(), "Host reachable");
        }
        Ok(())
    }
}

impl Preflight for KagglePreflight {
    fn check(&self) -> Result<(), PreflightError> {
        let source = self.find_credentials()?;
        debug!(?source, "Kaggle credentials found");
        self.check_hosts()
    }
}

fn validate_kaggle_json(path: &Path) -> Result<(), PreflightError> {
    let invalid = |reason: String| PreflightError::InvalidCredentials {
        path: path.to_path_buf(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let parsed: KaggleJson = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if !present(&parsed.username) {
        return Err(invalid("missing 'username'".to_string()));
    }
    if !present(&parsed.key) {
        return Err(invalid("missing 'key'".to_string()));
    }
    Ok(())
}
