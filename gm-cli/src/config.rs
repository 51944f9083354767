//! Configuration module
//!
//! Loads the TOML configuration file: general polling settings, GitHub API
//! access, and the watch-list. The `GM_GITHUB_TOKEN` environment variable
//! takes precedence over the token stored in the file.

use anyhow::{Context, Result};
use gm_client::{ClientOptions, DEFAULT_API_URL};
use gm_core::domain::target::WatchTarget;
use gm_monitor::MonitorConfig;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the GitHub token
pub const TOKEN_ENV: &str = "GM_GITHUB_TOKEN";

/// CLI configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub github: GitHubConfig,

    /// Repositories to watch, in display order
    #[serde(rename = "watch")]
    pub watches: Vec<WatchEntry>,
}

/// `[general]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub polling_interval_seconds: u64,

    /// Ring the terminal bell when a repository's latest run starts failing
    pub notifications_enabled: bool,

    pub max_concurrent_fetches: usize,
    pub cycle_timeout_seconds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            polling_interval_seconds: 60,
            notifications_enabled: true,
            max_concurrent_fetches: 4,
            cycle_timeout_seconds: 45,
        }
    }
}

/// `[github]` table
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub connect_timeout_seconds: u64,
    pub read_timeout_seconds: u64,
    pub per_page: u8,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            connect_timeout_seconds: 10,
            read_timeout_seconds: 30,
            per_page: 10,
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("read_timeout_seconds", &self.read_timeout_seconds)
            .field("per_page", &self.per_page)
            .finish()
    }
}

/// One `[[watch]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct WatchEntry {
    pub owner: String,
    pub repo: String,

    /// Workflow names to show; empty means all
    #[serde(default)]
    pub workflows: Vec<String>,
}

/// Default location of the configuration file
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("gm").join("config.toml"))
}

impl Config {
    /// Load configuration from disk and the environment
    ///
    /// An explicit `path` must exist. When no path is given the default
    /// location is tried, and a missing file yields the defaults with an
    /// empty watch-list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    warn!("No configuration file at {}, watching nothing", path.display());
                    Self::default()
                }
                None => {
                    warn!("Could not find home directory, using default configuration");
                    Self::default()
                }
            },
        };

        Ok(config.with_token_override(std::env::var(TOKEN_ENV).ok()))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!(
            "Loaded configuration from {} ({} watch entries)",
            path.display(),
            config.watches.len()
        );
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Replace the file's token with `token` when it is set and non-empty
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.github.token = Some(token);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.general.polling_interval_seconds == 0 {
            anyhow::bail!("general.polling_interval_seconds must be greater than 0");
        }

        if self.general.max_concurrent_fetches == 0 {
            anyhow::bail!("general.max_concurrent_fetches must be greater than 0");
        }

        if self.general.cycle_timeout_seconds == 0 {
            anyhow::bail!("general.cycle_timeout_seconds must be greater than 0");
        }

        if !(1..=100).contains(&self.github.per_page) {
            anyhow::bail!("github.per_page must be between 1 and 100");
        }

        if !(self.github.api_url.starts_with("http://")
            || self.github.api_url.starts_with("https://"))
        {
            anyhow::bail!(
                "github.api_url must start with http:// or https://, got '{}'",
                self.github.api_url
            );
        }

        for (index, watch) in self.watches.iter().enumerate() {
            if watch.owner.trim().is_empty() || watch.repo.trim().is_empty() {
                anyhow::bail!("watch entry #{} needs a non-empty owner and repo", index + 1);
            }
        }

        Ok(())
    }

    /// The watch-list in configuration order
    pub fn watch_targets(&self) -> Vec<WatchTarget> {
        self.watches
            .iter()
            .map(|watch| {
                WatchTarget::new(watch.owner.trim(), watch.repo.trim())
                    .with_workflows(watch.workflows.iter().cloned())
            })
            .collect()
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::new(Duration::from_secs(self.general.polling_interval_seconds))
            .with_max_in_flight(self.general.max_concurrent_fetches)
            .with_cycle_timeout(Duration::from_secs(self.general.cycle_timeout_seconds))
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.github.api_url.clone(),
            token: self.github.token.clone(),
            connect_timeout: Duration::from_secs(self.github.connect_timeout_seconds),
            read_timeout: Duration::from_secs(self.github.read_timeout_seconds),
            per_page: self.github.per_page,
        }
    }
}
