//! Configuration and credential storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::api::simulate::SimulationConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Stored bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    /// Unix seconds
    pub expires_at: Option<u64>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl StoredToken {
    pub fn new(token: String, expires_in_secs: Option<u64>) -> Self {
        let expires_at = expires_in_secs.map(|secs| unix_now().saturating_add(secs));
        Self { token, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            // Treat as expired with less than a minute left
            Some(exp) => unix_now() + 60 >= exp,
            None => false,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend root, endpoints are resolved against it
    pub base_url: String,
    /// Per-request timeout for the HTTP client
    pub timeout_ms: u64,
    /// Serve requests from the in-process mock backend
    pub use_mock_api: bool,
    /// Fixed seed for the mock data set
    pub mock_seed: Option<u64>,
    /// Latency/failure knobs for the mock backend
    pub simulation: SimulationConfig,
    /// Bearer token sent to the real backend
    pub auth_token: Option<StoredToken>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            use_mock_api: true,
            mock_seed: None,
            simulation: SimulationConfig::default(),
            auth_token: None,
        }
    }
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "docs-assistant", "docs-assistant")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk, then apply `DOCS_*` environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains tokens)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Override fields from environment variables looked up through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("DOCS_API_BASE_URL") {
            self.base_url = url;
        }
        if let Some(ms) = var("DOCS_API_TIMEOUT_MS") {
            self.timeout_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("Invalid DOCS_API_TIMEOUT_MS: {}", ms))?;
        }
        if let Some(flag) = var("DOCS_USE_MOCK_API") {
            self.use_mock_api = parse_flag("DOCS_USE_MOCK_API", &flag)?;
        }
        if let Some(rate) = var("DOCS_MOCK_FAILURE_RATE") {
            self.simulation.failure_rate = rate
                .trim()
                .parse()
                .with_context(|| format!("Invalid DOCS_MOCK_FAILURE_RATE: {}", rate))?;
        }
        if let Some(flag) = var("DOCS_MOCK_LATENCY") {
            self.simulation.latency = parse_flag("DOCS_MOCK_LATENCY", &flag)?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The stored token, unless it has expired.
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token
            .as_ref()
            .filter(|t| !t.is_expired())
            .map(|t| t.token.clone())
    }

    pub fn set_auth_token(&mut self, token: String, expires_in: Option<u64>) {
        self.auth_token = Some(StoredToken::new(token, expires_in));
    }

    pub fn clear_auth_token(&mut self) {
        self.auth_token = None;
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid {}: {}", name, other),
    }
}
