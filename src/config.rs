//! Configuration management
//!
//! Loads configuration from config.toml with support for:
//! - The fixed set of leaderboard ids
//! - The shared submission secret and digest algorithm
//! - Pagination limits
//! - Server binding settings
//! - Storage backend selection

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::auth::TokenDigest;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub leaderboards: LeaderboardsConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Leaderboards served by this process. Never changes after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardsConfig {
    pub ids: Vec<String>,
}

/// Submission verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret (LEADERBOARD_SECRET env var takes precedence)
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub digest: TokenDigest,
}

/// Limits applied to `count` query parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Max # of entries a single query may return
    pub max_count: u32,
    /// # of entries returned by a read that does not specify `count`
    pub default_count: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_count: 20,
            default_count: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
    Postgres,
}

/// Storage configuration (postgres uses DATABASE_URL)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// SQLite database file
    #[serde(default)]
    pub path: Option<String>,
    /// PostgreSQL connection string, normally filled from DATABASE_URL
    #[serde(default)]
    pub database_url: Option<String>,
}

impl Config {
    /// Load from specific path, then apply environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config: Config = if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            // Use embedded default config
            toml::from_str(DEFAULT_CONFIG).context("Failed to parse default config")?
        };

        config.apply_env();
        Ok(config)
    }

    /// Environment variables take precedence over file values
    pub fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var("LEADERBOARD_SECRET") {
            if !secret.is_empty() {
                self.auth.secret = secret;
            }
        }
        if let Ok(host) = std::env::var("LEADERBOARD_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Some(port) = std::env::var("LEADERBOARD_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.storage.database_url = Some(url);
            }
        }
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret.is_empty() {
            bail!("auth.secret is empty (set it in config.toml or LEADERBOARD_SECRET)");
        }

        if self.leaderboards.ids.is_empty() {
            bail!("leaderboards.ids must list at least one leaderboard");
        }

        let mut seen = HashSet::new();
        for id in &self.leaderboards.ids {
            if id.is_empty() {
                bail!("leaderboard ids must not be empty");
            }
            if !seen.insert(id.as_str()) {
                bail!("duplicate leaderboard id: {}", id);
            }
        }

        if self.pagination.default_count > self.pagination.max_count {
            bail!(
                "pagination.default_count ({}) exceeds pagination.max_count ({})",
                self.pagination.default_count,
                self.pagination.max_count
            );
        }

        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none()
        {
            bail!("postgres storage requires DATABASE_URL");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        // Embedded config parse is covered by tests
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|_| Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8091,
            },
            leaderboards: LeaderboardsConfig {
                ids: vec![
                    "beat_drift_webtrial_genesis".to_string(),
                    "beat_drift_webtrial_awaken".to_string(),
                    "beat_drift_webtrial_flare".to_string(),
                ],
            },
            auth: AuthConfig {
                secret: String::new(),
                digest: TokenDigest::Md5,
            },
            pagination: PaginationConfig::default(),
            storage: StorageConfig::default(),
        })
    }
}
