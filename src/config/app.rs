// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::probe::ProbeConfig;
use crate::rules::RuleTables;

pub const ENV_CONFIG_PATH: &str = "QR_CONFIG_PATH";
pub const ENV_DATABASE_PATH: &str = "QR_DATABASE_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

fn default_db_path() -> PathBuf {
    PathBuf::from("data/qr_phishing.db")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file; parent directories are created on first connect.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Everything the service reads at startup. Every field has a default, so an
/// empty file (or no file) is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub rules: RuleTables,
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;

        // A zero timeout would make every probe fail instantly.
        if cfg.probe.timeout_secs == 0 {
            cfg.probe.timeout_secs = ProbeConfig::default().timeout_secs;
        }
        if cfg.probe.accepted_statuses.is_empty() {
            cfg.probe.accepted_statuses = ProbeConfig::default().accepted_statuses;
        }
        cfg.rules = cfg.rules.sanitized();

        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $QR_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    ///
    /// `$QR_DATABASE_PATH` then overrides `database.path`.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from_file(&default_p)?
            } else {
                Self::default()
            }
        };

        if let Ok(db) = std::env::var(ENV_DATABASE_PATH) {
            if !db.trim().is_empty() {
                cfg.database.path = PathBuf::from(db.trim());
            }
        }

        Ok(cfg)
    }
}
