// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod hasher;
pub mod metrics;
pub mod payload;
pub mod probe;
pub mod rules;
pub mod store;
pub mod verdict;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::cache::KnownPhishingCache;
pub use crate::config::AppConfig;
pub use crate::engine::DecisionEngine;
pub use crate::rules::{LexicalAnalyzer, RuleTables, SuspicionReason};
pub use crate::store::{InsertOutcome, Lookup, SqliteStore, VerdictStore};
pub use crate::verdict::{UrlRecord, Verdict};

use axum::Router;

/// Build the full router from the default config sources
/// (`$QR_CONFIG_PATH`, `config/app.toml`, built-in defaults).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load_default()?;
    let state = AppState::from_config(&cfg)?;
    Ok(router(state))
}
