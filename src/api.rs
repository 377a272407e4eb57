//! Thin JSON surface over the decision engine.
//!
//! Routes:
//! - `GET  /health`
//! - `POST /check`            `{ "url": "..." }` → verdict
//! - `POST /scan`             `{ "payloads": [...] }` → verdict for the first http(s) payload
//! - `GET  /urls`             stored records (audit listing)
//! - `GET  /known-phishing`   `?url=...` → membership in the startup snapshot
//! - `GET  /metrics`          Prometheus, when the recorder is installed

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::cache::KnownPhishingCache;
use crate::config::AppConfig;
use crate::engine::DecisionEngine;
use crate::metrics::Metrics;
use crate::payload;
use crate::probe::HttpProber;
use crate::rules::LexicalAnalyzer;
use crate::store::{SqliteStore, VerdictStore};
use crate::verdict::{UrlRecord, Verdict};

#[derive(Clone)]
pub struct AppState {
    pub engine: DecisionEngine,
    pub known_phishing: Arc<KnownPhishingCache>,
}

impl AppState {
    pub fn new(engine: DecisionEngine, known_phishing: Arc<KnownPhishingCache>) -> Self {
        Self {
            engine,
            known_phishing,
        }
    }

    /// Startup wiring: store, snapshot, analyzer, prober.
    /// An unreachable store is logged, not fatal; the service still answers.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let store = Arc::new(SqliteStore::new(&cfg.database.path));
        match store.ping() {
            Ok(()) => info!(path = %cfg.database.path.display(), "verdict store ready"),
            Err(e) => warn!(error = %e, "verdict store unavailable at startup"),
        }

        let known = KnownPhishingCache::load(store.as_ref());

        let analyzer = Arc::new(LexicalAnalyzer::new(cfg.rules.clone()));
        let prober = Arc::new(HttpProber::new(&cfg.probe)?);
        let engine = DecisionEngine::new(store, analyzer, prober);

        Ok(Self::new(engine, Arc::new(known)))
    }
}

pub fn router(state: AppState) -> Router {
    // Recorder first, or the gauge lands in the no-op recorder.
    let metrics = Metrics::init();
    Metrics::set_cache_size(state.known_phishing.len());

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/check", post(check))
        .route("/scan", post(scan))
        .route("/urls", get(list_urls))
        .route("/known-phishing", get(known_phishing))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    match metrics {
        Some(m) => app.merge(m.router()),
        None => app,
    }
}

/// JSON error body with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
struct CheckReq {
    url: String,
}

async fn check(
    State(state): State<AppState>,
    Json(body): Json<CheckReq>,
) -> Result<Json<Verdict>, ApiError> {
    if !payload::is_candidate_url(&body.url) {
        return Err(ApiError::unprocessable("Only http(s) URLs can be checked"));
    }
    Ok(Json(state.engine.classify(&body.url).await))
}

#[derive(Deserialize)]
struct ScanReq {
    #[serde(default)]
    payloads: Vec<String>,
}

async fn scan(
    State(state): State<AppState>,
    Json(body): Json<ScanReq>,
) -> Result<Json<Verdict>, ApiError> {
    let url = payload::select_url(&body.payloads)
        .ok_or_else(|| ApiError::unprocessable("No URL found in the QR code"))?;
    Ok(Json(state.engine.classify(url).await))
}

async fn list_urls(State(state): State<AppState>) -> Result<Json<Vec<UrlRecord>>, ApiError> {
    state.engine.store().list_all().map(Json).map_err(|e| {
        warn!(error = %e, "listing stored urls failed");
        ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "Database connection error".to_string(),
        }
    })
}

#[derive(Deserialize)]
struct KnownReq {
    url: String,
}

#[derive(Serialize)]
struct KnownResp {
    url: String,
    known_phishing: bool,
}

async fn known_phishing(
    State(state): State<AppState>,
    Query(q): Query<KnownReq>,
) -> Json<KnownResp> {
    let known = state.known_phishing.contains(&q.url);
    Json(KnownResp {
        url: q.url,
        known_phishing: known,
    })
}
