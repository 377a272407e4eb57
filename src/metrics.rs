use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::warn;

pub const CLASSIFY_TOTAL: &str = "classify_total";
pub const CLASSIFY_REUSED_TOTAL: &str = "classify_reused_total";
pub const CLASSIFY_PHISHING_TOTAL: &str = "classify_phishing_total";
pub const STORE_CONFLICT_TOTAL: &str = "store_conflict_total";
pub const STORE_UNAVAILABLE_TOTAL: &str = "store_unavailable_total";
pub const PROBE_UNREACHABLE_TOTAL: &str = "probe_unreachable_total";
pub const KNOWN_PHISHING_CACHE_SIZE: &str = "known_phishing_cache_size";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(CLASSIFY_TOTAL, "URLs classified (fresh or reused).");
        describe_counter!(
            CLASSIFY_REUSED_TOTAL,
            "Classifications answered from a stored record."
        );
        describe_counter!(CLASSIFY_PHISHING_TOTAL, "Verdicts with is_phishing=true.");
        describe_counter!(
            STORE_CONFLICT_TOTAL,
            "Inserts skipped or rejected because the digest already existed."
        );
        describe_counter!(
            STORE_UNAVAILABLE_TOTAL,
            "Store operations that degraded because the backend was unreachable."
        );
        describe_counter!(
            PROBE_UNREACHABLE_TOTAL,
            "Reachability probes that did not return an accepted status."
        );
        describe_gauge!(
            KNOWN_PHISHING_CACHE_SIZE,
            "Entries in the startup known-phishing snapshot."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process. Later calls reuse the
    /// same handle; `None` if another recorder was installed first.
    pub fn init() -> Option<Self> {
        static HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();
        let handle = HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(error = %e, "prometheus recorder not installed; /metrics disabled");
                None
            }
        });
        ensure_described();
        handle.clone().map(|handle| Self { handle })
    }

    pub fn set_cache_size(size: usize) {
        gauge!(KNOWN_PHISHING_CACHE_SIZE).set(size as f64);
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
