// tests/common/mod.rs
//
// Shared fixtures: scripted probers and unreachable stores.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use qr_phishing_detector::probe::Prober;
use qr_phishing_detector::{DecisionEngine, LexicalAnalyzer, SqliteStore, VerdictStore};
use tempfile::TempDir;

/// Prober with a fixed default answer and per-URL overrides; counts calls.
pub struct ScriptedProber {
    default: bool,
    overrides: HashMap<String, bool>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn always(reachable: bool) -> Arc<Self> {
        Arc::new(Self {
            default: reachable,
            overrides: HashMap::new(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with(reachable: bool, overrides: &[(&str, bool)]) -> Arc<Self> {
        Arc::new(Self {
            default: reachable,
            overrides: overrides
                .iter()
                .map(|(u, r)| (u.to_string(), *r))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, url: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.overrides.get(url).copied().unwrap_or(self.default)
    }
}

pub fn memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::in_memory().expect("in-memory store"))
}

/// Store pointing below a regular file, so every connect fails.
/// Keep the returned TempDir alive for the duration of the test.
pub fn unreachable_store() -> (TempDir, Arc<SqliteStore>) {
    let tmp = TempDir::new().expect("tempdir");
    let blocker: PathBuf = tmp.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").expect("write blocker");
    let store = Arc::new(SqliteStore::new(blocker.join("verdicts.db")));
    (tmp, store)
}

pub fn engine(store: Arc<dyn VerdictStore>, prober: Arc<ScriptedProber>) -> DecisionEngine {
    DecisionEngine::new(store, Arc::new(LexicalAnalyzer::default()), prober)
}
