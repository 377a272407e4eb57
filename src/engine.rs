//! # Decision Engine
//! One verdict per URL, at most one stored record per URL.
//!
//! Per request:
//! `LOOKUP` (exact store match) → hit: rebuild verdict from the record, done.
//! Miss → `ANALYZE` → `PROBE` (always, no short-circuit) → `DECIDE` → `PERSIST` → return.
//!
//! Nothing in here fails outward. A down store reads as a miss and writes as
//! "not stored"; a failed probe reads as unreachable.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::hasher;
use crate::metrics::{
    CLASSIFY_PHISHING_TOTAL, CLASSIFY_REUSED_TOTAL, CLASSIFY_TOTAL, PROBE_UNREACHABLE_TOTAL,
    STORE_CONFLICT_TOTAL, STORE_UNAVAILABLE_TOTAL,
};
use crate::probe::Prober;
use crate::rules::LexicalAnalyzer;
use crate::store::{InsertOutcome, Lookup, VerdictStore};
use crate::verdict::Verdict;

/// What `PERSIST` ended with. Only used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Stored,
    /// Digest already present, either seen on lookup or rejected on insert.
    AlreadyStored,
    NotStored,
}

#[derive(Clone)]
pub struct DecisionEngine {
    store: Arc<dyn VerdictStore>,
    analyzer: Arc<LexicalAnalyzer>,
    prober: Arc<dyn Prober>,
}

impl DecisionEngine {
    pub fn new(
        store: Arc<dyn VerdictStore>,
        analyzer: Arc<LexicalAnalyzer>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            store,
            analyzer,
            prober,
        }
    }

    pub fn store(&self) -> &Arc<dyn VerdictStore> {
        &self.store
    }

    pub async fn classify(&self, url: &str) -> Verdict {
        counter!(CLASSIFY_TOTAL).increment(1);

        // LOOKUP
        match self.store.find_by_url(url) {
            Lookup::Found(record) => {
                debug!(%url, is_safe = record.is_safe, "reusing stored verdict");
                counter!(CLASSIFY_REUSED_TOTAL).increment(1);
                let verdict = Verdict::from_record(url, &record);
                if verdict.is_phishing {
                    counter!(CLASSIFY_PHISHING_TOTAL).increment(1);
                }
                return verdict;
            }
            Lookup::NotFound => debug!(%url, "no stored verdict"),
            Lookup::Unavailable => {
                counter!(STORE_UNAVAILABLE_TOTAL).increment(1);
                debug!(%url, "store unavailable; classifying fresh");
            }
        }

        // ANALYZE
        let reasons = self.analyzer.analyze(url);

        // PROBE
        let reachable = self.prober.probe(url).await;
        if !reachable {
            counter!(PROBE_UNREACHABLE_TOTAL).increment(1);
        }

        // DECIDE
        let verdict = Verdict::fresh(url, reasons, reachable);
        debug!(
            %url,
            reasons = ?verdict.suspicious_reasons,
            reachable,
            is_phishing = verdict.is_phishing,
            "classified"
        );
        if verdict.is_phishing {
            counter!(CLASSIFY_PHISHING_TOTAL).increment(1);
        }

        // PERSIST
        self.persist(url, verdict.is_safe());

        verdict
    }

    fn persist(&self, url: &str, is_safe: bool) -> PersistOutcome {
        let digest = hasher::digest(url);
        match self.store.find_by_hash(&digest) {
            Lookup::Found(_) => {
                info!(%url, "URL already exists");
                counter!(STORE_CONFLICT_TOTAL).increment(1);
                return PersistOutcome::AlreadyStored;
            }
            Lookup::Unavailable => {
                warn!(%url, "store unavailable; verdict not persisted");
                counter!(STORE_UNAVAILABLE_TOTAL).increment(1);
                return PersistOutcome::NotStored;
            }
            Lookup::NotFound => {}
        }

        match self.store.insert(url, is_safe) {
            InsertOutcome::Inserted => {
                info!(%url, is_safe, %digest, "stored URL");
                PersistOutcome::Stored
            }
            InsertOutcome::Conflict => {
                info!(%url, "URL stored concurrently; keeping existing record");
                counter!(STORE_CONFLICT_TOTAL).increment(1);
                PersistOutcome::AlreadyStored
            }
            InsertOutcome::Unavailable => {
                warn!(%url, "failed to store the URL");
                counter!(STORE_UNAVAILABLE_TOTAL).increment(1);
                PersistOutcome::NotStored
            }
        }
    }
}
