//! Known-phishing snapshot.
//!
//! Built once at startup from the store's unsafe records, then read-only for
//! the life of the process. Best-effort: if the store is down at boot the
//! snapshot is empty. Verdicts stored after startup are not reflected.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::store::VerdictStore;

#[derive(Debug, Clone, Default)]
pub struct KnownPhishingCache {
    urls: HashSet<String>,
}

impl KnownPhishingCache {
    pub fn load(store: &dyn VerdictStore) -> Self {
        match store.list_unsafe() {
            Ok(rows) => {
                let urls: HashSet<String> = rows.into_iter().map(|r| r.original_url).collect();
                info!(count = urls.len(), "known-phishing cache loaded");
                Self { urls }
            }
            Err(e) => {
                warn!(error = %e, "known-phishing cache unavailable; starting empty");
                Self::default()
            }
        }
    }

    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact string match.
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
