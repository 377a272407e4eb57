//! verdict.rs — persisted records and the per-request verdict.

use serde::{Deserialize, Serialize};

use crate::rules::SuspicionReason;

/// One persisted `(hash, url, is_safe)` row. Created once per distinct URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Lowercase hex SHA-256 of `original_url`.
    pub hash: String,
    pub original_url: String,
    pub is_safe: bool,
    /// Unix seconds at insert time.
    pub created_at: i64,
}

/// Classification result for one URL. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub url: String,
    /// Reason labels in rule evaluation order.
    pub suspicious_reasons: Vec<SuspicionReason>,
    pub is_reachable: bool,
    pub is_phishing: bool,
    /// True only when the verdict was rebuilt from a stored record.
    pub already_existed: bool,
}

impl Verdict {
    /// Fresh classification: phishing iff any lexical reason fired or the probe failed.
    pub fn fresh(url: impl Into<String>, reasons: Vec<SuspicionReason>, is_reachable: bool) -> Self {
        let is_phishing = !reasons.is_empty() || !is_reachable;
        Self {
            url: url.into(),
            suspicious_reasons: reasons,
            is_reachable,
            is_phishing,
            already_existed: false,
        }
    }

    /// Verdict rebuilt from a stored record. No probe is issued, so reachability is assumed.
    pub fn from_record(url: impl Into<String>, record: &UrlRecord) -> Self {
        let reasons = if record.is_safe {
            Vec::new()
        } else {
            vec![SuspicionReason::StoredUnsafe]
        };
        Self {
            url: url.into(),
            suspicious_reasons: reasons,
            is_reachable: true,
            is_phishing: !record.is_safe,
            already_existed: true,
        }
    }

    pub fn is_safe(&self) -> bool {
        !self.is_phishing
    }
}
