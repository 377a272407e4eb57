//! Reachability probe: one HEAD request, redirects followed, bounded by a timeout.
//! Any network fault counts as unreachable; nothing is raised to the caller.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/113 Safari/537.36";

fn default_timeout_secs() -> u64 {
    8
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_max_redirects() -> usize {
    30
}
fn default_accepted_statuses() -> Vec<u16> {
    vec![200, 301, 302]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sent on every probe; some hosts reject unknown clients.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Final status codes (after redirects) that count as reachable.
    #[serde(default = "default_accepted_statuses")]
    pub accepted_statuses: Vec<u16>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            accepted_statuses: default_accepted_statuses(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    /// `true` iff the URL answered with an accepted status in time.
    async fn probe(&self, url: &str) -> bool;
}

pub struct HttpProber {
    http: reqwest::Client,
    accepted: Vec<u16>,
}

impl HttpProber {
    pub fn new(cfg: &ProbeConfig) -> Result<Self> {
        Self::with_timeout(cfg, cfg.timeout())
    }

    /// Same as `new`, but with an explicit request timeout instead of `timeout_secs`.
    pub fn with_timeout(cfg: &ProbeConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(cfg.max_redirects))
            .build()
            .context("building probe http client")?;
        Ok(Self {
            http,
            accepted: cfg.accepted_statuses.clone(),
        })
    }

    pub fn is_accepted(&self, status: u16) -> bool {
        self.accepted.contains(&status)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> bool {
        match self.http.head(url).send().await {
            Ok(rsp) => {
                let status = rsp.status().as_u16();
                debug!(%url, status, "HEAD");
                self.is_accepted(status)
            }
            Err(e) => {
                warn!(
                    %url,
                    timeout = e.is_timeout(),
                    connect = e.is_connect(),
                    error = %e,
                    "HEAD failed"
                );
                false
            }
        }
    }
}
