// src/probe.rs
//! Reachability probe for direct search URLs: one HEAD request, no retries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use std::time::Duration;

#[async_trait]
pub trait ReachabilityProber: Send + Sync {
    /// `true` when the URL answered with 2xx/3xx. Never errors.
    async fn probe(&self, url: &str) -> bool;
}

pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self> {
        // Redirects are not followed so a 3xx counts as reachable on its own.
        let client = reqwest::Client::builder()
            .user_agent(crate::feed::http::USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(8))
            .build()
            .context("building probe http client")?;
        Ok(Self { client })
    }
}

pub fn is_reachable_status(status: reqwest::StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

#[async_trait]
impl ReachabilityProber for HttpProber {
    async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(resp) => {
                let ok = is_reachable_status(resp.status());
                if ok {
                    counter!("probe_reachable_total").increment(1);
                } else {
                    tracing::debug!(url, status = %resp.status(), "probe rejected");
                }
                ok
            }
            Err(e) => {
                tracing::debug!(url, error = ?e, "probe failed");
                false
            }
        }
    }
}
