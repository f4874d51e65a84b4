// src/feed/http.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::feed::parser::parse_feed;
use crate::feed::types::{CandidateEntry, FeedFetcher};

pub const USER_AGENT: &str = "freelance-radar/0.1";

/// Polls feeds over HTTP(S) and parses RSS or Atom bodies.
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<CandidateEntry>> {
        let body = self
            .client
            .get(feed_url)
            .send()
            .await
            .context("feed http get()")?
            .error_for_status()
            .context("feed non-2xx")?
            .text()
            .await
            .context("feed http .text()")?;
        parse_feed(&body).with_context(|| format!("parsing feed from {feed_url}"))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Serves a fixed document for every URL.
pub struct FixtureFeedFetcher {
    xml: String,
}

impl FixtureFeedFetcher {
    pub fn from_fixture_str(xml: &str) -> Self {
        Self {
            xml: xml.to_string(),
        }
    }
}

#[async_trait]
impl FeedFetcher for FixtureFeedFetcher {
    async fn fetch(&self, _feed_url: &str) -> Result<Vec<CandidateEntry>> {
        parse_feed(&self.xml)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
