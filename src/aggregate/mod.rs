// src/aggregate/mod.rs
//! Opportunity aggregation: walks the source registry in order, enriches feed
//! entries through the oracle, probes direct search links and records per-source
//! status as it goes.
//!
//! Sources run strictly one after another and entries are enriched one at a time.
//! A failing source ends `error` and the loop moves on.

pub mod types;

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{SecondsFormat, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::feed::fetch_or_unavailable;
use crate::feed::parser::feed_date_to_rfc3339;
use crate::feed::types::{CandidateEntry, FeedFetcher, FeedOutcome};
use crate::oracle::{EnrichmentResult, RelevanceOracle};
use crate::probe::ReachabilityProber;
use crate::sources::{
    ProgressPublisher, SourceDescriptor, SourceRegistry, SourceStatus, StatusBoard,
};

pub use types::{OpportunityItem, SearchError, SearchOutcome, SearchReport, NO_RESULTS_MESSAGE};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("aggregation_runs_total", "Aggregation runs started.");
        describe_counter!(
            "aggregation_source_errors_total",
            "Sources that ended in error status."
        );
        describe_counter!("aggregation_items_total", "Opportunity items produced.");
    });
}

/// Short SHA-256 prefix so search terms never reach the logs verbatim.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Split a search term on whitespace and commas, dropping empties.
pub fn split_keywords(term: &str) -> Vec<String> {
    static RE_SPLIT: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_SPLIT.get_or_init(|| regex::Regex::new(r"[\s,]+").unwrap());
    re.split(term)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn build_feed_item(
    source: &SourceDescriptor,
    term: &str,
    entry: &CandidateEntry,
    enrichment: EnrichmentResult,
    position: usize,
) -> OpportunityItem {
    let id = entry.guid.clone().unwrap_or_else(|| {
        format!(
            "{}-{}-{}",
            source.name,
            Utc::now().timestamp_millis(),
            position
        )
    });
    let date = match entry.published_at.as_deref() {
        Some(raw) => feed_date_to_rfc3339(raw).unwrap_or_else(|| raw.to_string()),
        None => now_rfc3339(),
    };
    OpportunityItem {
        id,
        title: entry
            .title
            .clone()
            .unwrap_or_else(|| format!("{} opportunity", source.name)),
        description: entry.body_text.clone().unwrap_or_default(),
        platform: source.name.clone(),
        date,
        url: entry
            .link
            .clone()
            .unwrap_or_else(|| source.search_url(term)),
        keywords: enrichment.keywords,
        location: enrichment.location,
        budget: enrichment.budget,
    }
}

fn build_search_link_item(source: &SourceDescriptor, term: &str, url: String) -> OpportunityItem {
    OpportunityItem {
        id: format!("{}-search-{}", source.name, Utc::now().timestamp_millis()),
        title: format!("See all {term} offers on {}", source.name),
        description: format!(
            "Browse every {term} opportunity available on {}",
            source.name
        ),
        platform: source.name.clone(),
        date: now_rfc3339(),
        url,
        keywords: split_keywords(term),
        location: None,
        budget: None,
    }
}

pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    feeds: Arc<dyn FeedFetcher>,
    prober: Arc<dyn ReachabilityProber>,
    oracle: Arc<dyn RelevanceOracle>,
}

impl Aggregator {
    pub fn new(
        registry: Arc<SourceRegistry>,
        feeds: Arc<dyn FeedFetcher>,
        prober: Arc<dyn ReachabilityProber>,
        oracle: Arc<dyn RelevanceOracle>,
    ) -> Self {
        Self {
            registry,
            feeds,
            prober,
            oracle,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Run one aggregation. The key is checked first: without it nothing is fetched.
    pub async fn search(
        &self,
        term: &str,
        api_key: Option<&str>,
        publisher: &dyn ProgressPublisher,
    ) -> Result<SearchReport, SearchError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(SearchError::MissingApiKey)?;
        let term = term.trim();
        if term.is_empty() {
            return Err(SearchError::EmptySearchTerm);
        }

        ensure_metrics_described();
        counter!("aggregation_runs_total").increment(1);
        let term_id = anon_hash(term);

        let mut board = StatusBoard::new(&self.registry, publisher);
        board.mark_all_searching();

        let mut items: Vec<OpportunityItem> = Vec::new();
        for (idx, source) in self.registry.sources().iter().enumerate() {
            let before = items.len();
            let status = match self.process_source(source, term, api_key, &mut items).await {
                Ok(()) => SourceStatus::Completed,
                Err(e) => {
                    warn!(
                        target: "aggregate",
                        source = %source.name,
                        term = %term_id,
                        error = %e,
                        "source failed"
                    );
                    counter!("aggregation_source_errors_total").increment(1);
                    SourceStatus::Error
                }
            };
            board.transition(idx, status);
            info!(
                target: "aggregate",
                source = %source.name,
                term = %term_id,
                added = items.len() - before,
                ?status,
                "source done"
            );
        }

        counter!("aggregation_items_total").increment(items.len() as u64);
        let outcome = if items.is_empty() {
            SearchOutcome::NoResults
        } else {
            SearchOutcome::Found(items)
        };
        Ok(SearchReport {
            outcome,
            sources: board.into_entries(),
        })
    }

    /// Feed pass then direct-link probe. A feed that could not be read fails the
    /// source after the probe has had its chance.
    async fn process_source(
        &self,
        source: &SourceDescriptor,
        term: &str,
        api_key: &str,
        items: &mut Vec<OpportunityItem>,
    ) -> anyhow::Result<()> {
        let mut feed_failure = None;

        if let Some(feed_url) = source.feed_search_url(term) {
            let outcome = fetch_or_unavailable(self.feeds.as_ref(), &feed_url).await;
            if let FeedOutcome::Unavailable { reason } = &outcome {
                feed_failure = Some(reason.clone());
            }
            for entry in outcome.entries() {
                let enrichment = self
                    .oracle
                    .enrich(&entry.text_blob(), term, api_key)
                    .await;
                if enrichment.is_relevant {
                    let position = items.len();
                    items.push(build_feed_item(source, term, entry, enrichment, position));
                }
            }
        }

        let search_url = source.search_url(term);
        if self.prober.probe(&search_url).await {
            items.push(build_search_link_item(source, term, search_url));
        }

        match feed_failure {
            Some(reason) => Err(anyhow!("feed unavailable: {reason}")),
            None => Ok(()),
        }
    }
}
