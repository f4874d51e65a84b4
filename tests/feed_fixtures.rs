// tests/feed_fixtures.rs
//
// Real-world shaped feed documents pushed through the parser and the
// aggregation loop via `FixtureFeedFetcher`.

use std::sync::Arc;

use async_trait::async_trait;

use freelance_radar::aggregate::{Aggregator, SearchOutcome};
use freelance_radar::feed::http::FixtureFeedFetcher;
use freelance_radar::feed::parser::parse_feed;
use freelance_radar::feed::types::FeedFetcher;
use freelance_radar::oracle::{EnrichmentResult, RelevanceOracle};
use freelance_radar::probe::ReachabilityProber;
use freelance_radar::sources::{NoopPublisher, SourceDescriptor, SourceRegistry, SourceStatus};

const MISSIONS_RSS: &str = include_str!("fixtures/missions_rss.xml");
const JOBS_ATOM: &str = include_str!("fixtures/jobs_atom.xml");
const INTERLEAVED_RSS: &str = include_str!("fixtures/interleaved_rss.xml");
const INTERLEAVED_ATOM: &str = include_str!("fixtures/interleaved_atom.xml");

struct Unreachable;

#[async_trait]
impl ReachabilityProber for Unreachable {
    async fn probe(&self, _url: &str) -> bool {
        false
    }
}

/// Relevant when the candidate mentions Rust.
struct RustOnly;

#[async_trait]
impl RelevanceOracle for RustOnly {
    async fn enrich(&self, text: &str, _term: &str, _key: &str) -> EnrichmentResult {
        if text.contains("Rust") {
            EnrichmentResult {
                is_relevant: true,
                keywords: vec!["rust".into()],
                location: None,
                budget: text.contains("TJM").then(|| "600EUR/day".to_string()),
            }
        } else {
            EnrichmentResult::not_relevant()
        }
    }
}

fn board() -> SourceRegistry {
    SourceRegistry::new(vec![SourceDescriptor::new(
        "Missions",
        "https://missions.test",
        "/search?q=",
        Some("https://missions.test/rss?q="),
    )])
}

async fn run(fetcher: impl FeedFetcher + 'static) -> freelance_radar::SearchReport {
    Aggregator::new(
        Arc::new(board()),
        Arc::new(fetcher),
        Arc::new(Unreachable),
        Arc::new(RustOnly),
    )
    .search("rust", Some("sk-test"), &NoopPublisher)
    .await
    .expect("search runs")
}

#[test]
fn rss_fixture_normalizes_text() {
    let entries = parse_feed(MISSIONS_RSS).unwrap();
    assert_eq!(entries.len(), 3);

    let first = &entries[0];
    assert_eq!(first.title.as_deref(), Some("Développeur Rust - API de paiement"));
    let body = first.body_text.as_deref().unwrap();
    assert!(!body.contains('<'), "tags left in {body:?}");
    assert!(body.contains("Rust & tokio."));
    assert!(body.contains("TJM 600EUR"));
    assert_eq!(first.guid.as_deref(), Some("missions-101"));

    assert_eq!(entries[1].guid, None);
    assert_eq!(entries[2].link, None);
}

#[test]
fn atom_fixture_prefers_alternate_link() {
    let entries = parse_feed(JOBS_ATOM).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].link.as_deref(), Some("https://jobs.test/7"));
    assert_eq!(entries[0].guid.as_deref(), Some("urn:jobs:7"));
    assert_eq!(entries[0].published_at.as_deref(), Some("2025-06-05T10:00:00+02:00"));
    // no rel attribute counts as alternate; falls back to <updated>
    assert_eq!(entries[1].link.as_deref(), Some("https://jobs.test/8"));
    assert_eq!(entries[1].published_at.as_deref(), Some("2025-06-04T10:00:00Z"));
    assert_eq!(entries[1].body_text.as_deref(), Some("Paris office"));
}

#[test]
fn rss_items_split_by_channel_elements_all_parse() {
    let entries = parse_feed(INTERLEAVED_RSS).expect("interleaved rss parses");
    let guids: Vec<_> = entries.iter().map(|e| e.guid.as_deref()).collect();
    assert_eq!(guids, vec![Some("offres-1"), Some("offres-2")]);
    assert_eq!(entries[0].body_text.as_deref(), Some("On-call for Rust services"));
    // no <description>: body comes from <content:encoded>
    assert_eq!(entries[1].body_text.as_deref(), Some("Moteur de règles en Rust"));
}

#[test]
fn atom_links_split_by_other_elements_parse() {
    let entries = parse_feed(INTERLEAVED_ATOM).expect("interleaved atom parses");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].link.as_deref(), Some("https://board.test/9"));
    assert_eq!(entries[0].title.as_deref(), Some("Rust compiler contractor"));
    assert_eq!(entries[0].guid.as_deref(), Some("urn:board:9"));
}

#[tokio::test]
async fn interleaved_feed_keeps_source_completed() {
    let report = run(FixtureFeedFetcher::from_fixture_str(INTERLEAVED_RSS)).await;
    assert_eq!(report.sources[0].status, SourceStatus::Completed);
    assert_eq!(report.outcome.items().len(), 2);
}

#[tokio::test]
async fn rss_fixture_through_aggregation() {
    let report = run(FixtureFeedFetcher::from_fixture_str(MISSIONS_RSS)).await;
    let items = report.outcome.items();
    assert_eq!(items.len(), 2, "SAP mission is filtered out");

    assert_eq!(items[0].id, "missions-101");
    assert_eq!(items[0].date, "2025-06-02T06:00:00Z");
    assert_eq!(items[0].budget.as_deref(), Some("600EUR/day"));
    assert_eq!(items[0].url, "https://missions.test/m/101");

    // no link: search URL; unreadable date kept verbatim; synthesized id
    assert_eq!(items[1].url, "https://missions.test/search?q=rust");
    assert_eq!(items[1].date, "not a date");
    assert!(items[1].id.starts_with("Missions-"));

    assert_eq!(report.sources[0].status, SourceStatus::Completed);
}

#[tokio::test]
async fn atom_fixture_through_aggregation() {
    let report = run(FixtureFeedFetcher::from_fixture_str(JOBS_ATOM)).await;
    let items = report.outcome.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Rust platform engineer");
    assert_eq!(items[0].date, "2025-06-05T08:00:00Z");
}

#[tokio::test]
async fn garbage_document_fails_the_source() {
    let report = run(FixtureFeedFetcher::from_fixture_str("<html><body>503</body></html>")).await;
    assert_eq!(report.outcome, SearchOutcome::NoResults);
    assert_eq!(report.sources[0].status, SourceStatus::Error);
}
