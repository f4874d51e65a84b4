// src/feed/mod.rs
pub mod http;
pub mod parser;
pub mod types;

use crate::feed::types::{FeedFetcher, FeedOutcome};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// Body text longer than this is cut before it reaches the oracle prompt.
pub const MAX_BODY_CHARS: usize = 2000;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Total entries parsed from feeds.");
        describe_counter!("feed_fetch_errors_total", "Feed fetch/parse errors.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize feed text: decode entities, strip tags, unify quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (covers &nbsp; decoded to U+00A0)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"[\s\u{00A0}]+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_BODY_CHARS {
        out = out.chars().take(MAX_BODY_CHARS).collect();
    }

    out
}

/// Fetch a feed and fold any failure into [`FeedOutcome::Unavailable`].
pub async fn fetch_or_unavailable(fetcher: &dyn FeedFetcher, feed_url: &str) -> FeedOutcome {
    ensure_metrics_described();
    match fetcher.fetch(feed_url).await {
        Ok(entries) => {
            counter!("feed_entries_total").increment(entries.len() as u64);
            FeedOutcome::Fetched(entries)
        }
        Err(e) => {
            tracing::warn!(
                target: "feed",
                error = ?e,
                fetcher = fetcher.name(),
                url = feed_url,
                "feed unavailable"
            );
            counter!("feed_fetch_errors_total").increment(1);
            FeedOutcome::Unavailable {
                reason: format!("{e:#}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::CandidateEntry;
    use anyhow::anyhow;

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        let s = "  <p>Senior&nbsp;&nbsp;Rust</p>\n<b>dev</b> &ldquo;remote&rdquo;  ";
        assert_eq!(normalize_text(s), r#"Senior Rust dev "remote""#);
    }

    #[test]
    fn normalize_text_caps_length() {
        let long = "a".repeat(MAX_BODY_CHARS + 50);
        assert_eq!(normalize_text(&long).chars().count(), MAX_BODY_CHARS);
    }

    struct Failing;

    #[async_trait::async_trait]
    impl FeedFetcher for Failing {
        async fn fetch(&self, _feed_url: &str) -> anyhow::Result<Vec<CandidateEntry>> {
            Err(anyhow!("connection refused"))
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn failures_fold_into_unavailable() {
        let out = fetch_or_unavailable(&Failing, "https://feed.test/rss").await;
        assert!(out.is_unavailable());
        assert!(out.entries().is_empty());
        match out {
            FeedOutcome::Unavailable { reason } => assert!(reason.contains("refused")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
