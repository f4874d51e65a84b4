// src/feed/parser.rs
//! RSS 2.0 and Atom parsing into [`CandidateEntry`] values.

use anyhow::{Context, Result};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime, UtcOffset,
};

use crate::feed::normalize_text;
use crate::feed::types::CandidateEntry;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    /// `<content:encoded>`, used when `<description>` is missing or blank.
    #[serde(rename = "encoded", alias = "content:encoded")]
    encoded: Option<String>,
    guid: Option<TextNode>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextNode>,
    id: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<TextNode>,
    content: Option<TextNode>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Element whose attributes we ignore (`<guid isPermaLink="false">`, `<title type="html">`).
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Convert a feed date to RFC 3339 when it parses as RFC 2822 or RFC 3339.
pub fn feed_date_to_rfc3339(raw: &str) -> Option<String> {
    let raw = raw.trim();
    OffsetDateTime::parse(raw, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

/// Parse a feed document, detecting RSS vs Atom by its root element.
pub fn parse_feed(xml: &str) -> Result<Vec<CandidateEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let out = if looks_like_atom(&xml_clean) {
        parse_atom(&xml_clean)?
    } else {
        parse_rss(&xml_clean)?
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    Ok(out)
}

fn looks_like_atom(xml: &str) -> bool {
    match (xml.find("<feed"), xml.find("<rss")) {
        (Some(_), None) => true,
        (Some(f), Some(r)) => f < r,
        _ => false,
    }
}

fn parse_rss(xml: &str) -> Result<Vec<CandidateEntry>> {
    let rss: Rss = from_str(xml).context("parsing rss xml")?;
    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| CandidateEntry {
            title: non_empty(it.title.map(|t| normalize_text(&t))),
            body_text: non_empty(it.description.map(|d| normalize_text(&d)))
                .or_else(|| non_empty(it.encoded.map(|e| normalize_text(&e)))),
            link: non_empty(it.link),
            published_at: non_empty(it.pub_date),
            guid: non_empty(it.guid.map(|g| g.value)),
        })
        .collect())
}

fn parse_atom(xml: &str) -> Result<Vec<CandidateEntry>> {
    let feed: AtomFeed = from_str(xml).context("parsing atom xml")?;
    Ok(feed
        .entry
        .into_iter()
        .map(|e| {
            let link = e
                .link
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                .or_else(|| e.link.first())
                .and_then(|l| l.href.clone());
            let body = e.summary.or(e.content).map(|n| normalize_text(&n.value));
            CandidateEntry {
                title: non_empty(e.title.map(|t| normalize_text(&t.value))),
                body_text: non_empty(body),
                link: non_empty(link),
                published_at: non_empty(e.published.or(e.updated)),
                guid: non_empty(e.id),
            }
        })
        .collect())
}

/// quick-xml only knows the five XML entities; map common HTML ones first.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&euro;", "EUR")
        .replace("&eacute;", "é")
        .replace("&egrave;", "è")
        .replace("&agrave;", "à")
}
