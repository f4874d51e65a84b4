// src/feed/types.rs
use anyhow::Result;

/// One raw feed item before relevance filtering. Every field may be absent.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CandidateEntry {
    pub title: Option<String>,
    pub body_text: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<String>, // raw feed date (RFC 2822 or RFC 3339)
    pub guid: Option<String>,
}

impl CandidateEntry {
    /// Title and body joined for the oracle prompt.
    pub fn text_blob(&self) -> String {
        format!(
            "{}\n{}",
            self.title.as_deref().unwrap_or_default(),
            self.body_text.as_deref().unwrap_or_default()
        )
    }
}

/// Result of one feed fetch. `Unavailable` carries no entries on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    Fetched(Vec<CandidateEntry>),
    Unavailable { reason: String },
}

impl FeedOutcome {
    pub fn entries(&self) -> &[CandidateEntry] {
        match self {
            FeedOutcome::Fetched(v) => v,
            FeedOutcome::Unavailable { .. } => &[],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, FeedOutcome::Unavailable { .. })
    }
}

#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<CandidateEntry>>;
    fn name(&self) -> &'static str;
}
