// src/sources.rs
//! Source registry and the per-source status board.
//!
//! The registry is an ordered, immutable list of platforms. Status lives on a
//! [`StatusBoard`] built from the registry, one entry per source in registry order.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// One external platform the aggregator can query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub base_url: String,
    pub search_path: String,
    /// Feed prefix; the encoded search term is appended to it.
    #[serde(default)]
    pub feed_url: Option<String>,
}

impl SourceDescriptor {
    pub fn new(name: &str, base_url: &str, search_path: &str, feed_url: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            search_path: search_path.to_string(),
            feed_url: feed_url.map(str::to_string),
        }
    }

    /// `base_url + search_path + encode(term)`
    pub fn search_url(&self, term: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            self.search_path,
            urlencoding::encode(term)
        )
    }

    /// `feed_url + encode(term)`, or `None` for sources without a feed.
    pub fn feed_search_url(&self, term: &str) -> Option<String> {
        self.feed_url
            .as_deref()
            .map(|prefix| format!("{}{}", prefix, urlencoding::encode(term)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        Self { sources }
    }

    /// Built-in mission boards. Feed-enabled boards first, link-only boards last.
    pub fn default_opportunity_sources() -> Self {
        Self::new(vec![
            SourceDescriptor::new(
                "Malt",
                "https://www.malt.fr",
                "/projects/search?keywords=",
                Some("https://api.malt.com/rss/missions"),
            ),
            SourceDescriptor::new(
                "Freelance.com",
                "https://www.freelance.com",
                "/fr/mission?search=",
                Some("https://www.freelance.com/feed/missions"),
            ),
            SourceDescriptor::new(
                "Indeed",
                "https://fr.indeed.com",
                "/jobs?q=",
                Some("https://fr.indeed.com/rss?q="),
            ),
            SourceDescriptor::new(
                "Apec",
                "https://www.apec.fr",
                "/recherche-offre?q=",
                Some("https://www.apec.fr/flux-rss/flux-rss.html?motsCles="),
            ),
            SourceDescriptor::new(
                "Pole Emploi",
                "https://candidat.pole-emploi.fr",
                "/offres/recherche?motsCles=",
                Some("https://candidat.pole-emploi.fr/offres/flux.rss?motsCles="),
            ),
            SourceDescriptor::new(
                "LinkedIn",
                "https://www.linkedin.com",
                "/jobs/search/?keywords=",
                None,
            ),
            SourceDescriptor::new(
                "Welcome to the Jungle",
                "https://www.welcometothejungle.com",
                "/fr/jobs?query=",
                None,
            ),
        ])
    }

    /// Built-in company directories (link probing only).
    pub fn default_company_directories() -> Self {
        Self::new(vec![
            SourceDescriptor::new(
                "Societe.com",
                "https://www.societe.com",
                "/cgi-bin/search?champs=",
                None,
            ),
            SourceDescriptor::new(
                "Infogreffe",
                "https://www.infogreffe.fr",
                "/entreprise-societe/recherche?terme=",
                None,
            ),
            SourceDescriptor::new(
                "Pages Jaunes",
                "https://www.pagesjaunes.fr",
                "/recherche?q=",
                None,
            ),
            SourceDescriptor::new(
                "Verif.com",
                "https://www.verif.com",
                "/recherche?search=",
                None,
            ),
        ])
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Pending,
    Searching,
    Completed,
    Error,
}

impl SourceStatus {
    fn rank(self) -> u8 {
        match self {
            SourceStatus::Pending => 0,
            SourceStatus::Searching => 1,
            SourceStatus::Completed | SourceStatus::Error => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceProgress {
    pub name: String,
    pub status: SourceStatus,
}

/// Receives every committed status snapshot.
pub trait ProgressPublisher: Send + Sync {
    fn publish(&self, snapshot: &[SourceProgress]);
}

/// Drops snapshots.
pub struct NoopPublisher;

impl ProgressPublisher for NoopPublisher {
    fn publish(&self, _snapshot: &[SourceProgress]) {}
}

impl ProgressPublisher for watch::Sender<Vec<SourceProgress>> {
    fn publish(&self, snapshot: &[SourceProgress]) {
        self.send_replace(snapshot.to_vec());
    }
}

/// Per-run status list, parallel to the registry it was built from.
pub struct StatusBoard<'p> {
    entries: Vec<SourceProgress>,
    publisher: &'p dyn ProgressPublisher,
}

impl<'p> StatusBoard<'p> {
    pub fn new(registry: &SourceRegistry, publisher: &'p dyn ProgressPublisher) -> Self {
        let entries = registry
            .sources()
            .iter()
            .map(|s| SourceProgress {
                name: s.name.clone(),
                status: SourceStatus::Pending,
            })
            .collect();
        Self { entries, publisher }
    }

    pub fn mark_all_searching(&mut self) {
        for e in &mut self.entries {
            if e.status == SourceStatus::Pending {
                e.status = SourceStatus::Searching;
            }
        }
        self.publisher.publish(&self.entries);
    }

    /// Moves the source at `index` forward. Backward or terminal-to-terminal
    /// transitions are ignored and reported as `false`.
    pub fn transition(&mut self, index: usize, next: SourceStatus) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        if next.rank() <= entry.status.rank() {
            tracing::debug!(
                source = %entry.name,
                from = ?entry.status,
                to = ?next,
                "ignored non-monotonic status transition"
            );
            return false;
        }
        entry.status = next;
        self.publisher.publish(&self.entries);
        true
    }

    pub fn snapshot(&self) -> Vec<SourceProgress> {
        self.entries.clone()
    }

    pub fn into_entries(self) -> Vec<SourceProgress> {
        self.entries
    }
}

/// Share of sources that ended `completed`, in percent (0 for an empty list).
pub fn completion_percent(progress: &[SourceProgress]) -> f32 {
    if progress.is_empty() {
        return 0.0;
    }
    let done = progress
        .iter()
        .filter(|p| p.status == SourceStatus::Completed)
        .count();
    done as f32 * 100.0 / progress.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_urls_encode_the_term() {
        let s = SourceDescriptor::new(
            "Indeed",
            "https://fr.indeed.com",
            "/jobs?q=",
            Some("https://fr.indeed.com/rss?q="),
        );
        assert_eq!(
            s.search_url("rust dev"),
            "https://fr.indeed.com/jobs?q=rust%20dev"
        );
        assert_eq!(
            s.feed_search_url("c++").as_deref(),
            Some("https://fr.indeed.com/rss?q=c%2B%2B")
        );

        let no_feed = SourceDescriptor::new("LinkedIn", "https://x", "/q=", None);
        assert!(no_feed.feed_search_url("rust").is_none());
    }

    #[test]
    fn board_is_parallel_to_registry_and_monotonic() {
        let reg = SourceRegistry::default_opportunity_sources();
        let mut board = StatusBoard::new(&reg, &NoopPublisher);
        assert_eq!(board.snapshot().len(), reg.len());
        assert!(board
            .snapshot()
            .iter()
            .all(|p| p.status == SourceStatus::Pending));

        board.mark_all_searching();
        assert!(board.transition(0, SourceStatus::Completed));
        assert!(!board.transition(0, SourceStatus::Searching));
        assert!(!board.transition(0, SourceStatus::Error));
        assert!(!board.transition(99, SourceStatus::Completed));

        let snap = board.snapshot();
        assert_eq!(snap[0].status, SourceStatus::Completed);
        assert_eq!(snap[1].status, SourceStatus::Searching);
        assert_eq!(snap[0].name, "Malt");
    }

    #[test]
    fn watch_publisher_sees_each_transition() {
        let reg = SourceRegistry::default_company_directories();
        let (tx, rx) = watch::channel(Vec::new());
        let mut board = StatusBoard::new(&reg, &tx);
        board.mark_all_searching();
        board.transition(2, SourceStatus::Error);
        let seen = rx.borrow().clone();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[2].status, SourceStatus::Error);
    }

    #[test]
    fn completion_percent_counts_completed_only() {
        let p = vec![
            SourceProgress {
                name: "a".into(),
                status: SourceStatus::Completed,
            },
            SourceProgress {
                name: "b".into(),
                status: SourceStatus::Error,
            },
        ];
        assert_eq!(completion_percent(&p), 50.0);
        assert_eq!(completion_percent(&[]), 0.0);
    }
}
