// src/session.rs
//! Search sessions: the latest search wins.
//!
//! Each search takes a generation number. Progress and results of a run are
//! committed only while that generation is still the newest one, so a slow,
//! superseded run can finish without overwriting a newer search.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::watch;

use crate::aggregate::{OpportunityItem, SearchError, SearchOutcome, SearchReport, NO_RESULTS_MESSAGE};
use crate::sources::{ProgressPublisher, SourceProgress};

/// What the presentation layer reads.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnapshot {
    pub generation: u64,
    pub search_term: String,
    pub loading: bool,
    pub has_searched: bool,
    pub error: Option<String>,
    pub opportunities: Vec<OpportunityItem>,
    pub sources: Vec<SourceProgress>,
}

pub struct SearchSession {
    generation: AtomicU64,
    snapshot: RwLock<SearchSnapshot>,
    progress: watch::Sender<Vec<SourceProgress>>,
}

/// Publisher bound to one generation; snapshots from stale runs are dropped.
pub struct GenerationPublisher {
    session: Arc<SearchSession>,
    generation: u64,
}

impl ProgressPublisher for GenerationPublisher {
    fn publish(&self, snapshot: &[SourceProgress]) {
        if !self.session.is_current(self.generation) {
            return;
        }
        self.session.progress.send_replace(snapshot.to_vec());
        if let Ok(mut g) = self.session.snapshot.write() {
            if g.generation == self.generation {
                g.sources = snapshot.to_vec();
            }
        }
    }
}

impl SearchSession {
    pub fn new(initial_sources: Vec<SourceProgress>) -> Arc<Self> {
        let (progress, _rx) = watch::channel(initial_sources.clone());
        Arc::new(Self {
            generation: AtomicU64::new(0),
            snapshot: RwLock::new(SearchSnapshot {
                sources: initial_sources,
                ..Default::default()
            }),
            progress,
        })
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Start a new search; every earlier generation becomes stale.
    pub fn begin(self: &Arc<Self>, term: &str) -> GenerationPublisher {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut g) = self.snapshot.write() {
            g.generation = generation;
            g.search_term = term.to_string();
            g.loading = true;
            g.error = None;
        }
        GenerationPublisher {
            session: Arc::clone(self),
            generation,
        }
    }

    /// Commit a finished run. Returns `false` (and changes nothing) for a stale run.
    pub fn commit(
        &self,
        publisher: &GenerationPublisher,
        result: &Result<SearchReport, SearchError>,
    ) -> bool {
        let Ok(mut g) = self.snapshot.write() else {
            return false;
        };
        if !self.is_current(publisher.generation) || g.generation != publisher.generation {
            tracing::debug!(
                stale = publisher.generation,
                current = g.generation,
                "discarding stale search result"
            );
            return false;
        }
        g.loading = false;
        match result {
            Ok(report) => {
                g.has_searched = true;
                g.sources = report.sources.clone();
                match &report.outcome {
                    SearchOutcome::Found(items) => {
                        g.opportunities = items.clone();
                        g.error = None;
                    }
                    SearchOutcome::NoResults => {
                        g.opportunities.clear();
                        g.error = Some(NO_RESULTS_MESSAGE.to_string());
                    }
                }
            }
            Err(e) => {
                g.error = Some(e.to_string());
            }
        }
        true
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.snapshot
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Vec<SourceProgress>> {
        self.progress.subscribe()
    }

    pub fn clear_error(&self) {
        if let Ok(mut g) = self.snapshot.write() {
            g.error = None;
        }
    }
}
