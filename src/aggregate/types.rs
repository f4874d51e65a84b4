// src/aggregate/types.rs
use serde::{Deserialize, Serialize};

use crate::sources::SourceProgress;

/// One finalized result surfaced to the user. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub platform: String,
    pub date: String, // RFC 3339 when known
    pub url: String,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Vec<OpportunityItem>),
    /// The run completed and nothing matched. Not an error.
    NoResults,
}

impl SearchOutcome {
    pub fn items(&self) -> &[OpportunityItem] {
        match self {
            SearchOutcome::Found(v) => v,
            SearchOutcome::NoResults => &[],
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("configure your OpenAI API key to analyze opportunities")]
    MissingApiKey,
    #[error("search term is empty")]
    EmptySearchTerm,
}

/// A finished run: outcome plus the final status of every source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub sources: Vec<SourceProgress>,
}

pub const NO_RESULTS_MESSAGE: &str =
    "No opportunities found. Try changing your search criteria.";
