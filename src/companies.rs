// src/companies.rs
//! Company lookup across public directories. Each directory is probed once; a
//! reachable search page becomes a link record.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::probe::ReachabilityProber;
use crate::sources::{ProgressPublisher, SourceProgress, SourceRegistry, SourceStatus, StatusBoard};

pub const NO_COMPANIES_MESSAGE: &str = "No company found. Check the name or try another search.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub description: String,
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siret: Option<String>,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompanySearchReport {
    pub companies: Vec<Company>,
    pub sources: Vec<SourceProgress>,
    pub error: Option<String>,
}

pub struct CompanyDirectory {
    registry: Arc<SourceRegistry>,
    prober: Arc<dyn ReachabilityProber>,
}

impl CompanyDirectory {
    pub fn new(registry: Arc<SourceRegistry>, prober: Arc<dyn ReachabilityProber>) -> Self {
        Self { registry, prober }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub async fn search(&self, term: &str, publisher: &dyn ProgressPublisher) -> CompanySearchReport {
        let term = term.trim();
        let mut board = StatusBoard::new(&self.registry, publisher);
        board.mark_all_searching();

        let mut companies = Vec::new();
        for (idx, dir) in self.registry.sources().iter().enumerate() {
            let url = dir.search_url(term);
            let reachable = !term.is_empty() && self.prober.probe(&url).await;
            if reachable {
                companies.push(Company {
                    id: format!("{}-{}", dir.name, Utc::now().timestamp_millis()),
                    name: term.to_string(),
                    description: format!("See the company details on {}", dir.name),
                    website: url.clone(),
                    address: None,
                    phone: None,
                    email: None,
                    siret: None,
                    source: dir.name.clone(),
                    url,
                });
            }
            let status = if reachable {
                SourceStatus::Completed
            } else {
                SourceStatus::Error
            };
            board.transition(idx, status);
        }

        let error = companies
            .is_empty()
            .then(|| NO_COMPANIES_MESSAGE.to_string());
        CompanySearchReport {
            companies,
            sources: board.into_entries(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::NoopPublisher;

    struct OnlyHost(&'static str);

    #[async_trait::async_trait]
    impl ReachabilityProber for OnlyHost {
        async fn probe(&self, url: &str) -> bool {
            url.contains(self.0)
        }
    }

    #[tokio::test]
    async fn reachable_directories_yield_companies() {
        let dir = CompanyDirectory::new(
            Arc::new(SourceRegistry::default_company_directories()),
            Arc::new(OnlyHost("infogreffe")),
        );
        let report = dir.search("Acme SAS", &NoopPublisher).await;
        assert_eq!(report.companies.len(), 1);
        let c = &report.companies[0];
        assert_eq!(c.source, "Infogreffe");
        assert_eq!(c.name, "Acme SAS");
        assert!(c.url.ends_with("terme=Acme%20SAS"));
        assert!(report.error.is_none());

        let statuses: Vec<_> = report.sources.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                SourceStatus::Error,
                SourceStatus::Completed,
                SourceStatus::Error,
                SourceStatus::Error
            ]
        );
    }

    #[tokio::test]
    async fn nothing_reachable_sets_message() {
        let dir = CompanyDirectory::new(
            Arc::new(SourceRegistry::default_company_directories()),
            Arc::new(OnlyHost("nowhere")),
        );
        let report = dir.search("Acme", &NoopPublisher).await;
        assert!(report.companies.is_empty());
        assert_eq!(report.error.as_deref(), Some(NO_COMPANIES_MESSAGE));
    }
}
