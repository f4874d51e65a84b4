// src/professionals.rs
//! In-memory professional directory with token search.

use serde::{Deserialize, Serialize};

use crate::aggregate::split_keywords;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: String,
    pub name: String,
    pub title: String,
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub location: String,
    pub experience: u32,
    pub rating: f32,
    pub review_count: u32,
    pub skills: Vec<String>,
    pub profile_url: String,
}

impl Professional {
    fn searchable_text(&self) -> String {
        let mut parts = vec![
            self.name.as_str(),
            self.title.as_str(),
            self.bio.as_str(),
            self.location.as_str(),
        ];
        parts.extend(self.skills.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfessionalDirectory {
    profiles: Vec<Professional>,
}

impl ProfessionalDirectory {
    pub fn new(profiles: Vec<Professional>) -> Self {
        Self { profiles }
    }

    pub fn with_sample_profiles() -> Self {
        Self::new(vec![
            Professional {
                id: "1".into(),
                name: "Jean Dupont".into(),
                title: "Senior Full Stack Developer".into(),
                bio: "Over 10 years of web development with a focus on React and Node.js".into(),
                avatar: None,
                location: "Paris, France".into(),
                experience: 10,
                rating: 4.9,
                review_count: 127,
                skills: vec![
                    "React".into(),
                    "Node.js".into(),
                    "TypeScript".into(),
                    "MongoDB".into(),
                ],
                profile_url: "https://example.com/profile/1".into(),
            },
            Professional {
                id: "2".into(),
                name: "Claire Martin".into(),
                title: "Data Engineer".into(),
                bio: "Builds streaming pipelines and analytics platforms".into(),
                avatar: None,
                location: "Lyon, France".into(),
                experience: 7,
                rating: 4.7,
                review_count: 54,
                skills: vec!["Python".into(), "Kafka".into(), "Spark".into(), "SQL".into()],
                profile_url: "https://example.com/profile/2".into(),
            },
        ])
    }

    /// Profiles where any term token appears in the searchable text.
    pub fn search(&self, term: &str) -> Vec<Professional> {
        let tokens = split_keywords(&term.to_lowercase());
        if tokens.is_empty() {
            return Vec::new();
        }
        self.profiles
            .iter()
            .filter(|p| {
                let hay = p.searchable_text();
                tokens.iter().any(|t| hay.contains(t.as_str()))
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_token_matches_case_insensitively() {
        let dir = ProfessionalDirectory::with_sample_profiles();
        let hits = dir.search("KAFKA, golang");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Claire Martin");

        let hits = dir.search("france");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn blank_term_matches_nothing() {
        let dir = ProfessionalDirectory::with_sample_profiles();
        assert!(dir.search(" , ").is_empty());
        assert!(dir.search("cobol").is_empty());
    }
}
