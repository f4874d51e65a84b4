//! Oracle: relevance classification, extraction and free-text generation over a
//! chat-completion provider.
//!
//! Relevance enrichment never fails: any transport, HTTP or parse failure degrades to
//! "not relevant, no keywords". The auxiliary calls (suggestions, drafting) return
//! `Result` and leave the degraded branch to the caller.

pub mod openai;
pub mod parse;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};

pub use openai::OpenAiProvider;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("invalid input: {0}")]
    Input(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
}

/// Relevance verdict and extractions for one candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    pub is_relevant: bool,
    pub keywords: Vec<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
}

impl EnrichmentResult {
    /// The safe default used whenever the oracle cannot answer.
    pub fn not_relevant() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordSuggestions {
    pub keywords: Vec<String>,
    pub titles: Vec<String>,
    pub domains: Vec<String>,
}

impl KeywordSuggestions {
    /// keywords ++ titles ++ domains
    pub fn flatten(&self) -> Vec<String> {
        self.keywords
            .iter()
            .chain(&self.titles)
            .chain(&self.domains)
            .cloned()
            .collect()
    }
}

/// What the drafting prompts need to know about an opportunity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpportunityBrief {
    pub title: String,
    pub description: String,
    pub platform: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// One prompt sent to the provider.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub api_key: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Low-level provider: does the real remote call and returns the reply text.
pub trait ChatProvider: Send + Sync + 'static {
    fn complete<'a>(
        &'a self,
        req: ChatRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, OracleError>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// The relevance gate the aggregator depends on.
#[async_trait::async_trait]
pub trait RelevanceOracle: Send + Sync {
    async fn enrich(&self, text: &str, search_term: &str, api_key: &str) -> EnrichmentResult;
}

// ------------------------------------------------------------
// Prompts
// ------------------------------------------------------------

fn enrichment_prompt(text: &str, term: &str) -> String {
    format!(
        r#"Analyze this job opportunity for the search term: "{term}"

Content to analyze:
{text}

Return only a JSON object with:
{{
  "isRelevant": boolean (true if it matches the search criteria),
  "keywords": string[] (relevant skills and keywords found),
  "location": string (location if found),
  "budget": string (budget or rate if found)
}}

Consider:
- Technical skills and their variations
- Experience level
- Contract type (freelance, permanent, ...)
- Required qualifications"#
    )
}

fn suggestions_prompt(term: &str) -> String {
    format!(
        r#"For a job or freelance mission search on "{term}", suggest:
1. 5 relevant technical keywords
2. 5 variations of the job title
3. 3 related business domains

Format: JSON with three arrays: "keywords", "titles", "domains""#
    )
}

fn skills_prompt(term: &str) -> String {
    format!(
        "Domain: {term}\nTask: list 5 technical skills or professional specialities\nFormat: comma-separated skills, nothing else"
    )
}

fn questions_prompt(o: &OpportunityBrief) -> String {
    format!(
        r#"Generate 5 questions that help personalize an application message for this position:

Title: {}
Description: {}
Skills: {}

Answer format (JSON):
{{
  "questions": [
    {{ "id": "string", "question": "string" }}
  ]
}}

The questions should help to:
- Personalize the message
- Highlight relevant experience
- Show motivation
- Adapt the tone to the context"#,
        o.title,
        o.description,
        o.keywords.join(", ")
    )
}

fn message_prompt(o: &OpportunityBrief, questions: &[Question]) -> String {
    let answers = questions
        .iter()
        .map(|q| format!("Q: {}\nA: {}", q.question, q.answer))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        r#"Write a professional application message based on this information:

Position: {}
Description: {}
Platform: {}

Answers to the questions:
{answers}

The message must:
- Be professional but warm
- Highlight the key points of the answers
- Be well structured
- End with an appropriate closing
- Be about 250-300 words"#,
        o.title, o.description, o.platform
    )
}

// ------------------------------------------------------------
// Oracle
// ------------------------------------------------------------

#[derive(Clone)]
pub struct Oracle {
    provider: Arc<dyn ChatProvider>,
}

impl Oracle {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    async fn ask(
        &self,
        api_key: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String, OracleError> {
        if api_key.trim().is_empty() {
            return Err(OracleError::MissingApiKey);
        }
        self.provider
            .complete(ChatRequest {
                api_key,
                prompt,
                temperature,
                max_tokens,
            })
            .await
    }

    /// Relevance + extraction for one candidate. Single attempt, never fails.
    pub async fn enrich(&self, text: &str, search_term: &str, api_key: &str) -> EnrichmentResult {
        let prompt = enrichment_prompt(text, search_term);
        let verdict = match self.ask(api_key, &prompt, 0.1, Some(200)).await {
            Ok(reply) => parse::parse_enrichment(&reply),
            Err(e) => Err(e),
        };
        match verdict {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    target: "oracle",
                    error = %e,
                    provider = self.provider.name(),
                    "enrichment failed; treating candidate as not relevant"
                );
                counter!("oracle_failures_total", "op" => "enrich").increment(1);
                EnrichmentResult::not_relevant()
            }
        }
    }

    pub async fn suggest_keywords(
        &self,
        term: &str,
        api_key: &str,
    ) -> Result<KeywordSuggestions, OracleError> {
        if term.trim().is_empty() {
            return Ok(KeywordSuggestions::default());
        }
        let reply = self
            .ask(api_key, &suggestions_prompt(term.trim()), 0.7, Some(200))
            .await?;
        parse::parse_suggestions(&reply)
    }

    pub async fn suggest_skills(&self, term: &str, api_key: &str) -> Result<Vec<String>, OracleError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        let reply = self
            .ask(api_key, &skills_prompt(term.trim()), 0.7, Some(50))
            .await?;
        Ok(parse::parse_comma_list(&reply))
    }

    pub async fn generate_questions(
        &self,
        opportunity: &OpportunityBrief,
        api_key: &str,
    ) -> Result<Vec<Question>, OracleError> {
        let reply = self
            .ask(api_key, &questions_prompt(opportunity), 0.7, None)
            .await?;
        parse::parse_questions(&reply)
    }

    /// Draft the application message. Every question needs a non-blank answer.
    pub async fn draft_message(
        &self,
        opportunity: &OpportunityBrief,
        questions: &[Question],
        api_key: &str,
    ) -> Result<String, OracleError> {
        if let Some(q) = questions.iter().find(|q| q.answer.trim().is_empty()) {
            return Err(OracleError::Input(format!("question '{}' has no answer", q.id)));
        }
        let reply = self
            .ask(api_key, &message_prompt(opportunity, questions), 0.7, None)
            .await?;
        let msg = reply.trim().to_string();
        if msg.is_empty() {
            return Err(OracleError::Parse("empty message".into()));
        }
        Ok(msg)
    }
}

#[async_trait::async_trait]
impl RelevanceOracle for Oracle {
    async fn enrich(&self, text: &str, search_term: &str, api_key: &str) -> EnrichmentResult {
        Oracle::enrich(self, text, search_term, api_key).await
    }
}

// ------------------------------------------------------------
// Test/local providers
// ------------------------------------------------------------

/// Replies with a fixed text; records every prompt it receives.
pub struct ScriptedProvider {
    reply: Result<String, OracleError>,
    prompts: std::sync::Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: OracleError) -> Self {
        Self {
            reply: Err(err),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl ChatProvider for ScriptedProvider {
    fn complete<'a>(
        &'a self,
        req: ChatRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, OracleError>> + Send + 'a>> {
        if let Ok(mut g) = self.prompts.lock() {
            g.push(req.prompt.to_string());
        }
        let out = self.reply.clone();
        Box::pin(async move { out })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
