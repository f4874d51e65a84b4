// src/api.rs
//! HTTP surface consumed by the single-page front-end.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::aggregate::{Aggregator, SearchError};
use crate::companies::{CompanyDirectory, CompanySearchReport};
use crate::config::{OracleConfig, Registries};
use crate::feed::http::HttpFeedFetcher;
use crate::filters::{DateWindow, OpportunityFilter, BUDGET_RANGES, LOCATIONS};
use crate::oracle::{OpenAiProvider, OpportunityBrief, Oracle, OracleError, Question};
use crate::probe::{HttpProber, ReachabilityProber};
use crate::professionals::{Professional, ProfessionalDirectory};
use crate::session::{SearchSession, SearchSnapshot};
use crate::settings::SettingsStore;
use crate::sources::{completion_percent, NoopPublisher, SourceProgress, StatusBoard};
use crate::translate::Translator;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub aggregator: Arc<Aggregator>,
    pub session: Arc<SearchSession>,
    pub oracle: Oracle,
    pub companies: Arc<CompanyDirectory>,
    /// Live per-directory status of the latest company search.
    pub company_progress: Arc<watch::Sender<Vec<SourceProgress>>>,
    pub professionals: Arc<ProfessionalDirectory>,
    pub translator: Arc<Translator>,
    /// Used when the settings file holds no key (e.g. `OPENAI_API_KEY` in config).
    pub fallback_api_key: Option<String>,
}

impl AppState {
    /// Wire real HTTP collaborators from config files and environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let ai_path = std::env::var("AI_CONFIG_PATH")
            .unwrap_or_else(|_| crate::config::ai::DEFAULT_AI_CONFIG_PATH.to_string());
        let ai_cfg = OracleConfig::load_or_default(&ai_path);
        let registries = crate::config::load_registries_default()?;

        let oracle = Oracle::new(Arc::new(OpenAiProvider::new(&ai_cfg)?));
        let prober: Arc<dyn ReachabilityProber> = Arc::new(HttpProber::new()?);
        let feeds = Arc::new(HttpFeedFetcher::new()?);

        tracing::info!(
            provider = oracle.provider_name(),
            model = %ai_cfg.model,
            sources = registries.opportunities.len(),
            directories = registries.directories.len(),
            key_in_config = !ai_cfg.api_key.is_empty(),
            "app state configured"
        );

        let Registries {
            opportunities,
            directories,
        } = registries;
        let opportunities = Arc::new(opportunities);
        let aggregator = Aggregator::new(
            opportunities.clone(),
            feeds,
            prober.clone(),
            Arc::new(oracle.clone()),
        );

        let settings = SettingsStore::open_default();
        tracing::info!(path = %settings.path().display(), "settings storage");

        Ok(Self::from_parts(
            Arc::new(settings),
            aggregator,
            oracle,
            CompanyDirectory::new(Arc::new(directories), prober),
            ProfessionalDirectory::with_sample_profiles(),
            Translator::from_env()?,
            Some(ai_cfg.api_key).filter(|k| !k.trim().is_empty()),
        ))
    }

    pub fn from_parts(
        settings: Arc<SettingsStore>,
        aggregator: Aggregator,
        oracle: Oracle,
        companies: CompanyDirectory,
        professionals: ProfessionalDirectory,
        translator: Translator,
        fallback_api_key: Option<String>,
    ) -> Self {
        let initial = StatusBoard::new(aggregator.registry(), &NoopPublisher).into_entries();
        let directories = StatusBoard::new(companies.registry(), &NoopPublisher).into_entries();
        let (company_progress, _) = watch::channel(directories);
        Self {
            settings,
            aggregator: Arc::new(aggregator),
            session: SearchSession::new(initial),
            oracle,
            companies: Arc::new(companies),
            company_progress: Arc::new(company_progress),
            professionals: Arc::new(professionals),
            translator: Arc::new(translator),
            fallback_api_key,
        }
    }

    /// Key from settings, else the configured fallback.
    pub fn api_key(&self) -> Option<String> {
        self.settings
            .get()
            .api_key()
            .map(str::to_string)
            .or_else(|| self.fallback_api_key.clone())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/opportunities", get(list_opportunities))
        .route("/api/opportunities/search", post(search_opportunities))
        .route("/api/opportunities/progress", get(search_progress))
        .route("/api/opportunities/error", delete(clear_search_error))
        .route("/api/filters", get(filter_presets))
        .route("/api/keywords/suggest", post(suggest_keywords))
        .route("/api/messages/questions", post(message_questions))
        .route("/api/messages/draft", post(message_draft))
        .route("/api/companies/search", post(search_companies))
        .route("/api/companies/progress", get(company_progress))
        .route("/api/professionals", get(search_professionals))
        .route("/api/professionals/skills", post(suggest_skills))
        .route("/api/translate", post(translate))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ------------------------------------------------------------
// Errors
// ------------------------------------------------------------

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ErrorBody { error: self.1 })).into_response()
    }
}

impl From<OracleError> for ApiError {
    fn from(e: OracleError) -> Self {
        let code = match e {
            OracleError::MissingApiKey => StatusCode::BAD_REQUEST,
            OracleError::Input(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_GATEWAY,
        };
        ApiError(code, e.to_string())
    }
}

// ------------------------------------------------------------
// Settings
// ------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsOut {
    has_api_key: bool,
    masked_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsIn {
    openai_api_key: String,
}

fn mask_key(k: &str) -> String {
    let tail: String = k
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsOut> {
    let s = state.settings.get();
    Json(SettingsOut {
        has_api_key: s.api_key().is_some(),
        masked_key: s.api_key().map(mask_key),
    })
}

async fn put_settings(
    State(state): State<AppState>,
    Json(body): Json<SettingsIn>,
) -> Result<StatusCode, ApiError> {
    state.settings.set(&body.openai_api_key).map_err(|e| {
        tracing::warn!(error = ?e, "saving settings failed");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, "could not save settings".into())
    })?;
    Ok(StatusCode::NO_CONTENT)
}

// ------------------------------------------------------------
// Opportunities
// ------------------------------------------------------------

#[derive(Deserialize)]
struct TermReq {
    term: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResp {
    /// `true` when a newer search superseded this one before it finished.
    stale: bool,
    #[serde(flatten)]
    snapshot: SearchSnapshot,
}

/// The run is spawned so it finishes and commits even when the client goes away.
async fn search_opportunities(
    State(state): State<AppState>,
    Json(body): Json<TermReq>,
) -> Result<(StatusCode, Json<SearchResp>), ApiError> {
    let session = state.session.clone();
    let aggregator = state.aggregator.clone();
    let key = state.api_key();
    let run = tokio::spawn(async move {
        let publisher = session.begin(body.term.trim());
        let result = aggregator
            .search(&body.term, key.as_deref(), &publisher)
            .await;
        let committed = session.commit(&publisher, &result);
        (result.err(), committed)
    });
    let (failure, committed) = run.await.map_err(|e| {
        tracing::error!(error = ?e, "search task failed");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, "search failed".into())
    })?;

    let code = match failure {
        Some(SearchError::MissingApiKey) | Some(SearchError::EmptySearchTerm) => {
            StatusCode::BAD_REQUEST
        }
        None => StatusCode::OK,
    };
    Ok((
        code,
        Json(SearchResp {
            stale: !committed,
            snapshot: state.session.snapshot(),
        }),
    ))
}

async fn clear_search_error(State(state): State<AppState>) -> StatusCode {
    state.session.clear_error();
    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterPresets {
    platforms: Vec<String>,
    budget_ranges: Vec<&'static str>,
    locations: Vec<&'static str>,
    date_windows: Vec<DateWindow>,
}

/// Choices the filter panel offers.
async fn filter_presets(State(state): State<AppState>) -> Json<FilterPresets> {
    Json(FilterPresets {
        platforms: state
            .aggregator
            .registry()
            .sources()
            .iter()
            .map(|s| s.name.clone())
            .collect(),
        budget_ranges: BUDGET_RANGES.to_vec(),
        locations: LOCATIONS.to_vec(),
        date_windows: vec![DateWindow::Today, DateWindow::Week, DateWindow::Month],
    })
}

fn csv_param(q: &HashMap<String, String>, key: &str) -> Vec<String> {
    q.get(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Current results, optionally filtered (`platform`, `budget`, `location` as
/// comma lists, `date` = today|week|month).
async fn list_opportunities(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<SearchSnapshot>, ApiError> {
    let date = match q.get("date").map(|d| d.trim()).filter(|d| !d.is_empty()) {
        Some(d) => Some(
            d.parse::<DateWindow>()
                .map_err(|e| ApiError(StatusCode::BAD_REQUEST, e.to_string()))?,
        ),
        None => None,
    };
    let filter = OpportunityFilter {
        platform: csv_param(&q, "platform"),
        budget: csv_param(&q, "budget"),
        location: csv_param(&q, "location"),
        date,
    };
    let mut snap = state.session.snapshot();
    if !filter.is_empty() {
        snap.opportunities = filter.apply(&snap.opportunities, chrono::Utc::now());
    }
    Ok(Json(snap))
}

#[derive(Serialize)]
struct ProgressOut {
    percent: f32,
    sources: Vec<SourceProgress>,
}

async fn search_progress(State(state): State<AppState>) -> Json<ProgressOut> {
    let sources = state.session.subscribe_progress().borrow().clone();
    Json(ProgressOut {
        percent: completion_percent(&sources),
        sources,
    })
}

#[derive(Serialize)]
struct SuggestOut {
    suggestions: Vec<String>,
}

/// Failures are logged and answered with an empty list.
async fn suggest_keywords(
    State(state): State<AppState>,
    Json(body): Json<TermReq>,
) -> Json<SuggestOut> {
    let Some(key) = state.api_key() else {
        return Json(SuggestOut {
            suggestions: Vec::new(),
        });
    };
    let suggestions = match state.oracle.suggest_keywords(&body.term, &key).await {
        Ok(s) => s.flatten(),
        Err(e) => {
            tracing::warn!(error = %e, "keyword suggestions failed");
            Vec::new()
        }
    };
    Json(SuggestOut { suggestions })
}

// ------------------------------------------------------------
// Message drafting
// ------------------------------------------------------------

#[derive(Deserialize)]
struct QuestionsReq {
    opportunity: OpportunityBrief,
}

#[derive(Serialize)]
struct QuestionsOut {
    questions: Vec<Question>,
}

async fn message_questions(
    State(state): State<AppState>,
    Json(body): Json<QuestionsReq>,
) -> Result<Json<QuestionsOut>, ApiError> {
    let key = state.api_key().unwrap_or_default();
    let questions = state
        .oracle
        .generate_questions(&body.opportunity, &key)
        .await?;
    Ok(Json(QuestionsOut { questions }))
}

#[derive(Deserialize)]
struct DraftReq {
    opportunity: OpportunityBrief,
    questions: Vec<Question>,
}

#[derive(Serialize)]
struct DraftOut {
    message: String,
}

async fn message_draft(
    State(state): State<AppState>,
    Json(body): Json<DraftReq>,
) -> Result<Json<DraftOut>, ApiError> {
    let key = state.api_key().unwrap_or_default();
    let message = state
        .oracle
        .draft_message(&body.opportunity, &body.questions, &key)
        .await?;
    Ok(Json(DraftOut { message }))
}

// ------------------------------------------------------------
// Companies, professionals, translation
// ------------------------------------------------------------

async fn search_companies(
    State(state): State<AppState>,
    Json(body): Json<TermReq>,
) -> Json<CompanySearchReport> {
    Json(
        state
            .companies
            .search(&body.term, state.company_progress.as_ref())
            .await,
    )
}

async fn company_progress(State(state): State<AppState>) -> Json<ProgressOut> {
    let sources = state.company_progress.borrow().clone();
    Json(ProgressOut {
        percent: completion_percent(&sources),
        sources,
    })
}

async fn search_professionals(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Vec<Professional>> {
    let term = q.get("q").cloned().unwrap_or_default();
    Json(state.professionals.search(&term))
}

#[derive(Serialize)]
struct SkillsOut {
    skills: Vec<String>,
}

async fn suggest_skills(
    State(state): State<AppState>,
    Json(body): Json<TermReq>,
) -> Json<SkillsOut> {
    let key = state.api_key().unwrap_or_default();
    let skills = match state.oracle.suggest_skills(&body.term, &key).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "skill suggestions failed");
            Vec::new()
        }
    };
    Json(SkillsOut { skills })
}

#[derive(Deserialize)]
struct TranslateIn {
    text: String,
    #[serde(default)]
    target: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateOut {
    translated_text: String,
}

async fn translate(
    State(state): State<AppState>,
    Json(body): Json<TranslateIn>,
) -> Json<TranslateOut> {
    let translated_text = state
        .translator
        .translate(&body.text, body.target.as_deref())
        .await;
    Json(TranslateOut { translated_text })
}
