// src/oracle/openai.rs
//! Chat Completions provider. The API key travels with each request.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::OracleConfig;
use crate::oracle::{ChatProvider, ChatRequest, OracleError};

pub struct OpenAiProvider {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(cfg: &OracleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::feed::http::USER_AGENT)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building oracle http client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

impl ChatProvider for OpenAiProvider {
    fn complete<'a>(
        &'a self,
        req: ChatRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, OracleError>> + Send + 'a>> {
        Box::pin(async move {
            if req.api_key.trim().is_empty() {
                return Err(OracleError::MissingApiKey);
            }

            let body = Req {
                model: &self.model,
                messages: vec![Msg {
                    role: "user",
                    content: req.prompt,
                }],
                temperature: req.temperature,
                max_tokens: req.max_tokens,
            };

            let resp = self
                .http
                .post(&self.endpoint)
                .bearer_auth(req.api_key.trim())
                .json(&body)
                .send()
                .await
                .map_err(|e| OracleError::Network(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(OracleError::Api {
                    status: status.as_u16(),
                    body: text.chars().take(200).collect(),
                });
            }

            let parsed: Resp = resp
                .json()
                .await
                .map_err(|e| OracleError::Parse(format!("chat envelope: {e}")))?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| OracleError::Parse("reply had no message content".into()))
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
