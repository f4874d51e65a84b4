// src/translate.rs
//! LibreTranslate-compatible client with a fixed fallback text.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.argosopentech.com/translate";
pub const TRANSLATION_UNAVAILABLE: &str = "Translation service temporarily unavailable";

#[derive(Serialize)]
struct TranslateReq<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
}

#[derive(Deserialize)]
struct TranslateResp {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

pub struct Translator {
    endpoint: String,
    client: Client,
}

impl Translator {
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("TRANSLATE_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_TRANSLATE_ENDPOINT.to_string());
        Self::new(endpoint)
    }

    pub fn new(endpoint: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building translate http client")?;
        Ok(Self { endpoint, client })
    }

    async fn try_translate(&self, text: &str, target: &str) -> Result<String> {
        let resp: TranslateResp = self
            .client
            .post(&self.endpoint)
            .json(&TranslateReq {
                q: text,
                source: "auto",
                target,
            })
            .send()
            .await
            .context("translate post")?
            .error_for_status()
            .context("translate non-2xx")?
            .json()
            .await
            .context("translate json")?;
        Ok(resp.translated_text)
    }

    /// Translate `text` into `target` (two-letter code, defaults to "fr").
    /// Any failure yields [`TRANSLATION_UNAVAILABLE`].
    pub async fn translate(&self, text: &str, target: Option<&str>) -> String {
        let target = normalize_target(target);
        match self.try_translate(text, &target).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = ?e, "translation failed");
                TRANSLATION_UNAVAILABLE.to_string()
            }
        }
    }
}

/// "en-US" → "en"; blank → "fr".
pub fn normalize_target(target: Option<&str>) -> String {
    target
        .and_then(|t| t.split(['-', '_']).next())
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "fr".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_language_is_normalized() {
        assert_eq!(normalize_target(Some("en-US")), "en");
        assert_eq!(normalize_target(Some("DE")), "de");
        assert_eq!(normalize_target(Some("")), "fr");
        assert_eq!(normalize_target(None), "fr");
    }

    #[tokio::test]
    async fn unreachable_service_returns_fallback() {
        let t = Translator::new("http://127.0.0.1:9/translate".into()).unwrap();
        assert_eq!(t.translate("bonjour", Some("en")).await, TRANSLATION_UNAVAILABLE);
    }
}
