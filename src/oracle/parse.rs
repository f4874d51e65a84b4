// src/oracle/parse.rs
//! Lenient parsing of JSON embedded in model replies.
//!
//! Replies are validated field by field: a reply that is syntactically valid JSON
//! but misses fields never leaks nulls into results.

use serde_json::Value;

use crate::oracle::{EnrichmentResult, KeywordSuggestions, OracleError, Question};

/// Slice out the JSON object of a reply, tolerating code fences and prose around it.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn parse_object(reply: &str) -> Result<Value, OracleError> {
    let raw = extract_json_object(reply)
        .ok_or_else(|| OracleError::Parse("no JSON object in reply".into()))?;
    let v: Value =
        serde_json::from_str(raw).map_err(|e| OracleError::Parse(format!("reply json: {e}")))?;
    if v.is_object() {
        Ok(v)
    } else {
        Err(OracleError::Parse("reply json is not an object".into()))
    }
}

fn as_flag(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
        _ => false,
    }
}

fn as_text(v: Option<&Value>) -> Option<String> {
    let s = match v? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Strings of an array in order; other element types are dropped. Not deduplicated.
fn as_string_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| i.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn parse_enrichment(reply: &str) -> Result<EnrichmentResult, OracleError> {
    let v = parse_object(reply)?;
    Ok(EnrichmentResult {
        is_relevant: as_flag(v.get("isRelevant")),
        keywords: as_string_list(v.get("keywords")),
        location: as_text(v.get("location")),
        budget: as_text(v.get("budget")),
    })
}

pub fn parse_suggestions(reply: &str) -> Result<KeywordSuggestions, OracleError> {
    let v = parse_object(reply)?;
    Ok(KeywordSuggestions {
        keywords: as_string_list(v.get("keywords")),
        titles: as_string_list(v.get("titles")),
        domains: as_string_list(v.get("domains")),
    })
}

pub fn parse_questions(reply: &str) -> Result<Vec<Question>, OracleError> {
    let v = parse_object(reply)?;
    let Some(Value::Array(items)) = v.get("questions") else {
        return Err(OracleError::Parse("reply has no questions array".into()));
    };
    Ok(items
        .iter()
        .filter_map(|q| match q {
            Value::String(s) => Some((None, s.trim().to_string())),
            Value::Object(_) => {
                as_text(q.get("question")).map(|text| (as_text(q.get("id")), text))
            }
            _ => None,
        })
        .filter(|(_, text)| !text.is_empty())
        .enumerate()
        .map(|(i, (id, question))| Question {
            id: id.unwrap_or_else(|| format!("q{}", i + 1)),
            question,
            answer: String::new(),
        })
        .collect())
}

/// Comma-separated list reply, trimmed, blanks dropped.
pub fn parse_comma_list(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(|s| s.trim().trim_end_matches('.').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
