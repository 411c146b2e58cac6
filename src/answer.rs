//! Generative-answer collaborator: the Gemini REST client.
//!
//! The retrieval core hands this module a context string (formatted evidence)
//! and a question; it returns an explicit [`AnswerOutcome`] — either the
//! model's answer or an `Unavailable` reason. It never encodes fallback text:
//! rendering a degraded answer is the caller's decision (see `qa`).

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::AnswerConfig;
use crate::models::Hit;

/// Outcome of an answer-generation call. Transport errors, missing models,
/// and malformed responses all map to `Unavailable` with a reason — the
/// collaborator failing is an expected, renderable state, not a crash.
#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    Answer(String),
    Unavailable(String),
}

/// Format hits as the answer model's context: `"[page P] text"` per hit,
/// blank-line separated, nearest-first.
pub fn build_context(hits: &[Hit]) -> String {
    hits.iter()
        .map(|h| format!("[page {}] {}", h.page, h.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a client from configuration.
    ///
    /// A missing API key is a constructor-time failure so the absence
    /// surfaces before any retrieval work is done.
    pub fn new(config: &AnswerConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => bail!(
                "No Gemini API key configured (set answer.api_key or GOOGLE_API_KEY)"
            ),
        };

        Ok(Self {
            model: config.model.clone(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Ask the model to answer `question` grounded in `context`.
    pub fn ask(&self, context: &str, question: &str) -> AnswerOutcome {
        let prompt = format!(
            "Answer based only on the text below and cite pages.\n\n\
             Context:\n{}\n\nQuestion:\n{}",
            context, question
        );

        let client = match reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
        {
            Ok(c) => c,
            Err(e) => return AnswerOutcome::Unavailable(format!("HTTP client error: {}", e)),
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = match client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
        {
            Ok(r) => r,
            Err(e) => return AnswerOutcome::Unavailable(format!("transport error: {}", e)),
        };

        let status = response.status();
        if status.as_u16() == 404 {
            return AnswerOutcome::Unavailable(format!(
                "model not found: {} (set answer.model to a supported model name)",
                self.model
            ));
        }
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return AnswerOutcome::Unavailable(format!("API error {}: {}", status, detail));
        }

        match response.json::<serde_json::Value>() {
            Ok(json) => parse_answer(&json),
            Err(e) => AnswerOutcome::Unavailable(format!("invalid response: {}", e)),
        }
    }
}

/// Extract the answer text from a `generateContent` response.
fn parse_answer(json: &serde_json::Value) -> AnswerOutcome {
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    let text = match parts {
        Some(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        None => String::new(),
    };

    if text.is_empty() {
        AnswerOutcome::Unavailable("response contained no answer text".to_string())
    } else {
        AnswerOutcome::Answer(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_context_format() {
        let hits = vec![
            Hit {
                page: 3,
                text: "alpha chunk".to_string(),
            },
            Hit {
                page: 1,
                text: "beta chunk".to_string(),
            },
        ];
        assert_eq!(
            build_context(&hits),
            "[page 3] alpha chunk\n\n[page 1] beta chunk"
        );
    }

    #[test]
    fn test_build_context_empty() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_parse_answer_ok() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "See page 2." }] }
            }]
        });
        match parse_answer(&json) {
            AnswerOutcome::Answer(text) => assert_eq!(text, "See page 2."),
            other => panic!("expected Answer, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_answer_multipart() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "part one, " }, { "text": "part two" }] }
            }]
        });
        match parse_answer(&json) {
            AnswerOutcome::Answer(text) => assert_eq!(text, "part one, part two"),
            other => panic!("expected Answer, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_answer_empty_is_unavailable() {
        let json = serde_json::json!({ "candidates": [] });
        assert!(matches!(parse_answer(&json), AnswerOutcome::Unavailable(_)));
    }

    #[test]
    fn test_missing_api_key_fails_construction() {
        let config = AnswerConfig {
            model: "gemini-2.5-pro".to_string(),
            api_key: None,
            timeout_secs: 60,
        };
        assert!(GeminiClient::new(&config).is_err());
    }
}
