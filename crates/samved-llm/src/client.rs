//! Completion client for the hosted Gemini text-generation API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response contained no text")]
    EmptyResponse,

    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// A text-completion service. Turns a prompt into generated text.
///
/// Implementations must not retry on failure; errors go straight back to
/// the caller.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

// -- Wire format --

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Concatenates the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, CompletionError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Parse(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    Ok(text)
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Self {
        debug!("Created Gemini client for model {} at {}", model, base_url);
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Completer for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("Sending completion request ({} chars) to {}", prompt.len(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Completion request timed out after {:?}", self.timeout);
                    CompletionError::Timeout(self.timeout)
                } else {
                    error!("Completion request failed: {}", e);
                    CompletionError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout(self.timeout)
            } else {
                CompletionError::Http(e.to_string())
            }
        })?;

        if !status.is_success() {
            error!("Completion API error {}: {}", status, text);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        extract_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_joins_first_candidate_parts() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Key point: rain.\n"}, {"text": "Tweet: it pours!"}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        assert_eq!(extract_text(body).unwrap(), "Key point: rain.\nTweet: it pours!");
    }

    #[test]
    fn no_candidates_is_empty_response() {
        assert!(matches!(
            extract_text(r#"{"candidates": []}"#),
            Err(CompletionError::EmptyResponse)
        ));
        assert!(matches!(
            extract_text(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#),
            Err(CompletionError::EmptyResponse)
        ));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        assert!(matches!(extract_text("<html>"), Err(CompletionError::Parse(_))));
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(
            "key".into(),
            DEFAULT_MODEL.into(),
            format!("{}/", DEFAULT_BASE_URL),
            Duration::from_secs(5),
        );
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );
    }

    #[tokio::test]
    async fn unreachable_host_surfaces_error() {
        let client = GeminiClient::new(
            "key".into(),
            DEFAULT_MODEL.into(),
            "http://127.0.0.1:9".into(),
            Duration::from_secs(5),
        );
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(
            err,
            CompletionError::Http(_) | CompletionError::Timeout(_)
        ));
    }
}
