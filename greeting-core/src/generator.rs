//! Generative-text service clients.
//!
//! [`TextGenerator`] is the seam the orchestrator talks to. [`GeminiClient`]
//! speaks the Google Generative Language `generateContent` REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Model used for every greeting.
pub const GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Public Gemini endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Errors that can occur when calling the generative service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The configured base URL is invalid.
    #[error("invalid generative service URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("generative service request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status (quota, auth, ...).
    #[error("generative service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The response body could not be parsed.
    #[error("failed to parse generative service payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single-shot text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Generate text for `prompt`. `Ok(None)` means the service answered
    /// without any text.
    async fn generate(&self, model: &str, prompt: &str) -> Result<Option<String>, GenerationError>;
}

/// Client for Gemini `generateContent`.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl GeminiClient {
    /// Create a client for the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Http`] if the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        Self::with_base_url(api_key, GEMINI_BASE_URL)
    }

    /// Create a client against a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidUrl`] if the URL is malformed.
    /// Returns [`GenerationError::Http`] if the HTTP client fails to build.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, GenerationError> {
        let base_url =
            Url::parse(base_url).map_err(|e| GenerationError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GenerationError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("christmas-greeting/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                base_url,
                api_key: api_key.into(),
            }),
        })
    }

    fn endpoint(&self, model: &str) -> Result<Url, GenerationError> {
        self.inner
            .base_url
            .join(&format!("v1beta/models/{model}:generateContent"))
            .map_err(|e| GenerationError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[tracing::instrument(name = "gemini_generate", skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<Option<String>, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .inner
            .http
            .post(self.endpoint(model)?)
            .query(&[("key", self.inner.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&body)?;
        Ok(parsed.text())
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, with its parts joined.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
