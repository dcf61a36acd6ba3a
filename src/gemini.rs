//! Typed client for the Gemini `generateContent` REST endpoint.
//!
//! One endpoint serves both halves of the pipeline: structured extraction
//! (inline PDF + instruction + response schema → JSON text) and image
//! generation (prompt, optionally with a reference image → inline image
//! part). The request/response bodies are plain serde structs; callers map
//! [`GeminiError`] into their own taxonomy ([`crate::error::BillError`] for
//! extraction, [`crate::error::VisualError`] for visuals).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default API base; override with [`GeminiClient::with_api_base`] to point
/// at a proxy or a stub server in tests.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Wire-level failure from the service.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// The request never completed (DNS, TLS, timeout, connection reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Http { status: u16, body: String },

    /// The service answered 200 but embedded an error object.
    #[error("API error: {message}")]
    Api { message: String },

    /// The response body was not valid JSON for the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

// ── Request bodies ───────────────────────────────────────────────────────

/// A single part of a request or prompt: text or inline binary data.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Base64 payload with its mime type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

/// Generation knobs; only the set fields are serialised.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// "application/json" forces schema-constrained output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    /// e.g. `["IMAGE"]` for the image-generation models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

// ── Response bodies ──────────────────────────────────────────────────────

/// Response to a `generateContent` call.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseInlineData {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .flatten()
            .filter_map(|c| c.content.as_ref())
            .filter_map(|c| c.parts.as_ref())
            .flatten()
    }

    /// First text part of the first candidate, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.parts().find_map(|p| p.text.as_deref())
    }

    /// First inline image of the first candidate as `(mime_type, base64)`.
    pub fn first_image(&self) -> Option<(&str, &str)> {
        self.parts().find_map(|p| {
            p.inline_data
                .as_ref()
                .map(|d| (d.mime_type.as_deref().unwrap_or("image/png"), d.data.as_str()))
        })
    }
}

// ── Client ───────────────────────────────────────────────────────────────

/// Minimal `generateContent` client bound to one API key.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl GeminiClient {
    /// Build a client with a per-call timeout.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GeminiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API base (proxy, stub server).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Issue one `generateContent` call.
    pub async fn generate(
        &self,
        model: &str,
        parts: Vec<Part>,
        config: Option<&GenerationConfig>,
    ) -> Result<GenerateResponse, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: config,
        };

        debug!(model, "sending generateContent request");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Malformed(e.to_string()))?;

        if let Some(error) = &parsed.error {
            return Err(GeminiError::Api {
                message: error.message.clone(),
            });
        }

        Ok(parsed)
    }
}
