//! Gemini oracle backend.
//!
//! Uses the `generateContent` endpoint with the whole prompt — system
//! instructions, task, and transcript — sent as a single user content
//! part. One POST per turn; the first candidate's text parts, joined, are
//! the turn. An empty completion is a valid (empty) turn and classifies
//! downstream as unparseable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stepline_core::error::OracleError;
use stepline_core::{History, Oracle, Task};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Oracle backed by the Gemini `generateContent` API.
pub struct GeminiOracle {
    name: String,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiOracle {
    /// Create a new Gemini oracle.
    pub fn new(api_key: impl Into<String>) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| OracleError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key: api_key.into(),
            temperature: 0.2,
            client,
        })
    }

    /// Use a custom base URL (testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Extract the turn text from a decoded API response.
    fn extract_text(resp: GenerateContentResponse) -> String {
        // The contract is "take the first" — no candidate selection logic.
        resp.candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        instructions: &str,
        task: &Task,
        history: &History,
    ) -> Result<String, OracleError> {
        let prompt = stepline_protocol::render_prompt(instructions, task, history);

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        debug!(model = %self.model, step = history.len() + 1, "Sending oracle request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(e.to_string())
                } else {
                    OracleError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(OracleError::RateLimited { retry_after_secs: 5 });
        }
        if status == 401 || status == 403 {
            return Err(OracleError::AuthenticationFailed(
                "Invalid Gemini API key".into(),
            ));
        }
        if status == 400 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(OracleError::MalformedRequest(error_body));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(OracleError::Unavailable {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: GenerateContentResponse = response.json().await.map_err(|e| {
            OracleError::Unavailable {
                status_code: 200,
                message: format!("Failed to parse Gemini response: {e}"),
            }
        })?;

        Ok(Self::extract_text(api_resp))
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
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
    content: Content,
}
