//! HuggingFace Inference API translation backend.
//!
//! Translation models (e.g. `Helsinki-NLP/opus-mt-hi-en`) are served by
//! HuggingFace's inference endpoints; "loading" a model means asking the API
//! to warm it up and waiting until it answers.
//! See: <https://huggingface.co/docs/api-inference/index>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::HuggingFaceConfig;
use crate::model::{TranslationBackend, TranslationModel};
use crate::{Result, TolkError};

/// Default base URL for HuggingFace Inference API
const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Default per-request timeout. Cold models can take a while to answer.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for HuggingFace Inference API translation models.
#[derive(Clone)]
pub struct HuggingFaceBackend {
    api_key: Option<String>,
    http: Client,
    base_url: String,
}

impl HuggingFaceBackend {
    /// Create a backend talking to the public inference API.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a backend from config settings.
    pub fn from_config(config: &HuggingFaceConfig, api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a backend with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TolkError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Translate `text` with `model`.
    ///
    /// # Arguments
    /// * `text` - Text to translate
    /// * `model` - Full HuggingFace model ID (e.g., `Helsinki-NLP/opus-mt-fr-en`)
    /// * `max_length` - Input is truncated to this many tokens
    pub async fn translate(&self, text: &str, model: &str, max_length: usize) -> Result<String> {
        let url = format!("{}/models/{}", self.base_url, model);

        let mut request = self.http.post(&url).json(&TranslationRequest {
            inputs: text,
            parameters: TranslationParameters {
                max_length,
                truncation: "only_first",
            },
            options: RequestOptions {
                wait_for_model: true,
            },
        });
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TolkError::Http(e.to_string()))?;

        self.handle_response_errors(&response, model)?;

        // Response is [{"translation_text": ".."}] for a single input
        let outputs: Vec<TranslationOutput> = response
            .json()
            .await
            .map_err(|e| TolkError::Http(e.to_string()))?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.translation_text)
            .ok_or(TolkError::EmptyResponse)
    }

    /// Check response status and map to appropriate error.
    fn handle_response_errors(&self, response: &reqwest::Response, model: &str) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 | 403 => Err(TolkError::AuthenticationFailed),
            404 => Err(TolkError::ModelNotFound(model.to_string())),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(TolkError::RateLimited { retry_after })
            }
            503 => Err(TolkError::Api {
                status: 503,
                message: "Model is loading, please retry".to_string(),
            }),
            code => Err(TolkError::Api {
                status: code,
                message: format!("HuggingFace API error: {}", status),
            }),
        }
    }
}

#[derive(Serialize)]
struct TranslationRequest<'a> {
    inputs: &'a str,
    parameters: TranslationParameters,
    options: RequestOptions,
}

#[derive(Serialize)]
struct TranslationParameters {
    max_length: usize,
    truncation: &'static str,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct TranslationOutput {
    translation_text: String,
}

/// A warmed-up model on the inference API.
pub struct HuggingFaceModel {
    backend: HuggingFaceBackend,
    model_id: String,
}

#[async_trait]
impl TranslationModel for HuggingFaceModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn translate(&self, text: &str, max_length: usize) -> Result<String> {
        self.backend
            .translate(text, &self.model_id, max_length)
            .await
            .map_err(|e| match e {
                // Keep transport/status errors typed; everything else is a translation failure.
                TolkError::Http(_)
                | TolkError::Api { .. }
                | TolkError::RateLimited { .. }
                | TolkError::AuthenticationFailed
                | TolkError::ModelNotFound(_) => e,
                other => TolkError::Translation(other.to_string()),
            })
    }
}

#[async_trait]
impl TranslationBackend for HuggingFaceBackend {
    fn name(&self) -> &str {
        "huggingface"
    }

    /// Warm the model up with a one-word request; fails if the API refuses it.
    async fn load(&self, model_id: &str) -> Result<Box<dyn TranslationModel>> {
        debug!(model_id, "warming up model on inference API");
        self.translate("hello", model_id, 8).await?;
        Ok(Box::new(HuggingFaceModel {
            backend: self.clone(),
            model_id: model_id.to_string(),
        }))
    }
}
