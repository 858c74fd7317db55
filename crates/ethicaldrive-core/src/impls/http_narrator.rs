//! HttpNarrator - narrator backed by a generative text endpoint.
//!
//! Wire contract:
//! - `POST {endpoint}/v1/generate`
//! - request  `{"model": "...", "prompt": "...", "media": [...]}`, where each
//!   media part is `{"url": "data:...", "contentType": "video/mp4"}`
//! - response `{"text": "..."}`
//!
//! No retries here; a failure is reported once and the caller degrades.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::prompt;
use crate::config::NarratorConfig;
use crate::domain::errors::NarratorError;
use crate::domain::media::{VideoAssessment, VideoClip};
use crate::ports::narrator::{ExplanationRequest, Narrator, SummaryRequest};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    media: Vec<MediaPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaPart<'a> {
    url: &'a str,
    content_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Narrator that calls a remote generative-text endpoint.
///
/// One `reqwest::Client` is shared by all calls; its timeout matches the
/// configured narrative timeout.
///
/// # Errors
/// - transport failure or client-side timeout: `Transport` / `Timeout`
/// - non-2xx status: `Status` with the response body
/// - body without a `text` field, or an unparseable video verdict: `Decode`
pub struct HttpNarrator {
    url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl HttpNarrator {
    /// Build a client from config. The bearer token, if any, is read from the
    /// environment variable named by `api_key_env`.
    pub fn new(config: &NarratorConfig) -> Result<Self, NarratorError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout());
        if is_loopback(&config.endpoint) {
            builder = builder.no_proxy();
        }
        let http_client = builder
            .build()
            .map_err(|e| NarratorError::Client(e.to_string()))?;

        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            url: format!("{}/v1/generate", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            timeout: config.timeout(),
            http_client,
        })
    }

    /// Override the bearer token read from the environment.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, NarratorError> {
        debug!(
            url = %self.url,
            model = request.model,
            media = request.media.len(),
            "sending narrator request"
        );

        let mut builder = self.http_client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "narrator returned an error status");
            return Err(NarratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| NarratorError::Decode(e.to_string()))?;
        info!(chars = body.text.len(), "narrator response received");
        Ok(body.text.trim().to_string())
    }

    fn transport_error(&self, e: reqwest::Error) -> NarratorError {
        if e.is_timeout() {
            NarratorError::Timeout(self.timeout)
        } else {
            NarratorError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Narrator for HttpNarrator {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, NarratorError> {
        let prompt = prompt::summary_prompt(request);
        self.generate(&GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            media: Vec::new(),
        })
        .await
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, NarratorError> {
        let prompt = prompt::explanation_prompt(request);
        self.generate(&GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            media: Vec::new(),
        })
        .await
    }

    async fn assess_video(&self, clip: &VideoClip) -> Result<VideoAssessment, NarratorError> {
        let text = self
            .generate(&GenerateRequest {
                model: &self.model,
                prompt: prompt::video_prompt(),
                media: vec![MediaPart {
                    url: clip.data_uri(),
                    content_type: clip.mime_type(),
                }],
            })
            .await?;
        parse_assessment(&text)
    }
}

fn is_loopback(endpoint: &str) -> bool {
    let authority = endpoint.split_once("://").map_or(endpoint, |(_, rest)| rest);
    let authority = authority.split('/').next().unwrap_or_default();
    authority.starts_with("[::1]")
        || matches!(authority.split(':').next(), Some("localhost" | "127.0.0.1"))
}

/// Decode the generator's JSON verdict, tolerating a ```json fence around it.
pub(crate) fn parse_assessment(text: &str) -> Result<VideoAssessment, NarratorError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim()).map_err(|e| NarratorError::Decode(e.to_string()))
}
