use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, error};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::client::{Part, TextGenerator};
use crate::config::GeminiConfig;
use crate::error::AppError;

/// Client for the `generateContent` endpoint of the Gemini API.
///
/// No retries are attempted. Every call is bounded by the configured timeout.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    url: Url,
    api_key: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, api_key: String) -> Result<Self, AppError> {
        let base = config.endpoint.trim_end_matches('/');
        let url = Url::parse(&format!(
            "{}/v1beta/models/{}:generateContent",
            base, config.model
        ))
        .map_err(|e| AppError::Config(format!("invalid Gemini endpoint {}: {e}", config.endpoint)))?;

        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            api_key,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_transport_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout(self.timeout)
        } else {
            AppError::service(format!("request failed: {err}"))
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, parts: &[Part]) -> Result<String, AppError> {
        if parts.is_empty() {
            return Err(AppError::MissingInput(
                "generation requires at least one part".to_string(),
            ));
        }

        let start = Instant::now();
        let payload = build_request(parts);
        let resp = self
            .client
            .post(self.url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status();
        let value: Value = match resp.json().await {
            Ok(value) => value,
            Err(e) if e.is_timeout() => return Err(AppError::Timeout(self.timeout)),
            Err(e) if status.is_success() => {
                return Err(AppError::service(format!("failed to parse response: {e}")))
            }
            Err(_) => Value::Null,
        };
        debug!(
            "generateContent returned {} in {} ms",
            status,
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            let err = status_error(status, &value);
            error!("Generation request failed: {}", err);
            return Err(err);
        }

        extract_text(&value)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartPayload<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum PartPayload<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

fn build_request(parts: &[Part]) -> GenerateRequest<'_> {
    let parts = parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => PartPayload::Text { text },
            Part::InlineData { mime_type, bytes } => PartPayload::Inline {
                inline_data: InlineData {
                    mime_type,
                    data: STANDARD.encode(bytes),
                },
            },
        })
        .collect();
    GenerateRequest {
        contents: vec![Content { role: "user", parts }],
    }
}

fn status_error(status: StatusCode, value: &Value) -> AppError {
    let message = value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("no error details");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::service(format!(
            "authentication rejected ({status}): {message}"
        )),
        _ => AppError::service(format!("status {status}: {message}")),
    }
}

fn extract_text(value: &Value) -> Result<String, AppError> {
    if let Some(message) = value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(AppError::service(message.to_string()));
    }

    let first = value
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first());

    let Some(candidate) = first else {
        let reason = value
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(|r| r.as_str());
        return Err(match reason {
            Some(reason) => AppError::service(format!("prompt was blocked: {reason}")),
            None => AppError::service("response contained no candidates"),
        });
    };

    let text: Vec<&str> = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate
            .get("finishReason")
            .and_then(|r| r.as_str())
            .unwrap_or("unknown");
        return Err(AppError::service(format!(
            "response contained no text (finish reason: {reason})"
        )));
    }

    Ok(text.concat().trim().to_string())
}
