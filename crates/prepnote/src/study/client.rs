//! Language model client.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use crate::config::LlmConfig;
use crate::secrets::resolve_api_key;
use crate::study::StudyError;

/// Maximum length of an error body carried into `StudyError::Api`.
const MAX_ERROR_BODY_LENGTH: usize = 200;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A chat-style completion capability: one system and one user message in,
/// the model's text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, StudyError>;
}

/// OpenAI Responses API client.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: [Message<'a>; 2],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: SecretString) -> Result<Self, StudyError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StudyError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/responses", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Builds a client with the API key resolved from `config`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, StudyError> {
        let api_key = resolve_api_key(config)?;
        Self::new(config, api_key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, StudyError> {
        let request = ResponsesRequest {
            model: &self.model,
            input: [
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(
            "Requesting completion from {} (model {}, {} prompt chars)",
            self.endpoint,
            self.model,
            system.chars().count() + user.chars().count()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Model request failed with status {}", status);
            return Err(StudyError::Api {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let payload: Value = response.json().await?;
        let text = output_text(&payload);
        info!("Model returned {} chars", text.chars().count());

        Ok(text)
    }
}

/// Text of a Responses API payload: `output_text` when present, otherwise
/// every `output_text` content part of every output item, concatenated.
pub fn output_text(payload: &Value) -> String {
    if let Some(text) = payload.get("output_text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return text.trim().to_string();
        }
    }

    let mut text = String::new();
    let items = payload
        .get("output")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for item in items {
        let parts = item
            .get("content")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for part in parts {
            if part.get("type").and_then(Value::as_str) == Some("output_text") {
                if let Some(fragment) = part.get("text").and_then(Value::as_str) {
                    text.push_str(fragment);
                }
            }
        }
    }

    text.trim().to_string()
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((idx, _)) => format!("{}... (truncated)", &body[..idx]),
        None => body.to_string(),
    }
}
