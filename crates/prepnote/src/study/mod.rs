//! Study material generation: summaries and presentation scripts.

pub mod client;
pub mod prompt;
pub mod response;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;
use crate::sanitize::hash_text;
use crate::secrets::SecretError;

pub use client::{LlmClient, OpenAiClient};

pub const MAX_SPEAKERS: u8 = 5;
pub const MAX_TARGET_MINUTES: u8 = 15;

const DEFAULT_TITLE: &str = "제목 없음";

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("Language model API key is not configured: {0}")]
    MissingApiKey(#[from] SecretError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Language model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Language model API returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Elementary,
    Middle,
    High,
    #[default]
    College,
    Office,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Formal,
    Friendly,
    Energetic,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryOptions {
    #[serde(default)]
    pub length: Option<SummaryLength>,
    #[serde(default)]
    pub audience: Option<Audience>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub options: Option<SummaryOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub summary_id: String,
    pub summary: String,
    pub outline: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptOptions {
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub speaker_count: Option<i64>,
    #[serde(default)]
    pub target_minutes: Option<i64>,
}

impl ScriptOptions {
    /// Speaker count clamped to `1..=5`, default 1.
    pub fn speakers(&self) -> u8 {
        clamp_option(self.speaker_count, 1, MAX_SPEAKERS)
    }

    /// Target length clamped to `1..=15` minutes, default 3.
    pub fn minutes(&self) -> u8 {
        clamp_option(self.target_minutes, 3, MAX_TARGET_MINUTES)
    }
}

/// Missing or zero means the default; anything else is clamped into
/// `1..=max`.
fn clamp_option(value: Option<i64>, default: u8, max: u8) -> u8 {
    match value {
        None | Some(0) => default,
        Some(v) => v.clamp(1, i64::from(max)) as u8,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRequest {
    pub title: String,
    pub summary_text: String,
    #[serde(default)]
    pub outline: Option<Vec<String>>,
    #[serde(default)]
    pub options: Option<ScriptOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub script_id: String,
    pub content: Vec<String>,
}

/// Builds prompts, calls the model and shapes its reply.
pub struct StudyGenerator {
    client: Arc<dyn LlmClient>,
    summary_input_chars: usize,
    script_input_chars: usize,
}

impl StudyGenerator {
    pub fn new(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            summary_input_chars: config.summary_input_chars,
            script_input_chars: config.script_input_chars,
        }
    }

    pub async fn generate_summary(&self, request: &SummaryRequest) -> Result<Summary, StudyError> {
        if request.text.trim().is_empty() {
            return Err(StudyError::InvalidRequest("text must not be empty".to_string()));
        }

        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        let options = request.options.clone().unwrap_or_default();
        let length = options.length.unwrap_or_default();
        let audience = options.audience.unwrap_or_default();

        tracing::info!(
            ?length,
            ?audience,
            chars = request.text.chars().count(),
            text_hash = %hash_text(&request.text),
            "Generating summary"
        );

        let prompt = prompt::summary_prompt(
            title,
            &request.text,
            length,
            audience,
            self.summary_input_chars,
        );
        let output = self.client.complete(&prompt.system, &prompt.user).await?;
        let parsed = response::parse_summary(&output);

        Ok(Summary {
            summary_id: new_id("summary"),
            summary: parsed.summary,
            outline: parsed.outline,
        })
    }

    pub async fn generate_script(&self, request: &ScriptRequest) -> Result<Script, StudyError> {
        if request.summary_text.trim().is_empty() {
            return Err(StudyError::InvalidRequest("summaryText must not be empty".to_string()));
        }

        let options = request.options.clone().unwrap_or_default();
        let tone = options.tone.unwrap_or_default();
        let speakers = options.speakers();
        let minutes = options.minutes();
        let outline = request.outline.as_deref().unwrap_or_default();

        tracing::info!(?tone, speakers, minutes, "Generating script");

        let prompt = prompt::script_prompt(
            request.title.trim(),
            &request.summary_text,
            outline,
            tone,
            speakers,
            minutes,
            self.script_input_chars,
        );
        let output = self.client.complete(&prompt.system, &prompt.user).await?;

        Ok(Script {
            script_id: new_id("script"),
            content: response::parse_script(&output),
        })
    }
}

/// `<prefix>_` followed by 8 random hex characters.
fn new_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..8])
}
