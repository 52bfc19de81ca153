use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Browser origins allowed by CORS.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            allowed_origins: default_allowed_origins(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// Tesseract language codes, combined as `eng+kor`.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Overrides the tessdata directory Tesseract would otherwise discover.
    #[serde(default)]
    pub tessdata_dir: Option<String>,
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string(), "kor".to_string()]
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            tessdata_dir: None,
        }
    }
}

/// Sufficiency thresholds and work caps for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Characters native text needs before OCR fallback is skipped.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    /// Characters an OCR fallback result needs to be used at all.
    #[serde(default = "default_ocr_min_chars")]
    pub ocr_min_chars: usize,
    #[serde(default = "default_pdf_text_page_limit")]
    pub pdf_text_page_limit: usize,
    #[serde(default = "default_ocr_page_limit")]
    pub ocr_page_limit: usize,
    #[serde(default = "default_ocr_zoom")]
    pub ocr_zoom: f32,
    /// Picture blobs OCR'd across a whole deck.
    #[serde(default = "default_pptx_image_limit")]
    pub pptx_image_limit: usize,
}

fn default_min_chars() -> usize {
    80
}

fn default_ocr_min_chars() -> usize {
    30
}

fn default_pdf_text_page_limit() -> usize {
    10
}

fn default_ocr_page_limit() -> usize {
    8
}

fn default_ocr_zoom() -> f32 {
    2.0
}

fn default_pptx_image_limit() -> usize {
    8
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            ocr_min_chars: default_ocr_min_chars(),
            pdf_text_page_limit: default_pdf_text_page_limit(),
            ocr_page_limit: default_ocr_page_limit(),
            ocr_zoom: default_ocr_zoom(),
            pptx_image_limit: default_pptx_image_limit(),
        }
    }
}

/// Language model settings for summaries and scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Literal API key. Prefer `api_key_file` or `api_key_env_var`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_summary_input_chars")]
    pub summary_input_chars: usize,
    #[serde(default = "default_script_input_chars")]
    pub script_input_chars: usize,
}

pub(crate) fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env_var() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_summary_input_chars() -> usize {
    22_000
}

fn default_script_input_chars() -> usize {
    20_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_api_key_env_var(),
            timeout_secs: default_llm_timeout(),
            summary_input_chars: default_summary_input_chars(),
            script_input_chars: default_script_input_chars(),
        }
    }
}
