use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PREPNOTE_CONFIG";

/// Environment variable overriding `llm.model`.
pub const MODEL_ENV_VAR: &str = "OPENAI_MODEL";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = serde_json::from_str(content)?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Default per-user config location, e.g. `~/.config/prepnote/config.json`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("prepnote").join("config.json"))
}

/// Loads `$PREPNOTE_CONFIG` if set, else the per-user file if it exists,
/// else built-in defaults.
pub fn load_default_config() -> Result<Config, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        log::info!("Loading config from ${}", CONFIG_ENV_VAR);
        return load_config(PathBuf::from(path));
    }

    if let Some(path) = config_path().filter(|p| p.is_file()) {
        log::info!("Loading config from {}", path.display());
        return load_config(path);
    }

    log::info!("No config file found, using defaults");
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(model) = std::env::var(MODEL_ENV_VAR) {
        let model = model.trim();
        if !model.is_empty() {
            config.llm.model = model.to_string();
        }
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let extraction = &config.extraction;

    if extraction.min_chars == 0 || extraction.ocr_min_chars == 0 {
        return Err(validation("extraction thresholds must be greater than zero"));
    }

    if extraction.ocr_min_chars > extraction.min_chars {
        return Err(validation(format!(
            "extraction.ocrMinChars ({}) must not exceed extraction.minChars ({})",
            extraction.ocr_min_chars, extraction.min_chars
        )));
    }

    for (name, value) in [
        ("pdfTextPageLimit", extraction.pdf_text_page_limit),
        ("ocrPageLimit", extraction.ocr_page_limit),
        ("pptxImageLimit", extraction.pptx_image_limit),
    ] {
        if value == 0 {
            return Err(validation(format!("extraction.{} must be greater than zero", name)));
        }
    }

    if !(extraction.ocr_zoom > 0.0 && extraction.ocr_zoom <= 8.0) {
        return Err(validation(format!(
            "extraction.ocrZoom must be in (0, 8], got {}",
            extraction.ocr_zoom
        )));
    }

    let languages: Vec<&str> = config
        .ocr
        .languages
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    if languages.is_empty() {
        return Err(validation("ocr.languages must name at least one language"));
    }

    if let Some(bad) = languages
        .iter()
        .find(|l| !l.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    {
        return Err(validation(format!("Invalid OCR language code: '{}'", bad)));
    }

    if config.llm.model.trim().is_empty() {
        return Err(validation("llm.model must not be empty"));
    }

    if config.server.max_upload_bytes == 0 {
        return Err(validation("server.maxUploadBytes must be greater than zero"));
    }

    Ok(())
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
