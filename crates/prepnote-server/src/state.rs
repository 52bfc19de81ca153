//! Application state management

use std::sync::Arc;

use prepnote::study::{OpenAiClient, StudyError, StudyGenerator};
use prepnote::{Config, Extractor};

use crate::error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    extractor: Arc<Extractor>,
    study: Result<StudyGenerator, String>,
}

impl AppState {
    /// `study` is an error when the language model can't be used (usually a
    /// missing API key); only the study endpoints fail in that case.
    pub fn new(config: Config, extractor: Extractor, study: Result<StudyGenerator, StudyError>) -> Self {
        let study = study.map_err(|e| e.to_string());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                extractor: Arc::new(extractor),
                study,
            }),
        }
    }

    /// Production wiring: Tesseract, poppler and the OpenAI client.
    pub fn from_config(config: Config) -> Self {
        let extractor = Extractor::from_config(&config);

        let study = OpenAiClient::from_config(&config.llm)
            .map(|client| StudyGenerator::new(Arc::new(client), &config.llm));

        match &study {
            Ok(_) => tracing::info!(model = %config.llm.model, "Language model client ready"),
            Err(e) => tracing::warn!("Summaries and scripts unavailable: {}", e),
        }

        Self::new(config, extractor, study)
    }

    /// Loads the default configuration (`PREPNOTE_CONFIG` or the user
    /// config file) and wires production backends from it.
    pub fn load() -> prepnote::Result<Self> {
        let config = prepnote::load_default_config()?;
        Ok(Self::from_config(config))
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Cloned handle for moving into blocking tasks.
    pub fn extractor(&self) -> Arc<Extractor> {
        Arc::clone(&self.inner.extractor)
    }

    pub fn study(&self) -> Result<&StudyGenerator, ApiError> {
        self.inner
            .study
            .as_ref()
            .map_err(|reason| ApiError::StudyUnavailable(reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prepnote::{ConfigError, PrepnoteError};
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG_VAR: &str = "PREPNOTE_CONFIG";

    fn config_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_from_config_env_var() {
        let file = config_file(r#"{"server": {"bindAddress": "127.0.0.1:9100"}}"#);
        std::env::set_var(CONFIG_VAR, file.path());

        let state = AppState::load();
        std::env::remove_var(CONFIG_VAR);

        let state = state.unwrap();
        assert_eq!(state.config().server.bind_address, "127.0.0.1:9100");
        assert_eq!(state.extractor().config().min_chars, 80);
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_config() {
        let file = config_file(r#"{"extraction": {"minChars": 0}}"#);
        std::env::set_var(CONFIG_VAR, file.path());

        let result = AppState::load();
        std::env::remove_var(CONFIG_VAR);

        assert!(matches!(
            result,
            Err(PrepnoteError::Config(ConfigError::Validation { .. }))
        ));
    }
}
