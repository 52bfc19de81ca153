pub mod config;
pub mod error;
pub mod processor;
pub mod sanitize;
pub mod secrets;
pub mod study;

pub use config::{load_config, load_default_config, Config, ExtractionConfig, LlmConfig};
pub use error::{ConfigError, PrepnoteError, ProcessError, Result};
pub use processor::{
    DocumentFormat, ExtractionResult, Extractor, OcrEngine, OcrLanguages, PageRenderer, RasterPage,
};
pub use secrets::{resolve_api_key, resolve_secret, SecretError};
pub use study::{
    LlmClient, OpenAiClient, Script, ScriptRequest, StudyError, StudyGenerator, Summary,
    SummaryRequest,
};
