use std::path::PathBuf;
use thiserror::Error;

use crate::processor::format::{DocumentFormat, SUPPORTED_FORMATS};

#[derive(Error, Debug)]
pub enum PrepnoteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Study material error: {0}")]
    Study(#[from] crate::study::StudyError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(
        "Unsupported document format (filename={filename}, content_type={content_type}). Supported formats: {}",
        SUPPORTED_FORMATS
    )]
    UnsupportedFormat {
        filename: String,
        content_type: String,
    },

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Failed to process {format}: {message}")]
    Extraction {
        format: DocumentFormat,
        message: String,
    },

    #[error("No usable text extracted from {format}{}", hint_suffix(.format))]
    InsufficientText { format: DocumentFormat },

    #[error("OCR dependency unavailable: {0}")]
    OcrDependencyMissing(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to render PDF page: {0}")]
    RenderFailed(String),
}

impl ProcessError {
    /// Attributes a lower-level failure to the stage of `format` that raised it.
    ///
    /// Dependency failures and errors that already carry a format pass through
    /// untouched so callers can still tell them apart.
    pub fn in_format(self, format: DocumentFormat) -> Self {
        match self {
            Self::OcrFailed(message) | Self::ImageDecode(message) | Self::RenderFailed(message) => {
                Self::Extraction { format, message }
            }
            other => other,
        }
    }

    /// True when the failure is environmental rather than caused by the upload.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, Self::OcrDependencyMissing(_))
    }
}

fn hint_suffix(format: &DocumentFormat) -> &'static str {
    match format {
        DocumentFormat::Pdf => " (it may be a scanned or image-only PDF)",
        DocumentFormat::Pptx => " (the slides may be mostly images)",
        _ => "",
    }
}

pub type Result<T> = std::result::Result<T, PrepnoteError>;
