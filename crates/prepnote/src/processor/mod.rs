pub mod docx;
pub mod format;
pub mod image;
pub mod normalize;
pub mod ocr;
pub mod pdf;
pub mod pptx;
pub mod raster;
pub mod text;
mod xml;

use std::sync::Arc;

use crate::config::{Config, ExtractionConfig};
use crate::error::ProcessError;
use crate::sanitize::{hash_text, redact_filename};

pub use format::{Detected, DocumentFormat, SUPPORTED_FORMATS};
pub use normalize::{is_text_enough, normalize};
pub use ocr::{OcrEngine, OcrLanguages, OcrProcessor};
pub use raster::{PageRenderer, PopplerRenderer, RasterPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Normalized, never empty.
    pub text: String,
    pub format: DocumentFormat,
}

/// Turns an upload into text, escalating to OCR when native extraction
/// comes up short.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct Extractor {
    config: ExtractionConfig,
    languages: OcrLanguages,
    ocr: Arc<dyn OcrEngine>,
    renderer: Arc<dyn PageRenderer>,
}

impl Extractor {
    pub fn new(
        config: ExtractionConfig,
        languages: OcrLanguages,
        ocr: Arc<dyn OcrEngine>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            config,
            languages,
            ocr,
            renderer,
        }
    }

    /// Tesseract OCR and poppler rendering, configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.extraction.clone(),
            OcrLanguages::new(&config.ocr.languages),
            Arc::new(OcrProcessor::new(config.ocr.tessdata_dir.clone())),
            Arc::new(PopplerRenderer::new()),
        )
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn languages(&self) -> &OcrLanguages {
        &self.languages
    }

    pub fn extract_text(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<ExtractionResult, ProcessError> {
        let _span = tracing::info_span!(
            "processor.extract",
            file = %redact_filename(filename),
            content_type = %content_type,
            bytes = bytes.len(),
        )
        .entered();

        if filename.trim().is_empty() {
            return Err(ProcessError::EmptyInput("upload has no filename"));
        }
        if bytes.is_empty() {
            return Err(ProcessError::EmptyInput("uploaded file is empty"));
        }

        let format = match DocumentFormat::detect(filename, content_type) {
            Detected::Supported(format) => format,
            Detected::Unsupported => {
                return Err(ProcessError::UnsupportedFormat {
                    filename: redact_filename(filename),
                    content_type: content_type.to_string(),
                })
            }
        };
        tracing::debug!(format = %format, "Detected document format");

        let text = match format {
            DocumentFormat::Text => text::extract_text(bytes),
            DocumentFormat::Pdf => self.extract_pdf(bytes)?,
            DocumentFormat::Docx => docx::extract_text(bytes)?,
            DocumentFormat::Pptx => self.extract_pptx(bytes)?,
            DocumentFormat::Image => image::extract_text(self.ocr.as_ref(), bytes, &self.languages)?,
        };

        if text.is_empty() {
            return Err(ProcessError::InsufficientText { format });
        }

        tracing::info!(
            format = %format,
            chars = text.chars().count(),
            text_hash = %hash_text(&text),
            "Extracted text"
        );
        Ok(ExtractionResult { text, format })
    }

    fn extract_pdf(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        let ocr_pages = || {
            let pages = raster::rasterize_pages(
                self.renderer.as_ref(),
                bytes,
                self.config.ocr_page_limit,
                self.config.ocr_zoom,
            )?;
            tracing::debug!(pages = pages.len(), "Rasterized pages for OCR");
            ocr::recognize_pages(self.ocr.as_ref(), &pages, &self.languages)
        };

        let result = match pdf::extract_native_text(bytes, self.config.pdf_text_page_limit) {
            Ok(native) => replace_with_ocr(native, &self.config, ocr_pages),
            Err(e) => {
                // Poppler reads PDFs lopdf rejects, such as a broken xref table.
                tracing::warn!("lopdf failed to parse PDF: {}. Falling back to OCR.", e);
                ocr_unparsed(e, &self.config, ocr_pages)
            }
        };

        result.map_err(|e| e.in_format(DocumentFormat::Pdf))
    }

    fn extract_pptx(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.pptx").entered();

        let mut deck = pptx::Deck::open(bytes)?;
        let native = deck.native_text()?;

        append_ocr(native, &self.config, || {
            let blobs = deck.picture_blobs(self.config.pptx_image_limit)?;
            tracing::debug!(pictures = blobs.len(), "Collected slide pictures for OCR");
            ocr::recognize_blobs(self.ocr.as_ref(), &blobs, &self.languages)
        })
        .map_err(|e| e.in_format(DocumentFormat::Pptx))
    }
}

/// Scanned PDFs: a usable OCR result replaces the native text outright.
fn replace_with_ocr<F>(native: String, config: &ExtractionConfig, ocr: F) -> Result<String, ProcessError>
where
    F: FnOnce() -> Result<String, ProcessError>,
{
    if is_text_enough(&native, config.min_chars) {
        return Ok(native);
    }

    let _span = tracing::info_span!("processor.ocr_fallback", reason = "pdf_text_insufficient").entered();

    let recognized = normalize(&ocr()?);
    if is_text_enough(&recognized, config.ocr_min_chars) {
        Ok(recognized)
    } else {
        tracing::debug!("OCR fallback below threshold, keeping native text");
        Ok(native)
    }
}

/// PDFs lopdf can't open: OCR is the only source of text. The parse error
/// stands when OCR can't produce usable text either.
fn ocr_unparsed<F>(parse_error: ProcessError, config: &ExtractionConfig, ocr: F) -> Result<String, ProcessError>
where
    F: FnOnce() -> Result<String, ProcessError>,
{
    let _span = tracing::info_span!("processor.ocr_fallback", reason = "lopdf_parse_failed").entered();

    match ocr() {
        Ok(text) => {
            let recognized = normalize(&text);
            if is_text_enough(&recognized, config.ocr_min_chars) {
                Ok(recognized)
            } else {
                Err(parse_error)
            }
        }
        Err(e) if e.is_dependency_failure() => Err(e),
        Err(e) => {
            tracing::debug!("OCR of unparsed PDF failed: {}", e);
            Err(parse_error)
        }
    }
}

/// Image-heavy decks: a usable OCR result is appended after whatever native
/// text the slides had.
fn append_ocr<F>(native: String, config: &ExtractionConfig, ocr: F) -> Result<String, ProcessError>
where
    F: FnOnce() -> Result<String, ProcessError>,
{
    if is_text_enough(&native, config.min_chars) {
        return Ok(native);
    }

    let _span = tracing::info_span!("processor.ocr_fallback", reason = "pptx_text_insufficient").entered();

    let recognized = normalize(&ocr()?);
    if is_text_enough(&recognized, config.ocr_min_chars) {
        Ok(normalize(&format!("{}\n\n{}", native, recognized)))
    } else {
        tracing::debug!("OCR fallback below threshold, keeping native text");
        Ok(native)
    }
}
