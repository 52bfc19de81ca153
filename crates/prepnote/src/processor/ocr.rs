use std::fmt;
use std::sync::Arc;

use crate::error::ProcessError;
use crate::processor::raster::RasterPage;

/// Tesseract language set, e.g. `eng+kor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrLanguages(String);

impl OcrLanguages {
    pub fn new(languages: &[String]) -> Self {
        let joined: Vec<&str> = languages
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        if joined.is_empty() {
            Self::default()
        } else {
            Self(joined.join("+"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OcrLanguages {
    /// Latin plus Hangul.
    fn default() -> Self {
        Self("eng+kor".to_string())
    }
}

impl fmt::Display for OcrLanguages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optical character recognition capability.
pub trait OcrEngine: Send + Sync {
    /// Returns the recognized text of one image, trimmed.
    fn recognize(&self, page: &RasterPage, languages: &OcrLanguages) -> Result<String, ProcessError>;
}

/// Tesseract-backed engine. A fresh Tesseract handle is created per image,
/// so the processor itself holds no mutable state.
#[derive(Clone, Default)]
pub struct OcrProcessor {
    inner: Arc<OcrProcessorInner>,
}

#[derive(Default)]
struct OcrProcessorInner {
    data_path: Option<String>,
}

impl OcrProcessor {
    pub fn new(data_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(OcrProcessorInner { data_path }),
        }
    }
}

impl OcrEngine for OcrProcessor {
    fn recognize(&self, page: &RasterPage, languages: &OcrLanguages) -> Result<String, ProcessError> {
        let _span = tracing::info_span!(
            "processor.ocr",
            width = page.width(),
            height = page.height(),
            languages = %languages,
        )
        .entered();

        let png_data = page.to_png()?;

        let mut lt = leptess::LepTess::new(self.inner.data_path.as_deref(), languages.as_str())
            .map_err(|e| {
                ProcessError::OcrDependencyMissing(format!(
                    "Failed to initialize Tesseract for '{}': {}",
                    languages, e
                ))
            })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| ProcessError::OcrFailed(format!("OCR failed: {}", e)))?;

        Ok(text.trim().to_string())
    }
}

/// Combines per-image OCR results in input order.
///
/// Failed items are logged and skipped, blank items are dropped and the rest
/// are joined with blank lines. Only a missing OCR dependency aborts the batch.
pub fn join_recognized<I>(results: I) -> Result<String, ProcessError>
where
    I: IntoIterator<Item = Result<String, ProcessError>>,
{
    let mut chunks = Vec::new();

    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    chunks.push(text.to_string());
                }
            }
            Err(e) if e.is_dependency_failure() => return Err(e),
            Err(e) => tracing::warn!(item = index, "Skipping image in OCR batch: {}", e),
        }
    }

    Ok(chunks.join("\n\n"))
}

/// OCRs already-decoded pages as one batch.
pub fn recognize_pages(
    engine: &dyn OcrEngine,
    pages: &[RasterPage],
    languages: &OcrLanguages,
) -> Result<String, ProcessError> {
    join_recognized(pages.iter().map(|page| engine.recognize(page, languages)))
}

/// Decodes and OCRs encoded image blobs as one batch; undecodable blobs are skipped.
pub fn recognize_blobs(
    engine: &dyn OcrEngine,
    blobs: &[Vec<u8>],
    languages: &OcrLanguages,
) -> Result<String, ProcessError> {
    join_recognized(blobs.iter().map(|blob| {
        let page = RasterPage::decode(blob)?;
        engine.recognize(&page, languages)
    }))
}
