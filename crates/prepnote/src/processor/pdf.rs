use crate::error::ProcessError;
use crate::processor::format::DocumentFormat;
use crate::processor::normalize::normalize;

/// Reads the text layer of at most the first `page_limit` pages.
///
/// Pages whose text can't be decoded are skipped; blank pages are dropped
/// and the rest joined with blank lines.
pub fn extract_native_text(pdf_bytes: &[u8], page_limit: usize) -> Result<String, ProcessError> {
    let _span = tracing::info_span!("processor.pdf.native").entered();

    let doc = lopdf::Document::load_mem(pdf_bytes).map_err(|e| ProcessError::Extraction {
        format: DocumentFormat::Pdf,
        message: format!("Failed to load PDF: {}", e),
    })?;

    let mut pages = Vec::new();

    for (page_num, _) in doc.get_pages().into_iter().take(page_limit) {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                let page_text = page_text.trim();
                if !page_text.is_empty() {
                    pages.push(page_text.to_string());
                }
            }
            Err(e) => tracing::debug!(page = page_num, "No text layer extracted: {}", e),
        }
    }

    Ok(normalize(&pages.join("\n\n")))
}
