//! Recording fakes for the OCR and rendering capabilities.

#![allow(dead_code)]

use std::sync::Mutex;

use prepnote::processor::{OcrEngine, OcrLanguages, PageRenderer, RasterPage};
use prepnote::ProcessError;

/// Answers every image with the same text and records each call.
pub struct RecordingOcr {
    reply: Result<String, &'static str>,
    calls: Mutex<Vec<(u32, u32, String)>>,
}

impl RecordingOcr {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if Tesseract were not installed.
    pub fn missing() -> Self {
        Self {
            reply: Err("tesseract not installed"),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn languages_seen(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, _, l)| l.clone()).collect()
    }
}

impl OcrEngine for RecordingOcr {
    fn recognize(&self, page: &RasterPage, languages: &OcrLanguages) -> Result<String, ProcessError> {
        self.calls
            .lock()
            .unwrap()
            .push((page.width(), page.height(), languages.to_string()));

        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(ProcessError::OcrDependencyMissing(message.to_string())),
        }
    }
}

/// Pretends a PDF has `pages` pages and renders each as a tiny blank image.
pub struct RecordingRenderer {
    pages: usize,
    failing_pages: Vec<usize>,
    rendered: Mutex<Vec<(usize, f32)>>,
}

impl RecordingRenderer {
    pub fn with_pages(pages: usize) -> Self {
        Self {
            pages,
            failing_pages: Vec::new(),
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, pages: &[usize]) -> Self {
        self.failing_pages = pages.to_vec();
        self
    }

    pub fn rendered(&self) -> Vec<(usize, f32)> {
        self.rendered.lock().unwrap().clone()
    }
}

impl PageRenderer for RecordingRenderer {
    fn page_count(&self, _pdf_bytes: &[u8]) -> Result<usize, ProcessError> {
        Ok(self.pages)
    }

    fn render_page(&self, _pdf_bytes: &[u8], page_index: usize, zoom: f32) -> Result<RasterPage, ProcessError> {
        self.rendered.lock().unwrap().push((page_index, zoom));

        if self.failing_pages.contains(&page_index) {
            return Err(ProcessError::RenderFailed(format!("page {} is corrupt", page_index)));
        }
        RasterPage::from_rgb(2, 2, vec![255; 12])
    }
}
