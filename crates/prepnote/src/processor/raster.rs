//! In-memory bitmaps and PDF page rendering.

use std::io::{Cursor, ErrorKind};
use std::process::Command;

use image::{DynamicImage, RgbImage};

use crate::error::ProcessError;

/// An RGB bitmap produced from a PDF page or an embedded picture.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterPage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterPage {
    /// Builds a page from a packed RGB buffer (`width * height * 3` bytes).
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ProcessError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(ProcessError::ImageDecode(format!(
                "RGB buffer holds {} bytes, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decodes an encoded image (PNG, JPEG, WebP, ...) and drops any alpha channel.
    pub fn decode(data: &[u8]) -> Result<Self, ProcessError> {
        let img = image::load_from_memory(data)
            .map_err(|e| ProcessError::ImageDecode(format!("Failed to load image: {}", e)))?;
        Ok(Self::from_image(&img))
    }

    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            width,
            height,
            pixels: rgb.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Re-encodes the bitmap as PNG, the form Tesseract accepts from memory.
    pub fn to_png(&self) -> Result<Vec<u8>, ProcessError> {
        let rgb = RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| ProcessError::ImageDecode("Pixel buffer size mismatch".to_string()))?;

        let mut png_data = Vec::new();
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| ProcessError::ImageDecode(format!("Failed to encode PNG: {}", e)))?;
        Ok(png_data)
    }
}

impl std::fmt::Debug for RasterPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterPage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// PDF page rendering capability.
pub trait PageRenderer: Send + Sync {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ProcessError>;

    /// Renders the zero-based `page_index` with a uniform `zoom` scale.
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        zoom: f32,
    ) -> Result<RasterPage, ProcessError>;
}

/// Renders the first `min(page_count, max_pages)` pages in document order.
///
/// A page that fails to render is logged and skipped; a missing renderer
/// aborts the whole call.
pub fn rasterize_pages(
    renderer: &dyn PageRenderer,
    pdf_bytes: &[u8],
    max_pages: usize,
    zoom: f32,
) -> Result<Vec<RasterPage>, ProcessError> {
    let page_count = renderer.page_count(pdf_bytes)?.min(max_pages);
    let mut pages = Vec::with_capacity(page_count);

    for page_index in 0..page_count {
        match renderer.render_page(pdf_bytes, page_index, zoom) {
            Ok(page) => pages.push(page),
            Err(e) if e.is_dependency_failure() => return Err(e),
            Err(e) => tracing::warn!(page = page_index + 1, "Skipping page: {}", e),
        }
    }

    Ok(pages)
}

/// Renders pages with poppler's `pdftoppm`; counts pages with lopdf, or
/// `pdfinfo` when lopdf can't parse the file.
#[derive(Debug, Clone, Default)]
pub struct PopplerRenderer;

impl PopplerRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// PDF user space is 72 units per inch, so a zoom factor maps to DPI directly.
fn zoom_to_dpi(zoom: f32) -> u32 {
    (72.0 * zoom).round().max(1.0) as u32
}

fn spawn_error(tool: &str, e: std::io::Error) -> ProcessError {
    if e.kind() == ErrorKind::NotFound {
        ProcessError::OcrDependencyMissing(format!(
            "{} not found. Make sure poppler-utils is installed.",
            tool
        ))
    } else {
        ProcessError::RenderFailed(format!("Failed to run {}: {}", tool, e))
    }
}

fn write_temp_pdf(dir: &tempfile::TempDir, pdf_bytes: &[u8]) -> Result<std::path::PathBuf, ProcessError> {
    let pdf_path = dir.path().join("input.pdf");
    std::fs::write(&pdf_path, pdf_bytes)
        .map_err(|e| ProcessError::RenderFailed(format!("Failed to write temp PDF: {}", e)))?;
    Ok(pdf_path)
}

fn temp_dir() -> Result<tempfile::TempDir, ProcessError> {
    tempfile::Builder::new()
        .prefix("prepnote_")
        .tempdir()
        .map_err(|e| ProcessError::RenderFailed(format!("Failed to create temp dir: {}", e)))
}

impl PageRenderer for PopplerRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ProcessError> {
        if let Ok(doc) = lopdf::Document::load_mem(pdf_bytes) {
            return Ok(doc.get_pages().len());
        }

        let dir = temp_dir()?;
        let pdf_path = write_temp_pdf(&dir, pdf_bytes)?;

        let output = Command::new("pdfinfo")
            .arg(&pdf_path)
            .output()
            .map_err(|e| spawn_error("pdfinfo", e))?;

        if !output.status.success() {
            return Err(ProcessError::RenderFailed(format!(
                "pdfinfo failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_pdfinfo_pages(&stdout).unwrap_or(1))
    }

    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        zoom: f32,
    ) -> Result<RasterPage, ProcessError> {
        let _span = tracing::debug_span!("processor.render_page", page = page_index + 1).entered();

        let dir = temp_dir()?;
        let pdf_path = write_temp_pdf(&dir, pdf_bytes)?;
        let output_prefix = dir.path().join("page");
        let page_num = (page_index + 1).to_string();

        // -singlefile writes exactly `<prefix>.png` without a page-number suffix
        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(zoom_to_dpi(zoom).to_string())
            .arg("-f")
            .arg(&page_num)
            .arg("-l")
            .arg(&page_num)
            .arg(&pdf_path)
            .arg(&output_prefix)
            .output()
            .map_err(|e| spawn_error("pdftoppm", e))?;

        if !output.status.success() {
            return Err(ProcessError::RenderFailed(format!(
                "pdftoppm failed on page {}: {}",
                page_num,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let image_data = std::fs::read(output_prefix.with_extension("png")).map_err(|e| {
            ProcessError::RenderFailed(format!("Failed to read rendered page: {}", e))
        })?;

        RasterPage::decode(&image_data)
    }
}

fn parse_pdfinfo_pages(stdout: &str) -> Option<usize> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("Pages:"))
        .find_map(|count| count.trim().parse::<usize>().ok())
}
