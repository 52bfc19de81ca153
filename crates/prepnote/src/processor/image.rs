use crate::error::ProcessError;
use crate::processor::format::DocumentFormat;
use crate::processor::normalize::normalize;
use crate::processor::ocr::{OcrEngine, OcrLanguages};
use crate::processor::raster::RasterPage;

/// Images have no text layer, so the upload goes straight to OCR.
pub fn extract_text(
    engine: &dyn OcrEngine,
    data: &[u8],
    languages: &OcrLanguages,
) -> Result<String, ProcessError> {
    let _span = tracing::info_span!("processor.image", bytes = data.len()).entered();

    let page = RasterPage::decode(data).map_err(|e| e.in_format(DocumentFormat::Image))?;
    tracing::debug!(width = page.width(), height = page.height(), "Decoded image");

    let text = engine
        .recognize(&page, languages)
        .map_err(|e| e.in_format(DocumentFormat::Image))?;

    Ok(normalize(&text))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;

    use image::{ImageBuffer, ImageFormat, Rgb};

    /// A solid white PNG of the given size.
    pub fn build_png(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgb([255, 255, 255]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }
}
