use std::fmt;

/// Human-readable list of accepted uploads, surfaced in `UnsupportedFormat` errors.
pub const SUPPORTED_FORMATS: &str = "TXT / PDF / DOCX / PPTX / PNG / JPG / WEBP";

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PPTX_MIME: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Docx,
    Pptx,
    Image,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "png" | "jpg" | "jpeg" | "webp" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        match essence.as_str() {
            "text/plain" => Some(Self::Text),
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            PPTX_MIME => Some(Self::Pptx),
            "image/png" | "image/jpeg" | "image/jpg" | "image/webp" => Some(Self::Image),
            _ => None,
        }
    }

    /// Resolves the format of an upload, preferring the filename extension
    /// over the client-declared content type.
    pub fn detect(filename: &str, content_type: &str) -> Detected {
        // Only the last path component counts; a bare ".pdf" is a PDF too.
        let from_name = filename
            .trim()
            .rsplit(['/', '\\'])
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| Self::from_extension(ext));

        match from_name.or_else(|| Self::from_content_type(content_type)) {
            Some(format) => Detected::Supported(format),
            None => Detected::Unsupported,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "TXT",
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Pptx => "PPTX",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of format detection. Unknown uploads map to an explicit variant
/// instead of falling through to some default extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detected {
    Supported(DocumentFormat),
    Unsupported,
}
