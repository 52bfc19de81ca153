//! Helpers shared by the OOXML (DOCX/PPTX) readers.

use std::io::{Cursor, Read};

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesStart;

use crate::error::ProcessError;
use crate::processor::format::DocumentFormat;

pub type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

pub fn open_archive(data: &[u8], format: DocumentFormat) -> Result<Archive<'_>, ProcessError> {
    zip::ZipArchive::new(Cursor::new(data)).map_err(|e| ProcessError::Extraction {
        format,
        message: format!("Failed to open {} container: {}", format, e),
    })
}

/// Reads a UTF-8 part such as `word/document.xml`.
pub fn read_part(
    archive: &mut Archive<'_>,
    name: &str,
    format: DocumentFormat,
) -> Result<String, ProcessError> {
    let mut entry = archive.by_name(name).map_err(|e| ProcessError::Extraction {
        format,
        message: format!("Failed to find {}: {}", name, e),
    })?;

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| ProcessError::Extraction {
            format,
            message: format!("Failed to read {}: {}", name, e),
        })?;
    Ok(content)
}

/// Reads a binary part (an embedded picture).
pub fn read_binary_part(archive: &mut Archive<'_>, name: &str) -> Result<Vec<u8>, zip::result::ZipError> {
    let mut entry = archive.by_name(name)?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;
    Ok(data)
}

pub fn xml_error(format: DocumentFormat, e: impl std::fmt::Display) -> ProcessError {
    ProcessError::Extraction {
        format,
        message: format!("XML parsing error: {}", e),
    }
}

/// Decodes raw text content, resolving any entities left in it.
pub fn text_content(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    let unescaped = unescape(&raw).map(|text| text.into_owned()).ok();
    unescaped.unwrap_or_else(|| raw.into_owned())
}

/// Resolves a general entity reference (`amp`, `#x41`, `#65`).
pub fn entity_text(name: &[u8]) -> Option<String> {
    let name = std::str::from_utf8(name).ok()?;
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse::<u32>().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}

/// Looks up an attribute by local name, optionally requiring a namespace prefix
/// (`r:id` vs. plain `id`).
pub fn attribute(element: &BytesStart<'_>, local: &[u8], prefixed: bool) -> Option<String> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a: &Attribute<'_>| {
            a.key.local_name().as_ref() == local && a.key.prefix().is_some() == prefixed
        })
        .map(|a| text_content(&a.value))
}

/// Resolves a relationship target relative to the part that references it.
///
/// `resolve_target("ppt/slides/slide1.xml", "../media/image1.png")` yields
/// `ppt/media/image1.png`.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Relationship part for `part`, e.g. `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}
