use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ProcessError;
use crate::processor::format::DocumentFormat;
use crate::processor::normalize::normalize;
use crate::processor::xml::{entity_text, open_archive, read_part, text_content, xml_error};

/// Extracts body paragraphs, one per line, skipping blank ones.
pub fn extract_text(data: &[u8]) -> Result<String, ProcessError> {
    let _span = tracing::info_span!("processor.docx").entered();

    let mut archive = open_archive(data, DocumentFormat::Docx)?;
    let document_xml = read_part(&mut archive, "word/document.xml", DocumentFormat::Docx)?;

    let paragraphs = parse_paragraphs(&document_xml)?;
    let lines: Vec<&str> = paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    Ok(normalize(&lines.join("\n")))
}

/// Elements that may sit between a paragraph and its runs without hiding them.
const RUN_CONTAINERS: &[&[u8]] = &[b"hyperlink", b"ins", b"smartTag", b"fldSimple"];

/// True when `path` (element names below the paragraph) is `[containers.., r]`.
fn is_run_path(path: &[Vec<u8>]) -> bool {
    match path.split_last() {
        Some((last, containers)) => {
            last.as_slice() == b"r"
                && containers
                    .iter()
                    .all(|c| RUN_CONTAINERS.contains(&c.as_slice()))
        }
        None => false,
    }
}

/// Collects the text of every `w:p` that is a direct child of `w:body`.
fn parse_paragraphs(xml: &str) -> Result<Vec<String>, ProcessError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    // (stack depth just below the paragraph element, text so far)
    let mut current: Option<(usize, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name.as_slice() == b"p"
                    && current.is_none()
                    && stack.last().map(|n| n.as_slice()) == Some(b"body")
                {
                    current = Some((stack.len() + 1, String::new()));
                }
                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                if let Some((depth, text)) = current.as_mut() {
                    if is_run_path(&stack[*depth..]) {
                        match e.local_name().as_ref() {
                            b"tab" => text.push('\t'),
                            b"br" | b"cr" => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some((depth, text)) = current.as_mut() {
                    if in_text_element(&stack, *depth) {
                        text.push_str(&text_content(e));
                    }
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if let Some((depth, text)) = current.as_mut() {
                    if in_text_element(&stack, *depth) {
                        if let Some(resolved) = entity_text(e) {
                            text.push_str(&resolved);
                        }
                    }
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
                let closed = matches!(&current, Some((depth, _)) if stack.len() < *depth);
                if closed {
                    if let Some((_, text)) = current.take() {
                        paragraphs.push(text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(DocumentFormat::Docx, e)),
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn in_text_element(stack: &[Vec<u8>], depth: usize) -> bool {
    stack.len() > depth
        && stack.last().map(|n| n.as_slice()) == Some(b"t")
        && is_run_path(&stack[depth..stack.len() - 1])
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    /// Builds a minimal DOCX whose body holds one paragraph per entry.
    pub fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| {
                if p.is_empty() {
                    "<w:p/>".to_string()
                } else {
                    format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p)
                }
            })
            .collect();
        build_docx_from_body(&body)
    }

    pub fn build_docx_from_body(body: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        );

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = SimpleFileOptions::default();
            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(b"<?xml version=\"1.0\"?><Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\"/>")
                .unwrap();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(document.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{build_docx, build_docx_from_body};
    use super::*;

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:body>
                <w:p>
                    <w:r>
                        <w:t>Hello World</w:t>
                    </w:r>
                </w:p>
            </w:body>
        </w:document>"#;

        let paragraphs = parse_paragraphs(xml).unwrap();
        assert_eq!(paragraphs, vec!["Hello World".to_string()]);
    }

    #[test]
    fn test_blank_paragraphs_skipped() {
        let docx = build_docx(&["A", "", "B"]);
        assert_eq!(extract_text(&docx).unwrap(), "A\nB");
    }

    #[test]
    fn test_runs_concatenate_with_spacing() {
        let body = r#"<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>World</w:t></w:r></w:p>"#;
        let docx = build_docx_from_body(body);
        assert_eq!(extract_text(&docx).unwrap(), "Hello World");
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let body = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>R&amp;D</w:t><w:tab/><w:t>x</w:t><w:br/><w:t>y</w:t></w:r></w:p>"#;
        let docx = build_docx_from_body(body);
        assert_eq!(extract_text(&docx).unwrap(), "R&D\tx\ny");
    }

    #[test]
    fn test_hyperlink_runs_included() {
        let body = r#"<w:p><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink><w:r><w:t>docs</w:t></w:r></w:hyperlink></w:p>"#;
        let docx = build_docx_from_body(body);
        assert_eq!(extract_text(&docx).unwrap(), "See docs");
    }

    #[test]
    fn test_table_paragraphs_excluded() {
        let body = r#"<w:p><w:r><w:t>Before</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>After</w:t></w:r></w:p>"#;
        let docx = build_docx_from_body(body);
        assert_eq!(extract_text(&docx).unwrap(), "Before\nAfter");
    }

    #[test]
    fn test_paragraph_whitespace_trimmed() {
        let docx = build_docx(&["  padded  ", "next"]);
        assert_eq!(extract_text(&docx).unwrap(), "padded\nnext");
    }

    #[test]
    fn test_not_a_zip() {
        match extract_text(b"plain bytes") {
            Err(ProcessError::Extraction { format, .. }) => assert_eq!(format, DocumentFormat::Docx),
            other => panic!("Expected Extraction error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_document_part() {
        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            std::io::Write::write_all(&mut zip, b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        match extract_text(&buffer.into_inner()) {
            Err(ProcessError::Extraction { message, .. }) => {
                assert!(message.contains("word/document.xml"), "got {}", message)
            }
            other => panic!("Expected Extraction error, got {:?}", other),
        }
    }
}
