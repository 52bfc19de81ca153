use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ProcessError;
use crate::processor::format::DocumentFormat;
use crate::processor::normalize::normalize;
use crate::processor::xml::{
    attribute, entity_text, open_archive, read_binary_part, read_part, rels_path, resolve_target,
    text_content, xml_error, Archive,
};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// An opened slide deck with its slides in presentation order.
pub struct Deck<'a> {
    archive: Archive<'a>,
    slides: Vec<String>,
}

/// What one slide contributes: text of its text-bearing shapes and the
/// relationship ids of its picture shapes, both in shape order.
#[derive(Debug, Default, PartialEq)]
struct SlideContent {
    texts: Vec<String>,
    picture_rids: Vec<String>,
}

impl<'a> Deck<'a> {
    pub fn open(data: &'a [u8]) -> Result<Self, ProcessError> {
        let mut archive = open_archive(data, DocumentFormat::Pptx)?;
        let slides = slide_parts(&mut archive)?;
        tracing::debug!(slides = slides.len(), "Opened slide deck");
        Ok(Self { archive, slides })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Shape texts joined by newlines within a slide, slides by blank lines.
    pub fn native_text(&mut self) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.pptx.native").entered();

        let mut slide_texts = Vec::new();
        for slide in self.slides.clone() {
            let content = self.slide_content(&slide)?;
            if !content.texts.is_empty() {
                slide_texts.push(content.texts.join("\n"));
            }
        }

        Ok(normalize(&slide_texts.join("\n\n")))
    }

    /// Collects embedded picture blobs in slide order, at most `limit` across
    /// the whole deck. Pictures whose part can't be read are skipped.
    pub fn picture_blobs(&mut self, limit: usize) -> Result<Vec<Vec<u8>>, ProcessError> {
        let _span = tracing::info_span!("processor.pptx.pictures", limit).entered();

        let mut blobs = Vec::new();

        'slides: for slide in self.slides.clone() {
            if blobs.len() >= limit {
                break;
            }

            let content = self.slide_content(&slide)?;
            if content.picture_rids.is_empty() {
                continue;
            }

            let relationships = match read_part(&mut self.archive, &rels_path(&slide), DocumentFormat::Pptx) {
                Ok(xml) => parse_relationships(&xml, &slide)?,
                Err(e) => {
                    tracing::warn!(slide = %slide, "Slide has pictures but no relationships: {}", e);
                    continue;
                }
            };

            for rid in &content.picture_rids {
                let Some(target) = relationships.get(rid) else {
                    tracing::warn!(slide = %slide, rid = %rid, "Picture relationship not found");
                    continue;
                };

                match read_binary_part(&mut self.archive, target) {
                    Ok(blob) => blobs.push(blob),
                    Err(e) => tracing::warn!(part = %target, "Skipping unreadable picture: {}", e),
                }

                if blobs.len() >= limit {
                    break 'slides;
                }
            }
        }

        Ok(blobs)
    }

    fn slide_content(&mut self, slide: &str) -> Result<SlideContent, ProcessError> {
        let xml = read_part(&mut self.archive, slide, DocumentFormat::Pptx)?;
        parse_slide(&xml)
    }
}

/// Slide part names in presentation order, falling back to numeric file
/// order when the slide list is missing or unresolvable.
fn slide_parts(archive: &mut Archive<'_>) -> Result<Vec<String>, ProcessError> {
    let presentation = read_part(archive, PRESENTATION_PART, DocumentFormat::Pptx)?;
    let slide_rids = parse_slide_ids(&presentation)?;

    let relationships = match read_part(archive, &rels_path(PRESENTATION_PART), DocumentFormat::Pptx) {
        Ok(xml) => parse_relationships(&xml, PRESENTATION_PART)?,
        Err(_) => HashMap::new(),
    };

    let ordered: Vec<String> = slide_rids
        .iter()
        .filter_map(|rid| relationships.get(rid))
        .filter(|part| archive.index_for_name(part).is_some())
        .cloned()
        .collect();

    if !ordered.is_empty() {
        return Ok(ordered);
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    numbered.sort();

    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

/// Reads the `r:id` of every `p:sldId` in `p:sldIdLst`.
fn parse_slide_ids(xml: &str) -> Result<Vec<String>, ProcessError> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"sldId" {
                    if let Some(rid) = attribute(e, b"id", true) {
                        ids.push(rid);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(DocumentFormat::Pptx, e)),
            _ => {}
        }
    }

    Ok(ids)
}

/// Maps relationship ids to resolved part names. External targets are dropped.
fn parse_relationships(xml: &str, source_part: &str) -> Result<HashMap<String, String>, ProcessError> {
    let mut reader = Reader::from_str(xml);
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() != b"Relationship" {
                    continue;
                }
                if attribute(e, b"TargetMode", false).as_deref() == Some("External") {
                    continue;
                }
                if let (Some(id), Some(target)) =
                    (attribute(e, b"Id", false), attribute(e, b"Target", false))
                {
                    relationships.insert(id, resolve_target(source_part, &target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(DocumentFormat::Pptx, e)),
            _ => {}
        }
    }

    Ok(relationships)
}

/// Tracks the top-level shape currently being read.
enum Shape {
    /// `p:sp`: collects paragraphs of its text body.
    Text {
        index: usize,
        paragraphs: Vec<String>,
        paragraph: Option<String>,
    },
    /// `p:pic`: remembers the first embedded image reference.
    Picture { index: usize, rid: Option<String> },
}

impl Shape {
    fn index(&self) -> usize {
        match self {
            Shape::Text { index, .. } | Shape::Picture { index, .. } => *index,
        }
    }
}

fn is_top_level(stack: &[Vec<u8>]) -> bool {
    stack.last().map(|n| n.as_slice()) == Some(b"spTree")
}

fn blip_embed(e: &BytesStart<'_>) -> Option<String> {
    if e.local_name().as_ref() == b"blip" {
        attribute(e, b"embed", true)
    } else {
        None
    }
}

/// Only direct children of `p:spTree` count as shapes; group members,
/// graphic frames and connectors contribute nothing.
fn parse_slide(xml: &str) -> Result<SlideContent, ProcessError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape: Option<Shape> = None;
    let mut content = SlideContent::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name().as_ref().to_vec();

                if shape.is_none() && is_top_level(&stack) {
                    shape = match name.as_slice() {
                        b"sp" => Some(Shape::Text {
                            index: stack.len(),
                            paragraphs: Vec::new(),
                            paragraph: None,
                        }),
                        b"pic" => Some(Shape::Picture {
                            index: stack.len(),
                            rid: None,
                        }),
                        _ => None,
                    };
                } else if let Some(Shape::Text { paragraph, .. }) = shape.as_mut() {
                    if name.as_slice() == b"p"
                        && stack.last().map(|n| n.as_slice()) == Some(b"txBody")
                    {
                        *paragraph = Some(String::new());
                    }
                } else if let Some(Shape::Picture { rid, .. }) = shape.as_mut() {
                    if rid.is_none() {
                        *rid = blip_embed(e);
                    }
                }

                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => match shape.as_mut() {
                Some(Shape::Text {
                    paragraphs,
                    paragraph,
                    ..
                }) => match e.local_name().as_ref() {
                    b"p" if stack.last().map(|n| n.as_slice()) == Some(b"txBody") => {
                        paragraphs.push(String::new())
                    }
                    b"br" => {
                        if let Some(text) = paragraph.as_mut() {
                            text.push('\n');
                        }
                    }
                    _ => {}
                },
                Some(Shape::Picture { rid, .. }) => {
                    if rid.is_none() {
                        *rid = blip_embed(e);
                    }
                }
                None => {}
            },
            Ok(Event::Text(ref e)) => {
                if let Some(Shape::Text {
                    paragraph: Some(text),
                    ..
                }) = shape.as_mut()
                {
                    if stack.last().map(|n| n.as_slice()) == Some(b"t") {
                        text.push_str(&text_content(e));
                    }
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if let Some(Shape::Text {
                    paragraph: Some(text),
                    ..
                }) = shape.as_mut()
                {
                    if stack.last().map(|n| n.as_slice()) == Some(b"t") {
                        if let Some(resolved) = entity_text(e) {
                            text.push_str(&resolved);
                        }
                    }
                }
            }
            Ok(Event::End(_)) => {
                let closed = stack.pop();

                if let Some(Shape::Text {
                    paragraphs,
                    paragraph,
                    ..
                }) = shape.as_mut()
                {
                    if closed.as_deref() == Some(b"p".as_slice())
                        && stack.last().map(|n| n.as_slice()) == Some(b"txBody")
                    {
                        if let Some(text) = paragraph.take() {
                            paragraphs.push(text);
                        }
                    }
                }

                if shape.as_ref().is_some_and(|s| stack.len() == s.index()) {
                    match shape.take() {
                        Some(Shape::Text { paragraphs, .. }) => {
                            let text = paragraphs.join("\n");
                            let text = text.trim();
                            if !text.is_empty() {
                                content.texts.push(text.to_string());
                            }
                        }
                        Some(Shape::Picture { rid: Some(rid), .. }) => {
                            content.picture_rids.push(rid)
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(DocumentFormat::Pptx, e)),
            _ => {}
        }
    }

    Ok(content)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{build_pptx, SlideShape};
    use super::*;

    #[test]
    fn test_native_text_joins_shapes_and_slides() {
        let deck = build_pptx(&[
            vec![SlideShape::Text("s1a"), SlideShape::Text("s1b")],
            vec![SlideShape::Text("s2a"), SlideShape::Text("s2b")],
        ]);
        let mut deck = Deck::open(&deck).unwrap();
        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.native_text().unwrap(), "s1a\ns1b\n\ns2a\ns2b");
    }

    #[test]
    fn test_multi_paragraph_shape() {
        let deck = build_pptx(&[vec![SlideShape::Text("Title\nBullet one\nBullet two")]]);
        let mut deck = Deck::open(&deck).unwrap();
        assert_eq!(deck.native_text().unwrap(), "Title\nBullet one\nBullet two");
    }

    #[test]
    fn test_blank_shapes_and_slides_skipped() {
        let deck = build_pptx(&[
            vec![SlideShape::Text("  "), SlideShape::Text("kept")],
            vec![SlideShape::Picture(vec![1, 2, 3])],
            vec![SlideShape::Text("last")],
        ]);
        let mut deck = Deck::open(&deck).unwrap();
        assert_eq!(deck.native_text().unwrap(), "kept\n\nlast");
    }

    #[test]
    fn test_picture_blobs_in_order() {
        let deck = build_pptx(&[
            vec![SlideShape::Picture(vec![1]), SlideShape::Text("t")],
            vec![SlideShape::Picture(vec![2]), SlideShape::Picture(vec![3])],
        ]);
        let mut deck = Deck::open(&deck).unwrap();
        assert_eq!(deck.picture_blobs(8).unwrap(), vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_picture_blobs_capped_across_deck() {
        let slides: Vec<Vec<SlideShape<'_>>> = (0..5u8)
            .map(|s| (0..3u8).map(|p| SlideShape::Picture(vec![s * 3 + p])).collect())
            .collect();
        let deck = build_pptx(&slides);
        let mut deck = Deck::open(&deck).unwrap();

        let blobs = deck.picture_blobs(8).unwrap();
        assert_eq!(blobs.len(), 8);
        assert_eq!(blobs, (0..8u8).map(|b| vec![b]).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_slide_ignores_group_members() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p" xmlns:r="r"><p:cSld><p:spTree>
            <p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>nested</a:t></a:r></a:p></p:txBody></p:sp>
            <p:pic><p:blipFill><a:blip r:embed="rId9"/></p:blipFill></p:pic></p:grpSp>
            <p:sp><p:txBody><a:p><a:r><a:t>Top</a:t></a:r><a:br/><a:r><a:t>level</a:t></a:r></a:p></p:txBody></p:sp>
            <p:pic><p:blipFill><a:blip r:embed="rId2"><a:extLst/></a:blip></p:blipFill></p:pic>
        </p:spTree></p:cSld></p:sld>"#;

        let content = parse_slide(xml).unwrap();
        assert_eq!(content.texts, vec!["Top\nlevel".to_string()]);
        assert_eq!(content.picture_rids, vec!["rId2".to_string()]);
    }

    #[test]
    fn test_parse_slide_keeps_empty_paragraph_breaks() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:sp><p:txBody><a:p><a:r><a:t>One</a:t></a:r></a:p><a:p/><a:p><a:r><a:t>Two &amp; three</a:t></a:r></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;

        let content = parse_slide(xml).unwrap();
        assert_eq!(content.texts, vec!["One\n\nTwo & three".to_string()]);
    }

    #[test]
    fn test_slide_order_follows_presentation() {
        let presentation = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
        assert_eq!(
            parse_slide_ids(presentation).unwrap(),
            vec!["rId3".to_string(), "rId2".to_string()]
        );
    }

    #[test]
    fn test_relationships_resolve_and_skip_external() {
        let rels = r#"<Relationships><Relationship Id="rId1" Target="../media/image1.png"/><Relationship Id="rId2" TargetMode="External" Target="https://example.com"/></Relationships>"#;
        let map = parse_relationships(rels, "ppt/slides/slide1.xml").unwrap();
        assert_eq!(map.get("rId1").map(String::as_str), Some("ppt/media/image1.png"));
        assert!(!map.contains_key("rId2"));
    }

    #[test]
    fn test_not_a_deck() {
        match Deck::open(b"not a zip") {
            Err(ProcessError::Extraction { format, .. }) => assert_eq!(format, DocumentFormat::Pptx),
            other => panic!("Expected Extraction error, got {:?}", other.map(|_| ())),
        }
    }
}
