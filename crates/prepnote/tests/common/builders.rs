//! In-memory upload builders.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use image::{ImageBuffer, ImageFormat, Rgb};
use lopdf::{dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// A solid PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(width, height, Rgb([240, 240, 240]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// One page per entry; `None` pages have no text layer.
pub fn pdf(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|page| {
            let content = page
                .map(|text| format!("BT /F1 11 Tf 40 740 Td ({}) Tj ET", text))
                .unwrap_or_default();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            Object::from(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            }))
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A PDF cut off at its cross-reference table, which lopdf refuses to load.
pub fn pdf_with_truncated_xref(pages: &[Option<&str>]) -> Vec<u8> {
    let bytes = pdf(pages);
    let cut = bytes
        .windows(5)
        .rposition(|w| w == b"\nxref")
        .expect("saved PDF has an xref table");
    bytes[..=cut].to_vec()
}

fn write_part(zip: &mut zip::ZipWriter<&mut Cursor<Vec<u8>>>, name: &str, content: &[u8]) {
    zip.start_file(name, SimpleFileOptions::default()).unwrap();
    zip.write_all(content).unwrap();
}

/// A DOCX whose body holds one plain paragraph per entry.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        write_part(
            &mut zip,
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
                body
            )
            .as_bytes(),
        );
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

pub enum Shape {
    Text(String),
    Picture(Vec<u8>),
}

pub fn text(s: &str) -> Shape {
    Shape::Text(s.to_string())
}

pub fn picture(blob: Vec<u8>) -> Shape {
    Shape::Picture(blob)
}

/// A deck with one slide per entry, listed in presentation order.
pub fn pptx(slides: Vec<Vec<Shape>>) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);

        let ids: String = (1..=slides.len())
            .map(|n| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n))
            .collect();
        write_part(
            &mut zip,
            "ppt/presentation.xml",
            format!(r#"<p:presentation {}><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#, NS, ids).as_bytes(),
        );

        let rels: String = (1..=slides.len())
            .map(|n| format!(r#"<Relationship Id="rId{n}" Target="slides/slide{n}.xml"/>"#))
            .collect();
        write_part(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            format!(r#"<Relationships xmlns="{}">{}</Relationships>"#, RELS_NS, rels).as_bytes(),
        );

        let mut media = 0;
        for (index, shapes) in slides.into_iter().enumerate() {
            let slide = index + 1;
            let mut tree = String::new();
            let mut slide_rels = String::new();

            for (n, shape) in shapes.into_iter().enumerate() {
                match shape {
                    Shape::Text(body) => {
                        let paragraphs: String = body
                            .split('\n')
                            .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p))
                            .collect();
                        tree.push_str(&format!(
                            "<p:sp><p:nvSpPr><p:cNvPr id=\"{}\" name=\"t\"/></p:nvSpPr><p:txBody>{}</p:txBody></p:sp>",
                            n + 2,
                            paragraphs
                        ));
                    }
                    Shape::Picture(blob) => {
                        media += 1;
                        let rid = format!("rIdPic{}", n);
                        write_part(&mut zip, &format!("ppt/media/image{}.png", media), &blob);
                        slide_rels.push_str(&format!(
                            r#"<Relationship Id="{}" Target="../media/image{}.png"/>"#,
                            rid, media
                        ));
                        tree.push_str(&format!(
                            "<p:pic><p:nvPicPr><p:cNvPr id=\"{}\" name=\"p\"/></p:nvPicPr><p:blipFill><a:blip r:embed=\"{}\"/></p:blipFill></p:pic>",
                            n + 2,
                            rid
                        ));
                    }
                }
            }

            write_part(
                &mut zip,
                &format!("ppt/slides/slide{}.xml", slide),
                format!(r#"<p:sld {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#, NS, tree).as_bytes(),
            );
            write_part(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", slide),
                format!(r#"<Relationships xmlns="{}">{}</Relationships>"#, RELS_NS, slide_rels).as_bytes(),
            );
        }

        zip.finish().unwrap();
    }
    buffer.into_inner()
}
