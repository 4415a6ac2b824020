#![allow(dead_code)]

use docx_report_core::package::{DocxPackage, DOCUMENT_PART, STYLES_PART};
use docx_report_core::wordml::{self, W_NS};

pub fn heading(style_id: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>{}</w:t></w:r></w:p>"#,
        style_id, text
    )
}

pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
}

/// A word-processing package with the given body and paragraph styles
/// (`(id, name)` pairs). Also carries a header part that the engine never
/// touches.
pub fn build_template(body: &str, styles: &[(&str, &str)]) -> Vec<u8> {
    let style_defs: String = styles
        .iter()
        .map(|(id, name)| {
            format!(
                r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
                id, name
            )
        })
        .collect();

    let mut package = DocxPackage::new();
    package.set_part(
        "[Content_Types].xml",
        r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
    );
    package.set_part(
        "_rels/.rels",
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
    );
    package.set_part(
        DOCUMENT_PART,
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            W_NS, body
        ),
    );
    package.set_part(
        STYLES_PART,
        format!(r#"<w:styles xmlns:w="{}">{}</w:styles>"#, W_NS, style_defs),
    );
    package.set_part(
        "word/header1.xml",
        format!(r#"<w:hdr xmlns:w="{}"><w:p><w:r><w:t>Confidential</w:t></w:r></w:p></w:hdr>"#, W_NS),
    );
    package.to_bytes().unwrap()
}

pub fn english_template(body: &str) -> Vec<u8> {
    build_template(
        body,
        &[
            ("Normal", "Normal"),
            ("Heading1", "heading 1"),
            ("Heading2", "heading 2"),
            ("Heading3", "heading 3"),
        ],
    )
}

/// Body-level paragraphs of a document as `(style id, text)`.
pub fn paragraphs(bytes: &[u8]) -> Vec<(Option<String>, String)> {
    let package = DocxPackage::from_bytes(bytes).unwrap();
    let xml = package.part_str(DOCUMENT_PART).unwrap().unwrap();
    let doc = wordml::parse_part(xml, DOCUMENT_PART).unwrap();
    wordml::body_paragraphs(&doc)
        .iter()
        .map(|p| {
            (
                wordml::paragraph_style_id(p).map(str::to_string),
                wordml::paragraph_text(p),
            )
        })
        .collect()
}

pub fn texts(bytes: &[u8]) -> Vec<String> {
    paragraphs(bytes).into_iter().map(|(_, text)| text).collect()
}
