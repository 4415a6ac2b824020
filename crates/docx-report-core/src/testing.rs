//! In-memory template fixtures for unit tests.

use quick_xml::escape::escape;

use crate::package::{DocxPackage, DOCUMENT_PART, STYLES_PART};
use crate::wordml::W_NS;

pub struct StyleDef {
    pub id: &'static str,
    pub name: &'static str,
}

impl StyleDef {
    pub fn new(id: &'static str, name: &'static str) -> Self {
        Self { id, name }
    }
}

/// Unstyled paragraph with a single run.
pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, escape(text))
}

/// Bold 16pt paragraph referencing a paragraph style.
pub fn heading(style_id: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val="32"/></w:rPr><w:t>{}</w:t></w:r></w:p>"#,
        escape(style_id),
        escape(text)
    )
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
        W_NS, body
    )
}

pub fn styles_xml(styles: &[StyleDef]) -> String {
    let defs: String = styles
        .iter()
        .map(|s| {
            format!(
                r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
                escape(s.id),
                escape(s.name)
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{}">{}</w:styles>"#,
        W_NS, defs
    )
}

/// A minimal but complete word-processing package.
pub fn template_with_styles(body: &str, styles: &[StyleDef]) -> Vec<u8> {
    let mut package = DocxPackage::new();
    package.set_part(
        "[Content_Types].xml",
        r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#,
    );
    package.set_part(
        "_rels/.rels",
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
    );
    package.set_part(DOCUMENT_PART, document_xml(body));
    package.set_part(STYLES_PART, styles_xml(styles));
    package.to_bytes().unwrap()
}

/// Template with the usual English heading and body styles.
pub fn template(body: &str) -> Vec<u8> {
    template_with_styles(
        body,
        &[
            StyleDef::new("Normal", "Normal"),
            StyleDef::new("Heading1", "heading 1"),
            StyleDef::new("Heading2", "heading 2"),
            StyleDef::new("Heading3", "heading 3"),
            StyleDef::new("Heading4", "heading 4"),
        ],
    )
}

/// `word/document.xml` of a package.
pub fn document_of(bytes: &[u8]) -> String {
    let package = DocxPackage::from_bytes(bytes).unwrap();
    package.part_str(DOCUMENT_PART).unwrap().unwrap().to_string()
}
