//! WordprocessingML helpers over a parsed `roxmltree` tree.
//!
//! Only the handful of elements the engine reasons about are modelled:
//! body-level paragraphs, their text, their paragraph style and the style
//! table from `word/styles.xml`.

use std::collections::HashMap;
use std::ops::Range;

use roxmltree::{Document, Node};

use crate::error::{ReportError, Result};

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Parse an XML part, tagging errors with the part name.
pub fn parse_part<'input>(xml: &'input str, part: &str) -> Result<Document<'input>> {
    Document::parse(xml).map_err(|source| ReportError::Xml {
        part: part.to_string(),
        source,
    })
}

/// Whether `node` is the `w:<local>` element.
pub fn is_w(node: &Node, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local && node.tag_name().namespace() == Some(W_NS)
}

/// First `w:<local>` element child of `node`.
pub fn w_child<'a, 'input>(node: &Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_w(c, local))
}

/// Value of the `w:<name>` attribute.
pub fn w_attr<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((W_NS, name))
}

/// Value of `w:val` on the `w:<local>` child of `node`.
pub fn w_child_val<'a>(node: &Node<'a, '_>, local: &str) -> Option<&'a str> {
    w_child(node, local).and_then(|c| w_attr(&c, "val"))
}

/// On/off toggle semantics of `w:b`, `w:i` and friends: present and not
/// explicitly switched off.
pub fn toggle(node: Option<Node>) -> bool {
    match node {
        None => false,
        Some(n) => !matches!(w_attr(&n, "val"), Some("0") | Some("false") | Some("off")),
    }
}

/// The `w:body` element of a parsed `word/document.xml`.
pub fn body<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    doc.descendants().find(|n| is_w(n, "body"))
}

/// Block-level paragraphs of the body in document order.
///
/// Paragraphs nested inside another paragraph (text boxes, drawing
/// fallbacks) are not part of the running text and are skipped.
pub fn body_paragraphs<'a, 'input>(doc: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
    let Some(body) = body(doc) else {
        return Vec::new();
    };
    body.descendants()
        .filter(|n| is_w(n, "p"))
        .filter(|n| !n.ancestors().skip(1).any(|a| is_w(&a, "p")))
        .collect()
}

/// Concatenated `w:t` text of a paragraph, tabs included.
pub fn paragraph_text(paragraph: &Node) -> String {
    let mut text = String::new();
    for node in paragraph.descendants() {
        if is_w(&node, "t") {
            if let Some(t) = node.text() {
                text.push_str(t);
            }
        } else if is_w(&node, "tab") && node.parent().is_some_and(|p| is_w(&p, "r")) {
            text.push('\t');
        }
    }
    text
}

/// The `w:pStyle` id of a paragraph, if any.
pub fn paragraph_style_id<'a>(paragraph: &Node<'a, '_>) -> Option<&'a str> {
    w_child(paragraph, "pPr")
        .and_then(|ppr| w_child_val(&ppr, "pStyle"))
        .filter(|id| !id.is_empty())
}

/// First run of a paragraph, looking through hyperlinks and similar wrappers.
pub fn first_run<'a, 'input>(paragraph: &Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    paragraph
        .descendants()
        .find(|n| is_w(n, "r") && n.ancestors().skip(1).find(|a| is_w(a, "p")) == Some(*paragraph))
}

/// Where a new paragraph may be placed relative to an existing one.
///
/// Returns the byte offset just past the end of `paragraph` when its parent
/// is a container that accepts block-level content, `None` otherwise.
pub fn insertion_offset_after(paragraph: &Node) -> Option<usize> {
    let parent = paragraph.parent()?;
    let block_container = ["body", "tc", "sdtContent", "customXml", "txbxContent", "hdr", "ftr"]
        .iter()
        .any(|local| is_w(&parent, local));
    block_container.then(|| paragraph.range().end)
}

/// Byte offset at which content appended to the end of the body belongs:
/// before the final `w:sectPr` if there is one, otherwise before `</w:body>`.
pub fn body_append_offset(xml: &str, body: &Node) -> Option<usize> {
    if let Some(last) = body.children().filter(|c| c.is_element()).last() {
        if is_w(&last, "sectPr") {
            return Some(last.range().start);
        }
    }
    let range: Range<usize> = body.range();
    let inner = xml.get(range.clone())?;
    // Self-closing `<w:body/>` has no room for children.
    if inner.ends_with("/>") {
        return None;
    }
    inner.rfind("</").map(|pos| range.start + pos)
}

/// Non-empty prefix bound to the WordprocessingML namespace at `node`.
///
/// `None` when the namespace is only the default namespace, or not bound
/// at all. Unprefixed attributes are in no namespace, so new content then
/// has to declare its own prefix.
pub fn w_prefix<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.lookup_prefix(W_NS).filter(|prefix| !prefix.is_empty())
}

/// Style table parsed from `word/styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    /// Style ids in definition order.
    ids: Vec<String>,
    /// styleId -> human-readable name.
    names: HashMap<String, String>,
}

impl StyleTable {
    /// Parse a styles part.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = parse_part(xml, crate::package::STYLES_PART)?;
        let mut table = StyleTable::default();

        for style in doc.descendants().filter(|n| is_w(n, "style")) {
            let Some(id) = w_attr(&style, "styleId") else {
                continue;
            };
            if table.contains(id) {
                continue;
            }
            table.ids.push(id.to_string());
            if let Some(name) = w_child_val(&style, "name") {
                table.names.insert(id.to_string(), name.to_string());
            }
        }

        Ok(table)
    }

    /// Whether the table defines a style with this id.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Human-readable name of a style.
    pub fn name(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// First candidate id the table defines.
    pub fn first_defined<'c>(&self, candidates: &[&'c str]) -> Option<&'c str> {
        candidates.iter().copied().find(|c| self.contains(c))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
            W_NS, body
        )
    }

    #[test]
    fn test_paragraph_text_joins_runs() {
        let xml = doc(r#"<w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve"> world</w:t></w:r></w:p>"#);
        let parsed = parse_part(&xml, "test").unwrap();
        let paragraphs = body_paragraphs(&parsed);
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraph_text(&paragraphs[0]), "Hello\t world");
    }

    #[test]
    fn test_body_paragraphs_skip_text_box_content() {
        let xml = doc(concat!(
            r#"<w:p><w:r><w:t>outer</w:t></w:r>"#,
            r#"<w:r><w:pict><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:pict></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        ));
        let parsed = parse_part(&xml, "test").unwrap();
        let texts: Vec<String> = body_paragraphs(&parsed)
            .iter()
            .map(|p| paragraph_text(p))
            .collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("outer"));
        assert_eq!(texts[1], "cell");
    }

    #[test]
    fn test_paragraph_style_id() {
        let xml = doc(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>T</w:t></w:r></w:p><w:p/>"#);
        let parsed = parse_part(&xml, "test").unwrap();
        let paragraphs = body_paragraphs(&parsed);
        assert_eq!(paragraph_style_id(&paragraphs[0]), Some("Heading1"));
        assert_eq!(paragraph_style_id(&paragraphs[1]), None);
    }

    #[test]
    fn test_toggle_values() {
        let xml = doc(r#"<w:p><w:r><w:rPr><w:b/><w:i w:val="0"/><w:caps w:val="true"/></w:rPr></w:r></w:p>"#);
        let parsed = parse_part(&xml, "test").unwrap();
        let rpr = parsed.descendants().find(|n| is_w(n, "rPr")).unwrap();
        assert!(toggle(w_child(&rpr, "b")));
        assert!(!toggle(w_child(&rpr, "i")));
        assert!(toggle(w_child(&rpr, "caps")));
        assert!(!toggle(w_child(&rpr, "u")));
    }

    #[test]
    fn test_append_offset_lands_before_section_properties() {
        let xml = doc(r#"<w:p/><w:sectPr><w:pgSz w:w="11906"/></w:sectPr>"#);
        let parsed = parse_part(&xml, "test").unwrap();
        let body = body(&parsed).unwrap();
        let offset = body_append_offset(&xml, &body).unwrap();
        assert!(xml[offset..].starts_with("<w:sectPr>"));
    }

    #[test]
    fn test_append_offset_without_section_properties() {
        let xml = doc(r#"<w:p/>"#);
        let parsed = parse_part(&xml, "test").unwrap();
        let body = body(&parsed).unwrap();
        let offset = body_append_offset(&xml, &body).unwrap();
        assert!(xml[offset..].starts_with("</w:body>"));
    }

    #[test]
    fn test_insertion_offset_requires_block_container() {
        let xml = doc(r#"<w:p><w:r><w:t>a</w:t></w:r></w:p><w:sdt><w:sdtContent><w:p/></w:sdtContent></w:sdt>"#);
        let parsed = parse_part(&xml, "test").unwrap();
        let paragraphs = body_paragraphs(&parsed);
        let first = insertion_offset_after(&paragraphs[0]).unwrap();
        assert!(xml[first..].starts_with("<w:sdt>"));
        assert!(insertion_offset_after(&paragraphs[1]).is_some());
    }

    #[test]
    fn test_style_table() {
        let xml = format!(
            r#"<w:styles xmlns:w="{}"><w:style w:type="paragraph" w:styleId="a"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="1"><w:name w:val="heading 1"/></w:style></w:styles>"#,
            W_NS
        );
        let table = StyleTable::parse(&xml).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.contains("1"));
        assert_eq!(table.name("1"), Some("heading 1"));
        assert_eq!(table.first_defined(&["Heading1", "1"]), Some("1"));
        assert_eq!(table.first_defined(&["Normal"]), None);
    }

    #[test]
    fn test_custom_prefix_is_detected() {
        let xml = format!(
            r#"<x:document xmlns:x="{}"><x:body><x:p/></x:body></x:document>"#,
            W_NS
        );
        let parsed = parse_part(&xml, "test").unwrap();
        let body = body(&parsed).unwrap();
        assert_eq!(w_prefix(&body), Some("x"));
    }

    #[test]
    fn test_default_namespace_has_no_prefix() {
        let xml = format!(r#"<document xmlns="{}"><body><p/></body></document>"#, W_NS);
        let parsed = parse_part(&xml, "test").unwrap();
        let body = body(&parsed).unwrap();
        assert_eq!(w_prefix(&body), None);
    }
}
