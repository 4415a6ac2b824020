//! Template merge: section content is inserted directly after the template
//! paragraph whose text equals the section title.
//!
//! The main document part is edited as text. Paragraph boundaries come from
//! the parsed tree, new paragraphs are spliced in at those byte offsets and
//! everything else in the part is left exactly as it was.

use std::collections::HashMap;

use quick_xml::escape::escape;
use tracing::{debug, info, warn};

use crate::error::{ReportError, Result};
use crate::html::content_lines;
use crate::package::{DocxPackage, DOCUMENT_PART, STYLES_PART};
use crate::sections::{flatten, ContentNode};
use crate::style::{resolve, StyleMap, StyleRecord, StyleType};
use crate::wordml::{self, StyleTable};

/// Body style ids tried when the resolved record's id is not defined.
const BODY_STYLE_CANDIDATES: [&str; 5] = ["Normal", "a", "a0", "正文", "BodyText"];

/// Outcome counters of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Template paragraphs whose text matched a section title.
    pub matched: usize,
    /// Content paragraphs placed right after their heading.
    pub inserted: usize,
    /// Content paragraphs that had to go to the end of the body instead.
    pub appended: usize,
}

/// Merge section content into a template and return the new document.
pub fn merge_template(template: &[u8], forest: &[ContentNode], styles: &StyleMap) -> Result<Vec<u8>> {
    merge_template_with_stats(template, forest, styles).map(|(bytes, _)| bytes)
}

/// [`merge_template`], also reporting what was inserted where.
pub fn merge_template_with_stats(
    template: &[u8],
    forest: &[ContentNode],
    styles: &StyleMap,
) -> Result<(Vec<u8>, MergeStats)> {
    let mut package = DocxPackage::open_document(template)?;

    let table = match package.part_str(STYLES_PART)? {
        Some(xml) => StyleTable::parse(xml)?,
        None => StyleTable::default(),
    };
    let body_style = resolve(StyleType::Body, styles);
    let body_style_id = body_style_id(&body_style, &table);
    debug!("Content paragraphs use style id '{}'", body_style_id);

    let lookup = title_lookup(forest);
    info!("Merging {} section titles into template", lookup.len());

    let xml = package.part_str(DOCUMENT_PART)?.unwrap_or_default();
    let (merged, stats) = splice_content(xml, &lookup, &body_style, &body_style_id)?;

    info!(
        "Merge complete: {} headings matched, {} content paragraphs inserted, {} appended",
        stats.matched, stats.inserted, stats.appended
    );

    package.set_part(DOCUMENT_PART, merged);
    Ok((package.to_bytes()?, stats))
}

/// Trimmed title to node, first occurrence wins, empty titles skipped.
fn title_lookup(forest: &[ContentNode]) -> HashMap<&str, &ContentNode> {
    let mut lookup = HashMap::new();
    for node in flatten(forest) {
        let title = node.title.trim();
        if title.is_empty() {
            continue;
        }
        if lookup.contains_key(title) {
            debug!("Duplicate section title '{}', keeping the first", title);
            continue;
        }
        lookup.insert(title, node);
    }
    lookup
}

fn body_style_id(record: &StyleRecord, table: &StyleTable) -> String {
    record
        .native_style_id
        .as_deref()
        .filter(|id| table.contains(id))
        .or_else(|| table.first_defined(&BODY_STYLE_CANDIDATES))
        .unwrap_or("Normal")
        .to_string()
}

fn splice_content(
    xml: &str,
    lookup: &HashMap<&str, &ContentNode>,
    body_style: &StyleRecord,
    body_style_id: &str,
) -> Result<(String, MergeStats)> {
    let doc = wordml::parse_part(xml, DOCUMENT_PART)?;
    let body = wordml::body(&doc).ok_or_else(|| {
        ReportError::TemplateLoad("main document part has no body".to_string())
    })?;
    let prefix = wordml::w_prefix(&body);

    let mut stats = MergeStats::default();
    let mut insertions: Vec<(usize, String)> = Vec::new();
    let mut append_offset = None;

    for paragraph in wordml::body_paragraphs(&doc) {
        let text = wordml::paragraph_text(&paragraph);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let Some(node) = lookup.get(text) else {
            continue;
        };
        stats.matched += 1;

        let lines = content_lines(&node.content);
        if lines.is_empty() {
            debug!("Section '{}' has no content, leaving heading untouched", text);
            continue;
        }

        let fragment = content_paragraph(prefix, body_style_id, body_style, &lines);
        match wordml::insertion_offset_after(&paragraph) {
            Some(offset) => {
                debug!("Inserting content after heading '{}'", text);
                insertions.push((offset, fragment));
                stats.inserted += 1;
            }
            None => {
                warn!(
                    "Cannot insert after heading '{}' in place, appending to end of document",
                    text
                );
                if append_offset.is_none() {
                    append_offset = wordml::body_append_offset(xml, &body);
                }
                let offset = append_offset.ok_or_else(|| {
                    ReportError::TemplateLoad("document body cannot hold content".to_string())
                })?;
                insertions.push((offset, fragment));
                stats.appended += 1;
            }
        }
    }

    // Stable, so paragraphs sharing an offset keep document order.
    insertions.sort_by_key(|(offset, _)| *offset);

    let extra: usize = insertions.iter().map(|(_, f)| f.len()).sum();
    let mut merged = String::with_capacity(xml.len() + extra);
    let mut last = 0;
    for (offset, fragment) in &insertions {
        merged.push_str(&xml[last..*offset]);
        merged.push_str(fragment);
        last = *offset;
    }
    merged.push_str(&xml[last..]);

    // A splice that broke the part is a template failure, never an output.
    wordml::parse_part(&merged, DOCUMENT_PART)?;

    Ok((merged, stats))
}

/// A single paragraph carrying every line, separated by line breaks.
///
/// Names use the document's own prefix. Without one the paragraph declares
/// `w` itself.
fn content_paragraph(
    prefix: Option<&str>,
    style_id: &str,
    style: &StyleRecord,
    lines: &[String],
) -> String {
    let w = |local: &str| format!("{}:{}", prefix.unwrap_or("w"), local);

    let mut xml = format!("<{}", w("p"));
    if prefix.is_none() {
        xml.push_str(&format!(r#" xmlns:w="{}""#, wordml::W_NS));
    }
    xml.push_str(&format!("><{}>", w("pPr")));
    xml.push_str(&format!(r#"<{} {}="{}"/>"#, w("pStyle"), w("val"), escape(style_id)));

    let before = style.spacing_before_pt.filter(|pt| *pt > 0.0);
    let after = style.spacing_after_pt.filter(|pt| *pt > 0.0);
    let line = style.line_spacing.filter(|m| *m > 0.0);
    if before.is_some() || after.is_some() || line.is_some() {
        xml.push_str(&format!("<{}", w("spacing")));
        if let Some(pt) = before {
            xml.push_str(&format!(r#" {}="{}""#, w("before"), to_twips(pt)));
        }
        if let Some(pt) = after {
            xml.push_str(&format!(r#" {}="{}""#, w("after"), to_twips(pt)));
        }
        if let Some(multiple) = line {
            xml.push_str(&format!(
                r#" {}="{}" {}="auto""#,
                w("line"),
                (multiple * 240.0).round() as i64,
                w("lineRule")
            ));
        }
        xml.push_str("/>");
    }

    if let Some(pt) = style.first_line_indent_pt.filter(|pt| *pt > 0.0) {
        xml.push_str(&format!(r#"<{} {}="{}"/>"#, w("ind"), w("firstLine"), to_twips(pt)));
    }
    if let Some(alignment) = style.alignment {
        xml.push_str(&format!(r#"<{} {}="{}"/>"#, w("jc"), w("val"), alignment.jc()));
    }
    xml.push_str(&format!("</{}>", w("pPr")));

    let run_properties = run_properties(&w, style);
    for (i, line) in lines.iter().enumerate() {
        xml.push_str(&format!("<{}>{}", w("r"), run_properties));
        if i > 0 {
            xml.push_str(&format!("<{}/>", w("br")));
        }
        xml.push_str(&format!(
            r#"<{} xml:space="preserve">{}</{}></{}>"#,
            w("t"),
            escape(line.as_str()),
            w("t"),
            w("r")
        ));
    }

    xml.push_str(&format!("</{}>", w("p")));
    xml
}

fn run_properties(w: &impl Fn(&str) -> String, style: &StyleRecord) -> String {
    let mut rpr = String::new();

    if let Some(font) = style.font_family.as_deref().filter(|f| !f.is_empty()) {
        let font = escape(font);
        rpr.push_str(&format!(
            r#"<{} {}="{}" {}="{}" {}="{}"/>"#,
            w("rFonts"),
            w("ascii"),
            font,
            w("eastAsia"),
            font,
            w("hAnsi"),
            font
        ));
    }
    if let Some(bold) = style.bold {
        rpr.push_str(&toggle_element(w, "b", bold));
    }
    if let Some(italic) = style.italic {
        rpr.push_str(&toggle_element(w, "i", italic));
    }
    if let Some(color) = style.applied_color() {
        rpr.push_str(&format!(r#"<{} {}="{}"/>"#, w("color"), w("val"), escape(color)));
    }
    if let Some(pt) = style.font_size_pt.filter(|pt| *pt > 0.0) {
        let half_points = (pt * 2.0).round() as i64;
        rpr.push_str(&format!(
            r#"<{} {}="{}"/><{} {}="{}"/>"#,
            w("sz"),
            w("val"),
            half_points,
            w("szCs"),
            w("val"),
            half_points
        ));
    }

    if rpr.is_empty() {
        rpr
    } else {
        format!("<{}>{}</{}>", w("rPr"), rpr, w("rPr"))
    }
}

fn toggle_element(w: &impl Fn(&str) -> String, local: &str, on: bool) -> String {
    if on {
        format!("<{}/>", w(local))
    } else {
        format!(r#"<{} {}="0"/>"#, w(local), w("val"))
    }
}

fn to_twips(pt: f32) -> i64 {
    (pt * 20.0).round() as i64
}
