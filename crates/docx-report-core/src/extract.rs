//! Style extraction from an uploaded template.
//!
//! Extraction never fails: an unreadable template yields the built-in style
//! set, and any style type the template does not exhibit is filled from the
//! built-in table.

use std::collections::HashMap;

use roxmltree::Node;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::package::{DocxPackage, DOCUMENT_PART, STYLES_PART};
use crate::style::{builtin_styles, Alignment, StyleMap, StyleRecord, StyleType};
use crate::wordml::{self, StyleTable};

/// Extract one [`StyleRecord`] per [`StyleType`] from template bytes.
pub fn extract_styles(template: &[u8]) -> StyleMap {
    match try_extract(template) {
        Ok(styles) => {
            info!("Extracted {} style records from template", styles.len());
            styles
        }
        Err(e) => {
            warn!("Style extraction failed, using built-in styles: {}", e);
            builtin_styles()
        }
    }
}

fn try_extract(template: &[u8]) -> Result<StyleMap> {
    let package = DocxPackage::open_document(template)?;

    let table = match package.part_str(STYLES_PART)? {
        Some(xml) => StyleTable::parse(xml)?,
        None => StyleTable::default(),
    };
    let detected = detect_native_ids(&table);

    let xml = package.part_str(DOCUMENT_PART)?.unwrap_or_default();
    let doc = wordml::parse_part(xml, DOCUMENT_PART)?;

    let mut styles = StyleMap::new();
    for paragraph in wordml::body_paragraphs(&doc) {
        let style_id = wordml::paragraph_style_id(&paragraph);

        let style_type = match style_id {
            Some(id) => classify_style_id(id),
            None if !styles.contains_key(&StyleType::Body)
                && !wordml::paragraph_text(&paragraph).trim().is_empty() =>
            {
                Some(StyleType::Body)
            }
            None => None,
        };

        let Some(style_type) = style_type else {
            continue;
        };
        if styles.contains_key(&style_type) {
            continue;
        }

        let mut record = read_paragraph_style(&paragraph, style_type);
        record.native_style_id = detected
            .get(&style_type)
            .map(|id| id.to_string())
            .or_else(|| style_id.map(str::to_string));

        debug!(
            "Style {} taken from paragraph with style id {:?} (native id {:?})",
            style_type, style_id, record.native_style_id
        );
        styles.insert(style_type, record);
    }

    for style_type in StyleType::ALL {
        styles.entry(style_type).or_insert_with(|| {
            let mut record = StyleRecord::builtin(style_type);
            if let Some(id) = detected.get(&style_type) {
                record.native_style_id = Some(id.to_string());
            }
            debug!(
                "Style {} not present in template, using built-in (native id {})",
                style_type,
                record.native_id()
            );
            record
        });
    }

    Ok(styles)
}

/// First candidate id per style type that the style table defines.
fn detect_native_ids(table: &StyleTable) -> HashMap<StyleType, &'static str> {
    StyleType::ALL
        .into_iter()
        .filter_map(|t| table.first_defined(t.candidate_native_ids()).map(|id| (t, id)))
        .collect()
}

/// Map a native style id to a style type.
///
/// Known ids are matched exactly, anything else by lowercase substring.
pub fn classify_style_id(style_id: &str) -> Option<StyleType> {
    if let Some(t) = exact_style_id(style_id) {
        return Some(t);
    }

    let lower = style_id.to_lowercase();
    for level in 1..=4 {
        if lower.contains(&format!("heading{}", level))
            || lower.contains(&format!("标题{}", level))
            || lower == level.to_string()
        {
            return Some(StyleType::heading(level));
        }
    }

    if lower.contains("normal") || lower.contains("正文") || lower == "a" || lower == "body" {
        return Some(StyleType::Body);
    }

    None
}

fn exact_style_id(style_id: &str) -> Option<StyleType> {
    let digit = style_id
        .strip_prefix("Heading ")
        .or_else(|| style_id.strip_prefix("Heading"))
        .or_else(|| style_id.strip_prefix("heading"))
        .or_else(|| style_id.strip_prefix("标题 "))
        .or_else(|| style_id.strip_prefix("标题"))
        .unwrap_or(style_id);

    match digit {
        "1" => Some(StyleType::Heading1),
        "2" => Some(StyleType::Heading2),
        "3" => Some(StyleType::Heading3),
        "4" => Some(StyleType::Heading4),
        _ => None,
    }
}

/// Derive a record from a paragraph's first run and its paragraph properties.
fn read_paragraph_style(paragraph: &Node, style_type: StyleType) -> StyleRecord {
    let mut record = StyleRecord::empty(style_type);

    if let Some(run) = wordml::first_run(paragraph) {
        let rpr = wordml::w_child(&run, "rPr");

        record.font_family = rpr
            .and_then(|rpr| wordml::w_child(&rpr, "rFonts"))
            .and_then(|fonts| {
                ["eastAsia", "ascii", "hAnsi"]
                    .into_iter()
                    .find_map(|attr| wordml::w_attr(&fonts, attr).filter(|f| !f.is_empty()))
            })
            .map(str::to_string);

        record.font_size_pt = rpr
            .and_then(|rpr| wordml::w_child_val(&rpr, "sz"))
            .and_then(|sz| sz.parse::<f32>().ok())
            .filter(|half_points| *half_points > 0.0)
            .map(|half_points| half_points / 2.0);

        record.bold = Some(wordml::toggle(rpr.and_then(|rpr| wordml::w_child(&rpr, "b"))));
        record.italic = Some(wordml::toggle(rpr.and_then(|rpr| wordml::w_child(&rpr, "i"))));

        record.color_hex = rpr
            .and_then(|rpr| wordml::w_child_val(&rpr, "color"))
            .map(str::to_string);
    }

    let Some(ppr) = wordml::w_child(paragraph, "pPr") else {
        return record;
    };

    if let Some(spacing) = wordml::w_child(&ppr, "spacing") {
        record.spacing_before_pt = twips_to_pt(wordml::w_attr(&spacing, "before"));
        record.spacing_after_pt = twips_to_pt(wordml::w_attr(&spacing, "after"));

        let auto_rule = matches!(wordml::w_attr(&spacing, "lineRule"), None | Some("auto"));
        if auto_rule {
            record.line_spacing = wordml::w_attr(&spacing, "line")
                .and_then(|line| line.parse::<f32>().ok())
                .filter(|line| *line > 0.0)
                .map(|line| line / 240.0);
        }
    }

    record.alignment = wordml::w_child_val(&ppr, "jc").and_then(Alignment::from_jc);

    record.first_line_indent_pt = wordml::w_child(&ppr, "ind")
        .and_then(|ind| twips_to_pt(wordml::w_attr(&ind, "firstLine")));

    record
}

fn twips_to_pt(value: Option<&str>) -> Option<f32> {
    value
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|twips| *twips > 0.0)
        .map(|twips| twips / 20.0)
}
