//! Report export: template merge with fallback to flat rendering.

use std::collections::HashMap;

use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{ReportError, Result};
use crate::extract::extract_styles;
use crate::merge::merge_template;
use crate::render::render_flat;
use crate::sections::{build_content_tree, SectionRecord};
use crate::style::StyleMap;

/// Characters left as-is in an encoded file name (RFC 3986 unreserved).
const FILENAME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Report metadata supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl ReportMeta {
    /// `"<start> 至 <end>"`, empty when neither date is known.
    pub fn date_range_label(&self) -> String {
        if self.start_date.is_none() && self.end_date.is_none() {
            return String::new();
        }
        let side = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        format!("{} 至 {}", side(self.start_date), side(self.end_date))
    }

    /// Download file name, `<name>.docx`.
    pub fn file_name(&self) -> String {
        let name: String = self
            .name
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
            .collect();
        if name.is_empty() {
            "report.docx".to_string()
        } else {
            format!("{}.docx", name)
        }
    }
}

/// Everything one export needs.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    /// Template bytes, if the report's template has a document.
    pub template: Option<&'a [u8]>,
    pub sections: &'a [SectionRecord],
    /// Section key to HTML content.
    pub contents: &'a HashMap<String, String>,
    /// Saved style configuration, possibly empty.
    pub styles: &'a StyleMap,
    pub meta: &'a ReportMeta,
}

/// A finished document ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    pub const CONTENT_TYPE: &'static str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

    pub fn content_type(&self) -> &'static str {
        Self::CONTENT_TYPE
    }

    /// `Content-Disposition` header value carrying the encoded file name.
    pub fn content_disposition(&self) -> String {
        let encoded = utf8_percent_encode(&self.file_name, FILENAME_SET).to_string();
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            encoded, encoded
        )
    }
}

/// Produce the report document.
///
/// With a template the content is merged into it; when the template cannot
/// be used the report is rendered flat instead. Only a failure of the flat
/// renderer is returned, as [`ReportError::NoUsableDocumentBase`].
#[instrument(skip_all, fields(report = %request.meta.name))]
pub fn export_report(request: &ExportRequest<'_>) -> Result<ExportedDocument> {
    let forest = build_content_tree(request.sections, request.contents);
    let file_name = request.meta.file_name();

    let template = request.template.filter(|t| !t.is_empty());
    if let Some(template) = template {
        match merge_template(template, &forest, request.styles) {
            Ok(bytes) => {
                info!("Exported '{}' from template ({} bytes)", file_name, bytes.len());
                return Ok(ExportedDocument { file_name, bytes });
            }
            Err(e) => warn!("Template merge failed, rendering without template: {}", e),
        }
    } else {
        info!("No template document, rendering without template");
    }

    let styles = if !request.styles.is_empty() {
        request.styles.clone()
    } else if let Some(template) = template {
        extract_styles(template)
    } else {
        StyleMap::new()
    };

    let bytes = render_flat(
        &forest,
        &styles,
        &request.meta.name,
        &request.meta.date_range_label(),
    )
    .map_err(|e| ReportError::NoUsableDocumentBase(e.to_string()))?;

    info!("Exported '{}' without template ({} bytes)", file_name, bytes.len());
    Ok(ExportedDocument { file_name, bytes })
}
