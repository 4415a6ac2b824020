//! Template-based report generation for Word documents.
//!
//! Section content is merged into an existing `.docx` template directly
//! after the heading paragraph whose text matches the section title, keeping
//! every other part of the template as it was. Without a usable template the
//! report is rendered from scratch with the template's extracted (or
//! built-in) styles.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use docx_report_core::{export_report, ExportRequest, ReportMeta, SectionRecord, StyleMap};
//!
//! # fn main() -> docx_report_core::Result<()> {
//! let template = std::fs::read("template.docx")?;
//! let sections = vec![SectionRecord {
//!     id: 1,
//!     parent_id: None,
//!     title: "总结".to_string(),
//!     section_key: "summary".to_string(),
//!     sort_order: 1,
//! }];
//! let contents = HashMap::from([("summary".to_string(), "<p>Done</p>".to_string())]);
//! let meta = ReportMeta { name: "Weekly".to_string(), ..Default::default() };
//!
//! let document = export_report(&ExportRequest {
//!     template: Some(&template),
//!     sections: &sections,
//!     contents: &contents,
//!     styles: &StyleMap::new(),
//!     meta: &meta,
//! })?;
//! std::fs::write(&document.file_name, &document.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod extract;
pub mod html;
pub mod merge;
pub mod outline;
pub mod package;
pub mod render;
pub mod sections;
pub mod style;
pub mod wordml;

#[cfg(test)]
mod testing;

pub use error::{ReportError, Result};
pub use export::{export_report, ExportRequest, ExportedDocument, ReportMeta};
pub use extract::extract_styles;
pub use html::{content_lines, strip_html};
pub use merge::{merge_template, merge_template_with_stats, MergeStats};
pub use outline::{parse_outline, OutlineNode};
pub use package::DocxPackage;
pub use render::render_flat;
pub use sections::{build_content_tree, sections_from_outline, ContentNode, SectionRecord};
pub use style::{builtin_styles, resolve, style_map_from_records, Alignment, StyleMap, StyleRecord, StyleType};
