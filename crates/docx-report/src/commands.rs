use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;

use docx_report_core::{
    export_report, extract_styles, parse_outline, sections_from_outline, style_map_from_records,
    ExportRequest, ReportMeta, SectionRecord, StyleMap, StyleRecord,
};

use crate::config::ExportArgs;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_template(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read template {}", path.display()))
}

/// Export a report and write it to disk. Returns a JSON summary.
pub fn export(args: &ExportArgs) -> Result<Value> {
    let sections: Vec<SectionRecord> = read_json(&args.sections)?;
    let contents: HashMap<String, String> = read_json(&args.contents)?;
    let styles: StyleMap = match &args.styles {
        Some(path) => style_map_from_records(read_json::<Vec<StyleRecord>>(path)?),
        None => StyleMap::new(),
    };
    let template = args.template.as_deref().map(read_template).transpose()?;

    let meta = ReportMeta {
        name: args.name.clone(),
        start_date: args.start_date,
        end_date: args.end_date,
    };

    let document = export_report(&ExportRequest {
        template: template.as_deref(),
        sections: &sections,
        contents: &contents,
        styles: &styles,
        meta: &meta,
    })?;

    let path = output_path(&args.output, &document.file_name);
    fs::write(&path, &document.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} ({} bytes)", path.display(), document.bytes.len());

    Ok(json!({
        "path": path,
        "bytes": document.bytes.len(),
        "contentType": document.content_type(),
        "contentDisposition": document.content_disposition(),
    }))
}

fn output_path(output: &Path, file_name: &str) -> PathBuf {
    if output.is_dir() {
        output.join(file_name)
    } else {
        output.to_path_buf()
    }
}

/// Style records extracted from a template, in style-type order.
pub fn styles(template: &Path) -> Result<Value> {
    let bytes = read_template(template)?;
    let records: Vec<StyleRecord> = extract_styles(&bytes).into_values().collect();
    Ok(serde_json::to_value(records)?)
}

/// Outline of a template, or the section records generated from it.
pub fn outline(template: &Path, as_sections: bool) -> Result<Value> {
    let bytes = read_template(template)?;
    let outline = parse_outline(&bytes)
        .with_context(|| format!("Failed to parse outline of {}", template.display()))?;

    if as_sections {
        Ok(serde_json::to_value(sections_from_outline(&outline))?)
    } else {
        Ok(serde_json::to_value(outline)?)
    }
}
