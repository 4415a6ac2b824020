//! Flat document rendering for reports without a usable template.

use std::collections::HashSet;
use std::io::Cursor;

use docx_rs::{
    AlignmentType, BreakType, Docx, LineSpacing, LineSpacingType, Paragraph, Run, RunFonts,
    SpecialIndentType, Style, StyleType as DocxStyleType,
};
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::html::content_lines;
use crate::sections::{flatten, ContentNode};
use crate::style::{resolve, resolve_heading, Alignment, StyleMap, StyleRecord, StyleType};

const TITLE_FONT: &str = "黑体";
const DATE_FONT: &str = "宋体";
const DATE_COLOR: &str = "666666";
const DATE_PREFIX: &str = "报告周期：";
/// Two CJK characters at 12pt, in twips.
const DEFAULT_FIRST_LINE_INDENT: i32 = 480;

/// Render a report from scratch: title, optional date line, separator,
/// then every section heading followed by its content.
pub fn render_flat(
    forest: &[ContentNode],
    styles: &StyleMap,
    title: &str,
    date_label: &str,
) -> Result<Vec<u8>> {
    let mut docx = Docx::new();

    let mut defined = HashSet::new();
    for level in 1..=4 {
        let record = resolve_heading(level, styles);
        let id = record.native_id().to_string();
        if defined.insert(id.clone()) {
            docx = docx.add_style(heading_style(&id, level, &record));
        }
    }

    docx = docx.add_paragraph(title_paragraph(title));
    if !date_label.is_empty() {
        docx = docx.add_paragraph(date_paragraph(date_label));
    }
    docx = docx.add_paragraph(Paragraph::new());

    let body = resolve(StyleType::Body, styles);
    let mut sections = 0;
    for node in flatten(forest) {
        let heading = resolve_heading(node.level, styles);
        docx = docx.add_paragraph(
            formatted_paragraph(&heading)
                .style(heading.native_id())
                .add_run(formatted_run(&heading, node.title.trim())),
        );

        let lines = content_lines(&node.content);
        if !lines.is_empty() {
            docx = docx.add_paragraph(body_paragraph(&body, &lines));
        }
        sections += 1;
    }
    debug!("Rendered {} sections without template", sections);

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ReportError::Render(e.to_string()))?;

    Ok(buf.into_inner())
}

fn heading_style(id: &str, level: usize, record: &StyleRecord) -> Style {
    let mut style = Style::new(id, DocxStyleType::Paragraph).name(format!("heading {}", level));
    if let Some(size) = half_points(record.font_size_pt) {
        style = style.size(size);
    }
    if record.bold.unwrap_or(true) {
        style = style.bold();
    }
    style
}

fn title_paragraph(title: &str) -> Paragraph {
    Paragraph::new()
        .align(AlignmentType::Center)
        .line_spacing(
            LineSpacing::new()
                .after(240)
                .line(360)
                .line_rule(LineSpacingType::Auto),
        )
        .add_run(
            Run::new()
                .add_text(title)
                .bold()
                .size(48)
                .fonts(fonts(TITLE_FONT)),
        )
}

fn date_paragraph(label: &str) -> Paragraph {
    Paragraph::new().align(AlignmentType::Center).add_run(
        Run::new()
            .add_text(format!("{}{}", DATE_PREFIX, label))
            .size(24)
            .color(DATE_COLOR)
            .fonts(fonts(DATE_FONT)),
    )
}

fn body_paragraph(record: &StyleRecord, lines: &[String]) -> Paragraph {
    let indent = record
        .first_line_indent_pt
        .filter(|pt| *pt > 0.0)
        .map(|pt| (pt * 20.0).round() as i32)
        .unwrap_or(DEFAULT_FIRST_LINE_INDENT);

    let mut paragraph = formatted_paragraph(record).indent(
        None,
        Some(SpecialIndentType::FirstLine(indent)),
        None,
        None,
    );
    for (i, line) in lines.iter().enumerate() {
        let mut run = formatted_run(record, "");
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        paragraph = paragraph.add_run(run.add_text(line.as_str()));
    }
    paragraph
}

/// Paragraph with the record's alignment and spacing.
fn formatted_paragraph(record: &StyleRecord) -> Paragraph {
    let mut paragraph = Paragraph::new();
    if let Some(alignment) = record.alignment {
        paragraph = paragraph.align(match alignment {
            Alignment::Left => AlignmentType::Left,
            Alignment::Center => AlignmentType::Center,
            Alignment::Right => AlignmentType::Right,
            Alignment::Justify => AlignmentType::Both,
        });
    }

    let before = twips(record.spacing_before_pt);
    let after = twips(record.spacing_after_pt);
    let line = record
        .line_spacing
        .filter(|m| *m > 0.0)
        .map(|m| (m * 240.0).round() as i32);
    if before.is_some() || after.is_some() || line.is_some() {
        let mut spacing = LineSpacing::new();
        if let Some(before) = before {
            spacing = spacing.before(before);
        }
        if let Some(after) = after {
            spacing = spacing.after(after);
        }
        if let Some(line) = line {
            spacing = spacing.line(line).line_rule(LineSpacingType::Auto);
        }
        paragraph = paragraph.line_spacing(spacing);
    }

    paragraph
}

/// Run with the record's character formatting. An empty `text` adds no
/// text element.
fn formatted_run(record: &StyleRecord, text: &str) -> Run {
    let mut run = Run::new();
    if !text.is_empty() {
        run = run.add_text(text);
    }
    if let Some(font) = record.font_family.as_deref().filter(|f| !f.is_empty()) {
        run = run.fonts(fonts(font));
    }
    if let Some(size) = half_points(record.font_size_pt) {
        run = run.size(size);
    }
    if record.bold == Some(true) {
        run = run.bold();
    }
    if record.italic == Some(true) {
        run = run.italic();
    }
    if let Some(color) = record.applied_color() {
        run = run.color(color);
    }
    run
}

fn fonts(family: &str) -> RunFonts {
    RunFonts::new()
        .east_asia(family)
        .ascii(family)
        .hi_ansi(family)
}

fn half_points(pt: Option<f32>) -> Option<usize> {
    pt.filter(|pt| *pt > 0.0).map(|pt| (pt * 2.0).round() as usize)
}

fn twips(pt: Option<f32>) -> Option<u32> {
    pt.filter(|pt| *pt > 0.0).map(|pt| (pt * 20.0).round() as u32)
}
