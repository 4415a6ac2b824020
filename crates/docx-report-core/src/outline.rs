//! Heading outline of an existing document.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::package::{DocxPackage, DOCUMENT_PART, STYLES_PART};
use crate::wordml::{self, StyleTable};

/// Greedy prefix so the last marker in the text decides the level.
static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*(?:heading|title|标题)\s*([1-6])").unwrap());

/// A heading and the headings nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub title: String,
    /// Heading level, 1 to 6.
    pub level: usize,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn leaf(title: impl Into<String>, level: usize) -> Self {
        Self {
            title: title.into(),
            level,
            children: Vec::new(),
        }
    }
}

/// Parse the heading outline of a document.
pub fn parse_outline(document: &[u8]) -> Result<Vec<OutlineNode>> {
    let package = DocxPackage::open_document(document)?;
    let table = match package.part_str(STYLES_PART)? {
        Some(xml) => StyleTable::parse(xml)?,
        None => StyleTable::default(),
    };
    let xml = package.part_str(DOCUMENT_PART)?.unwrap_or_default();
    let doc = wordml::parse_part(xml, DOCUMENT_PART)?;

    let headings = wordml::body_paragraphs(&doc).into_iter().filter_map(|p| {
        let text = wordml::paragraph_text(&p);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let style_id = wordml::paragraph_style_id(&p)?;
        let level = heading_level(style_id, table.name(style_id))?;
        Some((text.to_string(), level))
    });

    let outline = assemble(headings);
    debug!("Parsed outline with {} top-level headings", outline.len());
    Ok(outline)
}

/// Heading level of a paragraph style, from its id or else its name.
pub fn heading_level(style_id: &str, style_name: Option<&str>) -> Option<usize> {
    match_level(style_id).or_else(|| style_name.and_then(match_level))
}

fn match_level(text: &str) -> Option<usize> {
    let lower = text.trim().to_lowercase();

    if let Ok(level @ 1..=6) = lower.parse::<usize>() {
        if lower.len() == 1 {
            return Some(level);
        }
    }

    HEADING_MARKER
        .captures(&lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Nest `(title, level)` headings into a forest.
///
/// Each open heading's parent is the entry directly below it on the stack,
/// so a closed heading is attached to the new top or becomes a root.
fn assemble(headings: impl IntoIterator<Item = (String, usize)>) -> Vec<OutlineNode> {
    let mut roots = Vec::new();
    let mut stack: Vec<OutlineNode> = Vec::new();

    fn close(stack: &mut Vec<OutlineNode>, roots: &mut Vec<OutlineNode>) {
        if let Some(node) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => roots.push(node),
            }
        }
    }

    for (title, level) in headings {
        while stack.last().is_some_and(|top| top.level >= level) {
            close(&mut stack, &mut roots);
        }
        stack.push(OutlineNode::leaf(title, level));
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }

    roots
}

/// Titles of an outline, depth-first.
pub fn titles(outline: &[OutlineNode]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut stack: Vec<&OutlineNode> = outline.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node.title.as_str());
        stack.extend(node.children.iter().rev());
    }
    out
}
