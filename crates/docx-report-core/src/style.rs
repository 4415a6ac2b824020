//! Paragraph style records and the style resolver.
//!
//! A template carries exactly one [`StyleRecord`] per [`StyleType`]. Records
//! are owned by the persistence layer and exchanged as JSON; fields left
//! unset mean "inherit whatever the document's own style says".

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic role of a paragraph style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StyleType {
    #[serde(rename = "HEADING_1")]
    Heading1,
    #[serde(rename = "HEADING_2")]
    Heading2,
    #[serde(rename = "HEADING_3")]
    Heading3,
    #[serde(rename = "HEADING_4")]
    Heading4,
    #[serde(rename = "BODY")]
    Body,
}

impl StyleType {
    /// All style types, headings first.
    pub const ALL: [StyleType; 5] = [
        StyleType::Heading1,
        StyleType::Heading2,
        StyleType::Heading3,
        StyleType::Heading4,
        StyleType::Body,
    ];

    /// Heading style for an outline level. Levels below 1 clamp to 1 and
    /// levels beyond 4 reuse the level-4 style.
    pub fn heading(level: usize) -> StyleType {
        match level {
            0 | 1 => StyleType::Heading1,
            2 => StyleType::Heading2,
            3 => StyleType::Heading3,
            _ => StyleType::Heading4,
        }
    }

    /// Heading level, `None` for body text.
    pub fn level(self) -> Option<usize> {
        match self {
            StyleType::Heading1 => Some(1),
            StyleType::Heading2 => Some(2),
            StyleType::Heading3 => Some(3),
            StyleType::Heading4 => Some(4),
            StyleType::Body => None,
        }
    }

    /// Persisted code, e.g. `HEADING_1`.
    pub fn code(self) -> &'static str {
        match self {
            StyleType::Heading1 => "HEADING_1",
            StyleType::Heading2 => "HEADING_2",
            StyleType::Heading3 => "HEADING_3",
            StyleType::Heading4 => "HEADING_4",
            StyleType::Body => "BODY",
        }
    }

    /// Native style id Word uses for this role in an English template.
    pub fn default_native_id(self) -> &'static str {
        match self {
            StyleType::Heading1 => "Heading1",
            StyleType::Heading2 => "Heading2",
            StyleType::Heading3 => "Heading3",
            StyleType::Heading4 => "Heading4",
            StyleType::Body => "Normal",
        }
    }

    /// Native style ids probed in a template's style table, in order.
    pub fn candidate_native_ids(self) -> &'static [&'static str] {
        match self {
            StyleType::Heading1 => &["Heading1", "1", "标题1", "标题 1", "heading1"],
            StyleType::Heading2 => &["Heading2", "2", "标题2", "标题 2", "heading2"],
            StyleType::Heading3 => &["Heading3", "3", "标题3", "标题 3", "heading3"],
            StyleType::Heading4 => &["Heading4", "4", "标题4", "标题 4", "heading4"],
            StyleType::Body => &["Normal", "a", "正文", "body"],
        }
    }
}

impl fmt::Display for StyleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown style type: {0}")]
pub struct UnknownStyleType(pub String);

impl FromStr for StyleType {
    type Err = UnknownStyleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleType::ALL
            .into_iter()
            .find(|t| t.code() == s)
            .ok_or_else(|| UnknownStyleType(s.to_string()))
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Map a `w:jc` value.
    pub fn from_jc(val: &str) -> Option<Alignment> {
        match val {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// The `w:jc` value for this alignment.
    pub fn jc(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Formatting of one paragraph style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
    pub style_type: StyleType,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size_pt: Option<f32>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub color_hex: Option<String>,
    /// Multiple of single line spacing, e.g. `1.5`.
    #[serde(default)]
    pub line_spacing: Option<f32>,
    #[serde(default)]
    pub spacing_before_pt: Option<f32>,
    #[serde(default)]
    pub spacing_after_pt: Option<f32>,
    #[serde(default)]
    pub alignment: Option<Alignment>,
    #[serde(default)]
    pub first_line_indent_pt: Option<f32>,
    /// The document's own id for this style, e.g. `Heading1`, `1`, `标题1`.
    #[serde(default)]
    pub native_style_id: Option<String>,
}

impl StyleRecord {
    /// A record with nothing set.
    pub fn empty(style_type: StyleType) -> Self {
        Self {
            style_type,
            font_family: None,
            font_size_pt: None,
            bold: None,
            italic: None,
            color_hex: None,
            line_spacing: None,
            spacing_before_pt: None,
            spacing_after_pt: None,
            alignment: None,
            first_line_indent_pt: None,
            native_style_id: None,
        }
    }

    /// Built-in record for a style type.
    pub fn builtin(style_type: StyleType) -> Self {
        let mut record = StyleRecord::empty(style_type);
        record.line_spacing = Some(1.5);
        record.native_style_id = Some(style_type.default_native_id().to_string());

        match style_type.level() {
            Some(level) => {
                let (size, after) = match level {
                    1 => (22.0, 12.0),
                    2 => (18.0, 10.0),
                    3 => (16.0, 8.0),
                    _ => (14.0, 6.0),
                };
                record.font_family = Some("黑体".to_string());
                record.font_size_pt = Some(size);
                record.bold = Some(true);
                record.spacing_after_pt = Some(after);
            }
            None => {
                record.font_family = Some("宋体".to_string());
                record.font_size_pt = Some(12.0);
                record.bold = Some(false);
                record.spacing_after_pt = Some(6.0);
                // Two CJK characters at 12pt.
                record.first_line_indent_pt = Some(24.0);
            }
        }

        record
    }

    /// Native style id, falling back to Word's English default.
    pub fn native_id(&self) -> &str {
        self.native_style_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(self.style_type.default_native_id())
    }

    /// Colour to apply, skipping `auto` and empty values.
    pub fn applied_color(&self) -> Option<&str> {
        self.color_hex
            .as_deref()
            .map(|c| c.trim_start_matches('#'))
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("auto"))
    }
}

/// Saved style configuration of one template, keyed by style type.
pub type StyleMap = BTreeMap<StyleType, StyleRecord>;

/// Built-in records for every style type.
pub fn builtin_styles() -> StyleMap {
    StyleType::ALL
        .into_iter()
        .map(|t| (t, StyleRecord::builtin(t)))
        .collect()
}

/// Build a style map from persisted records, keeping the first record per
/// style type.
pub fn style_map_from_records(records: impl IntoIterator<Item = StyleRecord>) -> StyleMap {
    let mut map = StyleMap::new();
    for record in records {
        map.entry(record.style_type).or_insert(record);
    }
    map
}

/// Effective style for a style type: the saved record when present,
/// otherwise the built-in default.
pub fn resolve(style_type: StyleType, saved: &StyleMap) -> StyleRecord {
    saved
        .get(&style_type)
        .cloned()
        .unwrap_or_else(|| StyleRecord::builtin(style_type))
}

/// Effective style for a heading at an arbitrary outline level.
pub fn resolve_heading(level: usize, saved: &StyleMap) -> StyleRecord {
    resolve(StyleType::heading(level), saved)
}
