//! In-memory OOXML package.
//!
//! A `.docx` file is a zip archive of XML parts. The engine never touches
//! the filesystem: a package is read from bytes, individual parts are
//! replaced, and the whole archive is written back to a fresh buffer. Every
//! part that is not replaced is copied through byte-for-byte, so anything
//! the engine does not understand (headers, numbering, media, custom XML)
//! survives unchanged.

use std::io::{Cursor, Read, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ReportError, Result};

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";
/// Style definitions part.
pub const STYLES_PART: &str = "word/styles.xml";

/// A single named part of the package.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// Ordered collection of package parts.
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: Vec<Part>,
}

impl DocxPackage {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a package from raw archive bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(Part { name, data });
        }

        debug!("Read package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Read a package that must be a word-processing document.
    pub fn open_document(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ReportError::TemplateLoad("template is empty".to_string()));
        }
        let package = Self::from_bytes(bytes)
            .map_err(|e| ReportError::TemplateLoad(format!("not a readable package: {}", e)))?;
        if !package.contains(DOCUMENT_PART) {
            return Err(ReportError::TemplateLoad(format!(
                "package has no '{}' part",
                DOCUMENT_PART
            )));
        }
        Ok(package)
    }

    /// Whether a part with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name == name)
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// A part decoded as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<Option<&str>> {
        match self.part(name) {
            None => Ok(None),
            Some(data) => std::str::from_utf8(data).map(Some).map_err(|e| {
                ReportError::TemplateLoad(format!("part '{}' is not valid UTF-8: {}", name, e))
            }),
        }
    }

    /// Insert a part, replacing any existing part with the same name in place.
    pub fn set_part(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Serialize the package into archive bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            writer.start_file(part.name.as_str(), options)?;
            writer.write_all(&part.data)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}
