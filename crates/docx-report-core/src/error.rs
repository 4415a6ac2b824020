//! Error types for the report merge engine.

/// Engine-level errors.
///
/// Most failure classes are recovered inside the engine (style extraction
/// degrades to defaults, an unreadable template switches export to the flat
/// renderer). What reaches the caller is either a load failure of a single
/// stage or the request-level [`ReportError::NoUsableDocumentBase`].
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Template could not be loaded: {0}")]
    TemplateLoad(String),

    #[error("Malformed XML in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Package error: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("No usable document base: {0}")]
    NoUsableDocumentBase(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Whether the error means the template itself is unusable, as opposed to
    /// a failure while producing output.
    pub fn is_template_failure(&self) -> bool {
        matches!(
            self,
            ReportError::TemplateLoad(_) | ReportError::Xml { .. } | ReportError::Package(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
