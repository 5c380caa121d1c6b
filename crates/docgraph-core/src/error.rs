/// Unified error type for docgraph.
#[derive(Debug, thiserror::Error)]
pub enum DocgraphError {
    #[error("Extraction failed for {path}: {message}")]
    Extraction { path: String, message: String },

    #[error("Invalid metadata in {path}: {message}")]
    Metadata { path: String, message: String },

    #[error("Invalid export kind: {0}")]
    InvalidExportKind(String),

    #[error("Invalid term kind: {0}")]
    InvalidTermKind(String),

    #[error("Invalid term scope: {0}")]
    InvalidTermScope(String),

    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocgraphError {
    /// Shorthand for an extraction failure on a single file.
    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }
}
