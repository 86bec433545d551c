use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyCheckerError {
    /// The uploaded document could not be read or is in an unsupported format.
    #[error("document parsing failed: {0}")]
    DocumentParsing(String),

    /// A model response could not be decoded as a structured analysis.
    #[error("citation validation failed: {0}")]
    CitationValidation(String),

    #[error("report generation failed: {0}")]
    ReportGeneration(String),

    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("completion failed: {0}")]
    Completion(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PolicyCheckerError>;
