use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the document and conversation layers.
///
/// None of these are fatal and none leave session state half-updated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("No text could be extracted from the document")]
    EmptyDocument,

    #[error("Unsupported file type: {0}. Please upload a PDF, DOCX, or TXT file")]
    UnsupportedType(String),

    #[error("Error extracting text: {0}")]
    Extraction(String),

    #[error("No document uploaded")]
    NoDocument,

    #[error("No question provided")]
    NoQuestion,

    #[error("LLM request failed: {0}")]
    Llm(String),
}

impl Error {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyDocument => "EMPTY_DOCUMENT",
            Self::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            Self::Extraction(_) => "EXTRACTION_FAILED",
            Self::NoDocument => "NO_DOCUMENT",
            Self::NoQuestion => "NO_QUESTION",
            Self::Llm(_) => "LLM_ERROR",
        }
    }
}
