//! Uploaded documents and the metadata derived from them at upload time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// Document formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
}

impl FileType {
    /// Resolve the type from a declared extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Result<Self> {
        let normalized = ext.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            _ => Err(Error::UnsupportedType(format!(".{normalized}"))),
        }
    }

    /// Resolve the type from the extension of a file name.
    pub fn from_filename(filename: &str) -> Result<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map_or_else(
                || Err(Error::UnsupportedType(filename.to_string())),
                Self::from_extension,
            )
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Txt => "TXT",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw extraction output, before it becomes a [`DocumentContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub file_type: FileType,
}

/// Facts about an uploaded file, computed once when it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub char_count: usize,
    pub word_count: usize,
    pub file_type: FileType,
}

impl DocumentMetadata {
    /// Derive metadata for `text` extracted from `filename`.
    ///
    /// Characters are Unicode scalar values; words are whitespace-separated tokens.
    #[must_use]
    pub fn derive(filename: &str, size_bytes: u64, file_type: FileType, text: &str) -> Self {
        Self {
            filename: filename.to_string(),
            size_bytes,
            uploaded_at: Utc::now(),
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            file_type,
        }
    }
}

/// The document a session is currently asking questions about.
///
/// Always holds non-blank text; the constructor refuses anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    text: String,
    metadata: DocumentMetadata,
}

impl DocumentContext {
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::EmptyDocument);
        }
        Ok(Self { text, metadata })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }
}
