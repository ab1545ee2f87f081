#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Plain-text extraction for uploaded PDF, DOCX and TXT files.

mod docx;

use policyqa_core::{Error, ExtractedDocument, FileType, Result, TextExtractor};
use tracing::{debug, warn};

pub use docx::extract_docx_text;

/// Extractor dispatching on the declared file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<ExtractedDocument> {
        let file_type = FileType::from_filename(filename)?;
        debug!(
            "Extracting {} bytes from {filename} as {file_type}",
            bytes.len()
        );

        let text = match file_type {
            FileType::Pdf => extract_pdf_text(bytes)?,
            FileType::Docx => extract_docx_text(bytes)?,
            FileType::Txt => extract_plain_text(bytes)?,
        };

        if text.trim().is_empty() {
            warn!("No text extracted from {filename}");
            return Err(Error::EmptyDocument);
        }

        Ok(ExtractedDocument { text, file_type })
    }
}

/// Page texts joined by newlines, skipping pages without text.
///
/// pdf-extract lays out whole documents well but gives up on the first page it
/// cannot decode; in that case each page is retried alone through lopdf and the
/// failing ones are skipped.
fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let pages = match pdf_extract::extract_text_from_mem_by_pages(bytes) {
        Ok(pages) => pages,
        Err(e) => {
            warn!("PDF layout extraction failed, reading page by page: {e}");
            extract_pdf_pages_individually(bytes)?
        }
    };

    Ok(join_pages(pages))
}

fn extract_pdf_pages_individually(bytes: &[u8]) -> Result<Vec<String>> {
    let document = lopdf::Document::load_mem(bytes).map_err(|e| {
        warn!("PDF extraction failed: {e}");
        Error::Extraction(format!("unreadable PDF: {e}"))
    })?;

    let pages = document
        .get_pages()
        .into_keys()
        .filter_map(|page_number| match document.extract_text(&[page_number]) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("Skipping unreadable PDF page {page_number}: {e}");
                None
            }
        })
        .collect();
    Ok(pages)
}

fn join_pages(pages: Vec<String>) -> String {
    pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_plain_text(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::Extraction(format!("text file is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_not_a_pdf() {
        assert!(matches!(
            extract_pdf_text(b"%PDF-1.4 but nothing else"),
            Err(Error::Extraction(_))
        ));
    }

    #[test]
    fn blank_pages_are_dropped_when_joining() {
        let pages = vec![
            "Leave policy\n".to_string(),
            "  \n".to_string(),
            "20 days".to_string(),
        ];
        assert_eq!(join_pages(pages), "Leave policy\n\n20 days");
    }

    #[test]
    fn plain_text_strips_bom() {
        let text = extract_plain_text(b"\xEF\xBB\xBFhello").unwrap_or_default();
        assert_eq!(text, "hello");
    }

    #[test]
    fn plain_text_rejects_invalid_utf8() {
        assert!(matches!(
            extract_plain_text(&[0xff, 0xfe, 0x00]),
            Err(Error::Extraction(_))
        ));
    }
}
