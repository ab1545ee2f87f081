//! DOCX text extraction: paragraphs from `word/document.xml`, joined by newlines.

use policyqa_core::{Error, Result};
use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, Event};
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the paragraph text of a DOCX container.
///
/// Tabs and explicit line breaks inside a run are kept as `\t` and `\n`.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extraction(format!("unreadable DOCX container: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| Error::Extraction(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::Extraction(format!("unreadable {DOCUMENT_PART}: {e}")))?;

    paragraphs_from_xml(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Paragraph texts in closing order.
///
/// Paragraphs nest (text boxes inside a paragraph hold their own `w:p`), so open
/// paragraphs form a stack and text always lands in the innermost one.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text_run = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::Extraction(format!("invalid DOCX XML: {e}")))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text_run = true,
                _ => {}
            },
            Event::Empty(e) => match (e.local_name().as_ref(), open.last_mut()) {
                (b"p", _) => paragraphs.push(String::new()),
                (b"tab", Some(paragraph)) => paragraph.push('\t'),
                (b"br" | b"cr", Some(paragraph)) => paragraph.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text_run => {
                if let Some(paragraph) = open.last_mut() {
                    let text = t
                        .decode()
                        .map_err(|e| Error::Extraction(format!("invalid DOCX text: {e}")))?;
                    paragraph.push_str(&text);
                }
            }
            Event::GeneralRef(r) if in_text_run => {
                if let Some(paragraph) = open.last_mut() {
                    push_reference(paragraph, &r);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Append the text of a character or predefined entity reference; unknown
/// entities are dropped.
fn push_reference(paragraph: &mut String, reference: &BytesRef<'_>) {
    if let Ok(Some(c)) = reference.resolve_char_ref() {
        paragraph.push(c);
        return;
    }
    if let Some(text) = reference
        .decode()
        .ok()
        .and_then(|name| resolve_xml_entity(&name))
    {
        paragraph.push_str(text);
    }
}
