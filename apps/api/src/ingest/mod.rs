//! Document ingestion — turns uploaded resume files into plain text.
//!
//! Decoding failures never reject an upload: the resume is still handed to
//! the analyzer with `decode_error` set, which yields a fallback record.

use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::ResumeInput;

const DOCX_BODY: &str = "word/document.xml";

static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern compiles"));
static CHAR_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").expect("reference pattern compiles")
});

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported document type '{0}'")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("text is not valid UTF-8")]
    NotUtf8(#[from] std::str::Utf8Error),
}

/// Decodes one uploaded file. Always returns an input for the analyzer.
pub fn decode_document(file_name: &str, bytes: &[u8]) -> ResumeInput {
    match extract_text(file_name, bytes) {
        Ok(text) => {
            debug!("Decoded {file_name}: {} chars", text.len());
            ResumeInput::new(file_name, text)
        }
        Err(e) => {
            warn!("Could not decode {file_name}: {e}");
            ResumeInput {
                file_name: file_name.to_string(),
                text: String::new(),
                decode_error: Some(e.to_string()),
            }
        }
    }
}

pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => extract_pdf(bytes),
        "docx" => extract_docx(bytes),
        "" | "txt" | "md" => Ok(std::str::from_utf8(bytes)?.to_string()),
        other => Err(DocumentError::UnsupportedFormat(other.to_string())),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    // pdf-extract panics on some malformed inputs.
    panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| DocumentError::Pdf("decoder panicked".to_string()))?
        .map_err(|e| DocumentError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| DocumentError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| DocumentError::Docx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| DocumentError::Docx(e.to_string()))?;

    Ok(docx_xml_to_text(&xml))
}

/// Paragraph ends become newlines, everything else that is markup is dropped.
fn docx_xml_to_text(xml: &str) -> String {
    let xml = xml
        .replace("</w:p>", "\n")
        .replace("<w:br/>", "\n")
        .replace("<w:tab/>", " ");
    let text = XML_TAG.replace_all(&xml, "");
    // Numeric references first so an escaped `&amp;#38;` stays literal.
    let text = CHAR_REFERENCE.replace_all(&text, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse().ok(),
            (None, None) => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCX_BODY, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_plain_text_passes_through() {
        let input = decode_document("notes.txt", b"Jane Doe\nRust");
        assert_eq!(input.text, "Jane Doe\nRust");
        assert!(input.decode_error.is_none());
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert!(matches!(
            extract_text("CV.PNG", b""),
            Err(DocumentError::UnsupportedFormat(ext)) if ext == "png"
        ));
    }

    #[test]
    fn test_unsupported_type_sets_decode_error() {
        let input = decode_document("photo.jpg", b"\xff\xd8\xff");
        assert!(input.text.is_empty());
        assert!(input.decode_error.unwrap().contains("jpg"));
    }

    #[test]
    fn test_invalid_utf8_text_sets_decode_error() {
        let input = decode_document("resume.txt", &[0xc3, 0x28]);
        assert!(input.decode_error.is_some());
    }

    #[test]
    fn test_garbage_pdf_sets_decode_error() {
        let input = decode_document("resume.pdf", b"definitely not a pdf");
        assert_eq!(input.file_name, "resume.pdf");
        assert!(input.text.is_empty());
        assert!(input.decode_error.is_some());
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let body = r#"<w:document><w:body><w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p><w:p><w:r><w:t>R&amp;D with Rust</w:t></w:r></w:p></w:body></w:document>"#;
        let input = decode_document("jane.docx", &docx_with_body(body));
        assert!(input.decode_error.is_none());
        assert_eq!(input.text, "Jane Doe\nR&D with Rust\n");
    }

    #[test]
    fn test_docx_numeric_references_are_decoded() {
        let body = r#"<w:p><w:t>2019&#8211;2023 at O&#x2019;Neil &amp;#38; Co &#xD800;</w:t></w:p>"#;
        let input = decode_document("ref.docx", &docx_with_body(body));
        assert!(input.decode_error.is_none());
        assert_eq!(input.text, "2019\u{2013}2023 at O\u{2019}Neil &#38; Co &#xD800;\n");
    }

    #[test]
    fn test_docx_without_body_sets_decode_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let input = decode_document("broken.docx", &bytes);
        assert!(input.decode_error.is_some());
    }
}
