use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use zip::ZipArchive;

/// Extracted text shorter than this is treated as an unreadable resume.
pub const MIN_TEXT_CHARS: usize = 50;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Main story of a WordprocessingML package.
const DOCX_BODY_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}. Upload a PDF, DOCX or plain-text resume")]
    Unsupported(String),

    #[error("Could not extract enough text from the resume ({found} characters, need at least 50)")]
    InsufficientText { found: usize },

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

/// Magic bytes win over the declared content type, which wins over the
/// file extension.
pub fn detect_kind(
    bytes: &[u8],
    content_type: Option<&str>,
    filename: &str,
) -> Result<DocumentKind, ExtractError> {
    if bytes.starts_with(b"%PDF-") {
        return Ok(DocumentKind::Pdf);
    }

    let content_type = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");
    if let Some(ct) = &content_type {
        if ct == "application/pdf" {
            return Ok(DocumentKind::Pdf);
        }
        if ct == DOCX_CONTENT_TYPE {
            return Ok(DocumentKind::Docx);
        }
        if ct.starts_with("text/") {
            return Ok(DocumentKind::PlainText);
        }
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => Ok(DocumentKind::Pdf),
        Some("docx") => Ok(DocumentKind::Docx),
        Some("txt") | Some("md") | Some("text") => Ok(DocumentKind::PlainText),
        _ => Err(ExtractError::Unsupported(
            content_type
                .or(extension.map(|e| format!(".{e}")))
                .unwrap_or_else(|| "unknown".to_string()),
        )),
    }
}

/// Extracts resume text. CPU bound; call from `spawn_blocking`.
pub fn extract_text(
    bytes: &[u8],
    content_type: Option<&str>,
    filename: &str,
) -> Result<String, ExtractError> {
    let text = match detect_kind(bytes, content_type, filename)? {
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?
        }
        DocumentKind::Docx => docx_text(bytes)?,
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };

    let text = normalize_whitespace(&text);
    let found = text.chars().count();
    if found < MIN_TEXT_CHARS {
        return Err(ExtractError::InsufficientText { found });
    }
    Ok(text)
}

fn docx_error(e: impl std::fmt::Display) -> ExtractError {
    ExtractError::Docx(e.to_string())
}

fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(docx_error)?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .map_err(docx_error)?
        .read_to_string(&mut xml)
        .map_err(docx_error)?;
    document_xml_text(&xml)
}

/// Text runs in document order. Paragraphs end lines; `w:tab` and `w:br`
/// become a tab and a line break. Everything outside `w:t` is markup.
fn document_xml_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(docx_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" | b"p" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape().map_err(docx_error)?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Collapses runs of blank lines and trailing spaces left by PDF extraction.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Asha Rao\nSenior Backend Engineer\n\n\n\nSkills: Rust, PostgreSQL, Kafka, AWS\n";

    #[test]
    fn test_detect_by_magic_bytes() {
        let kind = detect_kind(b"%PDF-1.7\n...", Some("text/plain"), "cv.txt").unwrap();
        assert_eq!(kind, DocumentKind::Pdf);
    }

    #[test]
    fn test_detect_by_content_type_then_extension() {
        assert_eq!(
            detect_kind(b"hello", Some("text/plain; charset=utf-8"), "cv").unwrap(),
            DocumentKind::PlainText
        );
        assert_eq!(
            detect_kind(b"hello", Some("application/octet-stream"), "cv.TXT").unwrap(),
            DocumentKind::PlainText
        );
    }

    #[test]
    fn test_unsupported_type() {
        let err = detect_kind(b"\xD0\xCF\x11\xE0", None, "cv.doc").unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(ref t) if t == ".doc"));
    }

    fn docx_fixture(body: &str) -> Vec<u8> {
        use std::io::Write;
        use zip::write::{SimpleFileOptions, ZipWriter};

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.start_file(DOCX_BODY_PART, SimpleFileOptions::default())
            .unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
        .unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_detect_docx_by_content_type_or_extension() {
        assert_eq!(
            detect_kind(b"PK\x03\x04", Some(DOCX_CONTENT_TYPE), "upload").unwrap(),
            DocumentKind::Docx
        );
        assert_eq!(
            detect_kind(b"PK\x03\x04", None, "Asha_CV.DOCX").unwrap(),
            DocumentKind::Docx
        );
    }

    #[test]
    fn test_docx_extraction() {
        let bytes = docx_fixture(
            r#"<w:p><w:r><w:t>Asha Rao</w:t></w:r></w:p><w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r><w:t xml:space="preserve">Senior Backend Engineer </w:t></w:r><w:r><w:tab/><w:t>Bengaluru &amp; Remote</w:t></w:r></w:p><w:p/><w:p/><w:p><w:r><w:t>Skills: Rust, PostgreSQL, Kafka, AWS</w:t></w:r></w:p>"#,
        );

        let text = extract_text(&bytes, Some(DOCX_CONTENT_TYPE), "cv.docx").unwrap();

        assert_eq!(
            text,
            "Asha Rao\nSenior Backend Engineer \tBengaluru & Remote\n\nSkills: Rust, PostgreSQL, Kafka, AWS"
        );
    }

    #[test]
    fn test_docx_without_body_part_is_an_error() {
        let err = extract_text(b"definitely not a zip", None, "cv.docx").unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn test_plain_text_extraction_normalizes_blank_lines() {
        let text = extract_text(RESUME.as_bytes(), Some("text/plain"), "cv.txt").unwrap();
        assert_eq!(
            text,
            "Asha Rao\nSenior Backend Engineer\n\nSkills: Rust, PostgreSQL, Kafka, AWS"
        );
    }

    #[test]
    fn test_short_text_rejected() {
        let err = extract_text(b"Asha Rao\n", None, "cv.txt").unwrap_err();
        assert!(matches!(err, ExtractError::InsufficientText { found: 8 }));
    }
}
