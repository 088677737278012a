//! Text extraction from uploaded files
//!
//! Each supported format has one extractor. Extraction happens before any
//! network work so a malformed file fails fast without spending provider
//! quota.

use pulldown_cmark::{Event, Options, Parser};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Extract plain text from raw file bytes according to the file type
pub fn extract_text(filename: &str, file_type: &FileType, bytes: &[u8]) -> Result<String> {
    match file_type {
        FileType::Txt => extract_plain(filename, bytes),
        FileType::Markdown => extract_markdown(filename, bytes),
        FileType::Pdf => extract_pdf(filename, bytes),
        FileType::Docx => Err(Error::UnsupportedFormat(format!(
            "'{filename}': Word documents must be converted to text before upload"
        ))),
        FileType::Unknown => Err(Error::UnsupportedFormat(format!(
            "'{filename}': supported formats are txt, md, pdf"
        ))),
    }
}

fn extract_plain(filename: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::extraction(filename, format!("not valid UTF-8: {e}")))
}

/// Render markdown down to its text content. Formatting is noise for
/// retrieval; headings and paragraphs become plain lines.
fn extract_markdown(filename: &str, bytes: &[u8]) -> Result<String> {
    let raw = extract_plain(filename, bytes)?;
    let parser = Parser::new_ext(&raw, Options::empty());

    let mut text = String::with_capacity(raw.len());
    for event in parser {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(_) => {
                if !text.ends_with("\n\n") {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }
    Ok(text)
}

fn extract_pdf(filename: &str, bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::extraction(filename, format!("PDF extraction failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let text = extract_text("notes.txt", &FileType::Txt, b"hello world").unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn invalid_utf8_is_an_extraction_error() {
        let err = extract_text("notes.txt", &FileType::Txt, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn markdown_formatting_is_stripped() {
        let md = b"# Title\n\nSome **bold** text with `code`.\n";
        let text = extract_text("doc.md", &FileType::Markdown, md).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("bold"));
        assert!(text.contains("code"));
        assert!(!text.contains('#'));
        assert!(!text.contains("**"));
    }

    #[test]
    fn docx_reports_unsupported() {
        let err = extract_text("report.docx", &FileType::Docx, b"PK").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn unknown_extension_reports_unsupported() {
        let err = extract_text("image.png", &FileType::Unknown, &[0x89]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
