//! Text extraction from uploaded policy documents.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use polcheck_core::{PolicyCheckerError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

pub const SUPPORTED_FORMATS: &str = ".pdf, .docx, .doc, .txt, .md";

/// Body part of a WordprocessingML package.
const DOCX_BODY: &str = "word/document.xml";

/// Read a document as plain text, trimmed and capped at `max_chars` characters.
pub fn extract_text(path: &Path, max_chars: usize) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let raw = match extension.as_str() {
        "pdf" => pdf_text(path)?,
        "docx" | "doc" => docx_text(path)?,
        "txt" | "md" => std::fs::read_to_string(path).map_err(|e| {
            PolicyCheckerError::DocumentParsing(format!(
                "failed to read {}: {e}",
                path.display()
            ))
        })?,
        _ => {
            return Err(PolicyCheckerError::DocumentParsing(format!(
                "unsupported file format {:?}; supported formats: {SUPPORTED_FORMATS}",
                path.file_name().unwrap_or_default()
            )));
        }
    };
    debug!(path = %path.display(), chars = raw.chars().count(), "document text extracted");
    Ok(cap(raw.trim(), max_chars).to_string())
}

fn pdf_text(path: &Path) -> Result<String> {
    let parse_error = |e: String| {
        PolicyCheckerError::DocumentParsing(format!("error reading PDF {}: {e}", path.display()))
    };
    // pdf-extract panics on some malformed inputs.
    match std::panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(parse_error(e.to_string())),
        Err(_) => Err(parse_error("malformed document".to_string())),
    }
}

/// Paragraph text of a `.docx` package, one paragraph per line.
fn docx_text(path: &Path) -> Result<String> {
    let parse_error = |e: String| {
        PolicyCheckerError::DocumentParsing(format!("error reading DOCX {}: {e}", path.display()))
    };

    let file = File::open(path).map_err(|e| parse_error(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| parse_error(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| parse_error(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| parse_error(e.to_string()))?;

    paragraphs(&xml).map_err(parse_error)
}

/// Concatenate `<w:t>` runs, breaking lines at `<w:p>`.
fn paragraphs(xml: &str) -> std::result::Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => lines.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                b"p" => lines.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines.join("\n"))
}

fn cap(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_and_trims_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "policy.TXT", b"\n  Retention policy v2  \n\n");
        assert_eq!(extract_text(&path, 50_000).unwrap(), "Retention policy v2");
    }

    #[test]
    fn caps_length_in_characters() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.md", "ééééé".as_bytes());
        assert_eq!(extract_text(&path, 3).unwrap(), "ééé");
    }

    fn write_docx(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        use std::io::Write;

        let path = dir.path().join(name);
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file(DOCX_BODY, zip::write::SimpleFileOptions::default())
            .unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
        .unwrap();
        zip.finish().unwrap();
        path
    }

    #[test]
    fn reads_docx_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_docx(
            &dir,
            "policy.docx",
            "<w:p><w:r><w:t>1. Data retention</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Logs are kept </w:t></w:r>\
             <w:r><w:t>for 5 years &amp; then deleted.</w:t></w:r></w:p>\
             <w:p/><w:p><w:r><w:t>Owner:</w:t><w:tab/><w:t>DPO</w:t></w:r></w:p>",
        );
        assert_eq!(
            extract_text(&path, 50_000).unwrap(),
            "1. Data retention\nLogs are kept for 5 years & then deleted.\n\nOwner:\tDPO"
        );
    }

    #[test]
    fn doc_extension_reads_the_same_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_docx(&dir, "legacy.DOC", "<w:p><w:r><w:t>Access control</w:t></w:r></w:p>");
        assert_eq!(extract_text(&path, 6).unwrap(), "Access");
    }

    #[test]
    fn docx_without_body_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.finish().unwrap();
        let err = extract_text(&path, 100).unwrap_err();
        assert!(matches!(err, PolicyCheckerError::DocumentParsing(ref m) if m.contains("DOCX")));
    }

    #[test]
    fn corrupt_office_file_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "policy.docx", b"not a zip archive");
        assert!(matches!(
            extract_text(&path, 100),
            Err(PolicyCheckerError::DocumentParsing(_))
        ));
    }

    #[test]
    fn corrupt_pdf_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "policy.pdf", b"%PDF-1.7\nnot really a pdf");
        let err = extract_text(&path, 100).unwrap_err();
        assert!(matches!(err, PolicyCheckerError::DocumentParsing(ref m) if m.contains("PDF")));
    }

    #[test]
    fn missing_pdf_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.pdf");
        assert!(matches!(
            extract_text(&path, 100),
            Err(PolicyCheckerError::DocumentParsing(_))
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "policy.xlsx", b"x");
        let err = extract_text(&path, 100).unwrap_err();
        assert!(matches!(err, PolicyCheckerError::DocumentParsing(ref m) if m.contains(SUPPORTED_FORMATS)));
    }

    #[test]
    fn invalid_utf8_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "policy.txt", &[0xff, 0xfe, 0x00]);
        assert!(matches!(
            extract_text(&path, 100),
            Err(PolicyCheckerError::DocumentParsing(_))
        ));
    }
}
