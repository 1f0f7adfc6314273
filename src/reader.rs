//! Document text extraction.
//!
//! Turns a document path into an ordered sequence of page/section strings
//! for the chunker. PDF extraction goes through `pdf-extract`; DOCX is
//! unpacked as OOXML (`zip` + `quick-xml`); `.txt`/`.md` are read as-is.
//!
//! Extraction never panics: every failure returns a [`ReadError`], and the
//! batch ingestion pipeline reports it per-document without aborting
//! sibling documents.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb
/// protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// File patterns picked up when a directory is passed as a document input.
const INCLUDE_GLOBS: &[&str] = &["**/*.pdf", "**/*.docx", "**/*.txt", "**/*.md"];

/// Per-document read failure.
#[derive(Debug)]
pub enum ReadError {
    NotFound(PathBuf),
    Unsupported(String),
    Pdf(String),
    Ooxml(String),
    Io(String),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::NotFound(path) => write!(f, "file not found: {}", path.display()),
            ReadError::Unsupported(ext) => write!(f, "unsupported file type: {}", ext),
            ReadError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ReadError::Ooxml(e) => write!(f, "OOXML extraction failed: {}", e),
            ReadError::Io(e) => write!(f, "read failed: {}", e),
        }
    }
}

impl std::error::Error for ReadError {}

/// Display name a document is registered and attributed under.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract a document's text as ordered page/section strings.
pub fn read_pages(path: &Path) -> Result<Vec<String>, ReadError> {
    if !path.exists() {
        return Err(ReadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path).map_err(|e| ReadError::Io(e.to_string()))?;
            let text = pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| ReadError::Pdf(e.to_string()))?;
            Ok(split_pages(&text))
        }
        "docx" => {
            let bytes = std::fs::read(path).map_err(|e| ReadError::Io(e.to_string()))?;
            Ok(vec![extract_docx(&bytes)?])
        }
        "txt" | "md" => {
            let text =
                std::fs::read_to_string(path).map_err(|e| ReadError::Io(e.to_string()))?;
            Ok(vec![text])
        }
        other => Err(ReadError::Unsupported(if other.is_empty() {
            path.display().to_string()
        } else {
            format!(".{}", other)
        })),
    }
}

/// Split extracted PDF text on the form feeds the extractor emits between
/// pages; a stream without them stays one section.
fn split_pages(text: &str) -> Vec<String> {
    let pages: Vec<String> = text
        .split('\u{0c}')
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.to_string())
        .collect();

    if pages.is_empty() {
        vec![text.to_string()]
    } else {
        pages
    }
}

/// Pull the `<w:t>` runs out of `word/document.xml`, one line per
/// paragraph.
fn extract_docx(bytes: &[u8]) -> Result<String, ReadError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ReadError::Ooxml(e.to_string()))?;

    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ReadError::Ooxml("word/document.xml not found".to_string()))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ReadError::Ooxml(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ReadError::Ooxml(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(doc_xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ReadError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Expand document inputs: files pass through, directories are scanned for
/// supported files (deterministic order, VCS and build directories
/// excluded).
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(INCLUDE_GLOBS)?;
    let exclude_set = build_globset(&["**/.git/**", "**/target/**", "**/node_modules/**"])?;

    let mut expanded = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            // Missing files stay in the batch so their failure is
            // reported per-document, not swallowed here.
            expanded.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(input).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
                continue;
            }
            found.push(path.to_path_buf());
        }
        found.sort();
        expanded.extend(found);
    }

    Ok(expanded)
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_pages(Path::new("/nonexistent/report.pdf")).unwrap_err();
        assert!(matches!(err, ReadError::NotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("archive.tar");
        std::fs::write(&path, b"x").unwrap();
        let err = read_pages(&path).unwrap_err();
        assert!(matches!(err, ReadError::Unsupported(_)));
    }

    #[test]
    fn test_invalid_pdf_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        let err = read_pages(&path).unwrap_err();
        assert!(matches!(err, ReadError::Pdf(_)));
    }

    #[test]
    fn test_invalid_docx_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        let err = read_pages(&path).unwrap_err();
        assert!(matches!(err, ReadError::Ooxml(_)));
    }

    #[test]
    fn test_plain_text_single_section() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "plain body").unwrap();
        assert_eq!(read_pages(&path).unwrap(), vec!["plain body".to_string()]);
    }

    #[test]
    fn test_docx_extraction() {
        use std::io::Write;

        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(
                b"<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body><w:p><w:r><w:t>first para</w:t></w:r></w:p><w:p><w:r><w:t>second para</w:t></w:r></w:p></w:body></w:document>",
            )
            .unwrap();
            zip.finish().unwrap();
        }

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.docx");
        std::fs::write(&path, &buf).unwrap();

        let pages = read_pages(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("first para"));
        assert!(pages[0].contains("second para"));
        assert!(pages[0].contains('\n'));
    }

    #[test]
    fn test_split_pages_form_feed() {
        let pages = split_pages("page one\u{0c}page two\u{0c}");
        assert_eq!(pages, vec!["page one".to_string(), "page two".to_string()]);
        assert_eq!(split_pages("no breaks"), vec!["no breaks".to_string()]);
    }

    #[test]
    fn test_expand_inputs_scans_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("docs");
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        std::fs::write(dir.join("b.txt"), "b").unwrap();
        std::fs::write(dir.join("a.md"), "a").unwrap();
        std::fs::write(dir.join("sub/c.pdf"), "c").unwrap();
        std::fs::write(dir.join("skip.bin"), "x").unwrap();
        std::fs::write(dir.join(".git/d.txt"), "d").unwrap();

        let single = tmp.path().join("single.pdf");
        std::fs::write(&single, "s").unwrap();

        let expanded = expand_inputs(&[single.clone(), dir.clone()]).unwrap();
        assert_eq!(
            expanded,
            vec![
                single,
                dir.join("a.md"),
                dir.join("b.txt"),
                dir.join("sub/c.pdf"),
            ]
        );
    }
}
