use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Supported discovery document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Markdown (`.md`)
    Markdown,
    /// Plain text (`.txt`)
    PlainText,
    /// PDF (`.pdf`)
    Pdf,
}

impl DocumentKind {
    /// Detects the kind from a path's extension (case-insensitive).
    ///
    /// Returns `None` for anything outside the allow-list.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Outcome of extracting text from one file.
///
/// Extraction never fails the run: problems are reported as a
/// [`Extraction::Diagnostic`] whose message is placed in the corpus instead
/// of the file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Extracted plain text
    Text(String),

    /// Short placeholder explaining why no text could be extracted
    Diagnostic(String),
}

impl Extraction {
    /// Returns true if text was extracted.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true if extraction failed.
    #[must_use]
    pub const fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Diagnostic(_))
    }

    /// Returns the string folded into the corpus for this extraction.
    #[must_use]
    pub fn as_corpus_text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Diagnostic(text) => text,
        }
    }
}

/// A discovery document: its source and extracted content.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path of the file on disk
    pub path: PathBuf,

    /// File name relative to the docs directory
    pub name: String,

    /// Extracted content or diagnostic
    pub extraction: Extraction,
}

impl Document {
    /// Extracts a document from disk.
    #[must_use]
    pub fn load(path: &Path, kind: DocumentKind) -> Self {
        Self {
            path: path.to_path_buf(),
            name: display_name(path),
            extraction: extract(path, kind),
        }
    }
}

/// Extracts the text of a single file.
///
/// Plain text and Markdown are decoded as UTF-8, falling back to Latin-1.
/// PDFs are extracted page by page; pages without text are skipped.
#[must_use]
pub fn extract(path: &Path, kind: DocumentKind) -> Extraction {
    trace!("Extracting {:?}: {}", kind, path.display());

    match kind {
        DocumentKind::Markdown | DocumentKind::PlainText => extract_text(path),
        DocumentKind::Pdf => extract_pdf(path),
    }
}

fn extract_text(path: &Path) -> Extraction {
    match fs::read(path) {
        Ok(bytes) => Extraction::Text(decode_text(bytes)),
        Err(e) => Extraction::Diagnostic(format!(
            "[Failed to read {}: {}]",
            display_name(path),
            e
        )),
    }
}

/// Decodes bytes as UTF-8, or as Latin-1 when they are not valid UTF-8.
fn decode_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| {
        e.into_bytes().into_iter().map(char::from).collect()
    })
}

fn extract_pdf(path: &Path) -> Extraction {
    let name = display_name(path);

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return Extraction::Diagnostic(format!("[Failed to read PDF {name}: {e}]")),
    };

    // pdf-extract can panic on malformed fonts and object streams
    let pages = match panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    })) {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            return Extraction::Diagnostic(format!("[Failed to read PDF {name}: {e}]"));
        }
        Err(_) => {
            return Extraction::Diagnostic(format!(
                "[Failed to read PDF {name}: parser panicked on malformed content]"
            ));
        }
    };

    let total = pages.len();
    let text = pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>();

    debug!(
        "PDF {}: {} of {} pages had extractable text",
        name,
        text.len(),
        total
    );

    Extraction::Text(text.join("\n\n"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(
            DocumentKind::from_path(Path::new("notes.md")),
            Some(DocumentKind::Markdown)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("QA.TXT")),
            Some(DocumentKind::PlainText)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("sow.Pdf")),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::from_path(Path::new("diagram.png")), None);
        assert_eq!(DocumentKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_extract_markdown_unchanged() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("notes.md");
        file.write_str("# Goals\n\n- run on AKS\n").unwrap();

        let extraction = extract(file.path(), DocumentKind::Markdown);
        assert_eq!(extraction, Extraction::Text("# Goals\n\n- run on AKS\n".to_string()));
    }

    #[test]
    fn test_extract_latin1_fallback() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("legacy.txt");
        // "café" in Latin-1
        file.write_binary(&[b'c', b'a', b'f', 0xE9]).unwrap();

        let extraction = extract(file.path(), DocumentKind::PlainText);
        assert_eq!(extraction, Extraction::Text("café".to_string()));
    }

    #[test]
    fn test_extract_missing_file_is_diagnostic() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = temp.path().join("gone.txt");

        let extraction = extract(&path, DocumentKind::PlainText);
        assert!(extraction.is_diagnostic());
        assert!(extraction.as_corpus_text().starts_with("[Failed to read gone.txt"));
    }

    #[test]
    fn test_extract_malformed_pdf_is_diagnostic() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("broken.pdf");
        file.write_binary(b"not a pdf at all").unwrap();

        let extraction = extract(file.path(), DocumentKind::Pdf);
        assert!(extraction.is_diagnostic());
        assert!(
            extraction
                .as_corpus_text()
                .starts_with("[Failed to read PDF broken.pdf:")
        );
    }

    /// Assembles a minimal PDF with one Helvetica text line per page;
    /// an empty string produces a page without text.
    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let kids = (0..pages.len())
            .map(|i| format!("{} 0 R", 4 + 2 * i))
            .collect::<Vec<_>>()
            .join(" ");

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        for (i, text) in pages.iter().enumerate() {
            let content = if text.is_empty() {
                String::new()
            } else {
                format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
            };
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ));
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_offset = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }

    #[test]
    fn test_extract_pdf_skips_blank_pages_in_order() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("sow.pdf");
        file.write_binary(&build_pdf(&["Hello page one", "", "Hello page three"]))
            .unwrap();

        let extraction = extract(file.path(), DocumentKind::Pdf);
        assert!(extraction.is_text(), "{extraction:?}");

        let text = extraction.as_corpus_text();
        let one = text.find("Hello page one").unwrap();
        let three = text.find("Hello page three").unwrap();
        assert!(one < three);
        assert!(text[one..three].contains("\n\n"));
    }

    #[test]
    fn test_extract_pdf_with_blank_trailing_page() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("short.pdf");
        file.write_binary(&build_pdf(&["Hello page one", ""])).unwrap();

        let extraction = extract(file.path(), DocumentKind::Pdf);
        assert!(extraction.is_text(), "{extraction:?}");
        assert_eq!(extraction.as_corpus_text().trim(), "Hello page one");
    }

    #[test]
    fn test_document_load_uses_file_name() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("sow.txt");
        file.write_str("Statement of work").unwrap();

        let doc = Document::load(file.path(), DocumentKind::PlainText);
        assert_eq!(doc.name, "sow.txt");
        assert_eq!(doc.path, file.path());
        assert!(doc.extraction.is_text());
    }
}
