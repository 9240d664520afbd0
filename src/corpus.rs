//! Combined corpus assembled from the discovery documents.

use crate::file::Document;
use std::fmt::Write as _;
use tracing::warn;

/// Appended to the corpus when it was cut at the character ceiling.
pub const TRUNCATION_MARKER: &str = "\n\n[... corpus truncated ...]\n";

/// The concatenated text of all discovery documents for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corpus {
    /// No supported documents were found
    Empty,

    /// Joined document text
    Text {
        /// Documents with separators, possibly truncated
        text: String,
        /// Number of documents folded in
        documents: usize,
        /// Number of documents that produced a diagnostic instead of text
        diagnostics: usize,
        /// Whether the ceiling was hit
        truncated: bool,
    },
}

impl Corpus {
    /// Joins documents in the given order, each preceded by a `### <name>`
    /// separator, and enforces the `max_chars` ceiling.
    ///
    /// The ceiling counts characters, not bytes. When it is exceeded the text
    /// is cut to exactly `max_chars` characters and [`TRUNCATION_MARKER`] is
    /// appended.
    #[must_use]
    pub fn from_documents(documents: &[Document], max_chars: usize) -> Self {
        if documents.is_empty() {
            return Self::Empty;
        }

        let mut text = String::new();
        for doc in documents {
            // writing into a String cannot fail
            let _ = write!(
                text,
                "\n### {}\n\n{}\n",
                doc.name,
                doc.extraction.as_corpus_text().trim()
            );
        }

        let truncated = truncate_chars(&mut text, max_chars);
        if truncated {
            warn!(
                "Corpus exceeds {} characters, truncating ({} documents)",
                max_chars,
                documents.len()
            );
            text.push_str(TRUNCATION_MARKER);
        }

        Self::Text {
            text,
            documents: documents.len(),
            diagnostics: documents
                .iter()
                .filter(|d| d.extraction.is_diagnostic())
                .count(),
            truncated,
        }
    }

    /// Returns true if no documents were found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the corpus text, or `None` for an empty corpus.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Text { text, .. } => Some(text),
        }
    }

    /// Number of documents in the corpus.
    #[must_use]
    pub const fn document_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Text { documents, .. } => *documents,
        }
    }

    /// Number of documents that were replaced by a diagnostic.
    #[must_use]
    pub const fn diagnostic_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Text { diagnostics, .. } => *diagnostics,
        }
    }

    /// Whether the ceiling truncated the corpus.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Text { truncated: true, .. })
    }

    /// Length of the corpus text in characters.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text().map_or(0, |t| t.chars().count())
    }
}

/// Cuts `text` to at most `max_chars` characters. Returns true if it cut.
fn truncate_chars(text: &mut String, max_chars: usize) -> bool {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => {
            text.truncate(byte_offset);
            true
        }
        None => false,
    }
}
