use crate::{
    config::Config,
    corpus::Corpus,
    error::{Error, Result},
    file::{Document, DocumentKind},
};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Statistics collected during scanning.
#[derive(Debug, Default, Clone)]
struct ScanStats {
    /// Files seen in the docs directory
    total_files: usize,

    /// Files with a supported extension
    accepted_files: usize,

    /// Files skipped for their extension
    skipped_files: usize,

    /// Accepted files whose extraction produced a diagnostic
    diagnostics: usize,
}

/// Scans the docs directory and builds the combined corpus.
pub(crate) struct Scanner {
    docs_dir: PathBuf,
    max_corpus_chars: usize,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            docs_dir: config.docs_dir.clone(),
            max_corpus_chars: config.max_corpus_chars,
        }
    }

    /// Scans the docs directory (non-recursively) and returns the corpus.
    ///
    /// A missing directory or one without supported files yields
    /// [`Corpus::Empty`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be listed.
    pub(crate) fn scan(&self) -> Result<Corpus> {
        let documents = self.load_documents()?;
        Ok(Corpus::from_documents(&documents, self.max_corpus_chars))
    }

    /// Lists, filters, sorts and extracts every supported file.
    pub(crate) fn load_documents(&self) -> Result<Vec<Document>> {
        if !self.docs_dir.exists() {
            warn!(
                "Docs directory {} does not exist, continuing with an empty corpus",
                self.docs_dir.display()
            );
            return Ok(Vec::new());
        }

        let mut stats = ScanStats::default();
        let mut accepted = Vec::new();

        debug!("Scanning {}", self.docs_dir.display());

        // links are resolved per entry so a dangling one cannot abort the walk
        let walker = WalkBuilder::new(&self.docs_dir)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(Some(1))
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) if e.depth().is_some_and(|depth| depth > 0) => {
                    warn!("Skipping unreadable entry in {}: {}", self.docs_dir.display(), e);
                    continue;
                }
                Err(e) => return Err(walk_error(&self.docs_dir, &e)),
            };
            if entry.depth() == 0 || !is_file_entry(&entry) {
                continue;
            }

            stats.total_files += 1;
            let path = entry.into_path();

            match DocumentKind::from_path(&path) {
                Some(kind) => {
                    stats.accepted_files += 1;
                    accepted.push((path, kind));
                }
                None => {
                    trace!("Skipping unsupported file: {}", path.display());
                    stats.skipped_files += 1;
                }
            }
        }

        // Sort for deterministic ordering
        accepted.sort_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()));

        let documents: Vec<Document> = accepted
            .iter()
            .map(|(path, kind)| {
                let doc = Document::load(path, *kind);
                if doc.extraction.is_diagnostic() {
                    warn!("{}", doc.extraction.as_corpus_text());
                    stats.diagnostics += 1;
                } else {
                    debug!(
                        "Loaded {} ({} chars)",
                        doc.path.display(),
                        doc.extraction.as_corpus_text().chars().count()
                    );
                }
                doc
            })
            .collect();

        debug!(
            "Scan complete: {} total, {} accepted, {} skipped, {} diagnostics",
            stats.total_files, stats.accepted_files, stats.skipped_files, stats.diagnostics
        );

        if documents.is_empty() {
            warn!(
                "No discovery docs found in {}. Add .md/.txt/.pdf files and re-run.",
                self.docs_dir.display()
            );
        }

        Ok(documents)
    }
}

/// Regular files, and links that point to a file or to nothing.
///
/// A dangling link is accepted so that its extraction reports a diagnostic.
fn is_file_entry(entry: &ignore::DirEntry) -> bool {
    match entry.file_type() {
        Some(ft) if ft.is_file() => true,
        Some(ft) if ft.is_symlink() => {
            fs::metadata(entry.path()).map_or(true, |meta| meta.is_file())
        }
        _ => false,
    }
}

fn walk_error(dir: &Path, e: &ignore::Error) -> Error {
    let source = e
        .io_error()
        .map(|io| std::io::Error::new(io.kind(), io.to_string()))
        .unwrap_or_else(|| std::io::Error::other(e.to_string()));
    Error::io(dir, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::TRUNCATION_MARKER;
    use assert_fs::prelude::*;

    fn create_test_config(root: &Path) -> Config {
        Config::builder()
            .docs_dir(root)
            .output_dir(root.join("out"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_scanner_orders_documents_lexicographically() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("b.txt").write_str("bravo").unwrap();
        temp.child("a.md").write_str("alpha").unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path()));
        let corpus = scanner.scan().unwrap();
        let text = corpus.text().unwrap();

        let a = text.find("### a.md\n\nalpha").unwrap();
        let b = text.find("### b.txt\n\nbravo").unwrap();
        assert!(a < b);
        assert_eq!(corpus.document_count(), 2);
    }

    #[test]
    fn test_scanner_skips_unsupported_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("logo.png").write_binary(&[0u8; 16]).unwrap();
        temp.child("notes.docx").write_str("ignored").unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path()));
        let corpus = scanner.scan().unwrap();

        assert!(corpus.is_empty());
    }

    #[test]
    fn test_scanner_does_not_recurse() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("top.md").write_str("top").unwrap();
        temp.child("nested/deep.md").write_str("deep").unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path()));
        let corpus = scanner.scan().unwrap();
        let text = corpus.text().unwrap();

        assert_eq!(corpus.document_count(), 1);
        assert!(!text.contains("deep"));
    }

    #[test]
    fn test_scanner_missing_directory_is_empty() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = create_test_config(&temp.path().join("absent"));

        let corpus = Scanner::new(&config).scan().unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_scanner_keeps_going_after_bad_pdf() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.pdf").write_binary(b"garbage").unwrap();
        temp.child("b.md").write_str("still here").unwrap();

        let corpus = Scanner::new(&create_test_config(temp.path())).scan().unwrap();
        let text = corpus.text().unwrap();

        assert_eq!(corpus.diagnostic_count(), 1);
        assert!(text.contains("[Failed to read PDF a.pdf:"));
        assert!(text.contains("still here"));
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_keeps_going_after_dangling_link() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("alpha").unwrap();
        std::os::unix::fs::symlink(temp.path().join("nowhere.md"), temp.path().join("b.md"))
            .unwrap();

        let corpus = Scanner::new(&create_test_config(temp.path())).scan().unwrap();
        let text = corpus.text().unwrap();

        assert_eq!(corpus.document_count(), 2);
        assert_eq!(corpus.diagnostic_count(), 1);
        assert!(text.contains("### a.md\n\nalpha"));
        assert!(text.contains("[Failed to read b.md:"));
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_follows_link_to_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("source/notes.txt").write_str("linked notes").unwrap();
        let docs = temp.child("docs");
        docs.create_dir_all().unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("source/notes.txt"),
            docs.path().join("notes.txt"),
        )
        .unwrap();

        let corpus = Scanner::new(&create_test_config(docs.path())).scan().unwrap();

        assert_eq!(corpus.diagnostic_count(), 0);
        assert!(corpus.text().unwrap().contains("linked notes"));
    }

    #[test]
    fn test_scanner_applies_ceiling() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("big.txt").write_str(&"y".repeat(10_000)).unwrap();

        let config = Config::builder()
            .docs_dir(temp.path())
            .max_corpus_chars(256)
            .build()
            .unwrap();

        let corpus = Scanner::new(&config).scan().unwrap();
        let text = corpus.text().unwrap();

        assert_eq!(text.chars().count(), 256 + TRUNCATION_MARKER.len());
        assert!(text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_scanner_is_deterministic() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("z.md").write_str("zulu").unwrap();
        temp.child("m.txt").write_str("mike").unwrap();
        temp.child("a.md").write_str("alpha").unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path()));
        let first = scanner.scan().unwrap();
        let second = scanner.scan().unwrap();

        assert_eq!(first, second);
    }
}
