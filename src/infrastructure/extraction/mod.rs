use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lopdf::Document;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("document not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot process encrypted document: {0}")]
    Encrypted(PathBuf),

    #[error("failed to parse document: {0}")]
    Malformed(String),

    #[error("text extraction timed out")]
    Timeout,
}

/// Extracts the raw text of a source document.
///
/// The pipeline only needs this one capability from a document, so it is a
/// trait seam: the production implementation reads PDFs, tests substitute a
/// stub and never touch the filesystem.
#[async_trait]
pub trait DocumentTextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// PDF text extraction backed by `lopdf`.
#[derive(Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_from_file(path: &Path) -> Result<String, ExtractionError> {
        let doc = Document::load(path)
            .map_err(|e| ExtractionError::Malformed(format!("failed to parse PDF: {e}")))?;

        if doc.is_encrypted() {
            return Err(ExtractionError::Encrypted(path.to_path_buf()));
        }

        let mut pages = Vec::new();
        for &page_number in doc.get_pages().keys() {
            match doc.extract_text(&[page_number]) {
                Ok(text) => {
                    if !text.trim().is_empty() {
                        pages.push(text);
                    }
                }
                Err(e) => {
                    tracing::warn!(page_number, error = %e, "Skipping undecodable PDF page");
                }
            }
        }

        Ok(pages.join("\n\n"))
    }
}

#[async_trait]
impl DocumentTextExtractor for PdfTextExtractor {
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::NotFound(path.to_path_buf()));
        }

        let owned_path = path.to_path_buf();

        // Parsing is CPU-bound and lopdf is synchronous, so it runs off the
        // async runtime under a bounded timeout.
        let text = tokio::time::timeout(
            EXTRACTION_TIMEOUT,
            tokio::task::spawn_blocking(move || Self::extract_from_file(&owned_path)),
        )
        .await
        .map_err(|_| ExtractionError::Timeout)?
        .map_err(|e| ExtractionError::Malformed(format!("extraction task failed: {e}")))??;

        tracing::info!(text_length = text.len(), "PDF text extraction complete");

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn write_single_page_pdf(path: &Path, text: &str) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_extracts_text_from_generated_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.pdf");
        write_single_page_pdf(&path, "Hello audiobook world");

        let text = PdfTextExtractor::new().extract_text(&path).await.unwrap();

        assert!(text.contains("Hello audiobook world"), "got: {text:?}");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = PdfTextExtractor::new()
            .extract_text(Path::new("/nonexistent/missing.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_pdf_bytes_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let err = PdfTextExtractor::new().extract_text(&path).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Malformed(_)));
    }
}
