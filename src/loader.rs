//! Document loading: turning a source file into page-level text records.

use std::path::Path;

use async_trait::async_trait;
use lopdf::Document;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::types::RagError;

/// Text content of a single document page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number within the source document (1-indexed).
    pub number: usize,
    /// Extracted text content.
    pub text: String,
}

/// Reads a source document into an ordered sequence of pages.
///
/// Implementations must have no side effects beyond reading the file, so the
/// pipeline can be exercised with in-memory fakes.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Vec<Page>, RagError>;
}

/// PDF loader backed by `lopdf`, extracting text page by page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Vec<Page>, RagError> {
        let bytes = fs::read(path)
            .await
            .map_err(|err| RagError::document(path.display(), err.to_string()))?;

        let document = Document::load_mem(&bytes)
            .map_err(|err| RagError::document(path.display(), format!("invalid PDF: {err}")))?;

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(RagError::document(path.display(), "document has no pages"));
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        for number in page_numbers {
            let text = document.extract_text(&[number]).map_err(|err| {
                RagError::document(
                    path.display(),
                    format!("failed to extract text from page {number}: {err}"),
                )
            })?;
            pages.push(Page {
                number: number as usize,
                text: text.trim_end_matches('\n').to_string(),
            });
        }

        tracing::debug!(
            path = %path.display(),
            pages = pages.len(),
            "loaded document"
        );
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_a_document_error() {
        let loader = PdfLoader::new();
        let err = loader
            .load(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Document(_)));
    }

    #[tokio::test]
    async fn garbage_bytes_are_a_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_pdf.pdf");
        tokio::fs::write(&path, b"plain text, no PDF header")
            .await
            .unwrap();

        let loader = PdfLoader::new();
        let err = loader.load(&path).await.unwrap_err();
        assert!(matches!(err, RagError::Document(_)));
    }
}
