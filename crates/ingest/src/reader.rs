use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

use crate::ExtractionError;
use crate::document::{Document, DocumentContent, DocumentType};
use crate::staging::StagingArea;

pub const IMAGE_PLACEHOLDER: &str = "Image file - text extraction not implemented";
pub const DICOM_PLACEHOLDER: &str = "DICOM file - text extraction not implemented";

/// Reads the text layer of a PDF, one string per page.
#[async_trait]
pub trait PdfReader: Send + Sync {
    async fn read_pages(&self, path: &Path) -> Result<Vec<String>, ExtractionError>;
}

/// PDF text layer reader backed by the pdf-extract crate.
pub struct PdfExtractReader;

#[async_trait]
impl PdfReader for PdfExtractReader {
    async fn read_pages(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let bytes = fs::read(path).await?;

        // pdf-extract is blocking and can panic on malformed input.
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .await
            .map_err(|e| ExtractionError::PdfParsing(format!("reader aborted: {}", e)))?
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))
    }
}

/// Maps documents to plain text, dispatching on the declared type.
#[derive(Clone)]
pub struct TextExtractor {
    pdf: Arc<dyn PdfReader>,
}

impl TextExtractor {
    pub fn new(pdf: Arc<dyn PdfReader>) -> Self {
        Self { pdf }
    }

    /// Extract text for one document. Byte content is staged in `staging` first;
    /// text content is passed through untouched.
    ///
    /// Only staging I/O fails the call. Format problems come back as empty text.
    pub async fn extract(&self, document: &Document, staging: &StagingArea) -> Result<String> {
        match &document.content {
            DocumentContent::Text(text) => Ok(text.clone()),
            DocumentContent::Bytes(bytes) => {
                let path = staging.stage(bytes, document.declared_type.staging_extension())?;
                debug!(document = %document.name, path = ?path, "Staged document");
                Ok(self.extract_path(&path, document.declared_type).await)
            }
        }
    }

    /// Extract text from a file on disk.
    pub async fn extract_path(&self, path: &Path, declared_type: DocumentType) -> String {
        match declared_type {
            DocumentType::Pdf => match self.read_pdf(path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Error extracting text from PDF");
                    String::new()
                }
            },
            DocumentType::Txt => match read_utf8(path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Error reading text document");
                    String::new()
                }
            },
            DocumentType::Image => IMAGE_PLACEHOLDER.to_string(),
            DocumentType::Dicom => DICOM_PLACEHOLDER.to_string(),
            DocumentType::Unknown => String::new(),
        }
    }

    async fn read_pdf(&self, path: &Path) -> Result<String, ExtractionError> {
        let pages = self.pdf.read_pages(path).await?;
        Ok(pages.concat())
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(Arc::new(PdfExtractReader))
    }
}

async fn read_utf8(path: &Path) -> Result<String, ExtractionError> {
    let bytes = fs::read(path).await?;
    String::from_utf8(bytes).map_err(|e| ExtractionError::Encoding(e.to_string()))
}
