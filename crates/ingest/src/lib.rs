pub mod document;
pub mod reader;
pub mod staging;

pub use document::{Document, DocumentContent, DocumentType};
pub use reader::{DICOM_PLACEHOLDER, IMAGE_PLACEHOLDER, PdfExtractReader, PdfReader, TextExtractor};
pub use staging::StagingArea;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Text encoding error: {0}")]
    Encoding(String),
}
