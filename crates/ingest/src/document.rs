use serde::Serialize;
use std::path::Path;

/// Declared format of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Txt,
    Image,
    Dicom,
    Unknown,
}

impl DocumentType {
    /// Map a file extension (or a declared type name) to a document type.
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" => Self::Txt,
            "jpg" | "jpeg" | "png" | "image" => Self::Image,
            "dcm" | "dicom" => Self::Dicom,
            _ => Self::Unknown,
        }
    }

    /// Infer the type from the last extension of a file name.
    pub fn from_file_name(file_name: &str) -> Self {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Extension used when the document is staged on disk.
    pub fn staging_extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Image => "img",
            Self::Dicom => "dcm",
            Self::Unknown => "bin",
        }
    }
}

/// Raw payload as received from the caller.
#[derive(Debug, Clone)]
pub enum DocumentContent {
    Bytes(Vec<u8>),
    Text(String),
}

/// A document as handed to the comparison pipeline. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub declared_type: DocumentType,
    pub content: DocumentContent,
}

impl Document {
    pub fn from_bytes(name: impl Into<String>, declared_type: DocumentType, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_type,
            content: DocumentContent::Bytes(bytes),
        }
    }

    pub fn from_text(name: impl Into<String>, declared_type: DocumentType, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type,
            content: DocumentContent::Text(text.into()),
        }
    }

    /// Build a byte-content document whose type comes from its file name.
    pub fn from_upload(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = file_name.into();
        let declared_type = DocumentType::from_file_name(&name);
        Self::from_bytes(name, declared_type, bytes)
    }
}
