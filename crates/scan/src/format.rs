use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

use crate::ScanError;
use crate::render::render_png;

/// Listed in the rejection message for disallowed uploads.
pub const ALLOWED_SCAN_TYPES: &str = "png, jpg, jpeg, dcm, nii, nii.gz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFormat {
    Png,
    Jpg,
    Jpeg,
    Dicom,
    Nifti,
    NiftiGz,
}

impl ScanFormat {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".nii.gz") {
            return Some(Self::NiftiGz);
        }
        let (_, ext) = lower.rsplit_once('.')?;
        match ext {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "dcm" => Some(Self::Dicom),
            "nii" => Some(Self::Nifti),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Dicom => "dcm",
            Self::Nifti => "nii",
            Self::NiftiGz => "nii.gz",
        }
    }

    /// Formats a vision model accepts without rendering.
    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Png | Self::Jpg | Self::Jpeg)
    }
}

/// Format of a scan on disk, from its file name.
pub fn scan_format(path: &Path) -> Result<ScanFormat, ScanError> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    ScanFormat::from_file_name(name).ok_or_else(|| ScanError::UnsupportedFormat(name.to_string()))
}

/// Encode a scan as a `data:` URL. DICOM and NIfTI are rendered to PNG first.
pub async fn image_data_url(path: &Path) -> Result<String, ScanError> {
    let format = scan_format(path)?;

    if format.is_raster() {
        let bytes = tokio::fs::read(path).await?;
        return Ok(format!("data:image/{};base64,{}", format.extension(), STANDARD.encode(bytes)));
    }

    let owned = path.to_path_buf();
    let png = tokio::task::spawn_blocking(move || render_png(&owned, format))
        .await
        .map_err(|e| ScanError::Render(format!("renderer aborted: {}", e)))??;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_extension() {
        assert_eq!(ScanFormat::from_file_name("brain.NII.GZ"), Some(ScanFormat::NiftiGz));
        assert_eq!(ScanFormat::from_file_name("brain.nii"), Some(ScanFormat::Nifti));
        assert_eq!(ScanFormat::from_file_name("archive.gz"), None);
    }

    #[test]
    fn test_upload_allow_list() {
        assert_eq!(ScanFormat::from_file_name("chest.JPG"), Some(ScanFormat::Jpg));
        assert_eq!(ScanFormat::from_file_name("series.dcm"), Some(ScanFormat::Dicom));
        assert_eq!(ScanFormat::from_file_name("report.pdf"), None);
        assert_eq!(ScanFormat::from_file_name("noextension"), None);
    }

    #[tokio::test]
    async fn test_png_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"abc").unwrap();

        let url = image_data_url(&path).await.unwrap();
        assert_eq!(url, "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn test_dicom_rendered_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.dcm");
        std::fs::write(&path, crate::render::tests::dicom_file("CT", 1, 2, &[10, 20])).unwrap();

        let url = image_data_url(&path).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_unreadable_dicom_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.dcm");
        std::fs::write(&path, b"DICM").unwrap();

        assert!(matches!(image_data_url(&path).await, Err(ScanError::Render(_))));
    }
}
