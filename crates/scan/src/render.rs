use dicom_pixeldata::PixelDecoder;
use image::{DynamicImage, GrayImage, ImageFormat};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::io::Cursor;
use std::path::Path;

use crate::ScanError;
use crate::format::ScanFormat;

/// Render a DICOM image or the middle slice of a NIfTI volume as an 8-bit PNG.
///
/// Intensities are scaled so the brightest voxel maps to 255. Blocking.
pub fn render_png(path: &Path, format: ScanFormat) -> Result<Vec<u8>, ScanError> {
    let (width, height, values) = match format {
        ScanFormat::Dicom => dicom_intensities(path)?,
        ScanFormat::Nifti | ScanFormat::NiftiGz => nifti_intensities(path)?,
        _ => return Err(ScanError::UnsupportedFormat(format.extension().to_string())),
    };
    encode_png(width, height, &values)
}

/// The DICOM `Modality` tag, trimmed of padding.
pub fn dicom_modality(path: &Path) -> Result<String, ScanError> {
    let object = dicom_object::open_file(path).map_err(render_error)?;
    let modality = object
        .element_by_name("Modality")
        .map_err(render_error)?
        .to_str()
        .map_err(render_error)?;
    Ok(modality.trim().to_string())
}

/// Scan type implied by a DICOM modality code.
pub fn modality_scan_type(modality: &str) -> Option<&'static str> {
    match modality {
        "CT" => Some("CT Scan"),
        "MR" => Some("MRI Scan"),
        "DX" | "CR" => Some("X-ray"),
        "US" => Some("Ultrasound"),
        _ => None,
    }
}

fn dicom_intensities(path: &Path) -> Result<(u32, u32, Vec<f32>), ScanError> {
    let object = dicom_object::open_file(path).map_err(render_error)?;
    let pixels = object.decode_pixel_data().map_err(render_error)?;
    let frame = pixels.to_dynamic_image(0).map_err(render_error)?.to_luma32f();

    let (width, height) = frame.dimensions();
    Ok((width, height, frame.into_raw()))
}

fn nifti_intensities(path: &Path) -> Result<(u32, u32, Vec<f32>), ScanError> {
    let object = ReaderOptions::new().read_file(path).map_err(render_error)?;
    let volume = object.into_volume().into_ndarray::<f32>().map_err(render_error)?;

    // Rows follow the first axis and columns the second; 3D volumes use the middle slice.
    let shape = volume.shape().to_vec();
    let (rows, cols, slice) = match shape.as_slice() {
        [rows, cols] => (*rows, *cols, None),
        [rows, cols, depth] => (*rows, *cols, Some(depth / 2)),
        other => {
            return Err(ScanError::Render(format!(
                "expected a 2D or 3D volume, got {} dimensions",
                other.len()
            )));
        }
    };

    let mut values = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let value = match slice {
                Some(z) => volume[&[row, col, z][..]],
                None => volume[&[row, col][..]],
            };
            values.push(value);
        }
    }

    Ok((cols as u32, rows as u32, values))
}

fn encode_png(width: u32, height: u32, values: &[f32]) -> Result<Vec<u8>, ScanError> {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    let pixels: Vec<u8> = values
        .iter()
        .map(|&v| if max > 0.0 { (v.max(0.0) / max * 255.0) as u8 } else { 0 })
        .collect();

    let gray = GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| ScanError::Render("pixel count does not match dimensions".to_string()))?;

    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut png, ImageFormat::Png)
        .map_err(render_error)?;
    Ok(png.into_inner())
}

fn render_error(e: impl std::fmt::Display) -> ScanError {
    ScanError::Render(e.to_string())
}
