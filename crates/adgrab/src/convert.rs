//! JPEG normalization of downloaded images
//!
//! Every file in the output folder that is not already a JPEG (and is not
//! the metadata file) is decoded, converted to RGB and re-encoded as
//! `<stem>.jpg`. The original is removed only after the new file is written.

use crate::error::GrabError;
use crate::metadata::METADATA_FILE_NAME;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extension of normalized files
pub const TARGET_EXTENSION: &str = "jpg";

/// JPEG encoder quality
pub const JPEG_QUALITY: u8 = 95;

/// What to do when this build cannot convert images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPolicy {
    /// Abort the run at startup; report every per-file failure
    Required,
    /// Keep files in their downloaded format; per-file failures are quiet
    #[default]
    BestEffort,
}

/// Whether this build can decode and encode images
pub fn conversion_available() -> bool {
    cfg!(feature = "convert")
}

/// File converted to JPEG
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// File left in its original format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedConversion {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of normalizing a folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub converted: Vec<ConvertedFile>,
    pub failed: Vec<FailedConversion>,
}

/// True if the file is left alone by normalization
pub fn skip_conversion(path: &Path) -> bool {
    if path.file_name().is_some_and(|name| name == METADATA_FILE_NAME) {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg")
        })
}

/// Convert every non-JPEG file in `dir` to JPEG
///
/// A file that fails to convert stays as it is and the batch continues.
/// Only a failure to list the folder is an error.
pub fn normalize_folder(
    dir: &Path,
    policy: ConversionPolicy,
) -> Result<ConversionReport, GrabError> {
    let mut report = ConversionReport::default();

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| GrabError::io(dir, e))? {
        let entry = entry.map_err(|e| GrabError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && !skip_conversion(&path) {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        match convert_file(&path) {
            Ok(to) => {
                tracing::info!(
                    "Converted: {} -> {}",
                    display_name(&path),
                    display_name(&to)
                );
                report.converted.push(ConvertedFile { from: path, to });
            }
            Err(e) => {
                match policy {
                    ConversionPolicy::Required => {
                        tracing::warn!("Could not convert {}: {}", display_name(&path), e)
                    }
                    ConversionPolicy::BestEffort => {
                        tracing::debug!("Could not convert {}: {}", display_name(&path), e)
                    }
                }
                report.failed.push(FailedConversion {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Re-encode one file as JPEG and remove the original
#[cfg(feature = "convert")]
fn convert_file(path: &Path) -> Result<PathBuf, GrabError> {
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ImageReader};
    use std::io::{BufWriter, Write};

    let decoded = ImageReader::open(path)
        .map_err(|e| GrabError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| GrabError::io(path, e))?
        .decode()
        .map_err(|e| GrabError::ImageError(e.to_string()))?;

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let target = path.with_extension(TARGET_EXTENSION);
    let file = std::fs::File::create(&target).map_err(|e| GrabError::io(&target, e))?;
    let mut writer = BufWriter::new(file);
    let written = rgb
        .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))
        .map_err(|e| GrabError::ImageError(e.to_string()))
        .and_then(|()| writer.flush().map_err(|e| GrabError::io(&target, e)));
    if let Err(e) = written {
        drop(writer);
        let _ = std::fs::remove_file(&target);
        return Err(e);
    }

    std::fs::remove_file(path).map_err(|e| GrabError::io(path, e))?;
    Ok(target)
}

#[cfg(not(feature = "convert"))]
fn convert_file(_path: &Path) -> Result<PathBuf, GrabError> {
    Err(GrabError::ConversionUnavailable)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_conversion() {
        assert!(skip_conversion(Path::new("/tmp/ad/image_1.jpg")));
        assert!(skip_conversion(Path::new("/tmp/ad/image_1.JPEG")));
        assert!(skip_conversion(Path::new("/tmp/ad/description.txt")));
        assert!(!skip_conversion(Path::new("/tmp/ad/image_2.png")));
        assert!(!skip_conversion(Path::new("/tmp/ad/image_3.webp")));
        assert!(!skip_conversion(Path::new("/tmp/ad/notes.txt")));
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(ConversionPolicy::default(), ConversionPolicy::BestEffort);
    }

    #[test]
    fn test_missing_folder_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = normalize_folder(&dir.path().join("nope"), ConversionPolicy::BestEffort);
        assert!(matches!(result, Err(GrabError::Io { .. })));
    }

    #[cfg(feature = "convert")]
    mod with_codecs {
        use super::*;
        use image::{ImageFormat, Rgba, RgbaImage};

        fn write_png(path: &Path) {
            let img = RgbaImage::from_pixel(4, 3, Rgba([200, 10, 10, 128]));
            img.save_with_format(path, ImageFormat::Png).unwrap();
        }

        #[test]
        fn test_converts_png_to_jpg() {
            let dir = tempfile::tempdir().unwrap();
            write_png(&dir.path().join("image_1.png"));

            let report = normalize_folder(dir.path(), ConversionPolicy::Required).unwrap();

            assert_eq!(report.converted.len(), 1);
            assert!(report.failed.is_empty());
            assert!(!dir.path().join("image_1.png").exists());

            let jpg = dir.path().join("image_1.jpg");
            assert_eq!(report.converted[0].to, jpg);
            let reopened = image::open(&jpg).unwrap();
            assert_eq!((reopened.width(), reopened.height()), (4, 3));
        }

        #[test]
        fn test_decodes_by_content_not_extension() {
            let dir = tempfile::tempdir().unwrap();
            // PNG data saved under a misleading extension
            let png = dir.path().join("image_1.png");
            write_png(&png);
            std::fs::rename(&png, dir.path().join("image_1.webp")).unwrap();

            let report = normalize_folder(dir.path(), ConversionPolicy::BestEffort).unwrap();
            assert_eq!(report.converted.len(), 1);
            assert!(dir.path().join("image_1.jpg").exists());
        }

        #[test]
        fn test_failure_keeps_original_and_continues() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("image_1.gif"), b"not an image").unwrap();
            write_png(&dir.path().join("image_2.png"));
            std::fs::write(dir.path().join(METADATA_FILE_NAME), "TITLE:\nx\n").unwrap();
            std::fs::write(dir.path().join("image_3.jpg"), b"already jpeg").unwrap();

            let report = normalize_folder(dir.path(), ConversionPolicy::BestEffort).unwrap();

            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].path, dir.path().join("image_1.gif"));
            assert!(dir.path().join("image_1.gif").exists());
            assert!(!dir.path().join("image_1.jpg").exists());

            assert_eq!(report.converted.len(), 1);
            assert!(dir.path().join("image_2.jpg").exists());

            assert_eq!(
                std::fs::read(dir.path().join("image_3.jpg")).unwrap(),
                b"already jpeg"
            );
            assert!(dir.path().join(METADATA_FILE_NAME).exists());
        }

        #[test]
        fn test_only_jpg_remains_after_success() {
            let dir = tempfile::tempdir().unwrap();
            write_png(&dir.path().join("image_1.png"));
            write_png(&dir.path().join("image_2.bmp"));
            std::fs::write(dir.path().join(METADATA_FILE_NAME), "TITLE:\nx\n").unwrap();

            normalize_folder(dir.path(), ConversionPolicy::Required).unwrap();

            for entry in std::fs::read_dir(dir.path()).unwrap() {
                let path = entry.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                assert!(name == METADATA_FILE_NAME || name.ends_with(".jpg"), "{name}");
            }
        }
    }

    #[cfg(not(feature = "convert"))]
    #[test]
    fn test_conversion_unavailable() {
        assert!(!conversion_available());
    }
}
