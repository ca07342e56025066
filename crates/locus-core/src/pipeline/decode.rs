//! Source image loading with format detection, validation, and timeout support.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// A decoded source image shared read-only by every stage of a run.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Resolved path on disk
    pub path: PathBuf,
    /// Original encoded bytes (sent to model services as-is)
    pub bytes: Vec<u8>,
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl SourceImage {
    /// Detector target size in `(height, width)` order.
    pub fn target_size(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    /// Lowercase format name ("jpeg", "png", …).
    pub fn format_name(&self) -> &'static str {
        format_to_str(self.format)
    }

    /// Wrap an in-memory image, re-encoding it as PNG. Mostly useful in tests.
    pub fn from_image(path: impl Into<PathBuf>, image: DynamicImage) -> PipelineResult<Self> {
        let path = path.into();
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| PipelineError::Decode {
                path: path.clone(),
                message: format!("Cannot encode image: {e}"),
            })?;
        let (width, height) = image.dimensions();
        Ok(Self {
            path,
            bytes,
            image,
            format: ImageFormat::Png,
            width,
            height,
        })
    }
}

/// Image loader with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode an image from disk.
    ///
    /// A missing file is reported as [`PipelineError::MissingInput`].
    pub async fn load(&self, path: &Path) -> PipelineResult<SourceImage> {
        if !path.is_file() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {e}"),
            })?;
        self.decode_from_bytes(bytes, path).await
    }

    /// Decode an in-memory buffer with dimension validation and timeout.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> PipelineResult<SourceImage> {
        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || decode_bytes_sync(bytes, path_owned)).await
        })
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                let max_dim = self.limits.max_image_dimension;
                if decoded.width > max_dim || decoded.height > max_dim {
                    return Err(PipelineError::ImageTooLarge {
                        path: path.to_path_buf(),
                        width: decoded.width,
                        height: decoded.height,
                        max_dim,
                    });
                }
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {e}"),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }
}

/// Synchronous decode (runs in spawn_blocking).
fn decode_bytes_sync(bytes: Vec<u8>, path: PathBuf) -> PipelineResult<SourceImage> {
    let reader = image::ImageReader::new(std::io::Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.clone(),
            message: format!("Cannot detect image format: {e}"),
        })?;
    let format = match reader.format() {
        Some(f) => f,
        None => ImageFormat::from_path(&path).map_err(|_| PipelineError::Decode {
            path: path.clone(),
            message: "Unsupported image format".to_string(),
        })?,
    };
    let image = reader.decode().map_err(|e| PipelineError::Decode {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let (width, height) = image.dimensions();
    Ok(SourceImage {
        path,
        bytes,
        image,
        format,
        width,
        height,
    })
}

/// Lowercase name of an image format.
pub fn format_to_str(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::new(width, height).save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_reports_dimensions_and_target_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 64, 32);

        let decoder = ImageDecoder::new(LimitsConfig::default());
        let source = decoder.load(&path).await.unwrap();
        assert_eq!((source.width, source.height), (64, 32));
        assert_eq!(source.target_size(), (32, 64));
        assert_eq!(source.format_name(), "png");
        assert!(!source.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_missing_input() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder.load(Path::new("/nonexistent/desk.jpg")).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_format_detected_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), "real.png", 8, 8);
        let misnamed = dir.path().join("misnamed.jpg");
        std::fs::copy(&png, &misnamed).unwrap();

        let decoder = ImageDecoder::new(LimitsConfig::default());
        let source = decoder.load(&misnamed).await.unwrap();
        assert_eq!(source.format, ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_rejects_oversized_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "big.png", 40, 10);
        let limits = LimitsConfig {
            max_image_dimension: 32,
            ..LimitsConfig::default()
        };

        let err = ImageDecoder::new(limits).load(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { width: 40, .. }));
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = ImageDecoder::new(LimitsConfig::default())
            .load(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_from_image_encodes_png() {
        let source = SourceImage::from_image("mem.png", DynamicImage::new_rgb8(5, 3)).unwrap();
        assert_eq!(source.format, ImageFormat::Png);
        assert_eq!(source.target_size(), (3, 5));
        assert!(source.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
