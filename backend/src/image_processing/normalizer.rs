use super::{NORMALIZED_MEDIA_TYPE, NormalizedImage};
use crate::{
    config::ImageConfig,
    error::{AppError, AppResult},
};
use image::{RgbImage, codecs::jpeg::JpegEncoder, imageops::FilterType};
use std::path::Path;
use tokio::task;

/// 图像规范化器：解码、转RGB、按比例缩小、重新编码为JPEG
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ImageNormalizer {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_dimension: config.max_dimension.max(1),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    /// 读取磁盘上的图像并规范化
    pub async fn normalize_file(&self, path: &Path) -> AppResult<NormalizedImage> {
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::file_not_found(path.display().to_string()));
            }
            Err(e) => {
                return Err(AppError::invalid_image(format!("读取图像失败: {}", e)));
            }
        };

        self.normalize(data).await
    }

    /// 在后台线程中规范化内存中的图像，避免阻塞异步运行时
    pub async fn normalize(&self, data: Vec<u8>) -> AppResult<NormalizedImage> {
        let normalizer = *self;
        task::spawn_blocking(move || normalizer.normalize_bytes(&data))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
    }

    /// 同步规范化
    pub fn normalize_bytes(&self, data: &[u8]) -> AppResult<NormalizedImage> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| AppError::invalid_image(format!("无法解码图像: {}", e)))?;

        let (original_width, original_height) = (decoded.width(), decoded.height());
        if original_width == 0 || original_height == 0 {
            return Err(AppError::invalid_image("图像尺寸为0"));
        }

        // 丢弃透明通道与调色板
        let rgb = decoded.to_rgb8();
        drop(decoded);

        let (width, height) = self.target_size(original_width, original_height);
        let rgb = if (width, height) != (original_width, original_height) {
            tracing::debug!(
                "缩放图像: {}x{} -> {}x{}",
                original_width,
                original_height,
                width,
                height
            );
            image::imageops::resize(&rgb, width, height, FilterType::CatmullRom)
        } else {
            rgb
        };

        let bytes = self.encode_jpeg(&rgb)?;

        Ok(NormalizedImage {
            bytes,
            media_type: NORMALIZED_MEDIA_TYPE,
            width,
            height,
            original_width,
            original_height,
        })
    }

    /// 计算缩放后的尺寸：长边不超过上限，保持宽高比，短边至少1像素
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let longest = width.max(height);
        if longest <= self.max_dimension {
            return (width, height);
        }

        let ratio = self.max_dimension as f64 / longest as f64;
        let scale = |side: u32| -> u32 {
            ((side as f64 * ratio).round() as u32).clamp(1, self.max_dimension)
        };

        (scale(width), scale(height))
    }

    fn encode_jpeg(&self, rgb: &RgbImage) -> AppResult<Vec<u8>> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality)
            .encode_image(rgb)
            .map_err(|e| AppError::invalid_image(format!("JPEG编码失败: {}", e)))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn normalizer(max_dimension: u32) -> ImageNormalizer {
        ImageNormalizer::new(&ImageConfig {
            max_dimension,
            jpeg_quality: 85,
        })
    }

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn rgba_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, ((x + y) % 256) as u8])
        });
        png_bytes(DynamicImage::ImageRgba8(img))
    }

    #[test]
    fn test_target_size() {
        let n = normalizer(4096);
        assert_eq!(n.target_size(800, 600), (800, 600));
        assert_eq!(n.target_size(4096, 4096), (4096, 4096));
        assert_eq!(n.target_size(8192, 4096), (4096, 2048));
        assert_eq!(n.target_size(3000, 6000), (2048, 4096));
        assert_eq!(n.target_size(100_000, 1), (4096, 1));
    }

    #[test]
    fn test_small_rgba_png_becomes_rgb_jpeg() {
        let n = normalizer(4096);
        let normalized = n.normalize_bytes(&rgba_png(64, 48)).unwrap();

        assert_eq!(normalized.media_type, "image/jpeg");
        assert_eq!((normalized.width, normalized.height), (64, 48));
        assert!(!normalized.was_resized());
        assert_eq!(&normalized.bytes[..3], &[0xFF, 0xD8, 0xFF]);

        let decoded = image::load_from_memory(&normalized.bytes).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_large_image_is_downscaled() {
        let n = normalizer(64);
        let normalized = n.normalize_bytes(&rgba_png(200, 100)).unwrap();

        assert_eq!((normalized.width, normalized.height), (64, 32));
        assert_eq!(
            (normalized.original_width, normalized.original_height),
            (200, 100)
        );
        assert!(normalized.was_resized());

        let decoded = image::load_from_memory(&normalized.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn test_grayscale_input() {
        let gray = image::GrayImage::from_pixel(10, 10, image::Luma([200]));
        let data = png_bytes(DynamicImage::ImageLuma8(gray));

        let normalized = normalizer(4096).normalize_bytes(&data).unwrap();
        let decoded = image::load_from_memory(&normalized.bytes).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_corrupt_data_is_invalid_image() {
        let n = normalizer(4096);

        let err = n.normalize_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AppError::InvalidImage(_)));

        // 文件头正确但内容被截断
        let mut data = rgba_png(32, 32);
        data.truncate(40);
        assert!(matches!(
            n.normalize_bytes(&data),
            Err(AppError::InvalidImage(_))
        ));
    }

    #[tokio::test]
    async fn test_normalize_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mouth.png");
        tokio::fs::write(&path, rgba_png(20, 10)).await.unwrap();

        let normalized = normalizer(4096).normalize_file(&path).await.unwrap();
        assert_eq!((normalized.width, normalized.height), (20, 10));

        let missing = dir.path().join("missing.png");
        assert!(matches!(
            normalizer(4096).normalize_file(&missing).await,
            Err(AppError::FileNotFound { .. })
        ));
    }
}
