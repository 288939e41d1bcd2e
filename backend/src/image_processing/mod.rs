pub mod normalizer;
pub mod validator;

pub use normalizer::ImageNormalizer;
pub use validator::UploadValidator;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// 规范化后图像的MIME类型
pub const NORMALIZED_MEDIA_TYPE: &str = "image/jpeg";

/// 规范化后图像的扩展名
pub const NORMALIZED_EXTENSION: &str = "jpg";

/// 通过验证的上传文件信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadInfo {
    /// 小写扩展名（png/jpg/jpeg）
    pub extension: String,
    /// 按文件头识别的MIME类型
    pub mime_type: String,
}

/// 规范化后的图像：RGB、长边不超过上限、JPEG编码
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// JPEG字节
    pub bytes: Vec<u8>,
    /// 固定为 `image/jpeg`
    pub media_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl std::fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("bytes", &format!("<{} bytes>", self.bytes.len()))
            .field("media_type", &self.media_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("original_width", &self.original_width)
            .field("original_height", &self.original_height)
            .finish()
    }
}

impl NormalizedImage {
    /// 是否经过缩放
    pub fn was_resized(&self) -> bool {
        self.width != self.original_width || self.height != self.original_height
    }

    /// 标准Base64编码
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:image/jpeg;base64,...` 形式的内联URL
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}
