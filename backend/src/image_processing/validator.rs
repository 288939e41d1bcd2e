use super::UploadInfo;
use crate::{
    config::FileConfig,
    error::{AppError, AppResult},
};
use std::path::Path;

/// 允许的图像MIME类型（按文件头识别）
const ALLOWED_MIME_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// 上传文件验证器
#[derive(Debug, Clone)]
pub struct UploadValidator {
    config: FileConfig,
}

impl UploadValidator {
    /// 创建新的上传验证器
    pub fn new(config: &FileConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// 最大允许的文件大小（字节）
    pub fn max_size(&self) -> u64 {
        self.config.max_size
    }

    /// 验证上传文件，通过后返回识别出的扩展名和MIME类型
    pub fn validate_upload(&self, file_data: &[u8], filename: &str) -> AppResult<UploadInfo> {
        // 1. 检查文件大小
        self.validate_file_size(file_data)?;

        // 2. 检查文件名
        self.validate_filename(filename)?;

        // 3. 检查扩展名
        let extension = self.validate_file_extension(filename)?;

        // 4. 检查文件头
        let mime_type = self.validate_file_content(file_data)?;

        Ok(UploadInfo {
            extension,
            mime_type,
        })
    }

    /// 验证文件大小
    fn validate_file_size(&self, file_data: &[u8]) -> AppResult<()> {
        let file_size = file_data.len() as u64;

        if file_size == 0 {
            return Err(AppError::Validation("文件不能为空".to_string()));
        }

        if file_size > self.config.max_size {
            return Err(AppError::FileTooLarge {
                max_size: self.config.max_size,
            });
        }

        Ok(())
    }

    /// 验证文件名
    fn validate_filename(&self, filename: &str) -> AppResult<()> {
        if filename.is_empty() {
            return Err(AppError::Validation("文件名不能为空".to_string()));
        }

        if filename.len() > 255 {
            return Err(AppError::Validation(
                "文件名过长，最大支持255个字符".to_string(),
            ));
        }

        let dangerous_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
        if filename.chars().any(|c| dangerous_chars.contains(&c) || c.is_control()) {
            return Err(AppError::Validation("文件名包含非法字符".to_string()));
        }

        // 检查保留名称（Windows）
        let reserved_names = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];

        let name_without_ext = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_uppercase();

        if reserved_names.contains(&name_without_ext.as_str()) {
            return Err(AppError::Validation("文件名为系统保留名称".to_string()));
        }

        Ok(())
    }

    /// 验证文件扩展名，返回小写扩展名
    pub fn validate_file_extension(&self, filename: &str) -> AppResult<String> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension {
            Some(ext) if self.config.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => {
                Ok(ext)
            }
            Some(ext) => Err(AppError::UnsupportedFileType {
                file_type: format!("扩展名: {}", ext),
            }),
            None => Err(AppError::Validation("文件没有扩展名".to_string())),
        }
    }

    /// 按文件头验证内容确实是PNG或JPEG
    fn validate_file_content(&self, file_data: &[u8]) -> AppResult<String> {
        match infer::get(file_data) {
            Some(kind) if ALLOWED_MIME_TYPES.contains(&kind.mime_type()) => {
                Ok(kind.mime_type().to_string())
            }
            Some(kind) => Err(AppError::UnsupportedFileType {
                file_type: kind.mime_type().to_string(),
            }),
            None => Err(AppError::UnsupportedFileType {
                file_type: "无法识别的文件内容".to_string(),
            }),
        }
    }
}
