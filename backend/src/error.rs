use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::response::{ApiResponse, ResponseCode};

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 持久化失败（记录写入或读取）
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("文件过大: 最大允许大小 {max_size} 字节")]
    FileTooLarge { max_size: u64 },

    #[error("不支持的文件类型: {file_type}")]
    UnsupportedFileType { file_type: String },

    #[error("文件未找到: {path}")]
    FileNotFound { path: String },

    /// 上传内容无法解码为有效图像
    #[error("无效图像: {0}")]
    InvalidImage(String),

    /// 远程视觉模型调用失败或超时
    #[error("评估服务不可用: {0}")]
    AssessmentUnavailable(String),

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("服务不可用: {0}")]
    ServiceUnavailable(String),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("未登录或用户标识无效")]
    Unauthorized,

    #[error("无权访问: {resource}")]
    Forbidden { resource: String },

    #[error("资源不存在: {resource}")]
    NotFound { resource: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            AppError::Database(_) => (ResponseCode::INTERNAL_ERROR, "分析结果保存失败".to_string()),
            AppError::Io(_) => (ResponseCode::INTERNAL_ERROR, "文件IO错误".to_string()),
            AppError::Config(_) => (ResponseCode::INTERNAL_ERROR, "配置错误".to_string()),
            AppError::Validation(msg) => (ResponseCode::BAD_REQUEST, msg.clone()),
            AppError::Storage(_) => (ResponseCode::INTERNAL_ERROR, "存储服务错误".to_string()),
            AppError::FileTooLarge { max_size } => (
                ResponseCode::FILE_TOO_LARGE,
                format!("文件过大，最大允许大小: {} MB", max_size / 1024 / 1024),
            ),
            AppError::UnsupportedFileType { file_type } => (
                ResponseCode::UNSUPPORTED_FILE_TYPE,
                format!("不支持的文件类型: {}", file_type),
            ),
            AppError::FileNotFound { .. } => {
                (ResponseCode::NOT_FOUND, "文件未找到".to_string())
            }
            AppError::InvalidImage(_) => (
                ResponseCode::INVALID_IMAGE,
                "图像无法解析，请上传有效的PNG或JPEG照片".to_string(),
            ),
            AppError::AssessmentUnavailable(_) => (
                ResponseCode::ASSESSMENT_UNAVAILABLE,
                "图像分析服务暂时不可用，请稍后重试".to_string(),
            ),
            AppError::Internal(_) => (ResponseCode::INTERNAL_ERROR, "服务器内部错误".to_string()),
            AppError::ServiceUnavailable(msg) => (ResponseCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::BadRequest(msg) => (ResponseCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (ResponseCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden { resource } => {
                (ResponseCode::FORBIDDEN, format!("无权访问: {}", resource))
            }
            AppError::NotFound { resource } => {
                (ResponseCode::NOT_FOUND, format!("资源不存在: {}", resource))
            }
        };

        // 记录错误日志
        tracing::error!("应用错误: {}", self);

        ApiResponse::<()>::error(code, message).into_response()
    }
}

/// 应用程序Result类型别名
pub type AppResult<T> = Result<T, AppError>;

/// 错误构造辅助函数
impl AppError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn forbidden<T: Into<String>>(resource: T) -> Self {
        Self::Forbidden {
            resource: resource.into(),
        }
    }

    pub fn file_not_found<T: Into<String>>(path: T) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn file_too_large(max_size: u64) -> Self {
        Self::FileTooLarge { max_size }
    }

    pub fn unsupported_file_type<T: Into<String>>(file_type: T) -> Self {
        Self::UnsupportedFileType {
            file_type: file_type.into(),
        }
    }

    pub fn invalid_image<T: Into<String>>(msg: T) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn assessment_unavailable<T: Into<String>>(msg: T) -> Self {
        Self::AssessmentUnavailable(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}
