pub mod local;

pub use local::LocalStorage;

use crate::error::AppResult;
use std::path::PathBuf;

/// 存储抽象接口
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 上传文件，返回对象在存储中的键
    async fn upload(&self, key: &str, data: &[u8], content_type: Option<&str>)
    -> AppResult<String>;

    /// 下载文件
    async fn download(&self, key: &str) -> AppResult<Vec<u8>>;

    /// 删除文件
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// 检查文件是否存在
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// 将对象键解析为本地文件路径
    fn resolve(&self, key: &str) -> AppResult<PathBuf>;
}

/// 生成按日期分目录的对象键，如 `uploads/2024/05/01/<uuid>.png`
pub fn dated_key(prefix: &str, id: uuid::Uuid, extension: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        prefix,
        chrono::Utc::now().format("%Y/%m/%d"),
        id,
        extension
    )
}
