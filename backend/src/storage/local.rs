use super::Storage;
use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// 本地目录存储实现
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// 创建本地存储，根目录不存在时自动创建
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let root = PathBuf::from(&config.root);
        fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::storage(format!("创建存储目录失败: {}", e)))?;

        tracing::info!("本地存储已就绪: {}", root.display());

        Ok(Self { root })
    }

    /// 存储根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 健康检查：根目录可访问即视为健康
    pub async fn health_check(&self) -> AppResult<bool> {
        match fs::metadata(&self.root).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) => {
                tracing::error!("本地存储健康检查失败: {}", e);
                Ok(false)
            }
        }
    }
}

/// 检查对象键，只允许普通的相对路径段
fn validate_key(key: &str) -> AppResult<()> {
    if key.is_empty() {
        return Err(AppError::storage("对象键不能为空"));
    }

    let path = Path::new(key);
    if !path
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(AppError::storage(format!("非法的对象键: {}", key)));
    }

    Ok(())
}

#[async_trait::async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> AppResult<String> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage(format!("创建目录失败: {}", e)))?;
        }

        // 先写临时文件再重命名，读取方不会看到写了一半的文件
        let temp_path = path.with_file_name(format!(".{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::storage(format!("写入文件失败: {}", e)));
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::storage(format!("保存文件失败: {}", e)));
        }

        tracing::info!(
            "成功保存文件: {} ({} 字节, {})",
            key,
            data.len(),
            content_type.unwrap_or("application/octet-stream")
        );

        Ok(key.to_string())
    }

    async fn download(&self, key: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::file_not_found(key)),
            Err(e) => Err(AppError::storage(format!("读取文件失败: {}", e))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("成功删除文件: {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::storage(format!("删除文件失败: {}", e))),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| AppError::storage(format!("检查文件是否存在失败: {}", e)))
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}
