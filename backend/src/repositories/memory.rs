use super::AnalysisStore;
use crate::{
    error::{AppError, AppResult},
    models::{AnalysisRecord, NewAnalysisRecord},
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// 进程内分析记录仓库
///
/// 数据随进程退出而丢失，仅用于本地开发（`database.url = "memory://"`）和测试。
#[derive(Debug, Default)]
pub struct MemoryAnalysisRepository {
    records: RwLock<Vec<AnalysisRecord>>,
}

impl MemoryAnalysisRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前记录数
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl AnalysisStore for MemoryAnalysisRepository {
    async fn create(&self, request: NewAnalysisRecord) -> AppResult<AnalysisRecord> {
        request.validate().map_err(AppError::validation)?;

        let record = AnalysisRecord {
            id: Uuid::new_v4(),
            owner_id: request.owner_id,
            image_path: request.image_path,
            result: request.result,
            detail: request.detail,
            confidence: request.confidence,
            status: request.status,
            created_at: chrono::Utc::now(),
        };

        self.records.write().await.push(record.clone());

        Ok(record)
    }

    async fn get_by_id(&self, id: Uuid, requester_id: i64) -> AppResult<AnalysisRecord> {
        let records = self.records.read().await;
        let record = records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("分析记录 {}", id)))?;

        if record.owner_id != requester_id {
            return Err(AppError::forbidden(format!("分析记录 {}", id)));
        }

        Ok(record.clone())
    }

    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<AnalysisRecord>> {
        let mut records: Vec<AnalysisRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();

        // 与SQL实现保持一致：created_at 倒序，相同时间按 id 倒序
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(records)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, AnalysisStatus};
    use std::time::Duration;

    fn new_record(owner_id: i64, confidence: f64) -> NewAnalysisRecord {
        NewAnalysisRecord::completed(
            owner_id,
            format!("images/2024/01/01/{}.jpg", Uuid::new_v4()),
            AnalysisResult::Normal,
            confidence,
            None,
        )
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let repo = MemoryAnalysisRepository::new();
        let created = repo.create(new_record(1, 0.95)).await.unwrap();

        let fetched = repo.get_by_id(created.id, 1).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.result, AnalysisResult::Normal);
        assert_eq!(fetched.status, AnalysisStatus::Completed);
        assert_eq!(fetched.confidence, 0.95);
    }

    #[tokio::test]
    async fn test_get_by_other_owner_is_forbidden() {
        let repo = MemoryAnalysisRepository::new();
        let created = repo.create(new_record(1, 0.8)).await.unwrap();

        let err = repo.get_by_id(created.id, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
        // 错误信息不包含记录内容
        let message = err.to_string();
        assert!(!message.contains(&created.image_path));
        assert!(!message.contains("Normal"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let repo = MemoryAnalysisRepository::new();
        let err = repo.get_by_id(Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let repo = MemoryAnalysisRepository::new();
        let first = repo.create(new_record(5, 0.1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = repo.create(new_record(5, 0.2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        repo.create(new_record(6, 0.9)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let third = repo.create(new_record(5, 0.3)).await.unwrap();

        let records = repo.list_by_owner(5).await.unwrap();
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
        assert!(records.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_list_by_owner_without_records_is_empty() {
        let repo = MemoryAnalysisRepository::new();
        repo.create(new_record(1, 0.5)).await.unwrap();
        assert!(repo.list_by_owner(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_record() {
        let repo = MemoryAnalysisRepository::new();
        let mut request = new_record(1, 0.5);
        request.confidence = 1.5;
        assert!(repo.create(request).await.is_err());
        assert!(repo.is_empty().await);
    }
}
