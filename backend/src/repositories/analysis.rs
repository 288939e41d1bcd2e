use super::AnalysisStore;
use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::{AnalysisRecord, NewAnalysisRecord},
};
use uuid::Uuid;

/// 分析记录仓库（PostgreSQL）
#[derive(Clone, Debug)]
pub struct AnalysisRepository {
    db: Database,
}

impl AnalysisRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AnalysisRecord>> {
        let record = sqlx::query_as::<_, AnalysisRecord>(
            r#"
            SELECT id, owner_id, image_path, result, detail, confidence, status, created_at
            FROM analyses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(record)
    }
}

#[async_trait::async_trait]
impl AnalysisStore for AnalysisRepository {
    async fn create(&self, request: NewAnalysisRecord) -> AppResult<AnalysisRecord> {
        request.validate().map_err(AppError::validation)?;

        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let record = sqlx::query_as::<_, AnalysisRecord>(
            r#"
            INSERT INTO analyses (
                id, owner_id, image_path, result, detail, confidence, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, owner_id, image_path, result, detail, confidence, status, created_at
            "#,
        )
        .bind(id)
        .bind(request.owner_id)
        .bind(request.image_path)
        .bind(request.result)
        .bind(request.detail)
        .bind(request.confidence)
        .bind(request.status)
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;

        tracing::debug!(analysis_id = %record.id, owner_id = record.owner_id, "分析记录已写入");

        Ok(record)
    }

    async fn get_by_id(&self, id: Uuid, requester_id: i64) -> AppResult<AnalysisRecord> {
        let record = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("分析记录 {}", id)))?;

        if record.owner_id != requester_id {
            return Err(AppError::forbidden(format!("分析记录 {}", id)));
        }

        Ok(record)
    }

    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<AnalysisRecord>> {
        let records = sqlx::query_as::<_, AnalysisRecord>(
            r#"
            SELECT id, owner_id, image_path, result, detail, confidence, status, created_at
            FROM analyses
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(records)
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }
}
