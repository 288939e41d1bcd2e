use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{AssessmentClient, ResponseInterpreter};
use crate::{
    error::AppResult,
    image_processing::{ImageNormalizer, NORMALIZED_EXTENSION, NORMALIZED_MEDIA_TYPE},
    models::AnalysisRecord,
    repositories::AnalysisStore,
    storage::{Storage, dated_key},
};

/// 规范化图像在存储中的前缀
pub const IMAGE_PREFIX: &str = "images";

/// 分析流水线：规范化 → 远程评估 → 解释 → 保存图像 → 写入记录
///
/// 规范化或远程评估失败时直接返回错误，不产生任何记录。
/// 记录写入失败时会删除已保存的规范化图像。
#[derive(Clone)]
pub struct AnalysisPipeline {
    normalizer: ImageNormalizer,
    client: Arc<dyn AssessmentClient>,
    interpreter: ResponseInterpreter,
    storage: Arc<dyn Storage>,
    store: Arc<dyn AnalysisStore>,
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

impl AnalysisPipeline {
    pub fn new(
        normalizer: ImageNormalizer,
        client: Arc<dyn AssessmentClient>,
        storage: Arc<dyn Storage>,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            normalizer,
            client,
            interpreter: ResponseInterpreter::new(),
            storage,
            store,
        }
    }

    /// 对已暂存的上传文件执行完整分析，返回写入的记录
    pub async fn analyze(&self, owner_id: i64, staged_key: &str) -> AppResult<AnalysisRecord> {
        // 1. 规范化
        let source = self.storage.resolve(staged_key)?;
        let image = self.normalizer.normalize_file(&source).await?;
        info!(
            owner_id,
            width = image.width,
            height = image.height,
            resized = image.was_resized(),
            "图像规范化完成: {}",
            staged_key
        );

        // 2. 远程评估
        let raw = self.client.assess(&image).await?;

        // 3. 解释回复
        let interpretation = self.interpreter.interpret(&raw);
        info!(
            owner_id,
            result = %interpretation.result,
            confidence = interpretation.confidence,
            status = %interpretation.status,
            "模型回复解析完成"
        );

        // 4. 保存规范化图像
        let image_key = dated_key(IMAGE_PREFIX, Uuid::new_v4(), NORMALIZED_EXTENSION);
        let image_path = self
            .storage
            .upload(&image_key, &image.bytes, Some(NORMALIZED_MEDIA_TYPE))
            .await?;

        // 5. 写入记录
        let request = interpretation.into_record(owner_id, image_path.clone());
        match self.store.create(request).await {
            Ok(record) => {
                info!(owner_id, analysis_id = %record.id, "分析记录已保存");
                Ok(record)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&image_path).await {
                    warn!("清理规范化图像失败: {} ({})", image_path, cleanup);
                }
                Err(e)
            }
        }
    }
}
