pub mod analysis;
pub mod memory;

pub use analysis::AnalysisRepository;
pub use memory::MemoryAnalysisRepository;

use crate::{
    error::AppResult,
    models::{AnalysisRecord, NewAnalysisRecord},
};
use async_trait::async_trait;
use uuid::Uuid;

/// 分析记录存储抽象接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// 创建记录，分配ID与创建时间，原子写入
    async fn create(&self, request: NewAnalysisRecord) -> AppResult<AnalysisRecord>;

    /// 按ID获取记录，并校验所属用户
    async fn get_by_id(&self, id: Uuid, requester_id: i64) -> AppResult<AnalysisRecord>;

    /// 列出用户的全部记录，按创建时间倒序
    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<AnalysisRecord>>;

    /// 健康检查
    async fn health_check(&self) -> AppResult<bool>;
}
