use crate::handlers::{
    AppState, db_health_check, get_analysis, get_analysis_image, health_check, list_analyses,
    storage_health_check, system_status, upload_analysis,
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};

/// multipart 边界与表单头的额外开销
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// 创建API路由
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        // 健康检查与系统状态
        .route("/health", get(health_check))
        .route("/api/status", get(system_status))
        .route("/api/health/db", get(db_health_check))
        .route("/api/health/storage", get(storage_health_check))
        // 分析API
        .route("/api/analyses", get(list_analyses).post(upload_analysis)) // 历史记录 / 上传分析
        .route("/api/analyses/{id}", get(get_analysis)) // 获取单条记录
        .route("/api/analyses/{id}/image", get(get_analysis_image)) // 获取规范化图像
}

/// 创建带请求体大小限制的业务应用
pub fn create_app(app_state: AppState) -> Router {
    let body_limit = usize::try_from(app_state.config.file.max_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    create_api_routes()
        .layer(DefaultBodyLimit::max(body_limit)) // 设置请求体大小限制
        .with_state(app_state)
}
