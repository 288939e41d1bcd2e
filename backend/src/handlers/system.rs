use crate::{
    handlers::analysis::AppState,
    response::{ApiResponse, ResponseCode},
};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub detail: bool,
}

fn availability(available: bool) -> &'static str {
    if available { "available" } else { "unavailable" }
}

/// 系统状态检查
pub async fn system_status(
    State(app_state): State<AppState>,
) -> Json<ApiResponse<serde_json::Value>> {
    let mut status = HashMap::new();

    status.insert("database", availability(app_state.store.is_some()));
    status.insert("storage", availability(app_state.storage.is_some()));
    status.insert("assessment", availability(app_state.pipeline.is_some()));

    Json(ApiResponse::success(serde_json::json!(status)))
}

/// 健康检查
pub async fn health_check(Query(params): Query<HealthQuery>) -> Json<ApiResponse<serde_json::Value>> {
    if params.detail {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let mut details = HashMap::new();
        details.insert("status", "healthy");
        details.insert("version", env!("CARGO_PKG_VERSION"));
        details.insert("timestamp", timestamp.as_str());

        Json(ApiResponse::success(serde_json::json!(details)))
    } else {
        Json(ApiResponse::success(serde_json::json!({"status": "ok"})))
    }
}

/// 记录存储健康检查
pub async fn db_health_check(
    State(app_state): State<AppState>,
) -> ApiResponse<serde_json::Value> {
    match &app_state.store {
        Some(store) => match store.health_check().await {
            Ok(true) => {
                let timestamp = chrono::Utc::now().to_rfc3339();
                let mut details = HashMap::new();
                details.insert("database", "healthy");
                details.insert("timestamp", timestamp.as_str());
                ApiResponse::success(serde_json::json!(details))
            }
            Ok(false) => ApiResponse::error_with_data(
                ResponseCode::SERVICE_UNAVAILABLE,
                "数据库连接异常".to_string(),
                serde_json::json!({"status": "unhealthy"}),
            ),
            Err(e) => {
                tracing::error!("数据库健康检查失败: {}", e);
                ApiResponse::error_with_data(
                    ResponseCode::SERVICE_UNAVAILABLE,
                    format!("数据库健康检查失败: {}", e),
                    serde_json::json!({"status": "error"}),
                )
            }
        },
        None => ApiResponse::error_with_data(
            ResponseCode::SERVICE_UNAVAILABLE,
            "数据库未配置或连接失败".to_string(),
            serde_json::json!({"status": "unavailable"}),
        ),
    }
}

/// 存储健康检查
pub async fn storage_health_check(
    State(app_state): State<AppState>,
) -> ApiResponse<serde_json::Value> {
    match &app_state.storage {
        Some(storage) => match storage.health_check().await {
            Ok(true) => ApiResponse::success(serde_json::json!({
                "storage": "healthy",
                "root": storage.root().display().to_string(),
            })),
            _ => ApiResponse::error_with_data(
                ResponseCode::SERVICE_UNAVAILABLE,
                "存储目录不可访问".to_string(),
                serde_json::json!({"status": "unhealthy"}),
            ),
        },
        None => ApiResponse::error_with_data(
            ResponseCode::SERVICE_UNAVAILABLE,
            "存储服务未配置".to_string(),
            serde_json::json!({"status": "unavailable"}),
        ),
    }
}
