use crate::{
    auth::CurrentUser,
    config::Config,
    error::AppError,
    image_processing::{NORMALIZED_MEDIA_TYPE, UploadValidator},
    models::{AnalysisRecord, AnalysisResult, AnalysisStatus},
    repositories::AnalysisStore,
    response::ApiResponse,
    services::AnalysisPipeline,
    storage::{LocalStorage, Storage, dated_key},
};
use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// 上传暂存文件的前缀
pub const UPLOAD_PREFIX: &str = "uploads";

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub store: Option<Arc<dyn AnalysisStore>>,
    pub storage: Option<Arc<LocalStorage>>,
    pub pipeline: Option<AnalysisPipeline>,
    pub validator: UploadValidator,
    pub config: Config,
}

/// 上传分析响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// 新建分析记录的ID
    pub analysis_id: Uuid,
    /// 分析结论
    pub result: AnalysisResult,
    /// 置信度，范围 [0, 1]
    pub confidence: f64,
    /// 记录状态
    pub status: AnalysisStatus,
    /// 解析备注
    pub detail: Option<String>,
}

impl From<&AnalysisRecord> for UploadResponse {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            analysis_id: record.id,
            result: record.result,
            confidence: record.confidence,
            status: record.status,
            detail: record.detail.clone(),
        }
    }
}

/// 上传口腔照片并分析
///
/// multipart 字段 `file`，仅支持PNG/JPEG。图像经规范化后发送给视觉模型，
/// 解析结果写入分析记录并返回。
#[utoipa::path(
    post,
    path = "/api/analyses",
    tag = "analyses",
    params(("X-User-Id" = i64, Header, description = "上游认证层写入的用户ID")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "字段 file：PNG或JPEG图像"),
    responses(
        (status = 200, description = "分析完成", body = UploadResponse),
        (status = 400, description = "请求参数错误"),
        (status = 401, description = "未认证"),
        (status = 413, description = "文件过大"),
        (status = 415, description = "不支持的文件类型"),
        (status = 422, description = "图像无法解析"),
        (status = 502, description = "图像分析服务不可用"),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn upload_analysis(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, AppError> {
    // 检查必要的服务是否可用
    let storage = app_state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("存储服务不可用"))?;
    let pipeline = app_state
        .pipeline
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("图像分析服务不可用"))?;
    let max_size = app_state.validator.max_size();

    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    // 解析multipart数据
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_size))?
                    .to_vec(),
            );
        }
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("缺少文件数据"))?;
    let filename = filename.ok_or_else(|| AppError::bad_request("缺少文件名"))?;

    // 验证通过之前不会访问存储或远程服务
    let upload = app_state.validator.validate_upload(&file_data, &filename)?;

    let staged_key = dated_key(UPLOAD_PREFIX, Uuid::new_v4(), &upload.extension);
    storage
        .upload(&staged_key, &file_data, Some(upload.mime_type.as_str()))
        .await?;
    drop(file_data);

    let outcome = pipeline.analyze(user_id, &staged_key).await;

    // 无论成败都清理暂存文件
    if let Err(e) = storage.delete(&staged_key).await {
        tracing::warn!("清理暂存文件失败: {} ({})", staged_key, e);
    }

    let record = outcome?;

    tracing::info!(
        "用户 {} 上传 {} 分析完成: {} ({:.2})",
        user_id,
        filename,
        record.result,
        record.confidence
    );

    Ok(Json(ApiResponse::success(UploadResponse::from(&record))))
}

fn multipart_error(e: MultipartError, max_size: u64) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::file_too_large(max_size)
    } else {
        AppError::bad_request(format!("文件上传失败: {}", e.body_text()))
    }
}

/// 查询当前用户的分析历史（按创建时间倒序）
#[utoipa::path(
    get,
    path = "/api/analyses",
    tag = "analyses",
    params(("X-User-Id" = i64, Header, description = "上游认证层写入的用户ID")),
    responses(
        (status = 200, description = "查询成功", body = Vec<AnalysisRecord>),
        (status = 401, description = "未认证"),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn list_analyses(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<Vec<AnalysisRecord>>>, AppError> {
    let store = app_state
        .store
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("数据库服务不可用"))?;

    let records = store.list_by_owner(user_id).await?;

    Ok(Json(ApiResponse::success(records)))
}

/// 获取单条分析记录
#[utoipa::path(
    get,
    path = "/api/analyses/{id}",
    tag = "analyses",
    params(
        ("id" = Uuid, Path, description = "分析记录ID"),
        ("X-User-Id" = i64, Header, description = "上游认证层写入的用户ID")
    ),
    responses(
        (status = 200, description = "查询成功", body = AnalysisRecord),
        (status = 401, description = "未认证"),
        (status = 403, description = "无权访问"),
        (status = 404, description = "记录不存在")
    )
)]
pub async fn get_analysis(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(analysis_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AnalysisRecord>>, AppError> {
    let store = app_state
        .store
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("数据库服务不可用"))?;

    let record = store.get_by_id(analysis_id, user_id).await?;

    Ok(Json(ApiResponse::success(record)))
}

/// 获取分析记录对应的规范化图像
#[utoipa::path(
    get,
    path = "/api/analyses/{id}/image",
    tag = "analyses",
    params(
        ("id" = Uuid, Path, description = "分析记录ID"),
        ("X-User-Id" = i64, Header, description = "上游认证层写入的用户ID")
    ),
    responses(
        (status = 200, description = "规范化后的JPEG图像（image/jpeg）"),
        (status = 401, description = "未认证"),
        (status = 403, description = "无权访问"),
        (status = 404, description = "记录或图像不存在")
    )
)]
pub async fn get_analysis_image(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(analysis_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let store = app_state
        .store
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("数据库服务不可用"))?;
    let storage = app_state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("存储服务不可用"))?;

    let record = store.get_by_id(analysis_id, user_id).await?;
    let image = storage.download(&record.image_path).await?;

    tracing::debug!("读取分析图像: {} ({} 字节)", analysis_id, image.len());

    Ok((
        [
            (header::CONTENT_TYPE, NORMALIZED_MEDIA_TYPE),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        image,
    )
        .into_response())
}
