use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 统一API响应格式
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// 业务响应码
    pub code: i32,
    /// 响应消息（中文）
    pub msg: String,
    /// 响应数据
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            code: ResponseCode::SUCCESS,
            msg: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, msg: String) -> Self {
        Self {
            code: ResponseCode::SUCCESS,
            msg,
            data: Some(data),
        }
    }

    /// 创建错误响应
    pub fn error(code: i32, msg: String) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg,
            data: None,
        }
    }

    /// 创建错误响应（带数据）
    pub fn error_with_data(code: i32, msg: String, data: T) -> Self {
        Self {
            code,
            msg,
            data: Some(data),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        // 根据业务响应码确定HTTP状态码
        let status = match self.code {
            ResponseCode::SUCCESS => StatusCode::OK,
            ResponseCode::BAD_REQUEST => StatusCode::BAD_REQUEST,
            ResponseCode::UNAUTHORIZED => StatusCode::UNAUTHORIZED,
            ResponseCode::FORBIDDEN => StatusCode::FORBIDDEN,
            ResponseCode::NOT_FOUND => StatusCode::NOT_FOUND,
            ResponseCode::FILE_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            ResponseCode::UNSUPPORTED_FILE_TYPE => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ResponseCode::INVALID_IMAGE => StatusCode::UNPROCESSABLE_ENTITY,
            ResponseCode::ASSESSMENT_UNAVAILABLE => StatusCode::BAD_GATEWAY,
            ResponseCode::SERVICE_UNAVAILABLE => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// 业务响应码常量
pub struct ResponseCode;

impl ResponseCode {
    /// 成功响应码
    pub const SUCCESS: i32 = 200;

    /// 客户端错误 4xx
    pub const BAD_REQUEST: i32 = 400;
    pub const UNAUTHORIZED: i32 = 401;
    pub const FORBIDDEN: i32 = 403;
    pub const NOT_FOUND: i32 = 404;
    pub const FILE_TOO_LARGE: i32 = 413;
    pub const UNSUPPORTED_FILE_TYPE: i32 = 415;
    pub const INVALID_IMAGE: i32 = 422;

    /// 服务器错误 5xx
    pub const INTERNAL_ERROR: i32 = 500;
    pub const ASSESSMENT_UNAVAILABLE: i32 = 502;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response() {
        let response = ApiResponse::success(json!({"id": 1, "result": "Normal"}));
        assert_eq!(response.code, 200);
        assert_eq!(response.msg, "操作成功");
        assert!(response.data.is_some());
    }

    #[test]
    fn test_error_response() {
        let response = ApiResponse::<()>::error(400, "测试错误".to_string());
        assert_eq!(response.code, 400);
        assert_eq!(response.msg, "测试错误");
        assert!(response.data.is_none());
    }

    #[test]
    fn test_code_matches_http_status() {
        for code in [
            ResponseCode::BAD_REQUEST,
            ResponseCode::UNAUTHORIZED,
            ResponseCode::FORBIDDEN,
            ResponseCode::NOT_FOUND,
            ResponseCode::FILE_TOO_LARGE,
            ResponseCode::UNSUPPORTED_FILE_TYPE,
            ResponseCode::INVALID_IMAGE,
            ResponseCode::INTERNAL_ERROR,
            ResponseCode::ASSESSMENT_UNAVAILABLE,
            ResponseCode::SERVICE_UNAVAILABLE,
        ] {
            let response = ApiResponse::<()>::error(code, "错误".to_string()).into_response();
            assert_eq!(i32::from(response.status().as_u16()), code);
        }
    }

    #[test]
    fn test_service_unavailable_status() {
        let response = ApiResponse::<()>::error(
            ResponseCode::SERVICE_UNAVAILABLE,
            "数据库服务不可用".to_string(),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
