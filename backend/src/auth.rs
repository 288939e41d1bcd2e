use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};

/// 上游认证层写入的用户ID请求头
pub const USER_ID_HEADER: &str = "X-User-Id";

/// 当前请求的用户
///
/// 认证由前置网关完成，本服务只信任 `X-User-Id` 请求头。
/// 请求头缺失或不是正整数时返回 401。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
