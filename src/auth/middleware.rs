//! JWT 认证中间件
//!
//! 从 Authorization 头提取 Bearer 令牌，解码并把 `sub` 解析为用户记录。
//! 解码层的所有失败（签名、过期、claim）在这里统一折叠为 401。

use crate::{error::AppError, middleware::AppState, models::user::AuthenticatedUser};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .ok_or(AppError::Unauthorized)
}

/// JWT 认证中间件 - 必须认证
///
/// 成功后把 `AuthenticatedUser` 附加到请求扩展；
/// 账户是否启用在提取器层面检查（见 `ActiveUser`）。
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 从 Authorization 头提取令牌
    let token = extract_token(req.headers())?;

    // 验证访问令牌（刷新令牌与其他 TokenError 一律 -> Unauthorized）
    let claims = state.jwt_service.decode_access_token(&token)?;

    // 将 sub 解析为用户记录
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // 附加到请求扩展
    req.extensions_mut()
        .insert(AuthenticatedUser::from(user));

    Ok(next.run(req).await)
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthenticatedUser
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 活跃用户门禁
///
/// 在认证之上要求账户处于启用状态；被禁用的账户返回 403。
#[derive(Debug, Clone)]
pub struct ActiveUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for ActiveUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_active {
            return Err(AppError::Forbidden);
        }

        Ok(ActiveUser(user))
    }
}
