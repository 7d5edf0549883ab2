//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::ActiveUser,
    error::AppError,
    middleware::AppState,
    models::user::{LoginRequest, RefreshRequest, RegisterRequest},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Form, Json};
use serde_json::json;
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// 登录（表单字段：username, password）
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(req): Form<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token_pair = state.auth_service.login(&req.username, &req.password).await?;

    Ok(Json(token_pair))
}

/// 刷新访问令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token_pair = state.auth_service.refresh(req.refresh_token.as_deref()).await?;

    Ok(Json(token_pair))
}

/// 获取当前（活跃）用户信息
pub async fn logout_me(ActiveUser(user): ActiveUser) -> Result<impl IntoResponse, AppError> {
    Ok(Json(json!({
        "sub": user.id,
        "email": user.email,
    })))
}
