//! 认证服务：注册、凭证校验、令牌签发与刷新

use crate::{
    auth::jwt::{JwtService, TokenPair},
    auth::password::PasswordHasher,
    error::AppError,
    models::user::{AuthenticatedUser, RegisterRequest, UserResponse},
    repository::user_repo::UserStore,
};
use std::sync::Arc;
use validator::Validate;

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: Arc<JwtService>,
    hasher: Arc<PasswordHasher>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            users,
            jwt_service,
            hasher: Arc::new(PasswordHasher::new()),
        }
    }

    /// 测试使用低成本哈希器，避免 bcrypt 默认成本拖慢测试
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// 注册新用户
    ///
    /// 用户名/邮箱冲突由存储层以 Duplicate 错误上抛（HTTP 400），
    /// 不会产生部分写入。
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        // bcrypt 是 CPU 密集操作，移出异步工作线程
        let hasher = self.hasher.clone();
        let password = req.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))??;

        let user = self
            .users
            .insert(&req.username, req.email.as_deref(), &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(UserResponse::from(user))
    }

    /// 校验用户名/密码，返回认证后的用户标识
    ///
    /// 检查顺序固定：存在性 → 密码 → 启用状态。
    /// 「用户不存在」与「密码错误」对外不可区分（防止用户名枚举）；
    /// 启用状态只在密码匹配之后检查，因此「账户被禁用」只会
    /// 暴露给已持有正确密码的调用方。
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AppError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        let password_ok =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
                .await
                .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?;

        if !password_ok {
            tracing::debug!(username = %username, "Password mismatch");
            return Err(AppError::Unauthorized);
        }

        if !user.is_active {
            tracing::debug!(username = %username, "Account disabled");
            return Err(AppError::Forbidden);
        }

        Ok(AuthenticatedUser::from(user))
    }

    /// 用户登录：校验凭证并签发访问/刷新令牌对
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self.validate_credentials(username, password).await?;

        let token_pair = self.jwt_service.generate_token_pair(&user)?;

        tracing::info!(user_id = %user.id, "Login succeeded");

        Ok(token_pair)
    }

    /// 刷新访问令牌
    ///
    /// 刷新令牌是必填项；解码失败、令牌类型不符与凭证失败一样返回 401
    /// （访问令牌不能给自己续期）。本服务不持久化刷新令牌，已签发的
    /// 刷新令牌在自然过期前始终有效（没有撤销通道）。
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, AppError> {
        let refresh_token = refresh_token.ok_or(AppError::Unauthorized)?;

        let claims = self.jwt_service.decode_refresh_token(refresh_token)?;

        // 以解码出的主体（以及携带的 name/email，如有）重新签发访问令牌
        let access_token = self.jwt_service.reissue_access_token(&claims)?;

        tracing::debug!(sub = %claims.sub, "Access token reissued");

        Ok(TokenPair::bearer(access_token, None))
    }
}
