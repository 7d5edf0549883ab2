//! User repository (数据库访问层)
//!
//! 用户查找/写入通过显式的能力 trait 注入服务层，
//! 测试可以替换为内存实现（见 tests/common）。

use crate::{error::AppError, models::user::User};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// 用户查找能力（登录校验与令牌主体解析使用）
///
/// 未找到时返回 None，而不是错误。
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;
}

/// 用户写入能力（仅注册使用）
#[async_trait]
pub trait UserStore: UserLookup {
    /// 插入新用户；用户名或邮箱冲突时返回 `AppError::Duplicate`
    async fn insert(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> Result<User, AppError>;
}

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserLookup for UserRepository {
    /// 根据用户名查找用户（忽略软删除记录）
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 根据 ID 查找用户（忽略软删除记录）
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// 创建用户
    ///
    /// 唯一约束冲突（用户名/邮箱）直接转换为 Duplicate 错误，
    /// 不会留下部分写入。
    async fn insert(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Duplicate("username or email already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(user)
    }
}
