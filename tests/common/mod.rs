//! 测试公共模块
//! 提供内存用户存储与测试应用状态

use async_trait::async_trait;
use auth_system::{
    auth::jwt::JwtService,
    auth::password::PasswordHasher,
    config::AppConfig,
    error::AppError,
    middleware::AppState,
    models::user::User,
    repository::user_repo::{UserLookup, UserStore},
    services::AuthService,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const PRIVATE_PEM: &str = include_str!("../keys/jwt-private.pem");
pub const PUBLIC_PEM: &str = include_str!("../keys/jwt-public.pem");

/// 内存用户存储（无数据库的测试替身）
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接插入一条用户记录（用于构造禁用账户等场景）
    pub async fn seed(&self, user: User) {
        self.users.write().await.push(user);
    }

    /// 将已有用户置为禁用
    pub async fn disable(&self, id: &Uuid) {
        if let Some(user) = self.users.write().await.iter_mut().find(|u| u.id == *id) {
            user.is_active = false;
            user.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl UserLookup for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.id == *id && u.deleted_at.is_none())
            .cloned())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let mut users = self.users.write().await;

        // 与数据库唯一索引一致：用户名和邮箱均唯一
        let duplicate = users.iter().any(|u| {
            u.username == username || (email.is_some() && u.email.as_deref() == email)
        });
        if duplicate {
            return Err(AppError::Duplicate(
                "username or email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.map(|s| s.to_string()),
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(user.clone());

        Ok(user)
    }
}

/// bcrypt 允许的最低成本，仅用于测试提速
const TEST_COST: u32 = 4;

/// 低成本哈希器，避免 bcrypt 默认成本拖慢测试
pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_cost(TEST_COST)
}

pub fn test_config() -> AppConfig {
    AppConfig::for_tests("unused", "unused")
}

pub fn test_jwt_service() -> Arc<JwtService> {
    Arc::new(
        JwtService::from_pem(PRIVATE_PEM.as_bytes(), PUBLIC_PEM.as_bytes(), &test_config())
            .expect("Failed to create JWT service"),
    )
}

/// 创建带内存存储的认证服务
pub fn test_auth_service(store: Arc<InMemoryUserStore>) -> Arc<AuthService> {
    Arc::new(AuthService::new(store, test_jwt_service()).with_hasher(fast_hasher()))
}

/// 创建测试应用状态（无数据库）
pub fn create_test_app_state() -> (Arc<AppState>, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::new());
    let jwt_service = test_jwt_service();
    let auth_service = Arc::new(
        AuthService::new(store.clone(), jwt_service.clone()).with_hasher(fast_hasher()),
    );

    let state = Arc::new(AppState {
        config: test_config(),
        db: None,
        users: store.clone(),
        auth_service,
        jwt_service,
    });

    (state, store)
}

/// 插入一条指定启用状态的用户记录，返回其 ID
pub async fn seed_user(
    store: &InMemoryUserStore,
    username: &str,
    password: &str,
    is_active: bool,
) -> Uuid {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: Some(format!("{}@example.com", username)),
        password_hash: fast_hasher().hash(password).expect("hash failed"),
        is_active,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    let id = user.id;
    store.seed(user).await;
    id
}
