//! 认证服务集成测试（内存用户存储）

mod common;

use auth_system::{error::AppError, models::user::RegisterRequest};
use common::{create_test_app_state, seed_user, test_auth_service, InMemoryUserStore};
use std::sync::Arc;

fn register_request(username: &str, password: &str, email: Option<&str>) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        password: password.to_string(),
        email: email.map(|s| s.to_string()),
    }
}

#[tokio::test]
async fn test_register_and_login_round_trip() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());

    let user = service
        .register(register_request("alice", "pw12345", Some("alice@example.com")))
        .await
        .expect("registration should succeed");

    assert_eq!(user.username, "alice");
    assert!(user.is_active);

    let pair = service.login("alice", "pw12345").await.expect("login should succeed");

    assert_eq!(pair.token_type, "bearer");
    assert!(!pair.access_token.is_empty());
    assert!(pair.refresh_token.is_some());
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());

    service
        .register(register_request("alice", "pw12345", None))
        .await
        .unwrap();

    let result = service.login("alice", "wrong-password").await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_login_unknown_user_is_indistinguishable() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());

    service
        .register(register_request("alice", "pw12345", None))
        .await
        .unwrap();

    // 未知用户与密码错误必须返回同一个错误
    let unknown = service.login("nobody", "pw12345").await.unwrap_err();
    let wrong_pw = service.login("alice", "wrong-password").await.unwrap_err();

    assert!(matches!(unknown, AppError::Unauthorized));
    assert!(matches!(wrong_pw, AppError::Unauthorized));
    assert_eq!(unknown.user_message(), wrong_pw.user_message());
}

#[tokio::test]
async fn test_login_disabled_account_is_forbidden() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());

    seed_user(&store, "bob", "pw12345", false).await;

    // 密码正确但账户禁用：403 而不是 401
    let result = service.login("bob", "pw12345").await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    // 密码错误时禁用状态不可见，仍然是 401
    let result = service.login("bob", "wrong-password").await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());

    service
        .register(register_request("alice", "pw12345", Some("alice@example.com")))
        .await
        .unwrap();

    let result = service
        .register(register_request("alice", "other-pw", Some("other@example.com")))
        .await;
    assert!(matches!(result, Err(AppError::Duplicate(_))));

    // 原记录未被改动：旧密码仍然有效
    assert!(service.login("alice", "pw12345").await.is_ok());
    assert!(service.login("alice", "other-pw").await.is_err());
}

#[tokio::test]
async fn test_register_rejects_invalid_username() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());

    let result = service.register(register_request("al", "pw12345", None)).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = service
        .register(register_request(&"a".repeat(21), "pw12345", None))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_register_rejects_over_long_password() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());

    let result = service
        .register(register_request("alice", &"p".repeat(73), None))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_refresh_requires_token() {
    let (state, _) = create_test_app_state();

    let result = state.auth_service.refresh(None).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());

    seed_user(&store, "alice", "pw12345", true).await;
    let pair = service.login("alice", "pw12345").await.unwrap();

    // 3 分钟的访问令牌不能给自己无限续期
    let result = service.refresh(Some(&pair.access_token)).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_refresh_rejects_garbage_token() {
    let (state, _) = create_test_app_state();

    let result = state.auth_service.refresh(Some("not.a.token")).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_full_scenario_register_login_refresh() {
    let store = Arc::new(InMemoryUserStore::new());
    let service = test_auth_service(store.clone());
    let jwt = common::test_jwt_service();

    let registered = service
        .register(register_request("alice", "pw12345", Some("alice@example.com")))
        .await
        .unwrap();

    let pair = service.login("alice", "pw12345").await.unwrap();
    assert_eq!(pair.token_type, "bearer");

    // 访问令牌的 sub 是注册时分配的用户 ID
    let access_claims = jwt.decode(&pair.access_token).unwrap();
    assert_eq!(access_claims.sub, registered.id.to_string());
    assert_eq!(access_claims.name.as_deref(), Some("alice"));
    assert_eq!(access_claims.email.as_deref(), Some("alice@example.com"));

    // 刷新令牌只携带 sub
    let refresh_token = pair.refresh_token.unwrap();
    let refresh_claims = jwt.decode(&refresh_token).unwrap();
    assert_eq!(refresh_claims.sub, registered.id.to_string());
    assert!(refresh_claims.name.is_none());

    // iat 以秒为粒度，等待跨过秒界再刷新
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let refreshed = service.refresh(Some(&refresh_token)).await.unwrap();
    assert_eq!(refreshed.token_type, "bearer");
    assert!(refreshed.refresh_token.is_none());

    let new_claims = jwt.decode(&refreshed.access_token).unwrap();
    assert_eq!(new_claims.sub, registered.id.to_string());
    assert!(new_claims.iat > access_claims.iat);
}
