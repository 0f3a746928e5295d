mod common;

use std::time::Duration;

use gatepass_api::auth::{
    AuthConfig, AuthError, AuthService, Capability, CreateUserRequest, LoginRequest, Role,
};

use common::setup_db;

fn auth_service(db: &std::sync::Arc<sea_orm::DatabaseConnection>) -> AuthService {
    AuthService::new(
        AuthConfig {
            jwt_secret: "integration-test-secret-key-that-is-long-enough".to_string(),
            token_expiration: Duration::from_secs(3600),
        },
        db.clone(),
    )
}

#[tokio::test]
async fn login_issues_a_token_that_round_trips() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    auth.create_user(CreateUserRequest {
        username: "quarry-manager".to_string(),
        password: "a-strong-password".to_string(),
        role: Role::Manager,
    })
    .await
    .unwrap();

    let login = auth
        .login(LoginRequest {
            username: "quarry-manager".to_string(),
            password: "a-strong-password".to_string(),
        })
        .await
        .expect("login should succeed");
    assert_eq!(login.role, Role::Manager);
    assert_eq!(login.token_type, "Bearer");

    let user = auth
        .validate_token(&login.access_token)
        .expect("token should validate");
    assert_eq!(user.username, "quarry-manager");
    assert!(user.can(Capability::CreateInvoices));
    assert!(!user.can(Capability::ManageUsers));
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_rejected_alike() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    auth.create_user(CreateUserRequest {
        username: "operator".to_string(),
        password: "correct-password".to_string(),
        role: Role::Operator,
    })
    .await
    .unwrap();

    let err = auth
        .login(LoginRequest {
            username: "operator".to_string(),
            password: "wrong-password".to_string(),
        })
        .await
        .expect_err("wrong password must fail");
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = auth
        .login(LoginRequest {
            username: "nobody".to_string(),
            password: "whatever-password".to_string(),
        })
        .await
        .expect_err("unknown user must fail");
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let db = setup_db().await;
    let auth = auth_service(&db);
    assert!(matches!(
        auth.validate_token("not-a-jwt"),
        Err(AuthError::InvalidToken)
    ));
}

#[tokio::test]
async fn viewer_capability_gate_forbids_writes() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    auth.create_user(CreateUserRequest {
        username: "auditor".to_string(),
        password: "read-only-password".to_string(),
        role: Role::Viewer,
    })
    .await
    .unwrap();
    let login = auth
        .login(LoginRequest {
            username: "auditor".to_string(),
            password: "read-only-password".to_string(),
        })
        .await
        .unwrap();
    let user = auth.validate_token(&login.access_token).unwrap();

    assert!(user.require(Capability::ViewBlocks).is_ok());
    assert!(user.require(Capability::CreateBlocks).is_err());
}

#[tokio::test]
async fn bootstrap_admin_is_created_once() {
    let db = setup_db().await;
    let auth = auth_service(&db);

    auth.ensure_bootstrap_admin("admin", "bootstrap-password")
        .await
        .unwrap();
    // Second call is a no-op, not a duplicate-username conflict.
    auth.ensure_bootstrap_admin("admin", "bootstrap-password")
        .await
        .unwrap();

    let users = auth.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role, Role::Admin);
}
