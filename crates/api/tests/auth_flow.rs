//! Registration, login, and password change flows.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use store_ratings_core::Role;

use store_ratings_api::db::{Gateway, MemoryGateway};
use store_ratings_api::services::auth::RegisterInput;
use store_ratings_api::services::{AuthError, AuthService};

fn service() -> (Arc<MemoryGateway>, AuthService) {
    let gateway = Arc::new(MemoryGateway::new());
    let service = AuthService::new(Arc::clone(&gateway) as Arc<dyn Gateway>);
    (gateway, service)
}

fn valid_input() -> RegisterInput {
    RegisterInput {
        name: "Registration Test Account".to_owned(),
        email: "register@example.com".to_owned(),
        address: "1 Signup Street".to_owned(),
        password: "Valid$ecret1".to_owned(),
        role: None,
    }
}

#[tokio::test]
async fn register_then_login_roundtrip() {
    let (_gateway, service) = service();

    let user = service.register(valid_input()).await.unwrap();
    assert_eq!(user.role, Role::User);

    let logged_in = service
        .login("register@example.com", "Valid$ecret1")
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let (_gateway, service) = service();
    service.register(valid_input()).await.unwrap();

    let result = service.login("register@example.com", "Wrong$ecret1").await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn login_with_unknown_email_fails_identically() {
    let (_gateway, service) = service();

    let result = service.login("nobody@example.com", "Valid$ecret1").await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (_gateway, service) = service();
    service.register(valid_input()).await.unwrap();

    let mut again = valid_input();
    again.name = "Registration Test Account Two".to_owned();
    let result = service.register(again).await;
    assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
}

#[tokio::test]
async fn weak_passwords_are_rejected() {
    let (_gateway, service) = service();

    for password in ["short", "nouppercase$1", "NoSpecialChar1", "Ab$1"] {
        let mut input = valid_input();
        input.password = password.to_owned();
        let result = service.register(input).await;
        assert!(
            matches!(result, Err(AuthError::InvalidInput(_))),
            "expected rejection for {password:?}"
        );
    }
}

#[tokio::test]
async fn short_names_are_rejected() {
    let (_gateway, service) = service();

    let mut input = valid_input();
    input.name = "Too Short".to_owned();
    let result = service.register(input).await;
    assert!(matches!(result, Err(AuthError::InvalidInput(_))));
}

#[tokio::test]
async fn admin_role_cannot_self_register() {
    let (_gateway, service) = service();

    let mut input = valid_input();
    input.role = Some(Role::Admin);
    let result = service.register(input).await;
    assert!(matches!(result, Err(AuthError::InvalidInput(_))));
}

#[tokio::test]
async fn store_owner_role_may_self_register() {
    let (_gateway, service) = service();

    let mut input = valid_input();
    input.role = Some(Role::StoreOwner);
    let user = service.register(input).await.unwrap();
    assert_eq!(user.role, Role::StoreOwner);
}

#[tokio::test]
async fn password_change_requires_the_current_password() {
    let (_gateway, service) = service();
    let user = service.register(valid_input()).await.unwrap();

    let result = service
        .update_password(user.id, "Wrong$ecret1", "Fresh$ecret2")
        .await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));

    service
        .update_password(user.id, "Valid$ecret1", "Fresh$ecret2")
        .await
        .unwrap();

    // Old password no longer works, new one does
    assert!(service
        .login("register@example.com", "Valid$ecret1")
        .await
        .is_err());
    assert!(service
        .login("register@example.com", "Fresh$ecret2")
        .await
        .is_ok());
}
