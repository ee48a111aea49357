//! Registration, church login and token verification.

mod common;

use church_admin::domain::RoleCode;
use church_admin::errors::AppError;
use church_admin::services::{Registration, ServiceContainer};

use common::{client, seeded_app, SUPER_ADMIN_PASSWORD};

fn registration(prefix: &str) -> Registration {
    Registration {
        email_prefix: prefix.to_string(),
        password: "securepassword123".to_string(),
        password_confirm: "securepassword123".to_string(),
        first_name: "Juan".to_string(),
        last_name: "Dela Cruz".to_string(),
        phone_number: None,
        source: Some("Friend invite".to_string()),
    }
}

#[tokio::test]
async fn test_register_composes_church_email() {
    let app = seeded_app().await;

    let user = app
        .services
        .auth()
        .register("kasiglahan", registration("JuanDC"), client())
        .await
        .unwrap();
    assert_eq!(user.email, "juandc@kasiglahan.jcsgo.com");
    assert_eq!(user.role, RoleCode::NewFriend);
    assert_eq!(user.church_id, app.church("kasiglahan").await.id);

    let err = app
        .services
        .auth()
        .register("kasiglahan", registration("juandc"), client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey(_)));
}

#[tokio::test]
async fn test_register_rejects_mismatched_confirmation() {
    let app = seeded_app().await;
    let mut form = registration("pedro");
    form.password_confirm = "differentpassword".to_string();

    let err = app
        .services
        .auth()
        .register("tabak", form, client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_login_by_prefix_and_token_round_trip() {
    let app = seeded_app().await;
    let auth = app.services.auth();
    auth.register("tabak", registration("maria"), client())
        .await
        .unwrap();

    let token = auth
        .login("tabak", "maria", "securepassword123", client())
        .await
        .unwrap();
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.user.email, "maria@tabak.jcsgo.com");

    let claims = auth.verify_token(&token.access_token).unwrap();
    assert_eq!(claims.email, "maria@tabak.jcsgo.com");
    assert_eq!(claims.role, RoleCode::NewFriend);
    assert_eq!(claims.church_id, app.church("tabak").await.id);
}

#[tokio::test]
async fn test_login_to_wrong_church_is_denied() {
    let app = seeded_app().await;
    let auth = app.services.auth();
    auth.register("tabak", registration("rosa"), client())
        .await
        .unwrap();

    let err = auth
        .login("sanjose", "rosa@tabak.jcsgo.com", "securepassword123", client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = auth
        .login("tabak", "rosa", "wrong-password", client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn test_locked_setup_accounts_cannot_log_in() {
    let app = seeded_app().await;

    let err = app
        .services
        .auth()
        .login("tabak", "admin", "", client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn test_super_admin_login() {
    let app = seeded_app().await;
    let auth = app.services.auth();

    let token = auth
        .super_admin_login("superadmin@kasiglahan.jcsgo.com", SUPER_ADMIN_PASSWORD, client())
        .await
        .unwrap();
    assert_eq!(token.user.role, RoleCode::SuperAdmin);

    // Super admins may also sign in through any church
    let token = auth
        .login("sanjose", "superadmin@kasiglahan.jcsgo.com", SUPER_ADMIN_PASSWORD, client())
        .await
        .unwrap();
    assert_eq!(token.user.role, RoleCode::SuperAdmin);
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let app = seeded_app().await;

    assert!(app.services.auth().verify_token("not-a-token").is_err());
}

#[tokio::test]
async fn test_setup_is_idempotent() {
    let app = seeded_app().await;

    let report = app
        .services
        .setup()
        .run(Default::default())
        .await
        .unwrap();
    assert_eq!(report.roles_created, 0);
    assert_eq!(report.churches_created, 0);
    assert!(report.accounts_created.is_empty());

    assert_eq!(app.services.setup().update_locations().await.unwrap(), 6);
}
