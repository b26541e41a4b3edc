use bizdesk_shared::{
    errors::DeskError,
    req_args::{BranchLoginReqArgs, SignUpReqArgs},
    uac::{AuthError, CapabilityError, IdentityKind, Role, ValidationError},
};
use secrecy::SecretString;

use crate::helpers::{spawn_app, Failure, Rendered, MSG_INVALID_LOGIN};

fn sign_up_args(email: &str, password: &str, password_check: &str) -> SignUpReqArgs {
    SignUpReqArgs {
        email: email.to_string(),
        password: SecretString::from(password.to_string()),
        password_check: SecretString::from(password_check.to_string()),
        full_name: "New Owner".try_into().unwrap(),
    }
}

#[tokio::test]
async fn admin_login_lands_on_home() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;

    // Act
    app.login_admin().await.unwrap();

    // Assert
    let viewer = app.ctx.session().viewer().unwrap();
    assert_eq!(viewer.kind, IdentityKind::Enterprise);
    assert_eq!(viewer.role, Role::EnterpriseAdmin);
    assert_eq!(viewer.enterprise_id, app.admin.enterprise_id);
    assert_eq!(app.current_page(), "home");
    assert_eq!(app.stack(), ["home"]);
    assert_eq!(app.last_page_rendered(), Some("home"));
}

#[tokio::test]
async fn admin_login_rejection_is_shown_verbatim() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;
    let args = app
        .admin
        .login_args()
        .password(SecretString::from("not-the-password".to_string()));

    // Act
    let err = app.ctx.login(args).await.unwrap_err();

    // Assert
    assert_eq!(err.to_string(), MSG_INVALID_LOGIN);
    assert!(matches!(err, DeskError::Auth(AuthError::Rejected(_))));
    assert!(!app.ctx.session().is_logged_in());
}

#[tokio::test]
async fn admin_login_replaces_branch_session_and_purges_token() {
    // Arrange
    let mut app = spawn_app();
    app.store_branch_token(app.branch.token.expose());
    app.start().await;
    assert_eq!(
        app.ctx.session().identity().unwrap().kind(),
        IdentityKind::Branch
    );

    // Act
    app.login_admin().await.unwrap();

    // Assert
    assert_eq!(
        app.ctx.session().identity().unwrap().kind(),
        IdentityKind::Enterprise
    );
    assert_eq!(app.stored_branch_token(), None);
    assert!(app.backend.branch_token_header().is_none());
}

#[tokio::test]
async fn admin_without_profile_is_signed_in_but_sees_entry_view() {
    // Arrange
    let mut app = spawn_app();
    app.backend.remove_profile(app.admin.user_id);
    app.start().await;

    // Act
    app.login_admin().await.unwrap();

    // Assert
    assert!(app.ctx.session().is_logged_in());
    assert!(app.ctx.session().viewer().is_none());
    assert!(matches!(app.last_rendered(), Some(Rendered::Entry { .. })));
}

#[tokio::test]
async fn branch_login_stores_token_and_lands_on_home() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;

    // Act
    app.login_branch().await.unwrap();

    // Assert
    let identity = app.ctx.session().identity().unwrap();
    assert_eq!(identity.as_branch().unwrap().branch.id, app.branch.branch.id);
    assert_eq!(
        app.stored_branch_token().as_deref(),
        Some(app.branch.token.expose())
    );
    assert_eq!(app.backend.branch_token_header(), Some(app.branch.token.clone()));
    assert!(!app.ctx.session().settings().unwrap().has_security_pin);
    assert_eq!(
        app.last_rendered(),
        Some(&Rendered::Page {
            page: "home".try_into().unwrap(),
            kind: IdentityKind::Branch,
            full_name: "Harbour".to_string(),
            theme: "dark".try_into().unwrap(),
            currency: "GBP".to_string(),
        })
    );
}

#[tokio::test]
async fn branch_login_failure_is_generic() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;
    let args = BranchLoginReqArgs::new(
        app.branch.login_id.clone(),
        SecretString::from("wrong-password".to_string()),
    );

    // Act
    let err = app.ctx.login_branch(args).await.unwrap_err();

    // Assert
    assert_eq!(err.to_string(), AuthError::InvalidBranchCredentials.to_string());
    assert!(!err.to_string().contains(&app.branch.login_id));
    assert_eq!(app.stored_branch_token(), None);
    assert!(!app.ctx.session().is_logged_in());
}

#[tokio::test]
async fn branch_login_network_failure_is_generic() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;
    app.backend.fail("login_branch", Failure::Network);

    // Act
    let err = app.login_branch().await.unwrap_err();

    // Assert
    assert!(matches!(
        err,
        DeskError::Auth(AuthError::InvalidBranchCredentials)
    ));
}

#[tokio::test]
async fn branch_login_refused_while_admin_signed_in() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;
    app.login_admin().await.unwrap();

    // Act
    let err = app.login_branch().await.unwrap_err();

    // Assert
    assert!(matches!(
        err,
        DeskError::Capability(CapabilityError::AlreadySignedIn {
            kind: IdentityKind::Enterprise
        })
    ));
    assert_eq!(app.backend.call_count("login_branch"), 0);
    assert_eq!(
        app.ctx.session().identity().unwrap().kind(),
        IdentityKind::Enterprise
    );
}

#[tokio::test]
async fn branch_record_failure_after_login_falls_back_to_login_response() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;
    app.backend.fail("fetch_branch_by_token", Failure::Network);

    // Act
    app.login_branch().await.unwrap();

    // Assert
    let identity = app.ctx.session().identity().unwrap();
    let user = identity.as_branch().unwrap();
    assert_eq!(user.branch.id, app.branch.branch.id);
    assert_eq!(user.branch.name, app.branch.branch.name);
    assert!(user.branch.theme.is_none());
}

#[tokio::test]
async fn sign_up_signs_the_new_owner_in() {
    // Arrange
    let app = spawn_app();
    let args = sign_up_args("owner@example.com", "long-password", "long-password");

    // Act
    let identity = app.ctx.session().sign_up(args).await.unwrap().unwrap();

    // Assert
    let user = identity.as_enterprise().unwrap();
    assert_eq!(user.email, "owner@example.com");
    assert_eq!(user.profile.as_ref().unwrap().full_name(), "New Owner");
}

#[tokio::test]
async fn sign_up_waiting_for_email_confirmation_signs_nobody_in() {
    // Arrange
    let app = spawn_app();
    app.backend.set_confirm_sign_up_by_email(true);
    let args = sign_up_args("owner@example.com", "long-password", "long-password");

    // Act
    let outcome = app.ctx.session().sign_up(args).await.unwrap();

    // Assert
    assert!(outcome.is_none());
    assert!(!app.ctx.session().is_logged_in());
}

#[tokio::test]
async fn sign_up_with_mismatched_passwords_never_reaches_backend() {
    // Arrange
    let app = spawn_app();
    let args = sign_up_args("owner@example.com", "long-password", "other-password");

    // Act
    let err = app.ctx.session().sign_up(args).await.unwrap_err();

    // Assert
    assert!(matches!(
        err,
        DeskError::Validation(ValidationError::PasswordsDoNotMatch)
    ));
    assert_eq!(app.backend.call_count("sign_up"), 0);
}

#[tokio::test]
async fn password_reset_request_needs_no_session() {
    // Arrange
    let app = spawn_app();

    // Act
    app.ctx
        .session()
        .request_password_reset("someone@example.com")
        .await
        .unwrap();

    // Assert
    assert_eq!(app.backend.call_count("reset_password_for_email"), 1);
}
