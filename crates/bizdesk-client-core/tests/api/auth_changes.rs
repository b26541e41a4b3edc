use bizdesk_client_core::AuthEvent;
use bizdesk_shared::{req_args::api::ChangePasswordReqArgs, uac::IdentityKind};
use secrecy::SecretString;

use crate::helpers::{spawn_app, spawn_logged_in_admin, spawn_logged_in_branch, Rendered};

#[tokio::test]
async fn recovery_link_shows_password_reset_form() {
    // Arrange
    let mut app = spawn_app();
    app.backend.install_session(&app.admin);
    app.start().await;
    let session = app.backend.session_for(&app.admin);

    // Act
    app.backend.emit(AuthEvent::PasswordRecovery, Some(session));
    app.ctx.process_auth_changes().await;

    // Assert
    assert_eq!(app.last_rendered(), Some(&Rendered::PasswordReset));
    assert!(app.ctx.session().is_recovery_mode());

    // Act
    app.ctx
        .session()
        .complete_password_recovery(ChangePasswordReqArgs {
            new_password: SecretString::from("a-new-password".to_string()),
            new_password_check: SecretString::from("a-new-password".to_string()),
        })
        .await
        .unwrap();

    // Assert
    assert!(!app.ctx.session().is_recovery_mode());
    assert_eq!(app.backend.call_count("update_user_password"), 1);
}

#[tokio::test]
async fn sign_out_elsewhere_returns_admin_to_entry_view() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.visit("branches");
    // Drain the notification sent by our own login
    app.ctx.process_auth_changes().await;

    // Act
    app.backend.emit(AuthEvent::SignedOut, None);
    app.ctx.process_auth_changes().await;

    // Assert
    assert!(!app.ctx.session().is_logged_in());
    assert_eq!(app.stack(), ["home"]);
    assert!(matches!(app.last_rendered(), Some(Rendered::Entry { .. })));
}

#[tokio::test]
async fn remote_sign_out_does_not_affect_branch_session() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;
    let rendered_before = app.last_rendered().cloned();

    // Act
    app.backend.emit(AuthEvent::SignedOut, None);
    app.ctx.process_auth_changes().await;

    // Assert
    assert_eq!(
        app.ctx.session().identity().unwrap().kind(),
        IdentityKind::Branch
    );
    assert!(app.stored_branch_token().is_some());
    assert_eq!(app.last_rendered().cloned(), rendered_before);
}

#[tokio::test]
async fn sign_in_from_another_tab_replaces_branch_session() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;
    let session = app.backend.session_for(&app.admin);

    // Act
    app.backend.emit(AuthEvent::SignedIn, Some(session));
    app.ctx.process_auth_changes().await;

    // Assert
    let viewer = app.ctx.session().viewer().unwrap();
    assert_eq!(viewer.kind, IdentityKind::Enterprise);
    assert_eq!(app.stored_branch_token(), None);
    assert!(app.backend.branch_token_header().is_none());
    assert!(matches!(
        app.last_rendered(),
        Some(Rendered::Page {
            kind: IdentityKind::Enterprise,
            ..
        })
    ));
}

#[tokio::test]
async fn initial_session_replacing_branch_purges_its_token() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;
    let session = app.backend.session_for(&app.admin);

    // Act
    app.backend.emit(AuthEvent::InitialSession, Some(session));
    app.ctx.process_auth_changes().await;

    // Assert
    assert_eq!(
        app.ctx.session().identity().unwrap().kind(),
        IdentityKind::Enterprise
    );
    assert_eq!(app.stored_branch_token(), None);
    assert!(app.backend.branch_token_header().is_none());
}

#[tokio::test]
async fn initial_session_without_active_branch_leaves_stored_token() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;
    app.store_branch_token(app.branch.token.expose());
    let session = app.backend.session_for(&app.admin);

    // Act
    app.backend.emit(AuthEvent::InitialSession, Some(session));
    app.ctx.process_auth_changes().await;

    // Assert
    assert_eq!(
        app.ctx.session().identity().unwrap().kind(),
        IdentityKind::Enterprise
    );
    assert_eq!(
        app.stored_branch_token().as_deref(),
        Some(app.branch.token.expose())
    );
}

#[tokio::test]
async fn token_refresh_for_same_user_changes_nothing() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.ctx.process_auth_changes().await;
    app.visit("analytics");
    let renders_before = app.ctx.renderer().rendered().len();
    let profile_loads_before = app.backend.call_count("fetch_profile");
    let session = app.backend.session_for(&app.admin);

    // Act
    app.backend.emit(AuthEvent::TokenRefreshed, Some(session));
    app.ctx.process_auth_changes().await;

    // Assert
    assert_eq!(app.ctx.renderer().rendered().len(), renders_before);
    assert_eq!(app.backend.call_count("fetch_profile"), profile_loads_before);
    assert_eq!(app.current_page(), "analytics");
}

#[tokio::test]
async fn profile_missing_at_login_is_loaded_on_next_notification() {
    // Arrange
    let mut app = spawn_app();
    let profile = app.backend.profile(app.admin.user_id).unwrap();
    app.backend.remove_profile(app.admin.user_id);
    app.start().await;
    app.login_admin().await.unwrap();
    app.ctx.process_auth_changes().await;
    assert!(app.ctx.session().viewer().is_none());
    app.backend.insert_profile(profile);
    let session = app.backend.session_for(&app.admin);

    // Act
    app.backend.emit(AuthEvent::UserUpdated, Some(session));
    app.ctx.process_auth_changes().await;

    // Assert
    let viewer = app.ctx.session().viewer().unwrap();
    assert_eq!(viewer.full_name, app.admin.full_name);
}

#[tokio::test]
async fn queued_notifications_are_applied_in_order() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;
    let session = app.backend.session_for(&app.admin);
    app.backend.emit(AuthEvent::SignedIn, Some(session));
    app.backend.emit(AuthEvent::SignedOut, None);

    // Act
    app.ctx.process_auth_changes().await;

    // Assert
    assert!(!app.ctx.session().is_logged_in());
    assert_eq!(app.stored_branch_token(), None);
    assert!(matches!(app.last_rendered(), Some(Rendered::Entry { .. })));
}
