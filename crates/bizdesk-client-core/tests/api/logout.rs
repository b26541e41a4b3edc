use bizdesk_shared::uac::IdentityKind;

use crate::helpers::{
    modal, spawn_logged_in_admin, spawn_logged_in_branch, Failure, Rendered,
};

#[tokio::test]
async fn logout_resets_navigation_and_shows_entry_view() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.visit("branches");
    app.visit("profile");
    assert_eq!(app.cursor(), 2);

    // Act
    app.ctx.logout().await.unwrap();

    // Assert
    assert!(!app.ctx.session().is_logged_in());
    assert!(app.ctx.session().settings().is_none());
    assert_eq!(app.stack(), ["home"]);
    assert_eq!(app.cursor(), 0);
    assert!(matches!(app.last_rendered(), Some(Rendered::Entry { .. })));
    assert!(!app.backend.has_session());
    assert_eq!(app.backend.call_count("sign_out"), 1);
}

#[tokio::test]
async fn branch_logout_forgets_token_without_remote_sign_out() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;
    assert!(app.stored_branch_token().is_some());

    // Act
    app.ctx.logout().await.unwrap();

    // Assert
    assert!(!app.ctx.session().is_logged_in());
    assert_eq!(app.stored_branch_token(), None);
    assert!(app.backend.branch_token_header().is_none());
    assert_eq!(app.backend.call_count("sign_out"), 0);
}

#[tokio::test]
async fn failed_remote_sign_out_still_clears_local_state() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.backend.fail("sign_out", Failure::Network);

    // Act
    let err = app.ctx.logout().await.unwrap_err();

    // Assert
    assert!(err.is_network());
    assert!(!app.ctx.session().is_logged_in());
    assert_eq!(app.stack(), ["home"]);
    assert!(matches!(app.last_rendered(), Some(Rendered::Entry { .. })));
}

#[tokio::test]
async fn logout_hides_open_modal() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.ctx.open_modal(modal("confirm-delete"));
    assert_eq!(app.visible_modals(), ["confirm-delete"]);

    // Act
    app.ctx.logout().await.unwrap();

    // Assert
    assert!(app.visible_modals().is_empty());
    assert!(app.ctx.router().state().active_modal().is_none());
}

#[tokio::test]
async fn context_can_log_in_again_after_logout() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;
    app.ctx.logout().await.unwrap();

    // Act
    app.login_admin().await.unwrap();

    // Assert
    let viewer = app.ctx.session().viewer().unwrap();
    assert_eq!(viewer.kind, IdentityKind::Enterprise);
    assert_eq!(app.last_page_rendered(), Some("home"));
}
