use bizdesk_shared::uac::IdentityKind;
use rstest::rstest;

use crate::helpers::{spawn_app, Rendered};

#[tokio::test]
async fn fresh_start_shows_entry_view() {
    // Arrange
    let mut app = spawn_app();

    // Act
    app.start().await;

    // Assert
    assert!(!app.ctx.session().is_logged_in());
    assert!(matches!(
        app.last_rendered(),
        Some(Rendered::Entry { theme }) if &**theme == "light"
    ));
    assert_eq!(app.backend.call_count("fetch_branch_by_token"), 0);
}

#[tokio::test]
async fn remote_session_wins_and_keeps_stored_branch_token() {
    // Arrange
    let mut app = spawn_app();
    app.backend.install_session(&app.admin);
    let token = app.branch.token.expose().to_string();
    app.store_branch_token(&token);

    // Act
    app.start().await;

    // Assert
    let identity = app.ctx.session().identity().unwrap();
    assert_eq!(identity.kind(), IdentityKind::Enterprise);
    assert_eq!(app.stored_branch_token(), Some(token));
    assert_eq!(app.backend.call_count("fetch_branch_by_token"), 0);
    assert!(app.backend.branch_token_header().is_none());
    assert_eq!(
        app.last_rendered(),
        Some(&Rendered::Page {
            page: "home".try_into().unwrap(),
            kind: IdentityKind::Enterprise,
            full_name: app.admin.full_name.clone(),
            theme: "light".try_into().unwrap(),
            currency: "EUR".to_string(),
        })
    );
}

#[tokio::test]
async fn valid_branch_token_resumes_branch_session() {
    // Arrange
    let mut app = spawn_app();
    app.store_branch_token(app.branch.token.expose());

    // Act
    app.start().await;

    // Assert
    let identity = app.ctx.session().identity().unwrap();
    let user = identity.as_branch().unwrap();
    assert_eq!(user.branch.id, app.branch.branch.id);
    assert_eq!(app.backend.branch_token_header(), Some(app.branch.token.clone()));
    let settings = app.ctx.session().settings().unwrap();
    assert_eq!(&*settings.theme, "dark");
    assert_eq!(&*settings.currency, "GBP");
    assert!(!settings.has_security_pin);
    assert_eq!(app.last_page_rendered(), Some("home"));
}

#[rstest]
#[case::revoked(true)]
#[case::unknown(false)]
#[tokio::test]
async fn rejected_branch_token_is_purged(#[case] revoked: bool) {
    // Arrange
    let mut app = spawn_app();
    if revoked {
        app.backend.revoke_branch_token(&app.branch.token);
        app.store_branch_token(app.branch.token.expose());
    } else {
        app.store_branch_token("not-a-token-anyone-issued");
    }

    // Act
    app.start().await;

    // Assert
    assert!(!app.ctx.session().is_logged_in());
    assert_eq!(app.stored_branch_token(), None);
    assert!(app.backend.branch_token_header().is_none());
    assert!(matches!(app.last_rendered(), Some(Rendered::Entry { .. })));
}

#[tokio::test]
async fn unreachable_backend_keeps_branch_token_for_next_time() {
    // Arrange
    let mut app = spawn_app();
    let token = app.branch.token.expose().to_string();
    app.store_branch_token(&token);
    app.backend.set_network_down(true);

    // Act
    app.start().await;

    // Assert
    assert!(!app.ctx.session().is_logged_in());
    assert_eq!(app.stored_branch_token(), Some(token));
    assert!(app.backend.branch_token_header().is_none());
    assert!(matches!(app.last_rendered(), Some(Rendered::Entry { .. })));
}

#[rstest]
#[case::named("?page=branches", "branches")]
#[case::alias("?page=settings", "profile")]
#[case::missing("?lang=fr", "home")]
#[tokio::test]
async fn first_page_comes_from_query(#[case] query: &str, #[case] expected: &str) {
    // Arrange
    let mut app = spawn_app();
    app.backend.install_session(&app.admin);

    // Act
    app.ctx.start(query).await;

    // Assert
    assert_eq!(app.current_page(), expected);
    assert_eq!(app.stack(), [expected]);
    assert_eq!(app.cursor(), 0);
    assert_eq!(app.last_page_rendered(), Some(expected));
    // The browser's own entry is replaced, not added to
    assert_eq!(app.ctx.router().history().entries().len(), 1);
}

#[tokio::test]
async fn unavailable_storage_still_reaches_entry_view() {
    // Arrange
    let mut app = spawn_app();
    app.store.set_unavailable(true);

    // Act
    app.start().await;

    // Assert
    assert!(!app.ctx.session().is_logged_in());
    assert!(matches!(app.last_rendered(), Some(Rendered::Entry { .. })));
}

#[tokio::test]
async fn profile_settings_take_precedence_over_enterprise() {
    // Arrange
    let mut app = spawn_app();
    let enterprise_id = app.admin.enterprise_id.unwrap();
    app.backend
        .set_enterprise_settings(enterprise_id, Some("ocean"), Some("JPY"));
    app.backend
        .set_profile_settings(app.admin.user_id, None, Some("CAD"));
    app.backend.install_session(&app.admin);

    // Act
    app.start().await;

    // Assert
    let settings = app.ctx.session().settings().unwrap();
    assert_eq!(&*settings.theme, "ocean");
    assert_eq!(&*settings.currency, "CAD");
}
