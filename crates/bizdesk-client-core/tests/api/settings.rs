use bizdesk_shared::{
    const_config::storage::STORAGE_KEY_THEME,
    enterprise::EnterpriseUpdate,
    uac::{IdentityKind, ProfileUpdate},
};

use crate::helpers::{
    spawn_app, spawn_logged_in_admin, spawn_logged_in_branch, Failure, Rendered, MSG_JWT_EXPIRED,
};

#[tokio::test]
async fn admin_settings_are_saved_to_profile_and_rendered() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.visit("analytics");

    // Act
    let profile = app
        .ctx
        .update_settings(
            Some("ocean".try_into().unwrap()),
            Some("JPY".try_into().unwrap()),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(profile.currency().map(|x| &**x), Some("JPY"));
    let stored = app.backend.profile(app.admin.user_id).unwrap();
    assert_eq!(stored.theme.as_deref(), Some("ocean"));
    assert_eq!(stored.currency.as_deref(), Some("JPY"));
    assert_eq!(
        app.last_rendered(),
        Some(&Rendered::Page {
            page: "analytics".try_into().unwrap(),
            kind: IdentityKind::Enterprise,
            full_name: app.admin.full_name.clone(),
            theme: "ocean".try_into().unwrap(),
            currency: "JPY".to_string(),
        })
    );
    assert_eq!(app.store.value(STORAGE_KEY_THEME).as_deref(), Some("ocean"));
}

#[tokio::test]
async fn entry_view_keeps_device_theme_after_logout() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;

    // Act
    app.ctx.logout().await.unwrap();

    // Assert
    assert_eq!(
        app.last_rendered(),
        Some(&Rendered::Entry {
            theme: "dark".try_into().unwrap()
        })
    );
}

#[tokio::test]
async fn invalid_stored_theme_falls_back_to_default() {
    // Arrange
    let mut app = spawn_app();
    app.store.insert(STORAGE_KEY_THEME, "");

    // Act
    app.start().await;

    // Assert
    assert_eq!(
        app.last_rendered(),
        Some(&Rendered::Entry {
            theme: "light".try_into().unwrap()
        })
    );
}

#[tokio::test]
async fn enterprise_theme_applies_unless_profile_overrides_it() {
    // Arrange
    let app = spawn_logged_in_admin().await;
    let session = app.ctx.session();

    // Act
    session
        .update_enterprise(EnterpriseUpdate {
            theme: Some("forest".try_into().unwrap()),
            ..Default::default()
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(&*session.settings().unwrap().theme, "forest");

    // Arrange
    session
        .update_profile(ProfileUpdate {
            theme: Some("ocean".try_into().unwrap()),
            ..Default::default()
        })
        .await
        .unwrap();

    // Act
    session
        .update_enterprise(EnterpriseUpdate {
            theme: Some("sand".try_into().unwrap()),
            ..Default::default()
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(&*session.settings().unwrap().theme, "ocean");
    let enterprise = app
        .backend
        .enterprise(app.admin.enterprise_id.unwrap())
        .unwrap();
    assert_eq!(enterprise.theme.as_deref(), Some("sand"));
}

#[tokio::test]
async fn profile_name_change_is_reflected_in_viewer() {
    // Arrange
    let app = spawn_logged_in_admin().await;

    // Act
    app.ctx
        .session()
        .update_profile(ProfileUpdate {
            full_name: Some("Renamed Admin".try_into().unwrap()),
            ..Default::default()
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(
        app.ctx.session().viewer().unwrap().full_name,
        "Renamed Admin"
    );
}

#[tokio::test]
async fn failed_enterprise_load_falls_back_to_defaults() {
    // Arrange
    let mut app = spawn_app();
    app.start().await;
    app.backend.fail("fetch_enterprise", Failure::Network);

    // Act
    app.login_admin().await.unwrap();

    // Assert
    let settings = app.ctx.session().settings().unwrap();
    assert_eq!(&*settings.theme, "light");
    assert_eq!(&*settings.currency, "USD");
    assert!(!settings.has_security_pin);
    assert_eq!(app.last_page_rendered(), Some("home"));
}

#[tokio::test]
async fn revoked_branch_token_surfaces_backend_refusal() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;
    app.backend.revoke_branch_token(&app.branch.token);

    // Act
    let err = app
        .ctx
        .update_settings(None, Some("CHF".try_into().unwrap()))
        .await
        .unwrap_err();

    // Assert
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), MSG_JWT_EXPIRED);
    assert_eq!(&*app.ctx.session().settings().unwrap().currency, "GBP");
}
