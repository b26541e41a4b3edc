pub use bizdesk_test_helper::{
    modal, page, spawn_app, Failure, Rendered, TestApp, ENTERPRISE_NAME, MSG_INVALID_LOGIN,
    MSG_JWT_EXPIRED, MSG_PIN_MISMATCH,
};

/// Starts the app and logs the seeded enterprise admin in
pub async fn spawn_logged_in_admin() -> TestApp {
    let mut app = spawn_app();
    app.start().await;
    app.login_admin().await.unwrap();
    app
}

/// Starts the app and logs the seeded branch in
pub async fn spawn_logged_in_branch() -> TestApp {
    let mut app = spawn_app();
    app.start().await;
    app.login_branch().await.unwrap();
    app
}
