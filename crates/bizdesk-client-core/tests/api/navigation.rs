use bizdesk_client_core::LoadOptions;
use rstest::rstest;

use crate::helpers::{page, spawn_logged_in_admin};

#[tokio::test]
async fn visiting_pages_pushes_onto_stack() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;

    // Act
    app.visit("branches");
    app.visit("profile");

    // Assert
    assert_eq!(app.stack(), ["home", "branches", "profile"]);
    assert_eq!(app.cursor(), 2);
    assert_eq!(app.current_page(), "profile");
    assert_eq!(app.last_page_rendered(), Some("profile"));
}

#[tokio::test]
async fn back_and_forward_move_the_cursor() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.visit("branches");
    app.visit("profile");

    // Act
    app.press_back();

    // Assert
    assert_eq!(app.cursor(), 1);
    assert_eq!(app.current_page(), "branches");
    assert_eq!(app.last_page_rendered(), Some("branches"));

    // Act
    app.press_forward();

    // Assert
    assert_eq!(app.cursor(), 2);
    assert_eq!(app.last_page_rendered(), Some("profile"));
    assert_eq!(app.stack(), ["home", "branches", "profile"]);
}

#[tokio::test]
async fn new_page_after_going_back_drops_forward_pages() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.visit("branches");
    app.visit("profile");
    app.visit("reports");
    app.press_back();
    app.press_back();

    // Act
    app.visit("workspace");

    // Assert
    assert_eq!(app.stack(), ["home", "branches", "workspace"]);
    assert_eq!(app.cursor(), 2);

    // Act - the browser dropped its forward entries as well
    app.press_forward();

    // Assert
    assert_eq!(app.cursor(), 2);
    assert_eq!(app.last_page_rendered(), Some("workspace"));
}

#[rstest]
#[case::alias("settings", "profile")]
#[case::known("analytics", "analytics")]
#[case::unknown("reports", "reports")]
#[tokio::test]
async fn loaded_page_is_redirected(#[case] requested: &str, #[case] expected: &str) {
    // Arrange
    let mut app = spawn_logged_in_admin().await;

    // Act
    app.visit(requested);

    // Assert
    assert_eq!(app.current_page(), expected);
    assert_eq!(app.last_page_rendered(), Some(expected));
}

#[tokio::test]
async fn jump_of_more_than_one_entry_leaves_cursor() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.visit("branches");
    app.visit("profile");

    // Act
    app.jump(-2);

    // Assert
    assert_eq!(app.cursor(), 2);
    assert_eq!(app.stack(), ["home", "branches", "profile"]);
    assert_eq!(app.last_page_rendered(), Some("home"));
}

#[tokio::test]
async fn reloading_current_page_does_not_add_browser_entry() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.visit("branches");
    let entries_before = app.ctx.router().history().entries().len();

    // Act
    app.ctx.load_page(
        page("branches"),
        LoadOptions {
            skip_history_record: true,
            ..Default::default()
        },
    );

    // Assert
    assert_eq!(app.ctx.router().history().entries().len(), entries_before);
    assert_eq!(app.stack(), ["home", "branches"]);
}

#[tokio::test]
async fn skip_browser_push_only_updates_stack() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    let entries_before = app.ctx.router().history().entries().len();

    // Act
    app.ctx.load_page(
        page("operations"),
        LoadOptions {
            skip_browser_push: true,
            ..Default::default()
        },
    );

    // Assert
    assert_eq!(app.ctx.router().history().entries().len(), entries_before);
    assert_eq!(app.stack(), ["home", "operations"]);
}

#[tokio::test]
async fn top_level_load_starts_a_new_stack() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.visit("branches");
    app.visit("profile");

    // Act
    app.ctx.load_page(page("analytics"), LoadOptions::top_level());

    // Assert
    assert_eq!(app.stack(), ["analytics"]);
    assert_eq!(app.cursor(), 0);
}
