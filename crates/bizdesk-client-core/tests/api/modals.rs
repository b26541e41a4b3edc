use crate::helpers::{modal, spawn_logged_in_admin};

#[tokio::test]
async fn opening_second_modal_hides_first() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;

    // Act
    app.ctx.open_modal(modal("new-branch"));
    app.ctx.open_modal(modal("confirm-delete"));

    // Assert
    assert_eq!(app.visible_modals(), ["confirm-delete"]);
    assert_eq!(
        app.ctx.router().state().active_modal().map(|x| &**x),
        Some("confirm-delete")
    );
}

#[tokio::test]
async fn back_steps_through_modals_without_rerendering_page() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.ctx.open_modal(modal("new-branch"));
    app.ctx.open_modal(modal("confirm-delete"));
    let renders_before = app.ctx.renderer().rendered().len();

    // Act
    app.press_back();

    // Assert
    assert_eq!(app.visible_modals(), ["new-branch"]);

    // Act
    app.press_back();

    // Assert
    assert!(app.visible_modals().is_empty());
    assert!(app.ctx.router().state().active_modal().is_none());
    assert_eq!(app.ctx.renderer().rendered().len(), renders_before);
    assert_eq!(app.stack(), ["home"]);
}

#[tokio::test]
async fn forward_reopens_modal() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.ctx.open_modal(modal("new-branch"));
    app.press_back();

    // Act
    app.press_forward();

    // Assert
    assert_eq!(app.visible_modals(), ["new-branch"]);
}

#[tokio::test]
async fn closing_modal_goes_back_through_browser() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.ctx.open_modal(modal("new-branch"));
    let index_with_modal = app.ctx.router().history().index();

    // Act
    app.ctx.close_modal(&modal("new-branch"));
    app.deliver_pops();

    // Assert
    assert!(app.visible_modals().is_empty());
    assert_eq!(app.ctx.router().history().index(), index_with_modal - 1);
}

#[tokio::test]
async fn closing_modal_that_does_not_own_entry_hides_it_directly() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    let index_before = app.ctx.router().history().index();

    // Act
    app.ctx.close_modal(&modal("new-branch"));

    // Assert
    assert!(app.visible_modals().is_empty());
    assert_eq!(app.ctx.router().history().index(), index_before);
}

#[tokio::test]
async fn opening_same_modal_twice_adds_one_entry() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    let entries_before = app.ctx.router().history().entries().len();

    // Act
    app.ctx.open_modal(modal("new-branch"));
    app.ctx.open_modal(modal("new-branch"));

    // Assert
    assert_eq!(
        app.ctx.router().history().entries().len(),
        entries_before + 1
    );
    assert_eq!(app.ctx.router().modals().shown(), 1);
}

#[tokio::test]
async fn loading_page_hides_modal() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    app.ctx.open_modal(modal("new-branch"));

    // Act
    app.visit("branches");

    // Assert
    assert!(app.visible_modals().is_empty());
    assert_eq!(app.current_page(), "branches");
    assert!(!app.ctx.router().modals().is_visible("new-branch"));
}
