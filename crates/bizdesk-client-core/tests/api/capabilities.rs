use bizdesk_shared::{
    branch::BranchUpdate,
    enterprise::EnterpriseUpdate,
    errors::DeskError,
    req_args::{
        api::{
            admin::branch::{NewBranchReqArgs, ResetBranchPasswordReqArgs},
            ChangePasswordReqArgs, SetPinReqArgs,
        },
        BranchLoginReqArgs,
    },
    uac::{Capability, CapabilityError, IdentityKind, ValidationError},
};
use secrecy::SecretString;

use crate::helpers::{
    spawn_app, spawn_logged_in_admin, spawn_logged_in_branch, ENTERPRISE_NAME, MSG_PIN_MISMATCH,
};

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

fn new_branch(name: &str) -> NewBranchReqArgs {
    NewBranchReqArgs {
        name: name.to_string().try_into().unwrap(),
        login_id: None,
        password: secret("branch-password"),
        password_check: secret("branch-password"),
        currency: None,
        theme: None,
    }
}

fn pin_change(new: &str, old: Option<&str>) -> SetPinReqArgs {
    SetPinReqArgs {
        new_pin: secret(new),
        new_pin_check: secret(new),
        old_pin: old.map(secret),
    }
}

fn password_change(value: &str) -> ChangePasswordReqArgs {
    ChangePasswordReqArgs {
        new_password: secret(value),
        new_password_check: secret(value),
    }
}

fn assert_missing(err: DeskError, capability: Capability) {
    assert!(
        matches!(
            err,
            DeskError::Capability(CapabilityError::Missing {
                capability: actual,
                kind: IdentityKind::Branch,
            }) if actual == capability
        ),
        "expected {capability:?} to be missing but got {err:?}"
    );
}

#[tokio::test]
async fn anonymous_caller_is_not_logged_in() {
    // Arrange
    let app = spawn_app();

    // Act
    let err = app.ctx.session().list_branches().await.unwrap_err();

    // Assert
    assert!(matches!(err, DeskError::NotLoggedIn(_)));
    assert_eq!(app.backend.call_count("list_branches"), 0);
}

#[tokio::test]
async fn branch_cannot_use_admin_operations() {
    // Arrange
    let app = spawn_logged_in_branch().await;
    let session = app.ctx.session();

    // Act + Assert
    assert_missing(
        session.list_branches().await.unwrap_err(),
        Capability::ManageBranches,
    );
    assert_missing(
        session.create_branch(new_branch("Quay")).await.unwrap_err(),
        Capability::ManageBranches,
    );
    assert_missing(
        session
            .update_enterprise(EnterpriseUpdate {
                theme: Some("ocean".try_into().unwrap()),
                ..Default::default()
            })
            .await
            .unwrap_err(),
        Capability::ManageEnterprise,
    );
    assert_missing(
        session
            .set_security_pin(pin_change("1234", None))
            .await
            .unwrap_err(),
        Capability::ManageSecurityPin,
    );
    assert_missing(
        session
            .delete_branch(app.branch.branch.id, secret("1234"))
            .await
            .unwrap_err(),
        Capability::ManageBranches,
    );
    assert_eq!(app.backend.call_count("list_branches"), 0);
    assert_eq!(app.backend.call_count("create_branch_account"), 0);
    assert_eq!(app.backend.call_count("delete_branch"), 0);
}

#[tokio::test]
async fn branch_cannot_change_password() {
    // Arrange
    let app = spawn_logged_in_branch().await;

    // Act
    let err = app
        .ctx
        .session()
        .update_password(password_change("new-password"))
        .await
        .unwrap_err();

    // Assert
    assert_eq!(err.to_string(), "Branch accounts cannot change the password");
    assert_eq!(app.backend.call_count("update_user_password"), 0);
}

#[tokio::test]
async fn admin_changes_password() {
    // Arrange
    let app = spawn_logged_in_admin().await;

    // Act
    app.ctx
        .session()
        .update_password(password_change("brand-new-password"))
        .await
        .unwrap();

    // Assert
    assert_eq!(app.backend.call_count("update_user_password"), 1);
}

#[tokio::test]
async fn admin_lists_branches_of_own_enterprise() {
    // Arrange
    let app = spawn_logged_in_admin().await;

    // Act
    let branches = app.ctx.session().list_branches().await.unwrap();

    // Assert
    assert_eq!(branches, [app.branch.branch.clone()]);
}

#[tokio::test]
async fn created_branch_gets_next_number_and_generated_login_id() {
    // Arrange
    let app = spawn_logged_in_admin().await;
    assert_eq!(ENTERPRISE_NAME, "Acme Trading");

    // Act
    let branch = app
        .ctx
        .session()
        .create_branch(new_branch("Quay"))
        .await
        .unwrap();

    // Assert
    assert_eq!(branch.branch_number, Some(2));
    assert_eq!(branch.login_id.as_deref(), Some("acme-trading-02"));
    assert_eq!(app.backend.branch(branch.id), Some(branch));
}

#[tokio::test]
async fn new_branch_passwords_must_match() {
    // Arrange
    let app = spawn_logged_in_admin().await;
    let mut args = new_branch("Quay");
    args.password_check = secret("something-else");

    // Act
    let err = app.ctx.session().create_branch(args).await.unwrap_err();

    // Assert
    assert!(matches!(
        err,
        DeskError::Validation(ValidationError::PasswordsDoNotMatch)
    ));
    assert_eq!(app.backend.call_count("get_next_branch_number"), 0);
}

#[tokio::test]
async fn first_security_pin_needs_no_current_pin_but_later_ones_do() {
    // Arrange
    let app = spawn_logged_in_admin().await;
    let enterprise_id = app.admin.enterprise_id.unwrap();
    let session = app.ctx.session();

    // Act
    session.set_security_pin(pin_change("1234", None)).await.unwrap();

    // Assert
    assert!(session.settings().unwrap().has_security_pin);
    assert_eq!(app.backend.security_pin(enterprise_id).as_deref(), Some("1234"));

    // Act
    let err = session
        .set_security_pin(pin_change("5678", None))
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(
        err,
        DeskError::Validation(ValidationError::CurrentPinRequired)
    ));

    // Act
    session
        .set_security_pin(pin_change("5678", Some("1234")))
        .await
        .unwrap();

    // Assert
    assert_eq!(app.backend.security_pin(enterprise_id).as_deref(), Some("5678"));
}

#[tokio::test]
async fn wrong_current_pin_is_refused_by_backend() {
    // Arrange
    let app = spawn_logged_in_admin().await;
    let session = app.ctx.session();
    session.set_security_pin(pin_change("1234", None)).await.unwrap();

    // Act
    let err = session
        .set_security_pin(pin_change("5678", Some("9999")))
        .await
        .unwrap_err();

    // Assert
    assert_eq!(err.to_string(), MSG_PIN_MISMATCH);
}

#[tokio::test]
async fn verifying_security_pin() {
    // Arrange
    let app = spawn_logged_in_admin().await;
    app.backend
        .set_security_pin_for(app.admin.enterprise_id.unwrap(), "2468");
    let session = app.ctx.session();

    // Act + Assert
    assert!(session.verify_security_pin(secret("2468")).await.unwrap());
    assert!(!session.verify_security_pin(secret("1357")).await.unwrap());
}

#[tokio::test]
async fn deleting_branch_requires_the_security_pin() {
    // Arrange
    let app = spawn_logged_in_admin().await;
    app.backend
        .set_security_pin_for(app.admin.enterprise_id.unwrap(), "2468");
    let branch_id = app.branch.branch.id;

    // Act
    let err = app
        .ctx
        .session()
        .delete_branch(branch_id, secret("1357"))
        .await
        .unwrap_err();

    // Assert
    assert_eq!(err.to_string(), MSG_PIN_MISMATCH);
    assert!(app.backend.branch(branch_id).is_some());

    // Act
    app.ctx
        .session()
        .delete_branch(branch_id, secret("2468"))
        .await
        .unwrap();

    // Assert
    assert!(app.backend.branch(branch_id).is_none());
}

#[tokio::test]
async fn malformed_pin_never_reaches_backend() {
    // Arrange
    let app = spawn_logged_in_admin().await;

    // Act
    let err = app
        .ctx
        .session()
        .delete_branch(app.branch.branch.id, secret("12"))
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(
        err,
        DeskError::Validation(ValidationError::MalformedPin(_))
    ));
    assert_eq!(app.backend.call_count("delete_branch"), 0);
}

#[tokio::test]
async fn branch_settings_go_through_the_branch_procedure() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;

    // Act
    let profile = app
        .ctx
        .update_settings(Some("ocean".try_into().unwrap()), None)
        .await
        .unwrap();

    // Assert
    assert_eq!(profile.theme().map(|x| &**x), Some("ocean"));
    assert_eq!(app.backend.call_count("update_branch_settings"), 1);
    assert_eq!(app.backend.call_count("update_profile"), 0);
    let stored = app.backend.branch(app.branch.branch.id).unwrap();
    assert_eq!(stored.theme.as_deref(), Some("ocean"));
    assert_eq!(stored.currency.as_deref(), Some("GBP"));
    assert_eq!(&*app.ctx.session().settings().unwrap().theme, "ocean");
}

#[tokio::test]
async fn empty_settings_change_is_rejected() {
    // Arrange
    let mut app = spawn_logged_in_branch().await;

    // Act
    let err = app.ctx.update_settings(None, None).await.unwrap_err();

    // Assert
    assert!(matches!(
        err,
        DeskError::Validation(ValidationError::NoChangeRequested)
    ));
}

#[tokio::test]
async fn admin_renames_branch() {
    // Arrange
    let app = spawn_logged_in_admin().await;
    let branch_id = app.branch.branch.id;

    // Act
    let branch = app
        .ctx
        .session()
        .update_branch(
            branch_id,
            BranchUpdate {
                name: Some("Dockside".to_string().try_into().unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(branch.name.to_string(), "Dockside");
    assert_eq!(app.backend.branch(branch_id), Some(branch));
}

#[tokio::test]
async fn reset_branch_password_lets_branch_sign_in_with_new_one() {
    // Arrange
    let mut app = spawn_logged_in_admin().await;
    let args = ResetBranchPasswordReqArgs {
        branch_id: app.branch.branch.id,
        new_password: secret("fresh-branch-password"),
        new_password_check: secret("fresh-branch-password"),
    };

    // Act
    app.ctx.session().reset_branch_password(args).await.unwrap();

    // Assert
    app.ctx.logout().await.unwrap();
    assert!(app.login_branch().await.is_err());
    app.ctx
        .login_branch(BranchLoginReqArgs::new(
            app.branch.login_id.clone(),
            secret("fresh-branch-password"),
        ))
        .await
        .unwrap();
    assert_eq!(
        app.ctx.session().identity().unwrap().kind(),
        IdentityKind::Branch
    );
}
