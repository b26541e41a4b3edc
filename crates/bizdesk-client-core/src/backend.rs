//! The seams between the core and the outside world
//!
//! Every remote call the core makes goes through [`RemoteBackend`]. The
//! browser facing pieces are split into [`LocalStore`], [`BrowserHistory`],
//! [`ModalHost`] and [`ViewRenderer`] so they can be swapped out in tests.

use std::fmt::Debug;

use bizdesk_shared::{
    branch::{Branch, BranchLoginId, BranchLoginResponse, BranchUpdate},
    enterprise::{Enterprise, EnterpriseUpdate},
    errors::DeskResult,
    id::{BranchId, EnterpriseId, UserId},
    nav::{HistoryEntry, ModalId, PageId},
    req_args::{
        api::admin::branch::{BranchSettingsReqArgs, NewBranchReqArgs, ResetBranchPasswordReqArgs},
        BranchLoginReqArgs, LoginReqArgs, SignUpReqArgs,
    },
    settings::{SecurityPin, ThemeName, UserSettings},
    token::BranchToken,
    uac::{ProfileRecord, ProfileUpdate, Viewer},
};
use futures::channel::mpsc::UnboundedReceiver;
use secrecy::{ExposeSecret as _, SecretString};

/// Authenticated session issued by the remote auth system
#[derive(Clone)]
pub struct RemoteSession {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// Unix timestamp in seconds
    pub expires_at: Option<i64>,
    pub user: RemoteUser,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Sent once for a session restored from storage
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    /// The user followed a password reset link
    PasswordRecovery,
}

#[derive(Debug, Clone)]
pub struct AuthStateChange {
    pub event: AuthEvent,
    pub session: Option<RemoteSession>,
}

/// What the backend needs to create a branch account
#[derive(Debug)]
pub struct NewBranchAccount<'a> {
    pub enterprise_id: EnterpriseId,
    pub branch_number: u32,
    pub login_id: &'a BranchLoginId,
    pub args: &'a NewBranchReqArgs,
}

/// Everything the core consumes from the backend-as-a-service
///
/// Errors are reported as received. Implementations must not retry.
#[allow(async_fn_in_trait)] // Single threaded by design, `Send` is never required
pub trait RemoteBackend {
    async fn get_session(&self) -> DeskResult<Option<RemoteSession>>;
    /// Every call returns a new receiver that gets all later notifications
    fn on_auth_state_change(&self) -> UnboundedReceiver<AuthStateChange>;
    async fn sign_in_with_password(&self, args: &LoginReqArgs) -> DeskResult<RemoteSession>;
    /// Returns `None` when the account still needs to be confirmed by email
    async fn sign_up(&self, args: &SignUpReqArgs) -> DeskResult<Option<RemoteSession>>;
    async fn sign_out(&self) -> DeskResult<()>;
    async fn reset_password_for_email(&self, email: &str) -> DeskResult<()>;
    async fn update_user_password(&self, new_password: &SecretString) -> DeskResult<()>;

    /// Sets or clears the token sent with every following request
    fn set_branch_token(&self, token: Option<&BranchToken>);

    async fn fetch_profile(&self, user_id: UserId) -> DeskResult<Option<ProfileRecord>>;
    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> DeskResult<ProfileRecord>;
    async fn fetch_enterprise(&self, id: EnterpriseId) -> DeskResult<Option<Enterprise>>;
    async fn update_enterprise(
        &self,
        id: EnterpriseId,
        update: &EnterpriseUpdate,
    ) -> DeskResult<Enterprise>;
    /// Looks up the branch `token` belongs to. `Ok(None)` means the token is
    /// not (or no longer) valid
    async fn fetch_branch_by_token(&self, token: &BranchToken) -> DeskResult<Option<Branch>>;
    async fn list_branches(&self, enterprise_id: EnterpriseId) -> DeskResult<Vec<Branch>>;
    async fn update_branch(&self, id: BranchId, update: &BranchUpdate) -> DeskResult<Branch>;

    async fn login_branch(&self, args: &BranchLoginReqArgs) -> DeskResult<BranchLoginResponse>;
    async fn create_branch_account(&self, account: NewBranchAccount<'_>) -> DeskResult<Branch>;
    async fn get_next_branch_number(&self, enterprise_id: EnterpriseId) -> DeskResult<u32>;
    async fn update_branch_settings(&self, args: &BranchSettingsReqArgs) -> DeskResult<Branch>;
    async fn reset_branch_password(&self, args: &ResetBranchPasswordReqArgs) -> DeskResult<()>;
    async fn delete_branch(
        &self,
        branch_id: BranchId,
        enterprise_id: EnterpriseId,
        pin: &SecurityPin,
    ) -> DeskResult<()>;
    async fn set_security_pin(
        &self,
        new_pin: &SecurityPin,
        old_pin: Option<&SecurityPin>,
    ) -> DeskResult<()>;
    async fn verify_security_pin(&self, pin: &SecurityPin) -> DeskResult<bool>;
}

/// Persistent key value storage (`localStorage` in the browser)
pub trait LocalStore {
    fn get(&self, key: &str) -> DeskResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DeskResult<()>;
    fn remove(&self, key: &str) -> DeskResult<()>;
}

/// The browser's native history
///
/// `go_back` does not report the resulting entry. The browser delivers it
/// later as a popstate notification.
pub trait BrowserHistory {
    fn current_state(&self) -> Option<HistoryEntry>;
    fn push_state(&mut self, entry: &HistoryEntry) -> anyhow::Result<()>;
    fn replace_state(&mut self, entry: &HistoryEntry) -> anyhow::Result<()>;
    fn go_back(&mut self) -> anyhow::Result<()>;
}

/// Shows and hides modal dialogs by id
pub trait ModalHost {
    fn show(&mut self, id: &ModalId);
    fn hide(&mut self, id: &ModalId);
}

/// Produces the content for a page. Rendering itself is out of scope
pub trait ViewRenderer {
    fn render_page(&mut self, page: &PageId, viewer: &Viewer, settings: &UserSettings);
    /// The unauthenticated entry (login) view
    fn render_entry(&mut self, theme: &ThemeName);
    fn show_password_reset(&mut self);
}

impl RemoteSession {
    /// Returns `true` if the access token has expired at `now` (unix seconds)
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl PartialEq for RemoteSession {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user
            && self.access_token.expose_secret() == other.access_token.expose_secret()
    }
}

impl Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}
