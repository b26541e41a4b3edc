//! Holds the one active identity and keeps it in step with the backend

use std::sync::{Arc, Mutex, MutexGuard};

use bizdesk_shared::{
    branch::{Branch, BranchLoginId},
    const_config::storage::STORAGE_KEY_BRANCH_TOKEN,
    errors::{DeskError, DeskResult, NotFoundError, NotLoggedInError},
    id::UserId,
    log_err_as_warn,
    req_args::{api::ChangePasswordReqArgs, BranchLoginReqArgs, LoginReqArgs, SignUpReqArgs},
    settings::UserSettings,
    token::BranchToken,
    uac::{AuthError, BranchUser, CapabilityError, EnterpriseUser, Identity, IdentityKind, Viewer},
};
use futures::channel::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::{
    backend::{AuthEvent, AuthStateChange, LocalStore, RemoteBackend, RemoteSession},
    sequence::RequestSequencer,
};

mod mutations;

/// Owns the active [`Identity`] and everything derived from it
///
/// Cloning is cheap and every clone shares the same state. The lock is never
/// held across an `.await`.
pub struct SessionStore<B, S> {
    backend: Arc<B>,
    store: Arc<S>,
    inner: Arc<Mutex<SessionInner>>,
}

#[derive(Debug, Default)]
struct SessionInner {
    identity: Option<Identity>,
    recovery_mode: bool,
    settings: Option<UserSettings>,
    sequencer: RequestSequencer,
}

/// What an auth notification did to the session
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTransition {
    Unchanged,
    /// A different identity is now active
    SignedIn,
    SignedOut,
    /// The password reset form should be shown
    RecoveryRequested,
}

#[derive(Debug, Default, Clone, Copy)]
struct Adoption {
    changed: bool,
    /// An active branch identity was displaced
    replaced_branch: bool,
}

impl<B, S> Clone for SessionStore<B, S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RemoteBackend, S: LocalStore> SessionStore<B, S> {
    pub fn new(backend: Arc<B>, store: Arc<S>) -> Self {
        Self {
            backend,
            store,
            inner: Default::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().expect("mutex poisoned")
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.lock().identity.as_ref().and_then(Identity::viewer)
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().identity.is_some()
    }

    pub fn is_recovery_mode(&self) -> bool {
        self.lock().recovery_mode
    }

    pub fn settings(&self) -> Option<UserSettings> {
        self.lock().settings.clone()
    }

    /// Stores settings hydrated for `identity`. Ignored if another identity
    /// became active in the meantime
    pub fn set_settings(&self, identity: &Identity, settings: UserSettings) {
        let mut inner = self.lock();
        if same_principal(inner.identity.as_ref(), identity) {
            inner.settings = Some(settings);
        } else {
            debug!("identity changed before settings were hydrated");
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<AuthStateChange> {
        self.backend.on_auth_state_change()
    }

    /// Resolves the identity to resume on page load
    ///
    /// A remote session always wins and leaves any stored branch token alone.
    /// Otherwise a stored branch token is validated with the backend. Only a
    /// definite rejection purges it, a failed request keeps it for next time.
    #[tracing::instrument(skip(self))]
    pub async fn init(&self) -> Option<Identity> {
        match self.backend.get_session().await {
            Ok(Some(session)) => {
                info!(user_id = %session.user.id, "resuming remote session");
                self.adopt_remote_session(session).await;
                return self.identity();
            }
            Ok(None) => {}
            Err(err) => warn!(?err, "failed to read the remote session"),
        }
        self.restore_branch_session().await
    }

    async fn restore_branch_session(&self) -> Option<Identity> {
        let token = self.stored_branch_token()?;
        self.backend.set_branch_token(Some(&token));
        match self.backend.fetch_branch_by_token(&token).await {
            Ok(Some(branch)) => {
                info!(branch_id = %branch.id, "resuming branch session");
                let identity = Identity::Branch(BranchUser::new(branch, token));
                self.replace_identity(Some(identity.clone()));
                Some(identity)
            }
            Ok(None) => {
                warn!("stored branch token is no longer valid");
                self.clear_branch_token();
                None
            }
            Err(err) if err.is_unauthorized() => {
                warn!(?err, "stored branch token was rejected");
                self.clear_branch_token();
                None
            }
            Err(err) => {
                warn!(?err, "unable to validate the stored branch token");
                self.backend.set_branch_token(None);
                None
            }
        }
    }

    /// Applies a notification from the remote auth system
    #[tracing::instrument(skip(self))]
    pub async fn handle_auth_change(&self, change: AuthStateChange) -> AuthTransition {
        if change.event == AuthEvent::PasswordRecovery {
            self.lock().recovery_mode = true;
            return AuthTransition::RecoveryRequested;
        }
        match change.session {
            Some(session) => {
                let adopted = self.adopt_remote_session(session).await;
                if change.event == AuthEvent::SignedIn
                    || adopted.replaced_branch
                    || (adopted.changed && change.event != AuthEvent::InitialSession)
                {
                    self.clear_branch_token();
                }
                if adopted.changed {
                    AuthTransition::SignedIn
                } else {
                    AuthTransition::Unchanged
                }
            }
            None => {
                let mut inner = self.lock();
                if matches!(inner.identity, Some(Identity::Enterprise(_))) {
                    inner.identity = None;
                    inner.settings = None;
                    inner.sequencer.advance_generation();
                    AuthTransition::SignedOut
                } else {
                    AuthTransition::Unchanged
                }
            }
        }
    }

    /// Signs in an enterprise user. The backend's refusal is returned as is
    #[tracing::instrument(skip(self))]
    pub async fn login(&self, args: LoginReqArgs) -> DeskResult<Identity> {
        let session = self
            .backend
            .sign_in_with_password(&args)
            .await
            .map_err(auth_rejection)?;
        self.adopt_remote_session(session).await;
        self.clear_branch_token();
        Ok(self.identity().ok_or(NotLoggedInError)?)
    }

    /// Signs in a branch manager
    ///
    /// Every failure is reported as [`AuthError::InvalidBranchCredentials`]
    #[tracing::instrument(skip(self))]
    pub async fn login_branch(&self, args: BranchLoginReqArgs) -> DeskResult<Identity> {
        let active_kind = self.lock().identity.as_ref().map(Identity::kind);
        if active_kind == Some(IdentityKind::Enterprise) {
            return Err(CapabilityError::AlreadySignedIn {
                kind: IdentityKind::Enterprise,
            }
            .into());
        }

        let response = match self.backend.login_branch(&args).await {
            Ok(response) => response,
            Err(err) => {
                warn!(?err, "branch login refused");
                return Err(AuthError::InvalidBranchCredentials.into());
            }
        };
        let token = response.api_token.clone();
        self.backend.set_branch_token(Some(&token));

        let branch = match self.backend.fetch_branch_by_token(&token).await {
            Ok(Some(branch)) => branch,
            Ok(None) => {
                warn!("new branch token does not see its own branch");
                branch_from_login(response, &args)
            }
            Err(err) => {
                warn!(?err, "failed to load branch record after login");
                branch_from_login(response, &args)
            }
        };
        log_err_as_warn!(
            self.store.set(STORAGE_KEY_BRANCH_TOKEN, token.expose()),
            "failed to store the branch token"
        );
        info!(branch_id = %branch.id, "branch logged in");
        let identity = Identity::Branch(BranchUser::new(branch, token));
        self.replace_identity(Some(identity.clone()));
        Ok(identity)
    }

    /// Clears the session locally even if the remote sign out fails. That
    /// failure is still returned
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) -> DeskResult<()> {
        let previous = {
            let mut inner = self.lock();
            inner.recovery_mode = false;
            inner.settings = None;
            inner.sequencer.advance_generation();
            inner.identity.take()
        };
        self.clear_branch_token();
        match previous {
            Some(Identity::Enterprise(_)) => self.backend.sign_out().await,
            _ => Ok(()),
        }
    }

    /// Creates an enterprise account. Returns `None` while the email address
    /// still needs to be confirmed
    #[tracing::instrument(skip(self))]
    pub async fn sign_up(&self, args: SignUpReqArgs) -> DeskResult<Option<Identity>> {
        args.validate()?;
        let session = self.backend.sign_up(&args).await.map_err(auth_rejection)?;
        let Some(session) = session else {
            info!("sign up awaiting email confirmation");
            return Ok(None);
        };
        self.adopt_remote_session(session).await;
        self.clear_branch_token();
        Ok(self.identity())
    }

    /// Anonymous callers are allowed
    #[tracing::instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> DeskResult<()> {
        self.backend.reset_password_for_email(email).await
    }

    /// Sets the new password after following a reset link
    #[tracing::instrument(skip(self))]
    pub async fn complete_password_recovery(&self, args: ChangePasswordReqArgs) -> DeskResult<()> {
        args.validate()?;
        self.backend
            .update_user_password(&args.new_password)
            .await
            .map_err(auth_rejection)?;
        self.lock().recovery_mode = false;
        Ok(())
    }

    /// Makes `session` the active enterprise identity and loads its profile
    /// when needed. Returns `true` if the principal changed
    async fn adopt_remote_session(&self, session: RemoteSession) -> Adoption {
        let user_id = session.user.id;
        let (adoption, needs_profile) = {
            let mut inner = self.lock();
            match inner.identity.as_mut() {
                Some(Identity::Enterprise(user)) if user.user_id == user_id => {
                    user.email = session.user.email;
                    (Adoption::default(), user.profile.is_none())
                }
                _ => {
                    let replaced_branch = matches!(inner.identity, Some(Identity::Branch(_)));
                    inner.identity = Some(Identity::Enterprise(EnterpriseUser {
                        user_id,
                        email: session.user.email,
                        profile: None,
                    }));
                    inner.settings = None;
                    inner.sequencer.advance_generation();
                    let adoption = Adoption {
                        changed: true,
                        replaced_branch,
                    };
                    (adoption, true)
                }
            }
        };
        if needs_profile {
            self.load_profile(user_id).await;
        }
        adoption
    }

    /// A missing profile leaves the identity without one. It is loaded again
    /// on the next auth notification
    async fn load_profile(&self, user_id: UserId) {
        let generation = self.lock().sequencer.generation();
        match self.backend.fetch_profile(user_id).await {
            Ok(Some(record)) => {
                let mut inner = self.lock();
                if inner.sequencer.generation() != generation {
                    debug!("identity changed while the profile was loading");
                    return;
                }
                if let Some(Identity::Enterprise(user)) = inner.identity.as_mut() {
                    if user.user_id == record.id {
                        user.profile = Some(record.into());
                    }
                }
            }
            Ok(None) => warn!("{}", NotFoundError::Profile(user_id.to_string())),
            Err(err) => warn!(?err, "failed to load profile"),
        }
    }

    fn replace_identity(&self, identity: Option<Identity>) {
        let mut inner = self.lock();
        inner.identity = identity;
        inner.settings = None;
        inner.sequencer.advance_generation();
    }

    fn stored_branch_token(&self) -> Option<BranchToken> {
        match self.store.get(STORAGE_KEY_BRANCH_TOKEN) {
            Ok(token) => token.filter(|x| !x.is_empty()).map(BranchToken::from),
            Err(err) => {
                warn!(?err, "failed to read the stored branch token");
                None
            }
        }
    }

    fn clear_branch_token(&self) {
        log_err_as_warn!(self.store.remove(STORAGE_KEY_BRANCH_TOKEN));
        self.backend.set_branch_token(None);
    }
}

/// Keeps the remote message but marks it as an authentication failure
fn auth_rejection(err: DeskError) -> DeskError {
    match err {
        DeskError::Remote(remote) => AuthError::Rejected(remote).into(),
        other => other,
    }
}

fn same_principal(active: Option<&Identity>, other: &Identity) -> bool {
    match (active, other) {
        (Some(Identity::Enterprise(a)), Identity::Enterprise(b)) => a.user_id == b.user_id,
        (Some(Identity::Branch(a)), Identity::Branch(b)) => a.branch.id == b.branch.id,
        _ => false,
    }
}

/// Fallback when the branch record can not be read right after login
fn branch_from_login(
    response: bizdesk_shared::branch::BranchLoginResponse,
    args: &BranchLoginReqArgs,
) -> Branch {
    Branch {
        id: response.id,
        enterprise_id: response.enterprise_id,
        name: response.name,
        login_id: BranchLoginId::try_from(args.login_id.clone()).ok(),
        branch_number: None,
        theme: None,
        currency: None,
    }
}
