use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard},
};

use bizdesk_client_core::{
    AuthEvent, AuthStateChange, NewBranchAccount, RemoteBackend, RemoteSession, RemoteUser,
};
use bizdesk_shared::{
    branch::{Branch, BranchLoginId, BranchLoginResponse, BranchName, BranchUpdate},
    enterprise::{Enterprise, EnterpriseUpdate},
    errors::{DeskError, DeskResult, NotFoundError, RemoteError},
    id::{BranchId, EnterpriseId, UserId},
    req_args::{
        api::admin::branch::{BranchSettingsReqArgs, ResetBranchPasswordReqArgs},
        BranchLoginReqArgs, LoginReqArgs, SignUpReqArgs,
    },
    settings::{CurrencyCode, SecurityPin, ThemeName},
    token::BranchToken,
    uac::{ProfileRecord, ProfileUpdate, Role},
};
use futures::channel::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot,
};
use secrecy::{ExposeSecret as _, SecretString};
use tracing::debug;
use uuid::Uuid;

pub const MSG_INVALID_LOGIN: &str = "Invalid login credentials";
pub const MSG_PIN_MISMATCH: &str = "PIN does not match";
pub const MSG_JWT_EXPIRED: &str = "JWT expired";
pub const MSG_NETWORK_DOWN: &str = "error sending request: connection refused";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The request never reached the backend
    Network,
    Remote { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: UserId,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub enterprise_id: Option<EnterpriseId>,
}

#[derive(Debug, Clone)]
pub struct TestBranch {
    pub branch: Branch,
    pub login_id: String,
    pub password: String,
    pub token: BranchToken,
}

/// In-memory stand in for the hosted backend, answering with the same error
/// wording and row level rules
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

struct Account {
    user: RemoteUser,
    password: String,
}

struct BranchAccount {
    branch: Branch,
    password: String,
    token: BranchToken,
    revoked: bool,
}

#[derive(Default)]
struct FakeState {
    accounts: Vec<Account>,
    profiles: HashMap<UserId, ProfileRecord>,
    enterprises: HashMap<EnterpriseId, Enterprise>,
    pins: HashMap<EnterpriseId, String>,
    branches: Vec<BranchAccount>,
    session: Option<RemoteSession>,
    listeners: Vec<UnboundedSender<AuthStateChange>>,
    branch_token: Option<BranchToken>,
    failures: HashMap<&'static str, Failure>,
    network_down: bool,
    gates: HashMap<&'static str, oneshot::Receiver<()>>,
    calls: Vec<&'static str>,
    confirm_sign_up_by_email: bool,
}

impl Failure {
    pub fn remote<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    fn to_error(&self) -> DeskError {
        match self {
            Failure::Network => DeskError::Network(MSG_NETWORK_DOWN.to_string()),
            Failure::Remote { status, message } => {
                RemoteError::new(Some(*status), message.clone()).into()
            }
        }
    }
}

impl TestUser {
    pub fn login_args(&self) -> LoginReqArgs {
        LoginReqArgs::new(self.email.clone(), self.password.clone().into())
    }
}

impl TestBranch {
    pub fn login_args(&self) -> BranchLoginReqArgs {
        BranchLoginReqArgs::new(self.login_id.clone(), self.password.clone().into())
    }
}

impl Debug for FakeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("FakeBackend")
            .field("session", &state.session)
            .field("branch_token", &state.branch_token)
            .field("calls", &state.calls)
            .finish_non_exhaustive()
    }
}

impl FakeState {
    fn set_session(&mut self, session: Option<RemoteSession>, event: AuthEvent) {
        self.session = session.clone();
        self.emit(AuthStateChange { event, session });
    }

    fn emit(&mut self, change: AuthStateChange) {
        self.listeners
            .retain(|listener| listener.unbounded_send(change.clone()).is_ok());
    }

    fn session_user(&self) -> DeskResult<UserId> {
        self.session
            .as_ref()
            .map(|session| session.user.id)
            .ok_or_else(|| RemoteError::new(Some(401), "invalid claim: missing sub claim").into())
    }

    fn session_enterprise(&self) -> DeskResult<EnterpriseId> {
        let user_id = self.session_user()?;
        self.profiles
            .get(&user_id)
            .and_then(|profile| profile.enterprise_id)
            .ok_or_else(|| RemoteError::new(Some(403), "no enterprise linked to caller").into())
    }

    fn branch_mut(&mut self, id: BranchId) -> DeskResult<&mut BranchAccount> {
        self.branches
            .iter_mut()
            .find(|account| account.branch.id == id)
            .ok_or_else(|| NotFoundError::Branch(id.to_string()).into())
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("mutex poisoned")
    }

    /// Runs one remote call: records it, applies injected failures, then waits
    /// on a gate if one is set. The lock is released before waiting
    async fn call<T>(
        &self,
        name: &'static str,
        f: impl FnOnce(&mut FakeState) -> DeskResult<T>,
    ) -> DeskResult<T> {
        let (result, gate) = {
            let mut state = self.lock();
            state.calls.push(name);
            let gate = state.gates.remove(name);
            let result = if state.network_down {
                Err(Failure::Network.to_error())
            } else if let Some(failure) = state.failures.get(name) {
                Err(failure.to_error())
            } else {
                f(&mut state)
            };
            (result, gate)
        };
        if let Some(gate) = gate {
            debug!(name, "holding response");
            // A dropped sender releases the response as well
            let _ = gate.await;
        }
        result
    }

    /// Creates an enterprise, its admin account and the admin's profile
    pub fn seed_enterprise_admin(&self, enterprise_name: &str) -> TestUser {
        let enterprise_id = EnterpriseId::from(Uuid::new_v4());
        let user = self.seed_user(Some(enterprise_id));
        self.lock().enterprises.insert(
            enterprise_id,
            Enterprise {
                id: enterprise_id,
                name: enterprise_name.to_string(),
                currency: Some(CurrencyCode::try_from("EUR").expect("valid currency")),
                theme: None,
                has_security_pin: false,
            },
        );
        user
    }

    /// An admin account whose profile is not linked to any enterprise
    pub fn seed_user(&self, enterprise_id: Option<EnterpriseId>) -> TestUser {
        let user_id = UserId::from(Uuid::new_v4());
        let test_user = TestUser {
            user_id,
            email: format!("admin-{}@example.com", &Uuid::new_v4().to_string()[..8]),
            password: Uuid::new_v4().to_string(),
            full_name: "Test Admin".to_string(),
            enterprise_id,
        };
        let mut state = self.lock();
        state.accounts.push(Account {
            user: RemoteUser {
                id: user_id,
                email: test_user.email.clone(),
            },
            password: test_user.password.clone(),
        });
        state.profiles.insert(
            user_id,
            ProfileRecord {
                id: user_id,
                full_name: test_user.full_name.clone(),
                role: Role::EnterpriseAdmin,
                enterprise_id,
                theme: None,
                currency: None,
            },
        );
        test_user
    }

    pub fn seed_branch(&self, enterprise_id: EnterpriseId, name: &str) -> TestBranch {
        let mut state = self.lock();
        let branch_number = next_branch_number(&state, enterprise_id);
        let login_id = format!("branch-{}", &Uuid::new_v4().to_string()[..8]);
        let branch = Branch {
            id: BranchId::from(Uuid::new_v4()),
            enterprise_id,
            name: BranchName::try_from(name.to_string()).expect("valid branch name"),
            login_id: Some(BranchLoginId::try_from(login_id.clone()).expect("valid login id")),
            branch_number: Some(branch_number),
            theme: Some(ThemeName::try_from("dark").expect("valid theme")),
            currency: Some(CurrencyCode::try_from("GBP").expect("valid currency")),
        };
        let test_branch = TestBranch {
            branch: branch.clone(),
            login_id,
            password: Uuid::new_v4().to_string(),
            token: BranchToken::from(format!("branch-token-{}", Uuid::new_v4())),
        };
        state.branches.push(BranchAccount {
            branch,
            password: test_branch.password.clone(),
            token: test_branch.token.clone(),
            revoked: false,
        });
        test_branch
    }

    /// A session for `user` that has not been announced to anyone
    pub fn session_for(&self, user: &TestUser) -> RemoteSession {
        new_session(RemoteUser {
            id: user.user_id,
            email: user.email.clone(),
        })
    }

    /// Makes `user` signed in as if a session had been saved on a previous
    /// page load. No notification is sent
    pub fn install_session(&self, user: &TestUser) {
        let session = self.session_for(user);
        self.lock().session = Some(session);
    }

    /// Sends a notification as the auth system would, for example when
    /// another tab signs in or a recovery link is followed
    pub fn emit(&self, event: AuthEvent, session: Option<RemoteSession>) {
        let mut state = self.lock();
        if event != AuthEvent::PasswordRecovery {
            state.session = session.clone();
        }
        state.emit(AuthStateChange { event, session });
    }

    pub fn fail(&self, name: &'static str, failure: Failure) {
        self.lock().failures.insert(name, failure);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn set_network_down(&self, value: bool) {
        self.lock().network_down = value;
    }

    /// The next call to `name` is applied immediately but its response is
    /// only returned once the returned sender is used or dropped
    pub fn hold_next(&self, name: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().gates.insert(name, rx);
        tx
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.lock().calls.iter().filter(|x| **x == name).count()
    }

    /// The branch token currently sent with requests
    pub fn branch_token_header(&self) -> Option<BranchToken> {
        self.lock().branch_token.clone()
    }

    pub fn has_session(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Further use of `token` is answered with 401
    pub fn revoke_branch_token(&self, token: &BranchToken) {
        for account in self.lock().branches.iter_mut() {
            if &account.token == token {
                account.revoked = true;
            }
        }
    }

    pub fn remove_profile(&self, user_id: UserId) {
        self.lock().profiles.remove(&user_id);
    }

    pub fn insert_profile(&self, record: ProfileRecord) {
        self.lock().profiles.insert(record.id, record);
    }

    pub fn profile(&self, user_id: UserId) -> Option<ProfileRecord> {
        self.lock().profiles.get(&user_id).cloned()
    }

    pub fn enterprise(&self, id: EnterpriseId) -> Option<Enterprise> {
        self.lock().enterprises.get(&id).cloned()
    }

    pub fn branch(&self, id: BranchId) -> Option<Branch> {
        self.lock()
            .branches
            .iter()
            .find(|account| account.branch.id == id)
            .map(|account| account.branch.clone())
    }

    pub fn set_enterprise_settings(
        &self,
        id: EnterpriseId,
        theme: Option<&str>,
        currency: Option<&str>,
    ) {
        if let Some(enterprise) = self.lock().enterprises.get_mut(&id) {
            enterprise.theme = theme.map(|x| ThemeName::try_from(x).expect("valid theme"));
            enterprise.currency =
                currency.map(|x| CurrencyCode::try_from(x).expect("valid currency"));
        }
    }

    pub fn set_profile_settings(
        &self,
        user_id: UserId,
        theme: Option<&str>,
        currency: Option<&str>,
    ) {
        if let Some(profile) = self.lock().profiles.get_mut(&user_id) {
            profile.theme = theme.map(|x| ThemeName::try_from(x).expect("valid theme"));
            profile.currency = currency.map(|x| CurrencyCode::try_from(x).expect("valid currency"));
        }
    }

    pub fn set_security_pin_for(&self, id: EnterpriseId, pin: &str) {
        let mut state = self.lock();
        state.pins.insert(id, pin.to_string());
        if let Some(enterprise) = state.enterprises.get_mut(&id) {
            enterprise.has_security_pin = true;
        }
    }

    pub fn security_pin(&self, id: EnterpriseId) -> Option<String> {
        self.lock().pins.get(&id).cloned()
    }

    pub fn set_confirm_sign_up_by_email(&self, value: bool) {
        self.lock().confirm_sign_up_by_email = value;
    }
}

impl RemoteBackend for FakeBackend {
    async fn get_session(&self) -> DeskResult<Option<RemoteSession>> {
        self.call("get_session", |state| Ok(state.session.clone()))
            .await
    }

    fn on_auth_state_change(&self) -> UnboundedReceiver<AuthStateChange> {
        let (tx, rx) = mpsc::unbounded();
        let mut state = self.lock();
        state.calls.push("on_auth_state_change");
        state.listeners.push(tx);
        rx
    }

    async fn sign_in_with_password(&self, args: &LoginReqArgs) -> DeskResult<RemoteSession> {
        self.call("sign_in_with_password", |state| {
            let user = state
                .accounts
                .iter()
                .find(|account| {
                    account.user.email == args.email
                        && account.password == args.password.expose_secret()
                })
                .map(|account| account.user.clone())
                .ok_or_else(|| RemoteError::new(Some(400), MSG_INVALID_LOGIN))?;
            let session = new_session(user);
            state.set_session(Some(session.clone()), AuthEvent::SignedIn);
            Ok(session)
        })
        .await
    }

    async fn sign_up(&self, args: &SignUpReqArgs) -> DeskResult<Option<RemoteSession>> {
        self.call("sign_up", |state| {
            if state.accounts.iter().any(|x| x.user.email == args.email) {
                return Err(RemoteError::new(Some(422), "User already registered").into());
            }
            let user = RemoteUser {
                id: UserId::from(Uuid::new_v4()),
                email: args.email.clone(),
            };
            state.accounts.push(Account {
                user: user.clone(),
                password: args.password.expose_secret().to_string(),
            });
            state.profiles.insert(
                user.id,
                ProfileRecord {
                    id: user.id,
                    full_name: args.full_name.to_string(),
                    role: Role::EnterpriseAdmin,
                    enterprise_id: None,
                    theme: None,
                    currency: None,
                },
            );
            if state.confirm_sign_up_by_email {
                return Ok(None);
            }
            let session = new_session(user);
            state.set_session(Some(session.clone()), AuthEvent::SignedIn);
            Ok(Some(session))
        })
        .await
    }

    async fn sign_out(&self) -> DeskResult<()> {
        self.call("sign_out", |state| {
            state.set_session(None, AuthEvent::SignedOut);
            Ok(())
        })
        .await
    }

    async fn reset_password_for_email(&self, _email: &str) -> DeskResult<()> {
        self.call("reset_password_for_email", |_| Ok(())).await
    }

    async fn update_user_password(&self, new_password: &SecretString) -> DeskResult<()> {
        self.call("update_user_password", |state| {
            let user_id = state.session_user()?;
            if let Some(account) = state.accounts.iter_mut().find(|x| x.user.id == user_id) {
                account.password = new_password.expose_secret().to_string();
            }
            let session = state.session.clone();
            state.emit(AuthStateChange {
                event: AuthEvent::UserUpdated,
                session,
            });
            Ok(())
        })
        .await
    }

    fn set_branch_token(&self, token: Option<&BranchToken>) {
        let mut state = self.lock();
        state.calls.push("set_branch_token");
        state.branch_token = token.cloned();
    }

    async fn fetch_profile(&self, user_id: UserId) -> DeskResult<Option<ProfileRecord>> {
        self.call("fetch_profile", |state| {
            Ok(state.profiles.get(&user_id).cloned())
        })
        .await
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> DeskResult<ProfileRecord> {
        self.call("update_profile", |state| {
            if state.session_user()? != user_id {
                return Err(NotFoundError::Profile(user_id.to_string()).into());
            }
            let profile = state
                .profiles
                .get_mut(&user_id)
                .ok_or_else(|| NotFoundError::Profile(user_id.to_string()))?;
            if let Some(full_name) = &update.full_name {
                profile.full_name = full_name.to_string();
            }
            if let Some(theme) = &update.theme {
                profile.theme = Some(theme.clone());
            }
            if let Some(currency) = &update.currency {
                profile.currency = Some(currency.clone());
            }
            Ok(profile.clone())
        })
        .await
    }

    async fn fetch_enterprise(&self, id: EnterpriseId) -> DeskResult<Option<Enterprise>> {
        self.call("fetch_enterprise", |state| {
            Ok(state.enterprises.get(&id).cloned())
        })
        .await
    }

    async fn update_enterprise(
        &self,
        id: EnterpriseId,
        update: &EnterpriseUpdate,
    ) -> DeskResult<Enterprise> {
        self.call("update_enterprise", |state| {
            let enterprise = state
                .enterprises
                .get_mut(&id)
                .ok_or_else(|| NotFoundError::Enterprise(id.to_string()))?;
            if let Some(name) = &update.name {
                enterprise.name = name.to_string();
            }
            if let Some(theme) = &update.theme {
                enterprise.theme = Some(theme.clone());
            }
            if let Some(currency) = &update.currency {
                enterprise.currency = Some(currency.clone());
            }
            Ok(enterprise.clone())
        })
        .await
    }

    async fn fetch_branch_by_token(&self, token: &BranchToken) -> DeskResult<Option<Branch>> {
        self.call("fetch_branch_by_token", |state| {
            match state.branches.iter().find(|x| &x.token == token) {
                Some(account) if account.revoked => {
                    Err(RemoteError::new(Some(401), MSG_JWT_EXPIRED).into())
                }
                Some(account) => Ok(Some(account.branch.clone())),
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_branches(&self, enterprise_id: EnterpriseId) -> DeskResult<Vec<Branch>> {
        self.call("list_branches", |state| {
            let mut result: Vec<Branch> = state
                .branches
                .iter()
                .filter(|x| x.branch.enterprise_id == enterprise_id)
                .map(|x| x.branch.clone())
                .collect();
            result.sort_by_key(|x| x.branch_number);
            Ok(result)
        })
        .await
    }

    async fn update_branch(&self, id: BranchId, update: &BranchUpdate) -> DeskResult<Branch> {
        self.call("update_branch", |state| {
            let branch = &mut state.branch_mut(id)?.branch;
            if let Some(name) = &update.name {
                branch.name = name.clone();
            }
            if let Some(theme) = &update.theme {
                branch.theme = Some(theme.clone());
            }
            if let Some(currency) = &update.currency {
                branch.currency = Some(currency.clone());
            }
            Ok(branch.clone())
        })
        .await
    }

    async fn login_branch(&self, args: &BranchLoginReqArgs) -> DeskResult<BranchLoginResponse> {
        self.call("login_branch", |state| {
            let account = state
                .branches
                .iter()
                .find(|x| {
                    !x.revoked
                        && x.branch.login_id.as_deref() == Some(args.login_id.as_str())
                        && x.password == args.password.expose_secret()
                })
                .ok_or_else(|| {
                    RemoteError::new(
                        Some(400),
                        format!("{MSG_INVALID_LOGIN}: no branch matches {:?}", args.login_id),
                    )
                })?;
            Ok(BranchLoginResponse {
                id: account.branch.id,
                name: account.branch.name.clone(),
                enterprise_id: account.branch.enterprise_id,
                api_token: account.token.clone(),
                role: Role::BranchManager,
            })
        })
        .await
    }

    async fn create_branch_account(&self, account: NewBranchAccount<'_>) -> DeskResult<Branch> {
        self.call("create_branch_account", |state| {
            if state.session_enterprise()? != account.enterprise_id {
                return Err(RemoteError::new(Some(403), "not your enterprise").into());
            }
            let branch = Branch {
                id: BranchId::from(Uuid::new_v4()),
                enterprise_id: account.enterprise_id,
                name: account.args.name.clone(),
                login_id: Some(account.login_id.clone()),
                branch_number: Some(account.branch_number),
                theme: account.args.theme.clone(),
                currency: account.args.currency.clone(),
            };
            state.branches.push(BranchAccount {
                branch: branch.clone(),
                password: account.args.password.expose_secret().to_string(),
                token: BranchToken::from(format!("branch-token-{}", Uuid::new_v4())),
                revoked: false,
            });
            Ok(branch)
        })
        .await
    }

    async fn get_next_branch_number(&self, enterprise_id: EnterpriseId) -> DeskResult<u32> {
        self.call("get_next_branch_number", |state| {
            Ok(next_branch_number(state, enterprise_id))
        })
        .await
    }

    async fn update_branch_settings(&self, args: &BranchSettingsReqArgs) -> DeskResult<Branch> {
        self.call("update_branch_settings", |state| {
            let header = state.branch_token.clone();
            let account = state.branch_mut(args.branch_id)?;
            if header.as_ref() != Some(&account.token) || account.revoked {
                return Err(RemoteError::new(Some(401), MSG_JWT_EXPIRED).into());
            }
            if let Some(theme) = &args.theme {
                account.branch.theme = Some(theme.clone());
            }
            if let Some(currency) = &args.currency {
                account.branch.currency = Some(currency.clone());
            }
            Ok(account.branch.clone())
        })
        .await
    }

    async fn reset_branch_password(&self, args: &ResetBranchPasswordReqArgs) -> DeskResult<()> {
        self.call("reset_branch_password", |state| {
            let account = state.branch_mut(args.branch_id)?;
            account.password = args.new_password.expose_secret().to_string();
            Ok(())
        })
        .await
    }

    async fn delete_branch(
        &self,
        branch_id: BranchId,
        enterprise_id: EnterpriseId,
        pin: &SecurityPin,
    ) -> DeskResult<()> {
        self.call("delete_branch", |state| {
            if state.pins.get(&enterprise_id).map(String::as_str) != Some(pin.expose()) {
                return Err(RemoteError::new(Some(400), MSG_PIN_MISMATCH).into());
            }
            let before = state.branches.len();
            state.branches.retain(|x| {
                !(x.branch.id == branch_id && x.branch.enterprise_id == enterprise_id)
            });
            if state.branches.len() == before {
                return Err(NotFoundError::Branch(branch_id.to_string()).into());
            }
            Ok(())
        })
        .await
    }

    async fn set_security_pin(
        &self,
        new_pin: &SecurityPin,
        old_pin: Option<&SecurityPin>,
    ) -> DeskResult<()> {
        self.call("set_security_pin", |state| {
            let enterprise_id = state.session_enterprise()?;
            if let Some(existing) = state.pins.get(&enterprise_id) {
                if old_pin.map(SecurityPin::expose) != Some(existing.as_str()) {
                    return Err(RemoteError::new(Some(400), MSG_PIN_MISMATCH).into());
                }
            }
            state
                .pins
                .insert(enterprise_id, new_pin.expose().to_string());
            if let Some(enterprise) = state.enterprises.get_mut(&enterprise_id) {
                enterprise.has_security_pin = true;
            }
            Ok(())
        })
        .await
    }

    async fn verify_security_pin(&self, pin: &SecurityPin) -> DeskResult<bool> {
        self.call("verify_security_pin", |state| {
            let enterprise_id = state.session_enterprise()?;
            Ok(state.pins.get(&enterprise_id).map(String::as_str) == Some(pin.expose()))
        })
        .await
    }
}

fn next_branch_number(state: &FakeState, enterprise_id: EnterpriseId) -> u32 {
    state
        .branches
        .iter()
        .filter(|x| x.branch.enterprise_id == enterprise_id)
        .filter_map(|x| x.branch.branch_number)
        .max()
        .unwrap_or(0)
        + 1
}

fn new_session(user: RemoteUser) -> RemoteSession {
    RemoteSession {
        access_token: SecretString::from(format!("access-{}", Uuid::new_v4())),
        refresh_token: Some(SecretString::from(format!("refresh-{}", Uuid::new_v4()))),
        expires_at: None,
        user,
    }
}
