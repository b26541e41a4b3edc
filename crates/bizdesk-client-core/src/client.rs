//! [`RemoteBackend`] over HTTP for the hosted backend-as-a-service
//!
//! Requests are sent with `reqwest_cross` so the same code runs natively (on
//! tokio) and in the browser. Results come back over a oneshot channel.

use anyhow::Context as _;
use bizdesk_shared::{
    const_config::{
        client::{HEADER_API_KEY, HEADER_BRANCH_TOKEN},
        path::{PathSpec, PATH_AUTH_USER, PATH_REST_PREFIX, PATH_RPC_PREFIX},
        storage::STORAGE_KEY_REMOTE_SESSION,
    },
    errors::{DeskResult, RemoteError},
    log_err_as_warn,
    token::BranchToken,
};
use closure_traits::{ChannelCallBack, ChannelCallBackOutput};
use futures::channel::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot,
};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret as _, SecretString};
use std::{
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{info, warn};

use crate::{
    backend::{AuthEvent, AuthStateChange, LocalStore, RemoteSession, RemoteUser},
    configuration::BackendSettings,
};

pub mod api;
mod remote_backend;

pub struct Client<S> {
    api_client: reqwest::Client,
    inner: Arc<Mutex<ClientInner>>,
    store: Arc<S>,
}

struct ClientInner {
    base_url: String,
    anon_key: SecretString,
    session: Option<RemoteSession>,
    /// Set once storage has been checked for a saved session
    session_restored: bool,
    branch_token: Option<BranchToken>,
    listeners: Vec<UnboundedSender<AuthStateChange>>,
}

/// Form the remote session is saved in between page loads
#[derive(serde::Serialize, serde::Deserialize)]
struct StoredSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: RemoteUser,
}

/// Tokens the auth system appends to the URL fragment of email links
#[derive(Clone, PartialEq, Eq)]
struct FragmentTokens {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    link_type: Option<String>,
}

impl<S> Clone for Client<S> {
    fn clone(&self) -> Self {
        Self {
            api_client: self.api_client.clone(),
            inner: Arc::clone(&self.inner),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Client")
            .field("base_url", &inner.base_url)
            .field("session", &inner.session)
            .field("branch_token", &inner.branch_token)
            .finish_non_exhaustive()
    }
}

impl<S> Client<S> {
    fn lock(&self) -> MutexGuard<'_, ClientInner> {
        self.inner.lock().expect("mutex poisoned")
    }
}

impl<S: LocalStore> Client<S> {
    #[tracing::instrument(name = "NEW CLIENT-CORE", skip(store))]
    pub fn new(settings: &BackendSettings, store: S) -> anyhow::Result<Self> {
        let api_client = reqwest::Client::builder()
            .build()
            .context("unable to create reqwest client")?;
        Ok(Self {
            api_client,
            inner: Arc::new(Mutex::new(ClientInner {
                base_url: settings.base_url().to_string(),
                anon_key: settings.anon_key.clone(),
                session: None,
                session_restored: false,
                branch_token: None,
                listeners: Vec::new(),
            })),
            store: Arc::new(store),
        })
    }

    /// Picks up a session from an email link (sign up confirmation or
    /// password recovery). Returns `false` if the fragment carries no tokens
    #[tracing::instrument(skip(self, fragment))]
    pub async fn detect_session_in_url(&self, fragment: &str) -> DeskResult<bool> {
        let Some(tokens) = parse_fragment(fragment) else {
            return Ok(false);
        };
        let request = self.build_request(
            PATH_AUTH_USER.method.clone(),
            PATH_AUTH_USER.path,
            &tokens.access_token,
            None,
        );
        let user: RemoteUser = self.send_expect_json(request).await?;
        let event = if tokens.link_type.as_deref() == Some("recovery") {
            AuthEvent::PasswordRecovery
        } else {
            AuthEvent::SignedIn
        };
        info!(?event, user_id = %user.id, "session found in url");
        let session = RemoteSession {
            access_token: tokens.access_token.into(),
            refresh_token: tokens.refresh_token.map(Into::into),
            expires_at: tokens.expires_in.map(|x| now() + x),
            user,
        };
        self.set_session(Some(session), event);
        Ok(true)
    }

    fn subscribe(&self) -> UnboundedReceiver<AuthStateChange> {
        let (tx, rx) = mpsc::unbounded();
        self.lock().listeners.push(tx);
        rx
    }

    /// The session in memory, restoring it from storage the first time
    fn current_session(&self) -> Option<RemoteSession> {
        let mut inner = self.lock();
        if inner.session.is_none() && !inner.session_restored {
            inner.session_restored = true;
            match self.store.get(STORAGE_KEY_REMOTE_SESSION) {
                Ok(Some(text)) => match serde_json::from_str::<StoredSession>(&text) {
                    Ok(stored) => inner.session = Some(stored.into()),
                    Err(err) => warn!(?err, "discarding unreadable stored session"),
                },
                Ok(None) => {}
                Err(err) => warn!(?err, "failed to read stored session"),
            }
        }
        inner.session.clone()
    }

    /// Replaces the session, saves it and tells every listener
    fn set_session(&self, session: Option<RemoteSession>, event: AuthEvent) {
        match &session {
            Some(session) => match serde_json::to_string(&StoredSession::from(session)) {
                Ok(text) => log_err_as_warn!(self.store.set(STORAGE_KEY_REMOTE_SESSION, &text)),
                Err(err) => warn!(?err, "failed to serialize session"),
            },
            None => log_err_as_warn!(self.store.remove(STORAGE_KEY_REMOTE_SESSION)),
        }
        let change = AuthStateChange { event, session };
        let mut inner = self.lock();
        inner.session_restored = true;
        inner.session = change.session.clone();
        inner
            .listeners
            .retain(|listener| listener.unbounded_send(change.clone()).is_ok());
    }

    fn set_branch_token_header(&self, token: Option<&BranchToken>) {
        self.lock().branch_token = token.cloned();
    }

    /// Builds a request carrying the current credentials
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let branch_token = self.lock().branch_token.clone();
        self.request_with_token(method, path, branch_token.as_ref())
    }

    /// Same as [`Self::request`] but with `branch_token` in place of the one
    /// currently set
    fn request_with_token(
        &self,
        method: Method,
        path: &str,
        branch_token: Option<&BranchToken>,
    ) -> reqwest::RequestBuilder {
        let bearer = {
            let inner = self.lock();
            match &inner.session {
                Some(session) => session.access_token.expose_secret().to_string(),
                None => inner.anon_key.expose_secret().to_string(),
            }
        };
        self.build_request(method, path, &bearer, branch_token)
    }

    fn request_spec(&self, path_spec: PathSpec) -> reqwest::RequestBuilder {
        self.request(path_spec.method, path_spec.path)
    }

    fn table_request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        self.request(method, &format!("{PATH_REST_PREFIX}/{table}"))
    }

    fn rpc_request(&self, procedure: &str) -> reqwest::RequestBuilder {
        self.request(Method::POST, &format!("{PATH_RPC_PREFIX}/{procedure}"))
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        bearer: &str,
        branch_token: Option<&BranchToken>,
    ) -> reqwest::RequestBuilder {
        let (url, anon_key) = {
            let inner = self.lock();
            (
                format!("{}{path}", inner.base_url),
                inner.anon_key.expose_secret().to_string(),
            )
        };
        let request = self
            .api_client
            .request(method, url)
            .header(HEADER_API_KEY, anon_key)
            .bearer_auth(bearer);
        match branch_token {
            Some(token) => request.header(HEADER_BRANCH_TOKEN, token.expose()),
            None => request,
        }
    }

    async fn send_expect_json<U>(&self, request: reqwest::RequestBuilder) -> DeskResult<U>
    where
        U: Send + Debug + serde::de::DeserializeOwned + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_json_body(resp).await;
            if tx.send(msg).is_err() {
                warn!("response arrived after the caller stopped waiting");
            }
        };
        initiate_request(request, on_done);
        rx.await.context("response channel closed")?
    }

    async fn send_expect_empty(&self, request: reqwest::RequestBuilder) -> DeskResult<()> {
        let (tx, rx) = oneshot::channel();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_empty(resp).await;
            if tx.send(msg).is_err() {
                warn!("response arrived after the caller stopped waiting");
            }
        };
        initiate_request(request, on_done);
        rx.await.context("response channel closed")?
    }
}

#[tracing::instrument(skip(request, on_done))]
// WARNING: Must skip request as its headers carry credentials
fn initiate_request<F, O>(request: reqwest::RequestBuilder, on_done: F)
where
    F: ChannelCallBack<O>,
    O: ChannelCallBackOutput,
{
    reqwest_cross::fetch(request, on_done)
}

#[tracing::instrument(ret, err(Debug))]
async fn process_empty(response: reqwest::Result<reqwest::Response>) -> DeskResult<()> {
    let (response, status) = extract_response(response)?;
    if status.is_success() {
        Ok(())
    } else {
        Err(handle_error(response).await.into())
    }
}

#[tracing::instrument(ret, err(Debug))]
async fn process_json_body<T>(response: reqwest::Result<reqwest::Response>) -> DeskResult<T>
where
    T: Debug + serde::de::DeserializeOwned,
{
    let (response, status) = extract_response(response)?;
    if status.is_success() {
        Ok(response
            .json()
            .await
            .context("failed to parse result as json")?)
    } else {
        Err(handle_error(response).await.into())
    }
}

#[tracing::instrument(ret)]
async fn handle_error(response: reqwest::Response) -> RemoteError {
    let status = response.status();
    debug_assert!(
        !status.is_success(),
        "this is supposed to be an error, right? Status code is: {status}"
    );
    let Ok(body) = response.text().await else {
        return RemoteError::new(Some(status.as_u16()), "failed to get response body");
    };
    RemoteError::new(Some(status.as_u16()), error_message(status, &body))
}

/// The backend's own wording is shown to the user unchanged
fn error_message(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return format!("request failed with status code: {status} and no body");
    }
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(serde_json::Value::String(text)) = fields.get(key) {
                return text.clone();
            }
        }
    }
    body.to_string()
}

/// Provides a way to standardize the error message
#[tracing::instrument(ret, err(Debug))]
fn extract_response(
    response: reqwest::Result<reqwest::Response>,
) -> anyhow::Result<(reqwest::Response, StatusCode)> {
    if response.is_err() {
        info!("Response is err: {:#?}", response);
    }
    let response = response.context("failed to send request")?;
    let status = response.status();
    Ok((response, status))
}

fn parse_fragment(fragment: &str) -> Option<FragmentTokens> {
    let fragment = fragment.trim_start_matches('#');
    let url = reqwest::Url::parse(&format!("http://localhost/?{fragment}")).ok()?;
    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_in = None;
    let mut link_type = None;
    for (key, value) in url.query_pairs() {
        match &*key {
            "access_token" => access_token = Some(value.into_owned()),
            "refresh_token" => refresh_token = Some(value.into_owned()),
            "expires_in" => expires_in = value.parse().ok(),
            "type" => link_type = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(FragmentTokens {
        access_token: access_token.filter(|x| !x.is_empty())?,
        refresh_token,
        expires_in,
        link_type,
    })
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl From<&RemoteSession> for StoredSession {
    fn from(value: &RemoteSession) -> Self {
        Self {
            access_token: value.access_token.expose_secret().to_string(),
            refresh_token: value
                .refresh_token
                .as_ref()
                .map(|x| x.expose_secret().to_string()),
            expires_at: value.expires_at,
            user: value.user.clone(),
        }
    }
}

impl From<StoredSession> for RemoteSession {
    fn from(value: StoredSession) -> Self {
        Self {
            access_token: value.access_token.into(),
            refresh_token: value.refresh_token.map(Into::into),
            expires_at: value.expires_at,
            user: value.user,
        }
    }
}

impl Debug for FragmentTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentTokens")
            .field("link_type", &self.link_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> + Send {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> + Send {}
}

#[cfg(target_arch = "wasm32")]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> {}
}
