use std::fmt::Debug;

use bizdesk_shared::{
    const_config::{
        client::{HEADER_PREFER, PREFER_RETURN_REPRESENTATION},
        path::{
            PATH_AUTH_LOGOUT, PATH_AUTH_RECOVER, PATH_AUTH_SIGNUP, PATH_AUTH_TOKEN_PASSWORD,
            PATH_AUTH_TOKEN_REFRESH, PATH_AUTH_USER_UPDATE, TABLE_ENTERPRISES, TABLE_PROFILES,
        },
    },
    enterprise::{Enterprise, EnterpriseUpdate},
    errors::{DeskError, DeskResult, NotFoundError, NotLoggedInError},
    id::{EnterpriseId, UserId},
    req_args::{LoginReqArgs, SignUpReqArgs},
    uac::{ProfileRecord, ProfileUpdate},
};
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use tracing::{info, warn};

use crate::{
    backend::{AuthEvent, LocalStore, RemoteSession, RemoteUser},
    Client,
};

use super::now;

pub mod admin;

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: RemoteUser,
}

/// Sign up returns a session unless the email still has to be confirmed
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    PendingConfirmation(RemoteUser),
}

impl<S: LocalStore> Client<S> {
    /// Returns the saved session, refreshing it first if it has expired
    #[tracing::instrument(skip(self))]
    pub async fn get_session(&self) -> DeskResult<Option<RemoteSession>> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        if !session.is_expired_at(now()) {
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token.clone() else {
            info!("saved session expired");
            self.set_session(None, AuthEvent::SignedOut);
            return Ok(None);
        };
        match self.refresh_session(&refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(DeskError::Remote(err)) => {
                warn!(?err, "saved session could not be refreshed");
                self.set_session(None, AuthEvent::SignedOut);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn refresh_session(&self, refresh_token: &SecretString) -> DeskResult<RemoteSession> {
        let args = serde_json::json!({ "refresh_token": refresh_token.expose_secret() });
        let request = self.request_spec(PATH_AUTH_TOKEN_REFRESH).json(&args);
        let response: TokenResponse = self.send_expect_json(request).await?;
        let session = response.into_session();
        self.set_session(Some(session.clone()), AuthEvent::TokenRefreshed);
        Ok(session)
    }

    #[tracing::instrument(skip(self))]
    pub async fn sign_in_with_password(&self, args: &LoginReqArgs) -> DeskResult<RemoteSession> {
        let args = serde_json::json!({
            "email": args.email,
            "password": args.password.expose_secret(),
        });
        let request = self.request_spec(PATH_AUTH_TOKEN_PASSWORD).json(&args);
        let response: TokenResponse = self.send_expect_json(request).await?;
        let session = response.into_session();
        self.set_session(Some(session.clone()), AuthEvent::SignedIn);
        Ok(session)
    }

    #[tracing::instrument(skip(self))]
    pub async fn sign_up(&self, args: &SignUpReqArgs) -> DeskResult<Option<RemoteSession>> {
        let args = serde_json::json!({
            "email": args.email,
            "password": args.password.expose_secret(),
            "data": { "full_name": args.full_name },
        });
        let request = self.request_spec(PATH_AUTH_SIGNUP).json(&args);
        match self.send_expect_json::<SignUpResponse>(request).await? {
            SignUpResponse::Session(response) => {
                let session = response.into_session();
                self.set_session(Some(session.clone()), AuthEvent::SignedIn);
                Ok(Some(session))
            }
            SignUpResponse::PendingConfirmation(user) => {
                info!(user_id = %user.id, "sign up pending confirmation");
                Ok(None)
            }
        }
    }

    /// The local session is dropped whatever the backend answers
    #[tracing::instrument(skip(self))]
    pub async fn sign_out(&self) -> DeskResult<()> {
        if self.current_session().is_none() {
            return Ok(());
        }
        let request = self.request_spec(PATH_AUTH_LOGOUT);
        let result = self.send_expect_empty(request).await;
        self.set_session(None, AuthEvent::SignedOut);
        result
    }

    #[tracing::instrument(skip(self))]
    pub async fn reset_password_for_email(&self, email: &str) -> DeskResult<()> {
        let args = serde_json::json!({ "email": email });
        let request = self.request_spec(PATH_AUTH_RECOVER).json(&args);
        self.send_expect_empty(request).await
    }

    #[tracing::instrument(skip(self, new_password))]
    pub async fn update_user_password(&self, new_password: &SecretString) -> DeskResult<()> {
        let Some(session) = self.current_session() else {
            return Err(NotLoggedInError.into());
        };
        let args = serde_json::json!({ "password": new_password.expose_secret() });
        let request = self.request_spec(PATH_AUTH_USER_UPDATE).json(&args);
        let user: RemoteUser = self.send_expect_json(request).await?;
        let session = RemoteSession { user, ..session };
        self.set_session(Some(session), AuthEvent::UserUpdated);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_profile(&self, user_id: UserId) -> DeskResult<Option<ProfileRecord>> {
        let request = self
            .table_request(Method::GET, TABLE_PROFILES)
            .query(&[("id", eq(user_id)), ("select", "*".to_string())]);
        let rows: Vec<ProfileRecord> = self.send_expect_json(request).await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> DeskResult<ProfileRecord> {
        let request = self
            .table_request(Method::PATCH, TABLE_PROFILES)
            .query(&[("id", eq(user_id))])
            .header(HEADER_PREFER, PREFER_RETURN_REPRESENTATION)
            .json(update);
        let rows: Vec<ProfileRecord> = self.send_expect_json(request).await?;
        first_row(rows, || NotFoundError::Profile(user_id.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_enterprise(&self, id: EnterpriseId) -> DeskResult<Option<Enterprise>> {
        let request = self
            .table_request(Method::GET, TABLE_ENTERPRISES)
            .query(&[("id", eq(id)), ("select", "*".to_string())]);
        let rows: Vec<Enterprise> = self.send_expect_json(request).await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_enterprise(
        &self,
        id: EnterpriseId,
        update: &EnterpriseUpdate,
    ) -> DeskResult<Enterprise> {
        let request = self
            .table_request(Method::PATCH, TABLE_ENTERPRISES)
            .query(&[("id", eq(id))])
            .header(HEADER_PREFER, PREFER_RETURN_REPRESENTATION)
            .json(update);
        let rows: Vec<Enterprise> = self.send_expect_json(request).await?;
        first_row(rows, || NotFoundError::Enterprise(id.to_string()))
    }
}

/// Filter value matching a single column value
fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Writes come back as a list of the rows they touched. An empty list means
/// nothing matched (or row level security hid it)
fn first_row<T>(rows: Vec<T>, not_found: impl FnOnce() -> NotFoundError) -> DeskResult<T> {
    rows.into_iter().next().ok_or_else(|| not_found().into())
}

impl TokenResponse {
    fn into_session(self) -> RemoteSession {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|x| now() + x));
        RemoteSession {
            access_token: self.access_token.into(),
            refresh_token: self.refresh_token.map(Into::into),
            expires_at,
            user: self.user,
        }
    }
}

impl Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("user", &self.user)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
