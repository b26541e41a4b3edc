//! This module stores the expected format of the arguments for the requests
//! The structure of the module is supposed to match the path of the endpoints.
//! For example `/rest/v1/rpc/set_security_pin` would map to
//! [`api::SetPinReqArgs`]. Secrets are only exposed when the request body is
//! built so none of these types print them

use secrecy::{ExposeSecret, SecretString};
use std::fmt::Debug;

use crate::uac::{DisplayName, ValidationError};

pub mod api;

#[derive(serde::Deserialize, Clone)]
pub struct LoginReqArgs {
    pub email: String,
    pub password: SecretString,
}

#[derive(serde::Deserialize, Clone)]
pub struct SignUpReqArgs {
    pub email: String,
    pub password: SecretString,
    pub password_check: SecretString,
    pub full_name: DisplayName,
}

#[derive(serde::Deserialize, Clone)]
pub struct BranchLoginReqArgs {
    /// Not validated, anything typed is sent so the failure message stays
    /// the same whichever field is wrong
    pub login_id: String,
    pub password: SecretString,
}

impl LoginReqArgs {
    pub fn new<S: Into<String>>(email: S, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = email;
        self
    }

    pub fn password(mut self, password: SecretString) -> Self {
        self.password = password;
        self
    }
}

impl SignUpReqArgs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        passwords_match(&self.password, &self.password_check)
    }
}

impl BranchLoginReqArgs {
    pub fn new<S: Into<String>>(login_id: S, password: SecretString) -> Self {
        Self {
            login_id: login_id.into(),
            password,
        }
    }
}

/// Shared check for every form that asks for a password twice
pub fn passwords_match(
    password: &SecretString,
    password_check: &SecretString,
) -> Result<(), ValidationError> {
    if password.expose_secret() == password_check.expose_secret() {
        Ok(())
    } else {
        Err(ValidationError::PasswordsDoNotMatch)
    }
}

impl Debug for LoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReqArgs")
            .field("email", &self.email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

impl Debug for SignUpReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpReqArgs")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

impl Debug for BranchLoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchLoginReqArgs")
            .field("login_id", &self.login_id)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}
