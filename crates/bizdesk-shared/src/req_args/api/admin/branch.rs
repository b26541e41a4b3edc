use secrecy::{ExposeSecret as _, SecretString};
use std::fmt::Debug;

use crate::{
    branch::{BranchLoginId, BranchName},
    id::BranchId,
    req_args::passwords_match,
    settings::{CurrencyCode, ThemeName},
    uac::ValidationError,
};

/// Form data for a new branch account. The login id is generated from the
/// next branch number when left empty
#[derive(Clone)]
pub struct NewBranchReqArgs {
    pub name: BranchName,
    pub login_id: Option<BranchLoginId>,
    pub password: SecretString,
    pub password_check: SecretString,
    pub currency: Option<CurrencyCode>,
    pub theme: Option<ThemeName>,
}

#[derive(Clone)]
pub struct ResetBranchPasswordReqArgs {
    pub branch_id: BranchId,
    pub new_password: SecretString,
    pub new_password_check: SecretString,
}

#[derive(Debug, serde::Serialize, Clone, PartialEq, Eq)]
pub struct BranchSettingsReqArgs {
    pub branch_id: BranchId,
    pub currency: Option<CurrencyCode>,
    pub theme: Option<ThemeName>,
}

impl NewBranchReqArgs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        passwords_match(&self.password, &self.password_check)
    }
}

impl ResetBranchPasswordReqArgs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        passwords_match(&self.new_password, &self.new_password_check)
    }
}

impl Debug for NewBranchReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewBranchReqArgs")
            .field("name", &self.name)
            .field("login_id", &self.login_id)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .field("currency", &self.currency)
            .field("theme", &self.theme)
            .finish()
    }
}

impl Debug for ResetBranchPasswordReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetBranchPasswordReqArgs")
            .field("branch_id", &self.branch_id)
            .finish_non_exhaustive()
    }
}
