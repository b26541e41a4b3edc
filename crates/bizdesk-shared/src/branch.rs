use std::{fmt::Display, ops::Deref};

use crate::{
    errors::ConversionError,
    id::{BranchId, EnterpriseId},
    settings::{CurrencyCode, ThemeName},
    token::BranchToken,
    uac::Role,
};

/// A row of the `branches` table
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct Branch {
    pub id: BranchId,
    pub enterprise_id: EnterpriseId,
    pub name: BranchName,
    #[serde(default)]
    pub login_id: Option<BranchLoginId>,
    #[serde(default)]
    pub branch_number: Option<u32>,
    #[serde(default)]
    pub theme: Option<ThemeName>,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
}

/// Fields of a branch an enterprise admin may change directly
#[derive(Debug, Default, serde::Serialize, Clone, PartialEq, Eq)]
pub struct BranchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<BranchName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

/// What the `login_branch` procedure returns on success
#[derive(Debug, serde::Deserialize, Clone)]
pub struct BranchLoginResponse {
    pub id: BranchId,
    pub name: BranchName,
    pub enterprise_id: EnterpriseId,
    pub api_token: BranchToken,
    pub role: Role,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

/// Identifier a branch manager types in to log in
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct BranchLoginId(String);

impl BranchName {
    pub const MAX_LENGTH: usize = 50;
}

impl BranchLoginId {
    pub const MAX_LENGTH: usize = 32;

    /// Default login id for the n-th branch of an enterprise
    pub fn for_branch_number(
        enterprise_slug: &str,
        branch_number: u32,
    ) -> Result<Self, ConversionError> {
        format!("{enterprise_slug}-{branch_number:02}").try_into()
    }
}

impl TryFrom<String> for BranchName {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConversionError::check_length(value.trim(), Self::MAX_LENGTH)?;
        Ok(Self(value.trim().to_string()))
    }
}

impl TryFrom<String> for BranchLoginId {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConversionError::check_length(&value, Self::MAX_LENGTH)?;
        if let Some(found) = value.chars().find(|c| c.is_whitespace()) {
            return Err(ConversionError::InvalidCharacter {
                found,
                expected: "no whitespace",
            });
        }
        Ok(Self(value))
    }
}

impl From<BranchName> for String {
    fn from(value: BranchName) -> Self {
        value.0
    }
}

impl From<BranchLoginId> for String {
    fn from(value: BranchLoginId) -> Self {
        value.0
    }
}

impl Deref for BranchLoginId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0[..]
    }
}

impl Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for BranchLoginId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl BranchUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.theme.is_none() && self.currency.is_none()
    }
}
