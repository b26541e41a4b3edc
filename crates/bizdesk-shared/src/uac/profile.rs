use std::fmt::Display;

use crate::{
    branch::{Branch, BranchLoginId},
    errors::ConversionError,
    id::{BranchId, EnterpriseId, UserId},
    settings::{CurrencyCode, ThemeName},
};

use super::{Role, ValidationError};

#[derive(Default, Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    pub const MAX_LENGTH: usize = 60;
}

impl TryFrom<String> for DisplayName {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConversionError::check_length(value.trim(), Self::MAX_LENGTH)?;
        Ok(Self(value.trim().to_string()))
    }
}

impl TryFrom<&str> for DisplayName {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row of the `profiles` table as returned by the backend
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: UserId,
    #[serde(default)]
    pub full_name: String,
    pub role: Role,
    pub enterprise_id: Option<EnterpriseId>,
    pub theme: Option<ThemeName>,
    pub currency: Option<CurrencyCode>,
}

/// What the profile describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileId {
    User(UserId),
    /// Profile synthesized from a branch record, there is no `profiles` row
    Branch(BranchId),
}

/// Display and settings record for the active identity
///
/// Fields are only replaced wholesale from a record returned by the backend,
/// never edited in place. The role can not change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    id: ProfileId,
    full_name: String,
    role: Role,
    enterprise_id: Option<EnterpriseId>,
    theme: Option<ThemeName>,
    currency: Option<CurrencyCode>,
    branch_login_id: Option<BranchLoginId>,
}

impl Profile {
    /// Builds the stand-in profile used while a branch is logged in
    pub fn from_branch(branch: &Branch) -> Self {
        Self {
            id: ProfileId::Branch(branch.id),
            full_name: branch.name.to_string(),
            role: Role::BranchManager,
            enterprise_id: Some(branch.enterprise_id),
            theme: branch.theme.clone(),
            currency: branch.currency.clone(),
            branch_login_id: branch.login_id.clone(),
        }
    }

    pub fn id(&self) -> ProfileId {
        self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn enterprise_id(&self) -> Option<EnterpriseId> {
        self.enterprise_id
    }

    pub fn theme(&self) -> Option<&ThemeName> {
        self.theme.as_ref()
    }

    pub fn currency(&self) -> Option<&CurrencyCode> {
        self.currency.as_ref()
    }

    pub fn branch_login_id(&self) -> Option<&BranchLoginId> {
        self.branch_login_id.as_ref()
    }

    /// Returns `true` if this profile was synthesized from a branch
    #[must_use]
    pub fn is_branch_mock(&self) -> bool {
        matches!(self.id, ProfileId::Branch(_))
    }

    /// Replaces the mutable fields with those of an authoritative record
    ///
    /// Returns false (and changes nothing) if the record belongs to someone
    /// else or tries to change the role
    #[must_use]
    pub fn sync_from_record(&mut self, record: ProfileRecord) -> bool {
        if self.id != ProfileId::User(record.id) || self.role != record.role {
            return false;
        }
        self.full_name = record.full_name;
        self.enterprise_id = record.enterprise_id;
        self.theme = record.theme;
        self.currency = record.currency;
        true
    }

    /// Same as [`Self::sync_from_record`] for branch synthesized profiles
    #[must_use]
    pub fn sync_from_branch(&mut self, branch: &Branch) -> bool {
        if self.id != ProfileId::Branch(branch.id) {
            return false;
        }
        *self = Self::from_branch(branch);
        true
    }
}

impl From<ProfileRecord> for Profile {
    fn from(value: ProfileRecord) -> Self {
        Self {
            id: ProfileId::User(value.id),
            full_name: value.full_name,
            role: value.role,
            enterprise_id: value.enterprise_id,
            theme: value.theme,
            currency: value.currency,
            branch_login_id: None,
        }
    }
}

/// Fields of a profile to change. `None` fields are left untouched
#[derive(Debug, Default, serde::Serialize, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<DisplayName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

impl ProfileUpdate {
    pub fn is_valid(&self) -> Result<(), ValidationError> {
        if self.full_name.is_some() || self.theme.is_some() || self.currency.is_some() {
            Ok(())
        } else {
            Err(ValidationError::NoChangeRequested)
        }
    }

    /// Returns `true` if the update only touches theme and/or currency
    pub fn is_settings_only(&self) -> bool {
        self.full_name.is_none()
    }
}
