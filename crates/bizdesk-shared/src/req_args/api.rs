use secrecy::{ExposeSecret as _, SecretString};
use std::fmt::Debug;

use crate::{
    settings::SecurityPin,
    uac::ValidationError,
};

use super::passwords_match;

pub mod admin;

#[derive(serde::Deserialize)]
pub struct ChangePasswordReqArgs {
    pub new_password: SecretString,
    pub new_password_check: SecretString,
}

/// Arguments for setting or replacing the enterprise security PIN
#[derive(Clone)]
pub struct SetPinReqArgs {
    pub new_pin: SecretString,
    pub new_pin_check: SecretString,
    /// Required when a PIN is already set
    pub old_pin: Option<SecretString>,
}

/// [`SetPinReqArgs`] after validation
#[derive(Debug, Clone)]
pub struct ValidatedPinChange {
    pub new_pin: SecurityPin,
    pub old_pin: Option<SecurityPin>,
}

impl ChangePasswordReqArgs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        passwords_match(&self.new_password, &self.new_password_check)
    }
}

impl SetPinReqArgs {
    /// Checks both entries match, are well formed and that the old PIN is
    /// given when one is already configured
    pub fn validate(&self, has_existing_pin: bool) -> Result<ValidatedPinChange, ValidationError> {
        let new_pin =
            SecurityPin::try_from(self.new_pin.clone()).map_err(ValidationError::MalformedPin)?;
        let check = SecurityPin::try_from(self.new_pin_check.clone())
            .map_err(ValidationError::MalformedPin)?;
        if !new_pin.matches(&check) {
            return Err(ValidationError::PinsDoNotMatch);
        }
        let old_pin = match (&self.old_pin, has_existing_pin) {
            (Some(old), _) if !old.expose_secret().is_empty() => Some(
                SecurityPin::try_from(old.clone()).map_err(ValidationError::MalformedPin)?,
            ),
            (_, true) => return Err(ValidationError::CurrentPinRequired),
            (_, false) => None,
        };
        Ok(ValidatedPinChange { new_pin, old_pin })
    }
}

impl Debug for ChangePasswordReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordReqArgs").finish_non_exhaustive()
    }
}

impl Debug for SetPinReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetPinReqArgs")
            .field("has_old_pin", &self.old_pin.is_some())
            .finish_non_exhaustive()
    }
}
