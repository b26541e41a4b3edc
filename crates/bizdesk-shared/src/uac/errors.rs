use crate::errors::{ConversionError, RemoteError};

use super::{Capability, IdentityKind};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Shown for every failed branch login so the message does not reveal
    /// which of the two fields was wrong
    #[error("Invalid ID or password")]
    InvalidBranchCredentials,
    #[error("Branch session is no longer valid. Please log in again")]
    BranchTokenRejected,
    /// Remote auth refusal, message kept exactly as the backend sent it
    #[error("{0}")]
    Rejected(RemoteError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("You entered two different new passwords - the field values must match.")]
    PasswordsDoNotMatch,
    #[error("The two PIN entries do not match")]
    PinsDoNotMatch,
    #[error("The current PIN is required to change an existing PIN")]
    CurrentPinRequired,
    #[error("Invalid PIN: {0}")]
    MalformedPin(ConversionError),
    #[error("Invalid {field}: {source}")]
    Field {
        field: &'static str,
        source: ConversionError,
    },
    #[error("No change is being requested")]
    NoChangeRequested,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("{kind} accounts cannot {capability}")]
    Missing {
        capability: Capability,
        kind: IdentityKind,
    },
    #[error("Already signed in with a {kind} account. Log out first")]
    AlreadySignedIn { kind: IdentityKind },
}

impl ValidationError {
    pub fn field(field: &'static str) -> impl FnOnce(ConversionError) -> Self {
        move |source| Self::Field { field, source }
    }
}
