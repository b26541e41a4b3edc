use thiserror::Error;

pub use crate::uac::{AuthError, CapabilityError, ValidationError};

pub type DeskResult<T> = Result<T, DeskError>;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Empty not allowed")]
    Empty,
    #[error("Maximum length exceeded. {max} allowed but found {actual}")]
    MaxExceeded { max: usize, actual: usize },
    #[error("Minimum length not met. {min} required but found {actual}")]
    MinNotMet { min: usize, actual: usize },
    #[error("Invalid character {found:?}. Expected {expected}")]
    InvalidCharacter { found: char, expected: &'static str },
}

impl ConversionError {
    /// Rejects empty values and values longer than `max` bytes
    pub fn check_length(value: &str, max: usize) -> Result<(), Self> {
        if value.is_empty() {
            return Err(Self::Empty);
        }
        if value.len() > max {
            return Err(Self::MaxExceeded {
                max,
                actual: value.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("The user has not logged in")]
pub struct NotLoggedInError;

/// Every failure a client operation can surface to the initiating UI action
///
/// None of these are retried and none are fatal. The worst outcome is the
/// user being returned to the login view.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error("Network request failed: {0}")]
    Network(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("Local storage unavailable: {0}")]
    Storage(String),
    #[error(transparent)]
    NotLoggedIn(#[from] NotLoggedInError),
}

impl DeskError {
    /// Returns `true` if the backend refused the credentials used for the
    /// request (as opposed to the request never completing)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            DeskError::Auth(_) => true,
            DeskError::Remote(remote) => remote.is_unauthorized(),
            _ => false,
        }
    }

    /// Returns `true` if the request failed before the backend answered
    ///
    /// [`Network`]: DeskError::Network
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(..))
    }
}

impl From<anyhow::Error> for DeskError {
    fn from(value: anyhow::Error) -> Self {
        Self::Network(format!("{value:#}"))
    }
}

/// An error reported by the backend. The message is kept exactly as received
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("No profile found for user {0}")]
    Profile(String),
    #[error("No enterprise found with id {0}")]
    Enterprise(String),
    #[error("No branch found with id {0}")]
    Branch(String),
}
