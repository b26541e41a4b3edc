use std::fmt::Debug;

use secrecy::{ExposeSecret as _, SecretString};

/// Opaque bearer credential that authenticates a branch without going
/// through the remote auth system's sessions
#[derive(Clone)]
pub struct BranchToken(SecretString);

impl BranchToken {
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for BranchToken {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl PartialEq for BranchToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for BranchToken {}

impl Debug for BranchToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BranchToken")
            .field(&format_args!("{} chars", self.expose().len()))
            .finish()
    }
}

impl<'de> serde::Deserialize<'de> for BranchToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}
