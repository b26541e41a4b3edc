use std::fmt::Display;

use crate::{
    branch::Branch,
    id::{EnterpriseId, UserId},
    settings::{CurrencyCode, ThemeName},
    token::BranchToken,
};

use super::{require_capability, Capability, CapabilityError, Profile, Role};

/// The currently authenticated principal. At most one is active at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Enterprise(EnterpriseUser),
    Branch(BranchUser),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IdentityKind {
    Enterprise,
    Branch,
}

/// A user authenticated by the remote auth system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterpriseUser {
    pub user_id: UserId,
    pub email: String,
    /// `None` until the profile has been loaded
    pub profile: Option<Profile>,
}

/// A branch authenticated with its bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchUser {
    pub branch: Branch,
    pub token: BranchToken,
    pub profile: Profile,
}

/// Kind agnostic projection handed to the view layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub kind: IdentityKind,
    pub role: Role,
    pub full_name: String,
    pub enterprise_id: Option<EnterpriseId>,
    pub theme: Option<ThemeName>,
    pub currency: Option<CurrencyCode>,
}

impl BranchUser {
    pub fn new(branch: Branch, token: BranchToken) -> Self {
        let profile = Profile::from_branch(&branch);
        Self {
            branch,
            token,
            profile,
        }
    }
}

impl Identity {
    pub fn kind(&self) -> IdentityKind {
        match self {
            Identity::Enterprise(_) => IdentityKind::Enterprise,
            Identity::Branch(_) => IdentityKind::Branch,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Identity::Enterprise(user) => user.profile.as_ref(),
            Identity::Branch(branch) => Some(&branch.profile),
        }
    }

    /// Role of the identity. Enterprise users without a loaded profile are
    /// not trusted with anything yet so this returns `None` for them
    pub fn role(&self) -> Option<Role> {
        self.profile().map(Profile::role)
    }

    pub fn enterprise_id(&self) -> Option<EnterpriseId> {
        match self {
            Identity::Enterprise(user) => user.profile.as_ref()?.enterprise_id(),
            Identity::Branch(branch) => Some(branch.branch.enterprise_id),
        }
    }

    pub fn as_enterprise(&self) -> Option<&EnterpriseUser> {
        match self {
            Identity::Enterprise(user) => Some(user),
            Identity::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&BranchUser> {
        match self {
            Identity::Enterprise(_) => None,
            Identity::Branch(branch) => Some(branch),
        }
    }

    /// Returns an error unless this identity is allowed to perform `capability`
    pub fn require(&self, capability: Capability) -> Result<(), CapabilityError> {
        let kind = self.kind();
        match self.role() {
            Some(role) => require_capability(kind, role, capability),
            None => Err(CapabilityError::Missing { capability, kind }),
        }
    }

    pub fn viewer(&self) -> Option<Viewer> {
        let profile = self.profile()?;
        Some(Viewer {
            kind: self.kind(),
            role: profile.role(),
            full_name: profile.full_name().to_string(),
            enterprise_id: self.enterprise_id(),
            theme: profile.theme().cloned(),
            currency: profile.currency().cloned(),
        })
    }
}

impl Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKind::Enterprise => write!(f, "Enterprise"),
            IdentityKind::Branch => write!(f, "Branch"),
        }
    }
}
