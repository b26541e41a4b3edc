use std::fmt::Display;

use super::{CapabilityError, IdentityKind, Role};

/// Operations that are only open to some identities
#[derive(
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    strum::EnumCount,
    strum::EnumIter,
)]
pub enum Capability {
    EditProfile,
    EditBranchSettings,
    ManageEnterprise,
    ManageBranches,
    ManageSecurityPin,
    ChangePassword,
}

/// Checks that `role` (held by an identity of `kind`) grants `capability`
#[tracing::instrument(ret, err(Debug))]
pub fn require_capability(
    kind: IdentityKind,
    role: Role,
    capability: Capability,
) -> Result<(), CapabilityError> {
    if role.has_capability(capability) {
        Ok(())
    } else {
        Err(CapabilityError::Missing { capability, kind })
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display_text = match self {
            Capability::EditProfile => "edit the profile",
            Capability::EditBranchSettings => "edit branch settings",
            Capability::ManageEnterprise => "manage the enterprise",
            Capability::ManageBranches => "manage branches",
            Capability::ManageSecurityPin => "manage the security PIN",
            Capability::ChangePassword => "change the password",
        };
        write!(f, "{display_text}")
    }
}
