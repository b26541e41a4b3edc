use serde::{Deserialize, Serialize};

use super::Capability;

/// Role of the holder of a profile. Fixed when the profile is created
#[derive(
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    EnterpriseAdmin,
    BranchManager,
}

impl Role {
    /// Capabilities granted to holders of this role
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability as cap;
        match self {
            Role::EnterpriseAdmin => &[
                cap::EditProfile,
                cap::ManageEnterprise,
                cap::ManageBranches,
                cap::ManageSecurityPin,
                cap::ChangePassword,
            ],
            Role::BranchManager => &[cap::EditBranchSettings],
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn is_enterprise_admin(&self) -> bool {
        matches!(self, Self::EnterpriseAdmin)
    }
}
