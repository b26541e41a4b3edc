//! Shared items related to user account control

mod capability;
mod errors;
mod identity;
mod profile;
mod role;

pub use capability::{require_capability, Capability};
pub use errors::{AuthError, CapabilityError, ValidationError};
pub use identity::{BranchUser, EnterpriseUser, Identity, IdentityKind, Viewer};
pub use profile::{DisplayName, Profile, ProfileId, ProfileRecord, ProfileUpdate};
pub use role::Role;
