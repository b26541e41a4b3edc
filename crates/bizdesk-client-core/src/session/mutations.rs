use bizdesk_shared::{
    branch::{Branch, BranchLoginId, BranchUpdate},
    enterprise::{Enterprise, EnterpriseUpdate},
    errors::{DeskResult, NotFoundError, NotLoggedInError},
    id::{BranchId, EnterpriseId, UserId},
    req_args::api::{
        admin::branch::{BranchSettingsReqArgs, NewBranchReqArgs, ResetBranchPasswordReqArgs},
        ChangePasswordReqArgs, SetPinReqArgs,
    },
    settings::{CurrencyCode, SecurityPin, ThemeName, UserSettings},
    uac::{
        Capability, CapabilityError, Identity, IdentityKind, Profile, ProfileRecord,
        ProfileUpdate, ValidationError,
    },
};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::{
    backend::{LocalStore, NewBranchAccount, RemoteBackend},
    sequence::{Ticket, TrackedField},
};

use super::SessionStore;

impl<B: RemoteBackend, S: LocalStore> SessionStore<B, S> {
    #[tracing::instrument(skip(self))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> DeskResult<Profile> {
        update.is_valid()?;
        let (identity, ticket) =
            self.authorize_tracked(Capability::EditProfile, TrackedField::Profile)?;
        let user_id = enterprise_user_id(&identity, Capability::EditProfile)?;
        let record = self.backend.update_profile(user_id, &update).await?;
        self.apply_profile_record(&ticket, record.clone());
        Ok(record.into())
    }

    /// Changes theme and/or currency for whichever kind of identity is active
    #[tracing::instrument(skip(self))]
    pub async fn update_settings(
        &self,
        theme: Option<ThemeName>,
        currency: Option<CurrencyCode>,
    ) -> DeskResult<Profile> {
        if theme.is_none() && currency.is_none() {
            return Err(ValidationError::NoChangeRequested.into());
        }
        let kind = self
            .lock()
            .identity
            .as_ref()
            .map(Identity::kind)
            .ok_or(NotLoggedInError)?;
        match kind {
            IdentityKind::Enterprise => {
                self.update_profile(ProfileUpdate {
                    full_name: None,
                    theme,
                    currency,
                })
                .await
            }
            IdentityKind::Branch => {
                let (identity, ticket) = self
                    .authorize_tracked(Capability::EditBranchSettings, TrackedField::Profile)?;
                let branch_id = identity
                    .as_branch()
                    .map(|user| user.branch.id)
                    .ok_or(NotLoggedInError)?;
                let args = BranchSettingsReqArgs {
                    branch_id,
                    currency,
                    theme,
                };
                let branch = self.backend.update_branch_settings(&args).await?;
                self.apply_branch_record(&ticket, &branch);
                Ok(Profile::from_branch(&branch))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_enterprise(&self, update: EnterpriseUpdate) -> DeskResult<Enterprise> {
        if update.is_empty() {
            return Err(ValidationError::NoChangeRequested.into());
        }
        let (identity, ticket) =
            self.authorize_tracked(Capability::ManageEnterprise, TrackedField::Enterprise)?;
        let enterprise_id = linked_enterprise(&identity)?;
        let enterprise = self
            .backend
            .update_enterprise(enterprise_id, &update)
            .await?;

        let mut guard = self.lock();
        let inner = &mut *guard;
        if !inner.sequencer.is_current(&ticket) {
            debug!("discarding stale enterprise response");
            return Ok(enterprise);
        }
        let profile = inner.identity.as_ref().and_then(Identity::profile);
        if let Some(settings) = inner.settings.as_mut() {
            settings.has_security_pin = enterprise.has_security_pin;
            if let (Some(theme), None) = (&enterprise.theme, profile.and_then(Profile::theme)) {
                settings.theme = theme.clone();
            }
            if let (Some(currency), None) =
                (&enterprise.currency, profile.and_then(Profile::currency))
            {
                settings.currency = currency.clone();
            }
        }
        Ok(enterprise)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_branches(&self) -> DeskResult<Vec<Branch>> {
        let identity = self.authorize(Capability::ManageBranches)?;
        let enterprise_id = linked_enterprise(&identity)?;
        self.backend.list_branches(enterprise_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_branch(
        &self,
        branch_id: BranchId,
        update: BranchUpdate,
    ) -> DeskResult<Branch> {
        if update.is_empty() {
            return Err(ValidationError::NoChangeRequested.into());
        }
        self.authorize(Capability::ManageBranches)?;
        self.backend.update_branch(branch_id, &update).await
    }

    /// Creates a branch account numbered after the enterprise's existing
    /// branches. A login id is generated when none is given
    #[tracing::instrument(skip(self))]
    pub async fn create_branch(&self, args: NewBranchReqArgs) -> DeskResult<Branch> {
        args.validate()?;
        let identity = self.authorize(Capability::ManageBranches)?;
        let enterprise_id = linked_enterprise(&identity)?;
        let branch_number = self.backend.get_next_branch_number(enterprise_id).await?;
        let login_id = match &args.login_id {
            Some(login_id) => login_id.clone(),
            None => {
                let enterprise = self
                    .backend
                    .fetch_enterprise(enterprise_id)
                    .await?
                    .ok_or_else(|| NotFoundError::Enterprise(enterprise_id.to_string()))?;
                BranchLoginId::for_branch_number(&enterprise.slug(), branch_number)
                    .map_err(ValidationError::field("login id"))?
            }
        };
        let branch = self
            .backend
            .create_branch_account(NewBranchAccount {
                enterprise_id,
                branch_number,
                login_id: &login_id,
                args: &args,
            })
            .await?;
        info!(branch_id = %branch.id, %login_id, "branch account created");
        Ok(branch)
    }

    #[tracing::instrument(skip(self))]
    pub async fn reset_branch_password(&self, args: ResetBranchPasswordReqArgs) -> DeskResult<()> {
        self.authorize(Capability::ManageBranches)?;
        args.validate()?;
        self.backend.reset_branch_password(&args).await
    }

    /// Deleting a branch must be confirmed with the enterprise security PIN
    #[tracing::instrument(skip(self, pin))]
    pub async fn delete_branch(&self, branch_id: BranchId, pin: SecretString) -> DeskResult<()> {
        let identity = self.authorize(Capability::ManageBranches)?;
        identity.require(Capability::ManageSecurityPin)?;
        let pin = SecurityPin::try_from(pin).map_err(ValidationError::MalformedPin)?;
        let enterprise_id = linked_enterprise(&identity)?;
        self.backend
            .delete_branch(branch_id, enterprise_id, &pin)
            .await?;
        info!(%branch_id, "branch deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_security_pin(&self, args: SetPinReqArgs) -> DeskResult<()> {
        let (_, ticket) =
            self.authorize_tracked(Capability::ManageSecurityPin, TrackedField::SecurityPin)?;
        let has_existing_pin = self
            .lock()
            .settings
            .as_ref()
            .is_some_and(|settings| settings.has_security_pin);
        let change = args.validate(has_existing_pin)?;
        self.backend
            .set_security_pin(&change.new_pin, change.old_pin.as_ref())
            .await?;

        let mut inner = self.lock();
        if inner.sequencer.is_current(&ticket) {
            if let Some(settings) = inner.settings.as_mut() {
                settings.has_security_pin = true;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, pin))]
    pub async fn verify_security_pin(&self, pin: SecretString) -> DeskResult<bool> {
        self.authorize(Capability::ManageSecurityPin)?;
        let pin = SecurityPin::try_from(pin).map_err(ValidationError::MalformedPin)?;
        self.backend.verify_security_pin(&pin).await
    }

    /// Branch accounts can not change their own password yet
    #[tracing::instrument(skip(self))]
    pub async fn update_password(&self, args: ChangePasswordReqArgs) -> DeskResult<()> {
        self.authorize(Capability::ChangePassword)?;
        args.validate()?;
        self.backend.update_user_password(&args.new_password).await
    }

    fn authorize(&self, capability: Capability) -> DeskResult<Identity> {
        let inner = self.lock();
        let identity = inner.identity.as_ref().ok_or(NotLoggedInError)?;
        identity.require(capability)?;
        Ok(identity.clone())
    }

    /// Same as [`Self::authorize`] but also takes a ticket for `field` while
    /// the lock is held
    fn authorize_tracked(
        &self,
        capability: Capability,
        field: TrackedField,
    ) -> DeskResult<(Identity, Ticket)> {
        let mut inner = self.lock();
        let identity = inner.identity.as_ref().ok_or(NotLoggedInError)?;
        identity.require(capability)?;
        let identity = identity.clone();
        let ticket = inner.sequencer.issue(field);
        Ok((identity, ticket))
    }

    /// Returns `true` if `record` was applied
    fn apply_profile_record(&self, ticket: &Ticket, record: ProfileRecord) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if !inner.sequencer.is_current(ticket) {
            debug!("discarding stale profile response");
            return false;
        }
        let Some(Identity::Enterprise(user)) = inner.identity.as_mut() else {
            return false;
        };
        match user.profile.as_mut() {
            Some(profile) => {
                if !profile.sync_from_record(record) {
                    warn!("profile response does not match the active profile");
                    return false;
                }
            }
            None if user.user_id == record.id => user.profile = Some(record.into()),
            None => return false,
        }
        if let (Some(settings), Some(profile)) = (inner.settings.as_mut(), user.profile.as_ref()) {
            refresh_settings(settings, profile);
        }
        true
    }

    fn apply_branch_record(&self, ticket: &Ticket, branch: &Branch) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if !inner.sequencer.is_current(ticket) {
            debug!("discarding stale branch response");
            return false;
        }
        let Some(Identity::Branch(user)) = inner.identity.as_mut() else {
            return false;
        };
        if !user.profile.sync_from_branch(branch) {
            warn!("branch response does not match the active branch");
            return false;
        }
        user.branch = branch.clone();
        if let Some(settings) = inner.settings.as_mut() {
            refresh_settings(settings, &user.profile);
        }
        true
    }
}

fn refresh_settings(settings: &mut UserSettings, profile: &Profile) {
    if let Some(theme) = profile.theme() {
        settings.theme = theme.clone();
    }
    if let Some(currency) = profile.currency() {
        settings.currency = currency.clone();
    }
}

fn enterprise_user_id(
    identity: &Identity,
    capability: Capability,
) -> Result<UserId, CapabilityError> {
    identity
        .as_enterprise()
        .map(|user| user.user_id)
        .ok_or(CapabilityError::Missing {
            capability,
            kind: identity.kind(),
        })
}

fn linked_enterprise(identity: &Identity) -> Result<EnterpriseId, NotFoundError> {
    identity.enterprise_id().ok_or_else(|| {
        NotFoundError::Enterprise("no enterprise linked to this account".to_string())
    })
}
