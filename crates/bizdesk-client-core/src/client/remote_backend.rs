use bizdesk_shared::{
    branch::{Branch, BranchLoginResponse, BranchUpdate},
    enterprise::{Enterprise, EnterpriseUpdate},
    errors::DeskResult,
    id::{BranchId, EnterpriseId, UserId},
    req_args::{
        api::admin::branch::{BranchSettingsReqArgs, ResetBranchPasswordReqArgs},
        BranchLoginReqArgs, LoginReqArgs, SignUpReqArgs,
    },
    settings::SecurityPin,
    token::BranchToken,
    uac::{ProfileRecord, ProfileUpdate},
};
use futures::channel::mpsc::UnboundedReceiver;
use secrecy::SecretString;

use crate::backend::{
    AuthStateChange, LocalStore, NewBranchAccount, RemoteBackend, RemoteSession,
};

use super::Client;

// Inherent methods take precedence so each call forwards to `super::api`
impl<S: LocalStore> RemoteBackend for Client<S> {
    async fn get_session(&self) -> DeskResult<Option<RemoteSession>> {
        self.get_session().await
    }

    fn on_auth_state_change(&self) -> UnboundedReceiver<AuthStateChange> {
        self.subscribe()
    }

    async fn sign_in_with_password(&self, args: &LoginReqArgs) -> DeskResult<RemoteSession> {
        self.sign_in_with_password(args).await
    }

    async fn sign_up(&self, args: &SignUpReqArgs) -> DeskResult<Option<RemoteSession>> {
        self.sign_up(args).await
    }

    async fn sign_out(&self) -> DeskResult<()> {
        self.sign_out().await
    }

    async fn reset_password_for_email(&self, email: &str) -> DeskResult<()> {
        self.reset_password_for_email(email).await
    }

    async fn update_user_password(&self, new_password: &SecretString) -> DeskResult<()> {
        self.update_user_password(new_password).await
    }

    fn set_branch_token(&self, token: Option<&BranchToken>) {
        self.set_branch_token_header(token);
    }

    async fn fetch_profile(&self, user_id: UserId) -> DeskResult<Option<ProfileRecord>> {
        self.fetch_profile(user_id).await
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> DeskResult<ProfileRecord> {
        self.update_profile(user_id, update).await
    }

    async fn fetch_enterprise(&self, id: EnterpriseId) -> DeskResult<Option<Enterprise>> {
        self.fetch_enterprise(id).await
    }

    async fn update_enterprise(
        &self,
        id: EnterpriseId,
        update: &EnterpriseUpdate,
    ) -> DeskResult<Enterprise> {
        self.update_enterprise(id, update).await
    }

    async fn fetch_branch_by_token(&self, token: &BranchToken) -> DeskResult<Option<Branch>> {
        self.fetch_branch_by_token(token).await
    }

    async fn list_branches(&self, enterprise_id: EnterpriseId) -> DeskResult<Vec<Branch>> {
        self.list_branches(enterprise_id).await
    }

    async fn update_branch(&self, id: BranchId, update: &BranchUpdate) -> DeskResult<Branch> {
        self.update_branch(id, update).await
    }

    async fn login_branch(&self, args: &BranchLoginReqArgs) -> DeskResult<BranchLoginResponse> {
        self.login_branch(args).await
    }

    async fn create_branch_account(&self, account: NewBranchAccount<'_>) -> DeskResult<Branch> {
        self.create_branch_account(account).await
    }

    async fn get_next_branch_number(&self, enterprise_id: EnterpriseId) -> DeskResult<u32> {
        self.get_next_branch_number(enterprise_id).await
    }

    async fn update_branch_settings(&self, args: &BranchSettingsReqArgs) -> DeskResult<Branch> {
        self.update_branch_settings(args).await
    }

    async fn reset_branch_password(&self, args: &ResetBranchPasswordReqArgs) -> DeskResult<()> {
        self.reset_branch_password(args).await
    }

    async fn delete_branch(
        &self,
        branch_id: BranchId,
        enterprise_id: EnterpriseId,
        pin: &SecurityPin,
    ) -> DeskResult<()> {
        self.delete_branch(branch_id, enterprise_id, pin).await
    }

    async fn set_security_pin(
        &self,
        new_pin: &SecurityPin,
        old_pin: Option<&SecurityPin>,
    ) -> DeskResult<()> {
        self.set_security_pin(new_pin, old_pin).await
    }

    async fn verify_security_pin(&self, pin: &SecurityPin) -> DeskResult<bool> {
        self.verify_security_pin(pin).await
    }
}
