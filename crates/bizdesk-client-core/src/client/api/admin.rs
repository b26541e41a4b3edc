use bizdesk_shared::{
    branch::{Branch, BranchLoginResponse, BranchUpdate},
    const_config::{
        client::{HEADER_PREFER, PREFER_RETURN_REPRESENTATION},
        path::{PATH_REST_PREFIX, TABLE_BRANCHES},
        rpc::{
            RPC_CREATE_BRANCH_ACCOUNT, RPC_DELETE_BRANCH, RPC_GET_NEXT_BRANCH_NUMBER,
            RPC_LOGIN_BRANCH, RPC_RESET_BRANCH_PASSWORD, RPC_UPDATE_BRANCH_SETTINGS,
        },
    },
    errors::{DeskResult, NotFoundError},
    id::{BranchId, EnterpriseId},
    req_args::{
        api::admin::branch::{BranchSettingsReqArgs, ResetBranchPasswordReqArgs},
        BranchLoginReqArgs,
    },
    settings::SecurityPin,
    token::BranchToken,
};
use reqwest::Method;
use secrecy::ExposeSecret as _;

use crate::{
    backend::{LocalStore, NewBranchAccount},
    Client,
};

use super::{eq, first_row};

pub mod security;

/// Procedures declared `returns setof` answer with a list, the others with a
/// single object
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<S: LocalStore> Client<S> {
    /// Uses `token` for this request only, the token currently set is left
    /// unchanged
    #[tracing::instrument(skip(self))]
    pub async fn fetch_branch_by_token(&self, token: &BranchToken) -> DeskResult<Option<Branch>> {
        let request = self
            .request_with_token(Method::GET, &table_path(), Some(token))
            .query(&[("select", "*")]);
        let rows: Vec<Branch> = self.send_expect_json(request).await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_branches(&self, enterprise_id: EnterpriseId) -> DeskResult<Vec<Branch>> {
        let request = self.table_request(Method::GET, TABLE_BRANCHES).query(&[
            ("enterprise_id", eq(enterprise_id)),
            ("select", "*".to_string()),
            ("order", "branch_number.asc".to_string()),
        ]);
        self.send_expect_json(request).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_branch(&self, id: BranchId, update: &BranchUpdate) -> DeskResult<Branch> {
        let request = self
            .table_request(Method::PATCH, TABLE_BRANCHES)
            .query(&[("id", eq(id))])
            .header(HEADER_PREFER, PREFER_RETURN_REPRESENTATION)
            .json(update);
        let rows: Vec<Branch> = self.send_expect_json(request).await?;
        first_row(rows, || NotFoundError::Branch(id.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn login_branch(&self, args: &BranchLoginReqArgs) -> DeskResult<BranchLoginResponse> {
        let args = serde_json::json!({
            "p_login_id": args.login_id,
            "p_password": args.password.expose_secret(),
        });
        let request = self.rpc_request(RPC_LOGIN_BRANCH).json(&args);
        let response: OneOrMany<BranchLoginResponse> = self.send_expect_json(request).await?;
        single(response, || NotFoundError::Branch("matching login".to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_branch_account(&self, account: NewBranchAccount<'_>) -> DeskResult<Branch> {
        let NewBranchAccount {
            enterprise_id,
            branch_number,
            login_id,
            args,
        } = account;
        let body = serde_json::json!({
            "p_enterprise_id": enterprise_id,
            "p_branch_number": branch_number,
            "p_name": args.name,
            "p_login_id": login_id,
            "p_password": args.password.expose_secret(),
            "p_currency": args.currency,
            "p_theme": args.theme,
        });
        let request = self.rpc_request(RPC_CREATE_BRANCH_ACCOUNT).json(&body);
        let response: OneOrMany<Branch> = self.send_expect_json(request).await?;
        single(response, || NotFoundError::Branch(login_id.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_next_branch_number(&self, enterprise_id: EnterpriseId) -> DeskResult<u32> {
        let args = serde_json::json!({ "p_enterprise_id": enterprise_id });
        let request = self.rpc_request(RPC_GET_NEXT_BRANCH_NUMBER).json(&args);
        self.send_expect_json(request).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_branch_settings(&self, args: &BranchSettingsReqArgs) -> DeskResult<Branch> {
        let body = serde_json::json!({
            "p_branch_id": args.branch_id,
            "p_currency": args.currency,
            "p_theme": args.theme,
        });
        let request = self.rpc_request(RPC_UPDATE_BRANCH_SETTINGS).json(&body);
        let response: OneOrMany<Branch> = self.send_expect_json(request).await?;
        single(response, || NotFoundError::Branch(args.branch_id.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn reset_branch_password(&self, args: &ResetBranchPasswordReqArgs) -> DeskResult<()> {
        let body = serde_json::json!({
            "p_branch_id": args.branch_id,
            "p_new_password": args.new_password.expose_secret(),
        });
        let request = self.rpc_request(RPC_RESET_BRANCH_PASSWORD).json(&body);
        self.send_expect_empty(request).await
    }

    #[tracing::instrument(skip(self, pin))]
    pub async fn delete_branch(
        &self,
        branch_id: BranchId,
        enterprise_id: EnterpriseId,
        pin: &SecurityPin,
    ) -> DeskResult<()> {
        let body = serde_json::json!({
            "p_branch_id": branch_id,
            "p_enterprise_id": enterprise_id,
            "p_pin": pin.expose(),
        });
        let request = self.rpc_request(RPC_DELETE_BRANCH).json(&body);
        self.send_expect_empty(request).await
    }
}

fn table_path() -> String {
    format!("{PATH_REST_PREFIX}/{TABLE_BRANCHES}")
}

fn single<T>(response: OneOrMany<T>, not_found: impl FnOnce() -> NotFoundError) -> DeskResult<T> {
    match response {
        OneOrMany::One(value) => Ok(value),
        OneOrMany::Many(rows) => first_row(rows, not_found),
    }
}
