use bizdesk_shared::{
    const_config::rpc::{RPC_SET_SECURITY_PIN, RPC_VERIFY_SECURITY_PIN},
    errors::DeskResult,
    settings::SecurityPin,
};

use crate::{backend::LocalStore, Client};

impl<S: LocalStore> Client<S> {
    #[tracing::instrument(skip_all, fields(has_old_pin = old_pin.is_some()))]
    pub async fn set_security_pin(
        &self,
        new_pin: &SecurityPin,
        old_pin: Option<&SecurityPin>,
    ) -> DeskResult<()> {
        let body = serde_json::json!({
            "p_new_pin": new_pin.expose(),
            "p_old_pin": old_pin.map(SecurityPin::expose),
        });
        let request = self.rpc_request(RPC_SET_SECURITY_PIN).json(&body);
        self.send_expect_empty(request).await
    }

    /// `Ok(false)` is a wrong PIN, errors are reserved for failed requests
    #[tracing::instrument(skip_all)]
    pub async fn verify_security_pin(&self, pin: &SecurityPin) -> DeskResult<bool> {
        let body = serde_json::json!({ "p_pin": pin.expose() });
        let request = self.rpc_request(RPC_VERIFY_SECURITY_PIN).json(&body);
        self.send_expect_json(request).await
    }
}
