//! Named YellowAnt API operations. Each sends exactly one request.

use super::client::Client;
use super::http::{HttpSend, Params};
use super::Result;
use serde_json::Value;
use std::fmt::Display;

impl<S: HttpSend> Client<S> {
    /// Profile of the authenticating user.
    pub fn get_user_profile(&mut self, params: Params) -> Result<Value> {
        self.get("user/profile/", params)
    }

    pub fn create_user_integration(&mut self, params: Params) -> Result<Value> {
        self.post("user/integration/", params)
    }

    pub fn get_user_integration<I: Display>(&mut self, id: I, params: Params) -> Result<Value> {
        self.get(&format!("user/integration/{}/", id), params)
    }

    pub fn update_user_integration<I: Display>(&mut self, id: I, params: Params) -> Result<Value> {
        self.patch(&format!("user/integration/{}/", id), params)
    }

    pub fn delete_user_integration<I: Display>(&mut self, id: I, params: Params) -> Result<Value> {
        self.delete(&format!("user/integration/{}/", id), params)
    }

    /// Sends a message to the authenticated user. See `Params::from(&Message)`.
    pub fn add_message(&mut self, params: Params) -> Result<Value> {
        self.post("user/message/", params)
    }

    /// Posts a message to a webhook, addressed by id or name.
    pub fn create_webhook_message(&mut self, webhook: &str, params: Params) -> Result<Value> {
        self.post(&format!("user/application/webhook/{}/", webhook), params)
    }

    pub fn get_application_messages<I: Display>(
        &mut self,
        user_integration_id: I,
        params: Params,
    ) -> Result<Value> {
        self.patch(
            &format!("user/applications/{}/messages/", user_integration_id),
            params,
        )
    }

    pub fn get_application_message<I: Display, M: Display>(
        &mut self,
        user_integration_id: I,
        message_id: M,
        params: Params,
    ) -> Result<Value> {
        self.patch(
            &format!("user/applications/{}/messages/{}/", user_integration_id, message_id),
            params,
        )
    }

    pub fn get_application_logs(&mut self, params: Params) -> Result<Value> {
        self.get("user/logs/", params)
    }

    /// Revokes an issued OAuth2 bearer token.
    pub fn revoke_token(&mut self, params: Params) -> Result<Value> {
        self.post("oauth2/revoke_token/", params)
    }

    /// Languages supported by YellowAnt with their ISO 639-1 codes.
    pub fn get_supported_languages(&mut self, params: Params) -> Result<Value> {
        self.get("help/languages/", params)
    }

    pub fn create_application(&mut self, params: Params) -> Result<Value> {
        self.post("developers/create/", params)
    }

    pub fn update_application(&mut self, params: Params) -> Result<Value> {
        self.patch("developers/create/", params)
    }

    pub fn get_privacy_policy(&mut self, params: Params) -> Result<Value> {
        self.get("help/privacy/", params)
    }

    pub fn get_tos(&mut self, params: Params) -> Result<Value> {
        self.get("help/tos/", params)
    }

    pub fn get_application_rate_limit_status(&mut self, params: Params) -> Result<Value> {
        self.get("application/rate_limit_status/", params)
    }
}
