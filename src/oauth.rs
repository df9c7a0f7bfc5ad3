use super::client::{join_url, Client};
use super::http::{ApiRequest, Body, HttpSend, Method};
use super::{ErrorKind, Result};
use serde_json::{Map, Value};

/// Token issued by the OAuth2 authorization-code exchange.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<S: HttpSend> Client<S> {
    /// Exchanges an authorization code for an access token.
    pub fn get_access_token(&self, code: &str) -> Result<AccessToken> {
        let config = self.config();
        let client_id = match config.app_key {
            Some(ref key) => key.clone(),
            None => bail!(ErrorKind::InvalidValue("app_key", "is required to request a token".to_owned())),
        };
        let client_secret = match config.app_secret {
            Some(ref secret) => secret.clone(),
            None => bail!(ErrorKind::InvalidValue(
                "app_secret",
                "is required to request a token".to_owned()
            )),
        };

        let mut request = ApiRequest::new(Method::Post, join_url(self.api_url(), "oauth2/token/"));
        request.body = Body::Form(vec![
            ("grant_type".to_owned(), "authorization_code".to_owned()),
            ("client_id".to_owned(), client_id),
            ("client_secret".to_owned(), client_secret),
            ("code".to_owned(), code.to_owned()),
            (
                "redirect_uri".to_owned(),
                config.redirect_uri.clone().unwrap_or_default(),
            ),
        ]);

        let response = self.sender().send(&request)?;
        if response.status == 401 {
            let message = serde_json::from_str::<Value>(&response.body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| "Invalid / expired Token".to_owned());
            bail!(ErrorKind::AuthFailure(message, 401));
        }
        if response.status >= 300 {
            let detail = serde_json::from_str::<Value>(&response.body)
                .ok()
                .and_then(|v| {
                    v.get("error_description")
                        .or_else(|| v.get("error"))
                        .and_then(Value::as_str)
                        .map(str::to_owned)
                })
                .unwrap_or_else(|| response.body.clone());
            bail!(ErrorKind::GenericApi(detail, Some(response.status)));
        }
        debug!("obtained access token from {}", response.url);
        Ok(serde_json::from_str(&response.body)?)
    }
}
