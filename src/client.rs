//! OAuth2-authenticated client for the YellowAnt REST API.

use super::{ErrorKind, Result};
use super::http::{apply_params, query_value, ApiRequest, Authorization, HttpSend, Method, Params};
use super::settings;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_API_URL: &str = "https://api.yellowant.com/api/";
pub const USER_AGENT: &str = concat!("YellowAnt-Rust/", env!("CARGO_PKG_VERSION"));

const AUTH_FAILURE_MARKER: &str = "Bad Authentication data";
const DEFAULT_ERROR_MESSAGE: &str = "An error occurred processing your request.";

#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub app_key: Option<String>,
    pub app_secret: Option<String>,
    pub access_token: Option<String>,
    pub redirect_uri: Option<String>,
    /// Base URL; `YELLOWANT_API_URL` takes precedence when set.
    pub api_url: Option<String>,
}

/// What the most recent call sent and received.
#[derive(Clone, Debug)]
pub struct LastCall {
    pub api_call: String,
    pub api_error: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub status_code: u16,
    pub url: String,
    pub content: String,
}

pub struct Client<S = ::reqwest::blocking::Client> {
    api_url: String,
    config: ClientConfig,
    sender: S,
    last_call: Option<LastCall>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Client> {
        let sender = ::reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Client::with_sender(config, sender)
    }
}

impl<S: HttpSend> Client<S> {
    pub fn with_sender(config: ClientConfig, sender: S) -> Result<Client<S>> {
        let api_url = match settings::api_url_override()? {
            Some(url) => url,
            None => config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
        };
        Ok(Client {
            api_url,
            config,
            sender,
            last_call: None,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn sender(&self) -> &S {
        &self.sender
    }

    /// Resolves an endpoint against the base URL. Absolute `https://` URLs pass through.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<String> {
        if endpoint.starts_with("http://") {
            bail!(ErrorKind::InsecureEndpoint(endpoint.to_owned()));
        }
        if endpoint.starts_with("https://") {
            return Ok(endpoint.to_owned());
        }
        Ok(join_url(&self.api_url, endpoint))
    }

    /// Sends one request and decodes the JSON reply. 204 and 304 decode to `Value::Null`.
    pub fn request(&mut self, endpoint: &str, method: Method, params: Params) -> Result<Value> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = ApiRequest::new(method, url.clone());
        if let Some(ref token) = self.config.access_token {
            request.auth = Authorization::Bearer(token.clone());
        }
        apply_params(&mut request, params)?;

        let response = self.sender.send(&request)?;
        let status = response.status;
        let mut last_call = LastCall {
            api_call: url,
            api_error: None,
            headers: response.headers.clone(),
            status_code: status,
            url: response.url.clone(),
            content: response.body.clone(),
        };

        if status > 304 {
            let message = error_message(&response.body);
            last_call.api_error = Some(message.clone());
            self.last_call = Some(last_call);
            debug!("{} {} failed with {}: {}", method, endpoint, status, message);

            if status == 429 {
                let retry_after = response
                    .header("X-Rate-Limit-Reset")
                    .and_then(|v| v.trim().parse().ok());
                bail!(ErrorKind::RateLimit(message, status, retry_after));
            }
            if status == 401 || response.body.contains(AUTH_FAILURE_MARKER) {
                bail!(ErrorKind::AuthFailure(message, status));
            }
            bail!(ErrorKind::GenericApi(message, Some(status)));
        }
        self.last_call = Some(last_call);

        if status == 204 || status == 304 {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|_| {
            ErrorKind::GenericApi(
                "Response was not valid JSON. Unable to decode.".to_owned(),
                None,
            )
            .into()
        })
    }

    pub fn get(&mut self, endpoint: &str, params: Params) -> Result<Value> {
        self.request(endpoint, Method::Get, params)
    }

    pub fn post(&mut self, endpoint: &str, params: Params) -> Result<Value> {
        self.request(endpoint, Method::Post, params)
    }

    pub fn put(&mut self, endpoint: &str, params: Params) -> Result<Value> {
        self.request(endpoint, Method::Put, params)
    }

    pub fn patch(&mut self, endpoint: &str, params: Params) -> Result<Value> {
        self.request(endpoint, Method::Patch, params)
    }

    pub fn delete(&mut self, endpoint: &str, params: Params) -> Result<Value> {
        self.request(endpoint, Method::Delete, params)
    }

    pub fn last_call(&self) -> Option<&LastCall> {
        self.last_call.as_ref()
    }

    /// A header from the last API call, such as `x-rate-limit-remaining`.
    pub fn get_lastfunction_header(&self, header: &str) -> Result<Option<&str>> {
        match self.last_call {
            Some(ref call) => Ok(call.headers.get(&header.to_lowercase()).map(|v| v.as_str())),
            None => bail!(ErrorKind::NoPriorCall),
        }
    }
}

/// Joins a base URL and a relative path with exactly one slash between them.
/// A `%s` in the base marks where the path goes.
pub fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if base.contains("%s") {
        base.replace("%s", path)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

/// Appends `params` to `api_url` as a percent-encoded query string.
pub fn construct_api_url(api_url: &str, params: Params) -> Result<String> {
    let (values, _) = params.split();
    let pairs: Vec<(String, String)> = values
        .iter()
        .filter_map(|(k, v)| query_value(v).map(|v| (k.clone(), v)))
        .collect();
    ::reqwest::Url::parse_with_params(api_url, &pairs)
        .map(|url| url.to_string())
        .map_err(|e| ErrorKind::GenericApi(format!("invalid URL {}: {}", api_url, e), None).into())
}

fn error_message(body: &str) -> String {
    let content: Value = match serde_json::from_str(body) {
        Ok(content) => content,
        Err(_) => return DEFAULT_ERROR_MESSAGE.to_owned(),
    };
    let message = match content.get("errors") {
        Some(&Value::Array(ref errors)) => errors
            .first()
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        Some(&Value::String(ref s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
        None => content
            .get("detail")
            .and_then(Value::as_str)
            .map(str::to_owned),
    };
    message.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Body, FilePart};
    use crate::testing::{content_types, env_lock, response, serve_once, StubSender};
    use std::env;

    fn config(api_url: &str) -> ClientConfig {
        ClientConfig {
            access_token: Some("tok".to_owned()),
            api_url: Some(api_url.to_owned()),
            ..ClientConfig::default()
        }
    }

    fn client(sender: StubSender) -> Client<StubSender> {
        let _env = env_lock();
        Client::with_sender(config("https://api.example.com/api/"), sender).unwrap()
    }

    /// Sends one call through reqwest to a local listener and returns the raw request.
    fn capture<F>(call: F) -> String
    where
        F: FnOnce(&mut Client) -> Result<Value>,
    {
        let (base, server) = serve_once();
        let mut c = {
            let _env = env_lock();
            Client::new(config(&format!("{}/api/", base))).unwrap()
        };
        call(&mut c).unwrap();
        server.join().unwrap()
    }

    #[test]
    fn api_url_env_overrides_config() {
        let _env = env_lock();
        let api_url = || {
            Client::with_sender(config("https://api.example.com/api/"), StubSender::new(vec![]))
                .map(|c| c.api_url().to_owned())
        };
        env::set_var("YELLOWANT_API_URL", "https://staging.example.com/api/");
        let overridden = api_url();
        env::set_var("YELLOWANT_API_URL", "");
        let empty = api_url();
        env::remove_var("YELLOWANT_API_URL");
        let unset = api_url();

        assert_eq!(overridden.unwrap(), "https://staging.example.com/api/");
        assert_eq!(empty.unwrap(), "https://api.example.com/api/");
        assert_eq!(unset.unwrap(), "https://api.example.com/api/");
    }

    #[test]
    fn uploads_carry_only_the_multipart_content_type() {
        let file = FilePart {
            file_name: "report.csv".to_owned(),
            bytes: b"a,b\n1,2\n".to_vec(),
        };
        let raw = capture(|c| c.post("upload/", Params::new().set("kind", "csv").file("f", file)));
        let types = content_types(&raw);
        assert_eq!(types.len(), 1, "{:?}", types);
        assert!(types[0].starts_with("multipart/form-data; boundary="));
        assert!(raw.starts_with("POST /api/upload/ HTTP/1.1\r\n"));

        let head = raw.to_lowercase();
        assert!(head.contains("authorization: bearer tok"));
        assert!(head.contains("user-agent: yellowant-rust/"));
    }

    #[test]
    fn json_and_query_requests_carry_matching_content_type() {
        let raw = capture(|c| c.post("user/message/", Params::new().set("message_text", "hi")));
        assert_eq!(content_types(&raw), vec!["application/json".to_owned()]);

        let raw = capture(|c| c.get("user/logs/", Params::new().set("page", 2)));
        assert!(content_types(&raw).is_empty());
        assert!(raw.starts_with("GET /api/user/logs/?page=2 HTTP/1.1\r\n"));
    }

    #[test]
    fn join_url_normalizes_slashes() {
        let expected = "https://api.example.com/api/user/profile/";
        assert_eq!(join_url("https://api.example.com/api/", "/user/profile/"), expected);
        assert_eq!(join_url("https://api.example.com/api", "user/profile/"), expected);
        assert_eq!(join_url("https://api.example.com/api//", "//user/profile/"), expected);
        assert_eq!(join_url("https://api.example.com/api/%s", "/user/profile/"), expected);
    }

    #[test]
    fn request_sends_bearer_token_and_decodes_json() {
        let sender = StubSender::new(vec![response(200, r#"{"id": 5}"#)]);
        let mut c = client(sender);
        let v = c.get_user_profile(Params::new().set("verbose", true)).unwrap();
        assert_eq!(v["id"], 5);

        let sent = c.sender().requests();
        assert_eq!(sent[0].url, "https://api.example.com/api/user/profile/");
        assert_eq!(sent[0].auth, Authorization::Bearer("tok".to_owned()));
        assert_eq!(sent[0].query, vec![("verbose".to_owned(), "true".to_owned())]);
    }

    #[test]
    fn post_sends_json_body() {
        let sender = StubSender::new(vec![response(201, "{}")]);
        let mut c = client(sender);
        c.create_user_integration(Params::new().set("name", "jira")).unwrap();
        assert_eq!(c.sender().requests()[0].body, Body::Json(r#"{"name":"jira"}"#.to_owned()));
    }

    #[test]
    fn no_content_is_null() {
        let mut c = client(StubSender::new(vec![response(204, "")]));
        assert_eq!(c.delete_user_integration(3, Params::new()).unwrap(), Value::Null);
        assert_eq!(c.sender().requests()[0].url, "https://api.example.com/api/user/integration/3/");
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let resp = response(429, r#"{"errors": [{"message": "slow down"}]}"#)
            .with_header("X-Rate-Limit-Reset", "120");
        let mut c = client(StubSender::new(vec![resp]));
        let err = c.get_application_rate_limit_status(Params::new()).unwrap_err();
        assert_eq!(err.retry_after(), Some(120));
        assert_eq!(err.status_code(), Some(429));
        assert_eq!(
            err.to_string(),
            "YellowAnt API returned a 429 (Too Many Requests), slow down (Retry after 120 seconds)"
        );
    }

    #[test]
    fn unauthorized_maps_to_auth_failure() {
        let mut c = client(StubSender::new(vec![response(401, r#"{"detail": "nope"}"#)]));
        match *c.get_user_profile(Params::new()).unwrap_err().kind() {
            ErrorKind::AuthFailure(ref msg, 401) => assert_eq!(msg, "nope"),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn auth_marker_in_body_maps_to_auth_failure() {
        let body = r#"{"errors": [{"message": "Bad Authentication data"}]}"#;
        let mut c = client(StubSender::new(vec![response(400, body)]));
        match *c.get_user_profile(Params::new()).unwrap_err().kind() {
            ErrorKind::AuthFailure(_, 400) => {}
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn other_errors_are_generic() {
        let mut c = client(StubSender::new(vec![response(500, "<html>oops</html>")]));
        let err = c.get_tos(Params::new()).unwrap_err();
        match *err.kind() {
            ErrorKind::GenericApi(ref msg, Some(500)) => {
                assert_eq!(msg, "An error occurred processing your request.")
            }
            ref other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            c.last_call().and_then(|call| call.api_error.clone()),
            Some("An error occurred processing your request.".to_owned())
        );
    }

    #[test]
    fn invalid_json_success_fails() {
        let mut c = client(StubSender::new(vec![response(200, "not json")]));
        assert!(c.get_privacy_policy(Params::new()).is_err());
    }

    #[test]
    fn last_function_header_requires_a_call() {
        let mut c = client(StubSender::new(vec![
            response(200, "{}").with_header("X-Rate-Limit-Remaining", "14"),
        ]));
        match *c.get_lastfunction_header("x-rate-limit-remaining").unwrap_err().kind() {
            ErrorKind::NoPriorCall => {}
            ref other => panic!("unexpected {:?}", other),
        }
        c.get_supported_languages(Params::new()).unwrap();
        assert_eq!(c.get_lastfunction_header("X-Rate-Limit-Remaining").unwrap(), Some("14"));
        assert_eq!(c.get_lastfunction_header("x-missing").unwrap(), None);
    }

    #[test]
    fn plain_http_is_refused() {
        let mut c = client(StubSender::new(vec![]));
        match *c.get("http://api.example.com/x", Params::new()).unwrap_err().kind() {
            ErrorKind::InsecureEndpoint(_) => {}
            ref other => panic!("unexpected {:?}", other),
        }
        assert!(c.sender().requests().is_empty());
    }

    #[test]
    fn construct_api_url_encodes_params() {
        let url = construct_api_url(
            "https://api.example.com/api/search",
            Params::new().set("q", "a b&c").set("page", 2),
        )
        .unwrap();
        assert!(url.starts_with("https://api.example.com/api/search?"));
        assert!(url.contains("q=a+b%26c"));
        assert!(url.contains("page=2"));
    }
}
