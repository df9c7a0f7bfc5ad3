//! Functionality for sending requests to YellowAnt.
//!
//! [`HttpSend`] is the only place a request touches the network; everything
//! above it works on [`ApiRequest`] and [`ApiResponse`] values.

use super::Result;
use super::message::Message;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl ::std::fmt::Display for Method {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the request authenticates.
#[derive(Clone, Debug, PartialEq)]
pub enum Authorization {
    None,
    /// `Authorization: Bearer <token>`, used by the OAuth2 client API.
    Bearer(String),
    /// `Authorization: Token <token>`, used by the developer API.
    Token(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Empty,
    Json(String),
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<(String, FilePart)>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub auth: Authorization,
    pub body: Body,
}

impl ApiRequest {
    pub fn new<S: Into<String>>(method: Method, url: S) -> ApiRequest {
        ApiRequest {
            method,
            url: url.into(),
            query: vec![],
            headers: vec![],
            auth: Authorization::None,
            body: Body::Empty,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub url: String,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|v| v.as_str())
    }

    pub fn with_header<N: AsRef<str>, V: Into<String>>(mut self, name: N, value: V) -> ApiResponse {
        self.headers.insert(name.as_ref().to_lowercase(), value.into());
        self
    }
}

pub trait HttpSend {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

impl HttpSend for ::reqwest::blocking::Client {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        use reqwest::blocking::multipart::{Form, Part};
        use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

        let method = match request.method {
            Method::Get => ::reqwest::Method::GET,
            Method::Post => ::reqwest::Method::POST,
            Method::Put => ::reqwest::Method::PUT,
            Method::Patch => ::reqwest::Method::PATCH,
            Method::Delete => ::reqwest::Method::DELETE,
        };
        let mut builder = self.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.auth {
            Authorization::None => builder,
            Authorization::Bearer(ref token) => builder.bearer_auth(token),
            Authorization::Token(ref token) => builder.header(AUTHORIZATION, format!("Token {}", token)),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(ref text) => builder.header(CONTENT_TYPE, "application/json").body(text.clone()),
            Body::Form(ref pairs) => builder.form(pairs),
            Body::Multipart { ref fields, ref files } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                for (name, file) in files {
                    let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
                    form = form.part(name.clone(), part);
                }
                builder.multipart(form)
            }
        };

        debug!("{} {}", request.method, request.url);
        let response = builder.send()?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_owned()))
            })
            .collect();
        let body = response.text()?;
        debug!("{} {} -> {}", request.method, url, status);

        Ok(ApiResponse {
            status,
            url,
            headers,
            body,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    Value(Value),
    File(FilePart),
}

/// Request parameters, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Vec<(String, Param)>);

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    pub fn set<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Params {
        self.0.push((key.into(), Param::Value(value.into())));
        self
    }

    pub fn file<K: Into<String>>(mut self, key: K, file: FilePart) -> Params {
        self.0.push((key.into(), Param::File(file)));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().rev().find_map(|(k, p)| match *p {
            Param::Value(ref v) if k == key => Some(v),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Separates plain values from file parts. Later duplicates win.
    pub fn split(self) -> (Map<String, Value>, Vec<(String, FilePart)>) {
        let mut values = Map::new();
        let mut files = vec![];
        for (key, param) in self.0 {
            match param {
                Param::Value(v) => {
                    values.insert(key, v);
                }
                Param::File(f) => files.push((key, f)),
            }
        }
        (values, files)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Params {
        Params(map.into_iter().map(|(k, v)| (k, Param::Value(v))).collect())
    }
}

impl<'a> From<&'a Message> for Params {
    fn from(message: &'a Message) -> Params {
        match message.to_value() {
            Ok(Value::Object(map)) => Params::from(map),
            _ => Params::new(),
        }
    }
}

/// Renders a value the way it appears in a query string or form field.
/// `None` for nulls, which are dropped.
pub fn query_value(value: &Value) -> Option<String> {
    match *value {
        Value::Null => None,
        Value::Bool(b) => Some(if b { "true" } else { "false" }.to_owned()),
        Value::String(ref s) => Some(s.clone()),
        Value::Number(ref n) => Some(n.to_string()),
        Value::Array(ref items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Fills in the body or query of `request` from `params` according to its method.
pub fn apply_params(request: &mut ApiRequest, params: Params) -> Result<()> {
    let (values, files) = params.split();
    if request.method == Method::Get {
        request.query = values
            .iter()
            .filter_map(|(k, v)| query_value(v).map(|v| (k.clone(), v)))
            .collect();
    } else if files.is_empty() {
        request.body = Body::Json(serde_json::to_string(&values)?);
    } else {
        let fields = values
            .iter()
            .filter_map(|(k, v)| query_value(v).map(|v| (k.clone(), v)))
            .collect();
        request.body = Body::Multipart { fields, files };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> FilePart {
        FilePart {
            file_name: "report.csv".to_owned(),
            bytes: b"a,b\n1,2\n".to_vec(),
        }
    }

    #[test]
    fn split_separates_files() {
        let (values, files) = Params::new()
            .set("id", 4)
            .file("attachment", upload())
            .set("name", "x")
            .split();
        assert_eq!(values.len(), 2);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "attachment");
    }

    #[test]
    fn get_params_go_to_query() {
        let mut req = ApiRequest::new(Method::Get, "https://api.yellowant.com/api/user/logs/");
        let params = Params::new()
            .set("active", true)
            .set("ids", json!([1, 2, 3]))
            .set("skip", Value::Null)
            .set("q", "hello");
        apply_params(&mut req, params).unwrap();
        assert_eq!(req.body, Body::Empty);
        assert!(req.query.contains(&("active".to_owned(), "true".to_owned())));
        assert!(req.query.contains(&("ids".to_owned(), "1,2,3".to_owned())));
        assert!(req.query.contains(&("q".to_owned(), "hello".to_owned())));
        assert!(!req.query.iter().any(|(k, _)| k == "skip"));
    }

    #[test]
    fn other_verbs_send_json() {
        let mut req = ApiRequest::new(Method::Post, "https://api.yellowant.com/api/user/message/");
        apply_params(&mut req, Params::new().set("message_text", "hi")).unwrap();
        assert_eq!(req.body, Body::Json("{\"message_text\":\"hi\"}".to_owned()));
        assert!(req.query.is_empty());
    }

    #[test]
    fn files_switch_to_multipart() {
        let mut req = ApiRequest::new(Method::Post, "https://api.yellowant.com/api/upload/");
        apply_params(&mut req, Params::new().set("kind", "csv").file("f", upload())).unwrap();
        match req.body {
            Body::Multipart { ref fields, ref files } => {
                assert_eq!(fields, &vec![("kind".to_owned(), "csv".to_owned())]);
                assert_eq!(files[0].1.file_name, "report.csv");
            }
            ref other => panic!("expected multipart, got {:?}", other),
        }
    }

    #[test]
    fn params_from_message() {
        let params = Params::from(&Message::new("ping"));
        assert_eq!(params.get("message_text"), Some(&json!("ping")));
    }

    fn send_captured(mut request: ApiRequest) -> String {
        let (base, server) = crate::testing::serve_once();
        request.url = format!("{}{}", base, request.url);
        let response = HttpSend::send(&::reqwest::blocking::Client::new(), &request).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{}");
        server.join().unwrap()
    }

    #[test]
    fn each_body_sends_one_content_type() {
        use crate::testing::content_types;

        let mut json = ApiRequest::new(Method::Post, "/user/message/");
        apply_params(&mut json, Params::new().set("message_text", "hi")).unwrap();
        json.auth = Authorization::Token("devtok".to_owned());
        let raw = send_captured(json);
        assert_eq!(content_types(&raw), vec!["application/json".to_owned()]);
        assert!(raw.to_lowercase().contains("authorization: token devtok"));
        assert!(raw.ends_with("{\"message_text\":\"hi\"}"));

        let mut form = ApiRequest::new(Method::Post, "/oauth2/token/");
        form.body = Body::Form(vec![("code".to_owned(), "abc".to_owned())]);
        let raw = send_captured(form);
        assert_eq!(content_types(&raw), vec!["application/x-www-form-urlencoded".to_owned()]);

        let mut multipart = ApiRequest::new(Method::Post, "/upload/");
        apply_params(&mut multipart, Params::new().set("kind", "csv").file("f", upload())).unwrap();
        let raw = send_captured(multipart);
        let types = content_types(&raw);
        assert_eq!(types.len(), 1, "{:?}", types);
        assert!(types[0].starts_with("multipart/form-data; boundary="));
        assert!(raw.contains("filename=\"report.csv\""));

        let mut get = ApiRequest::new(Method::Get, "/user/logs/");
        apply_params(&mut get, Params::new().set("page", 2)).unwrap();
        let raw = send_captured(get);
        assert!(content_types(&raw).is_empty());
        assert!(raw.starts_with("GET /user/logs/?page=2 HTTP/1.1\r\n"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = BTreeMap::new();
        headers.insert("x-rate-limit-reset".to_owned(), "120".to_owned());
        let resp = ApiResponse {
            status: 200,
            url: String::new(),
            headers,
            body: String::new(),
        };
        assert_eq!(resp.header("X-Rate-Limit-Reset"), Some("120"));
    }
}
