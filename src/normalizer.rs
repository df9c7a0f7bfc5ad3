//! Turns developer API replies into application data or a typed error.

use super::store::{Credentials, Workspace};
use super::{Error, ErrorKind, Result};
use serde_json::{Map, Value};
use std::path::Path;

const UNPARSEABLE: &str = "Application data could not be parsed.";
const INCOMPLETE: &str = "Application data is incomplete.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppAction {
    Created,
    Updated,
}

impl AppAction {
    pub fn from_status(status: u16) -> AppAction {
        if status == 201 {
            AppAction::Created
        } else {
            AppAction::Updated
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppAction::Created => "created",
            AppAction::Updated => "updated",
        }
    }
}

/// Outcome of a credential-bearing create or sync call.
#[derive(Clone, Debug)]
pub struct SavedApplication {
    pub action: AppAction,
    pub credentials: Credentials,
    /// What remains of the reply once the credentials are taken out.
    pub application: Map<String, Value>,
}

/// Parses a successful reply into an object, or converts a failed one into an error.
pub fn parse_application(status: u16, body: &str) -> Result<Map<String, Value>> {
    if !(200..300).contains(&status) {
        return Err(error_for(status, body));
    }
    match serde_json::from_str(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => bail!(ErrorKind::DataCorrupt(UNPARSEABLE.to_owned())),
    }
}

/// Handles a reply that carries application credentials: writes the credentials
/// file, the application YAML file at `app_file`, and the app config section.
pub fn save_credentials<P: AsRef<Path>>(
    status: u16,
    body: &str,
    workspace: &Workspace,
    app_file: P,
) -> Result<SavedApplication> {
    let mut application = parse_application(status, body)?;
    let credentials = take_credentials(&mut application)?;

    workspace.save_credentials(&credentials)?;
    workspace.save_application_yaml(app_file, &application)?;
    workspace.save_app_config(&credentials.application_id.to_string(), &credentials.invoke_name)?;

    Ok(SavedApplication {
        action: AppAction::from_status(status),
        credentials,
        application,
    })
}

/// Removes the secret fields from `application`. `invoke_name` stays behind.
fn take_credentials(application: &mut Map<String, Value>) -> Result<Credentials> {
    let present = ["id", "client_id", "client_secret", "verification_token", "rtm_token", "invoke_name"]
        .iter()
        .all(|k| application.contains_key(*k));
    if !present {
        bail!(ErrorKind::DataCorrupt(INCOMPLETE.to_owned()));
    }

    let application_id = match application.remove("id") {
        Some(Value::Number(ref n)) if n.is_u64() => n.as_u64(),
        Some(Value::String(ref s)) => s.trim().parse().ok(),
        _ => None,
    };
    let invoke_name = application.get("invoke_name").and_then(text);
    let mut secret = |key: &str| application.remove(key).as_ref().and_then(text);
    let client_id = secret("client_id");
    let client_secret = secret("client_secret");
    let verification_token = secret("verification_token");
    let rtm_token = secret("rtm_token");

    match (application_id, client_id, client_secret, verification_token, rtm_token, invoke_name) {
        (
            Some(application_id),
            Some(client_id),
            Some(client_secret),
            Some(verification_token),
            Some(rtm_token),
            Some(invoke_name),
        ) => Ok(Credentials {
            application_id,
            client_id,
            client_secret,
            invoke_name,
            rtm_token,
            verification_token,
        }),
        _ => bail!(ErrorKind::DataCorrupt(INCOMPLETE.to_owned())),
    }
}

fn text(value: &Value) -> Option<String> {
    match *value {
        Value::String(ref s) => Some(s.clone()),
        Value::Number(ref n) => Some(n.to_string()),
        _ => None,
    }
}

fn error_for(status: u16, body: &str) -> Error {
    let parsed = serde_json::from_str::<Value>(body).ok();
    if status == 400 {
        let msg = match parsed {
            Some(Value::Object(ref fields)) => render_field_errors(fields),
            _ => body.to_owned(),
        };
        return ErrorKind::InvalidAppData(msg).into();
    }
    let msg = parsed
        .as_ref()
        .and_then(|v| v.get("detail"))
        .and_then(text)
        .unwrap_or_else(|| body.to_owned());
    ErrorKind::GenericApi(msg, Some(status)).into()
}

fn render_field_errors(fields: &Map<String, Value>) -> String {
    let mut msg = "\nError: Please check your app data JSON.\n".to_owned();
    for (field, errors) in fields {
        let first = match *errors {
            Value::Array(ref list) => list.first().cloned().unwrap_or(Value::Null),
            ref other => other.clone(),
        };
        let first = match first {
            Value::String(s) => s,
            other => other.to_string(),
        };
        msg.push_str(&format!("{}: {}\n", field, first));
    }
    msg
}
