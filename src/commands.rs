//! The `yellowant` developer commands: auth, create, pull, sync and update.

use super::http::{ApiRequest, ApiResponse, Authorization, Body, HttpSend, Method};
use super::normalizer::{self, AppAction};
use super::settings::{Settings, AUTH_SECTION};
use super::store::{SectionFile, Workspace, APP_FILENAME, DESCRIPTOR_FIELDS};
use super::{ErrorKind, Result};
use clap::Subcommand;
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "https://www.yellowant.com";
pub const DEVELOPER_APPLICATION_ENDPOINT: &str = "/api/developer/applications/";
pub const DEVELOPER_APPLICATION_SYNC_ENDPOINT: &str = "/api/developer/applications/sync/";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Permanently save YellowAnt authentication details to a config file.
    Auth(AuthArgs),
    /// Create an application with your developer account.
    Create(CreateArgs),
    /// Pull application data from host. Either provide application id or invoke name.
    Pull(PullArgs),
    /// Create or update an application on YellowAnt.
    Sync(SyncArgs),
    /// Update an application with your developer account.
    Update(UpdateArgs),
}

#[derive(Debug, Default, clap::Args)]
pub struct AuthArgs {
    /// YellowAnt developer token.
    #[arg(long)]
    pub token: Option<String>,
    /// YellowAnt server host url.
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    /// App YAML file name.
    #[arg(long, default_value = APP_FILENAME)]
    pub filename: PathBuf,
    /// Do not prompt for inputs.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, clap::Args)]
pub struct PullArgs {
    /// Application id or invoke name.
    pub app: String,
    #[arg(long, default_value = APP_FILENAME)]
    pub filename: PathBuf,
}

#[derive(Debug, Default, clap::Args)]
pub struct SyncArgs {
    /// Unique name to invoke the app.
    #[arg(long = "invoke_name")]
    pub invoke_name: Option<String>,
    /// Website of the app.
    #[arg(long)]
    pub website: Option<String>,
    /// API endpoint through which YellowAnt interacts with this app.
    #[arg(long = "api_url")]
    pub api_url: Option<String>,
    /// Web URL through which users can integrate this app.
    #[arg(long = "install_page_url")]
    pub install_page_url: Option<String>,
    /// Web URL for the privacy policy of this app.
    #[arg(long = "privacy_policy_url")]
    pub privacy_policy_url: Option<String>,
    /// Redirect URI at which YellowAnt will provide OAuth tokens.
    #[arg(long = "redirect_uris")]
    pub redirect_uris: Option<String>,
    /// Do not prompt for inputs.
    #[arg(short, long)]
    pub quiet: bool,
    /// App YAML file name.
    #[arg(long, default_value = APP_FILENAME)]
    pub filename: PathBuf,
}

impl SyncArgs {
    fn overrides(&self) -> [(&'static str, Option<&String>); 6] {
        [
            ("invoke_name", self.invoke_name.as_ref()),
            ("website", self.website.as_ref()),
            ("api_url", self.api_url.as_ref()),
            ("install_page_url", self.install_page_url.as_ref()),
            ("privacy_policy_url", self.privacy_policy_url.as_ref()),
            ("redirect_uris", self.redirect_uris.as_ref()),
        ]
    }
}

#[derive(Debug, clap::Args)]
pub struct UpdateArgs {
    /// Application id or invoke name.
    pub app: String,
    #[arg(long, default_value = APP_FILENAME)]
    pub filename: PathBuf,
}

/// Asks the developer for a value.
pub trait Prompt {
    /// Returns `default` when the answer is empty.
    fn ask(&mut self, label: &str, default: Option<&str>, hidden: bool) -> Result<String>;
}

/// Reads answers from standard input.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, label: &str, default: Option<&str>, hidden: bool) -> Result<String> {
        let stdin = io::stdin();
        loop {
            match default {
                Some(d) if !hidden => eprint!("{} [{}]: ", label, d),
                _ => eprint!("{}: ", label),
            }
            io::stderr().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, format!("no value for {}", label)).into());
            }
            let answer = line.trim();
            if !answer.is_empty() {
                return Ok(answer.to_owned());
            }
            if let Some(d) = default {
                return Ok(d.to_owned());
            }
        }
    }
}

/// State shared by every command.
pub struct Context<S = ::reqwest::blocking::Client> {
    pub token: Option<String>,
    pub host: Option<String>,
    pub auth_file: PathBuf,
    pub workspace: Workspace,
    sender: S,
}

impl Context {
    pub fn new(settings: Settings, auth_file: PathBuf, workspace: Workspace) -> Result<Context> {
        let sender = ::reqwest::blocking::Client::builder()
            .user_agent(super::client::USER_AGENT)
            .build()?;
        Ok(Context::with_sender(settings, auth_file, workspace, sender))
    }
}

impl<S: HttpSend> Context<S> {
    pub fn with_sender(settings: Settings, auth_file: PathBuf, workspace: Workspace, sender: S) -> Context<S> {
        Context {
            token: settings.token,
            host: settings.host,
            auth_file,
            workspace,
            sender,
        }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Token and host, or `AuthenticationMissing`.
    pub fn require_auth(&self) -> Result<(&str, &str)> {
        match (self.token.as_deref(), self.host.as_deref()) {
            (Some(token), Some(host)) => Ok((token, host)),
            _ => bail!(ErrorKind::AuthenticationMissing),
        }
    }

    /// Sends one request to the developer API, authenticated with the stored token.
    pub fn send(&self, method: Method, endpoint: &str, data: Option<&Map<String, Value>>) -> Result<ApiResponse> {
        let (token, host) = self.require_auth()?;
        let mut request = ApiRequest::new(method, build_endpoint(host, endpoint));
        request.auth = Authorization::Token(token.to_owned());
        if let Some(data) = data {
            request.body = Body::Json(serde_json::to_string(data)?);
        }
        let response = self.sender.send(&request)?;
        debug!("{} {} -> {}", method, request.url, response.status);
        Ok(response)
    }
}

/// Joins host and endpoint, dropping a trailing slash from the host.
pub fn build_endpoint(host: &str, endpoint: &str) -> String {
    format!("{}{}", host.trim_end_matches('/'), endpoint)
}

/// Runs one command and returns the line to report to the developer.
pub fn dispatch<S: HttpSend, P: Prompt>(command: Command, ctx: &mut Context<S>, prompt: &mut P) -> Result<String> {
    match command {
        Command::Auth(args) => auth_command(ctx, prompt, args),
        Command::Create(args) => create_command(ctx, prompt, args),
        Command::Pull(args) => pull_command(ctx, args),
        Command::Sync(args) => sync_command(ctx, prompt, args),
        Command::Update(args) => update_command(ctx, args),
    }
}

fn auth_command<S: HttpSend, P: Prompt>(ctx: &mut Context<S>, prompt: &mut P, args: AuthArgs) -> Result<String> {
    let token = match args.token {
        Some(token) => token,
        None => prompt.ask("YellowAnt developer token", None, true)?,
    };
    let host = match args.host {
        Some(host) => host,
        None => prompt.ask("YellowAnt Host URL", Some(DEFAULT_HOST), false)?,
    };

    let mut file = SectionFile::load(ctx.auth_file.clone())?;
    file.set(AUTH_SECTION, "token", token.as_str());
    file.set(AUTH_SECTION, "host", host.as_str());
    file.save()?;

    ctx.token = Some(token);
    ctx.host = Some(host);
    Ok(format!("Saved authentication details to {}", ctx.auth_file.display()))
}

fn create_command<S: HttpSend, P: Prompt>(ctx: &mut Context<S>, prompt: &mut P, args: CreateArgs) -> Result<String> {
    ctx.require_auth()?;
    let mut data = ctx.workspace.read_descriptor(&args.filename)?;
    if !args.quiet {
        for &(field, label) in DESCRIPTOR_FIELDS.iter() {
            let answer = ask_field(prompt, label, data.get(field))?;
            data.insert(field.to_owned(), Value::String(answer));
        }
    }

    let response = ctx.send(Method::Post, DEVELOPER_APPLICATION_ENDPOINT, Some(&data))?;
    let saved = normalizer::save_credentials(response.status, &response.body, &ctx.workspace, &args.filename)?;
    Ok(success_line(saved.action, &saved.credentials.invoke_name))
}

fn sync_command<S: HttpSend, P: Prompt>(ctx: &mut Context<S>, prompt: &mut P, args: SyncArgs) -> Result<String> {
    ctx.require_auth()?;
    let mut data = ctx.workspace.read_descriptor(&args.filename)?;
    for (&(field, label), &(_, flag)) in DESCRIPTOR_FIELDS.iter().zip(args.overrides().iter()) {
        let value = match flag {
            Some(value) => value.clone(),
            None if args.quiet => continue,
            None => ask_field(prompt, label, data.get(field))?,
        };
        data.insert(field.to_owned(), Value::String(value));
    }

    let response = ctx.send(Method::Post, DEVELOPER_APPLICATION_SYNC_ENDPOINT, Some(&data))?;
    let saved = normalizer::save_credentials(response.status, &response.body, &ctx.workspace, &args.filename)?;
    Ok(success_line(saved.action, &saved.credentials.invoke_name))
}

fn pull_command<S: HttpSend>(ctx: &mut Context<S>, args: PullArgs) -> Result<String> {
    ctx.require_auth()?;
    let app_id = resolve_app(&ctx.workspace, &args.app)?;

    let response = ctx.send(Method::Get, &application_endpoint(&app_id), None)?;
    let application = normalizer::parse_application(response.status, &response.body)?;
    let path = ctx.workspace.save_application_yaml(&args.filename, &application)?;
    record_app(&ctx.workspace, &application)?;
    Ok(format!("Successfully saved application data to {}", path.display()))
}

fn update_command<S: HttpSend>(ctx: &mut Context<S>, args: UpdateArgs) -> Result<String> {
    ctx.require_auth()?;
    let app_id = resolve_app(&ctx.workspace, &args.app)?;
    let data = ctx.workspace.read_descriptor(&args.filename)?;

    let response = ctx.send(Method::Put, &application_endpoint(&app_id), Some(&data))?;
    let application = normalizer::parse_application(response.status, &response.body)?;
    ctx.workspace.save_application_yaml(&args.filename, &application)?;
    let invoke_name = record_app(&ctx.workspace, &application)?;
    Ok(success_line(AppAction::Updated, &invoke_name))
}

fn application_endpoint(app_id: &str) -> String {
    format!("{}{}/", DEVELOPER_APPLICATION_ENDPOINT, app_id)
}

/// A numeric id is used as is; anything else is looked up as an invoke name.
fn resolve_app(workspace: &Workspace, app: &str) -> Result<String> {
    if let Ok(id) = app.trim().parse::<u64>() {
        return Ok(id.to_string());
    }
    match workspace.read_app_id(app)? {
        Some(id) => Ok(id),
        None => bail!(ErrorKind::AppIdInvalid(app.to_owned())),
    }
}

/// Saves the app config section for `application` and returns its invoke name.
fn record_app(workspace: &Workspace, application: &Map<String, Value>) -> Result<String> {
    let id = application.get("id").and_then(scalar);
    let invoke_name = application.get("invoke_name").and_then(scalar);
    match (id, invoke_name) {
        (Some(id), Some(invoke_name)) => {
            workspace.save_app_config(&id, &invoke_name)?;
            Ok(invoke_name)
        }
        _ => bail!(ErrorKind::DataCorrupt("Application data is incomplete.".to_owned())),
    }
}

fn ask_field<P: Prompt>(prompt: &mut P, label: &str, current: Option<&Value>) -> Result<String> {
    let default = current.and_then(scalar);
    prompt.ask(label, default.as_ref().map(|d| d.as_str()), false)
}

fn scalar(value: &Value) -> Option<String> {
    match *value {
        Value::String(ref s) => Some(s.clone()),
        Value::Number(ref n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn success_line(action: AppAction, invoke_name: &str) -> String {
    format!(
        "Successfully {} application {} with your YellowAnt developer account.",
        action.as_str(),
        invoke_name
    )
}
