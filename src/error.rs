error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Config(::config::ConfigError);
        Json(::serde_json::error::Error);
        Yaml(::serde_yaml::Error);
        Toml(::toml::de::Error);
        TomlSerialize(::toml::ser::Error);
        Request(::reqwest::Error);
        Socket(::rust_socketio::Error);
    }
    errors {
        AuthenticationMissing {
            description("authentication missing")
            display("You cannot perform this command without authentication.\n\
                     Run 'yellowant auth' to remember authentication credentials, \
                     or provide '--token' and '--host' flag values before this command")
        }
        AppIdInvalid(app: String) {
            description("application id invalid")
            display("Could not resolve application '{}'. Please check if application invoke name \
                     details are present in the file: app.yellowant", app)
        }
        DataCorrupt(reason: String) {
            description("application data corrupt")
            display("{}", reason)
        }
        FilePermission(reason: String) {
            description("file permission")
            display("{}", reason)
        }
        InvalidAppData(msg: String) {
            description("invalid application data")
            display("{}", msg)
        }
        RateLimit(msg: String, status: u16, retry_after: Option<u64>) {
            description("rate limited")
            display("{}", crate::status::describe(*status, &match *retry_after {
                Some(seconds) => format!("{} (Retry after {} seconds)", msg, seconds),
                None => msg.clone(),
            }))
        }
        AuthFailure(msg: String, status: u16) {
            description("authentication failure")
            display("{}", crate::status::describe(*status, msg))
        }
        GenericApi(msg: String, status: Option<u16>) {
            description("api error")
            display("{}", match *status {
                Some(code) => crate::status::describe(code, msg),
                None => msg.clone(),
            })
        }
        InvalidValue(field: &'static str, reason: String) {
            description("invalid value")
            display("'{}' {}", field, reason)
        }
        NoPriorCall {
            description("no prior call")
            display("This function must be called after an API call. It delivers header information.")
        }
        InsecureEndpoint(url: String) {
            description("insecure endpoint")
            display("api.yellowant.com is restricted to SSL/TLS traffic, refusing {}", url)
        }
        NotConnected {
            description("not connected")
            display("Realtime client is not connected")
        }
    }
}

impl Error {
    /// HTTP status code carried by API errors, if any.
    pub fn status_code(&self) -> Option<u16> {
        match *self.kind() {
            ErrorKind::RateLimit(_, status, _) | ErrorKind::AuthFailure(_, status) => Some(status),
            ErrorKind::GenericApi(_, status) => status,
            ErrorKind::InvalidAppData(_) => Some(400),
            _ => None,
        }
    }

    /// Seconds until the rate limit resets, for `RateLimit` errors.
    pub fn retry_after(&self) -> Option<u64> {
        match *self.kind() {
            ErrorKind::RateLimit(_, _, retry_after) => retry_after,
            _ => None,
        }
    }
}
