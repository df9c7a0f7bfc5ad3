use super::store::SectionFile;
use super::Result;
use config::{Config, Environment};
use std::path::{Path, PathBuf};

pub const AUTH_SECTION: &str = "YELLOWANT_DEV";
pub const AUTH_FILENAME: &str = ".yellowant";

/// Developer credentials for the CLI.
///
/// Later sources win: the auth file, then `YACLI_TOKEN` / `YACLI_HOST`, then
/// the command-line flags.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Settings {
    pub token: Option<String>,
    pub host: Option<String>,
}

impl Settings {
    pub fn load(auth_file: &Path, token: Option<String>, host: Option<String>) -> Result<Settings> {
        let mut builder = Config::builder();
        match SectionFile::load(auth_file) {
            Ok(file) => {
                for key in &["token", "host"] {
                    if let Some(value) = file.get(AUTH_SECTION, key) {
                        builder = builder.set_default(*key, value)?;
                    }
                }
            }
            Err(e) => warn!("ignoring unreadable {}: {}", auth_file.display(), e),
        }
        let settings = builder
            .add_source(Environment::with_prefix("YACLI"))
            .set_override_option("token", token)?
            .set_override_option("host", host)?
            .build()?;
        Ok(settings.try_deserialize::<Settings>()?)
    }
}

#[derive(Deserialize)]
struct SdkSettings {
    api_url: Option<String>,
}

/// `YELLOWANT_API_URL`, when set and non-empty.
pub fn api_url_override() -> Result<Option<String>> {
    let settings = Config::builder()
        .add_source(Environment::with_prefix("YELLOWANT"))
        .build()?
        .try_deserialize::<SdkSettings>()?;
    Ok(settings.api_url.filter(|url| !url.is_empty()))
}

/// `~/.yellowant`, falling back to `%HOMEPATH%` and then the working directory.
pub fn auth_file_path() -> PathBuf {
    use std::env::var_os;
    let home = var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| var_os("HOMEPATH").map(|p| Path::new("C:").join(p)))
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(AUTH_FILENAME)
}
