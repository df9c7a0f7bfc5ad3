//! Files the CLI keeps on disk: section files, the application descriptor
//! and the credentials bundle.

use super::{ErrorKind, Result, ResultExt};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const APP_FILENAME: &str = "yellowant_app.yaml";
pub const APP_CONFIG_FILENAME: &str = "app.yellowant";
pub const CREDENTIALS_FILENAME: &str = "yellowant_app_credentials.json";

/// Descriptor fields the CLI prompts for, with their prompt labels.
pub const DESCRIPTOR_FIELDS: [(&str, &str); 6] = [
    ("invoke_name", "Invoke Name"),
    ("website", "Website"),
    ("api_url", "API URL"),
    ("install_page_url", "Installation URL"),
    ("privacy_policy_url", "Privacy Policy URL"),
    ("redirect_uris", "Redirect URL"),
];

/// Keys that only ever live in the credentials file.
const SECRET_KEYS: [&str; 4] = ["client_id", "client_secret", "verification_token", "rtm_token"];

/// Field order is alphabetical so the file comes out with sorted keys.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Credentials {
    pub application_id: u64,
    pub client_id: String,
    pub client_secret: String,
    pub invoke_name: String,
    pub rtm_token: String,
    pub verification_token: String,
}

/// A file of named sections holding string values, e.g.
///
/// ```toml
/// [YELLOWANT_DEV]
/// host = "https://www.yellowant.com"
/// token = "..."
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionFile {
    path: PathBuf,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl SectionFile {
    /// Reads `path`; a missing file is an empty one.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<SectionFile> {
        let path = path.into();
        let sections = if path.exists() {
            toml::from_str(&fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };
        Ok(SectionFile { path, sections })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(|v| v.as_str())
    }

    pub fn set<V: Into<String>>(&mut self, section: &str, key: &str, value: V) {
        self.sections
            .entry(section.to_owned())
            .or_insert_with(BTreeMap::new)
            .insert(key.to_owned(), value.into());
    }

    pub fn save(&self) -> Result<()> {
        let text = toml::to_string(&self.sections)?;
        fs::write(&self.path, text)?;
        info!("wrote {}", self.path.display());
        Ok(())
    }
}

/// The directory an application is developed in.
#[derive(Clone, Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new<P: Into<PathBuf>>(root: P) -> Workspace {
        Workspace { root: root.into() }
    }

    pub fn path<P: AsRef<Path>>(&self, file: P) -> PathBuf {
        self.root.join(file)
    }

    /// Reads the YAML application descriptor. An empty file is an empty mapping.
    pub fn read_descriptor<P: AsRef<Path>>(&self, file: P) -> Result<Map<String, Value>> {
        let path = self.path(file);
        let text = fs::read_to_string(&path)
            .chain_err(|| format!("Could not read application file {}", path.display()))?;
        match serde_yaml::from_str::<Value>(&text)? {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map),
            _ => bail!(ErrorKind::DataCorrupt(format!(
                "{} must contain a mapping of application fields.",
                path.display()
            ))),
        }
    }

    /// Writes application data as YAML, leaving out any secrets.
    pub fn save_application_yaml<P: AsRef<Path>>(
        &self,
        file: P,
        application: &Map<String, Value>,
    ) -> Result<PathBuf> {
        let path = self.path(file);
        let mut public = application.clone();
        for key in &SECRET_KEYS {
            public.remove(*key);
        }
        write_yaml(&path, &public).chain_err(|| {
            ErrorKind::FilePermission(
                "Could not save application data to a local file. Please check permissions."
                    .to_owned(),
            )
        })?;
        info!("wrote {}", path.display());
        Ok(path)
    }

    /// Writes the credentials bundle with sorted keys and four-space indentation.
    pub fn save_credentials(&self, credentials: &Credentials) -> Result<PathBuf> {
        let path = self.path(CREDENTIALS_FILENAME);
        write_pretty_json(&path, credentials).chain_err(|| {
            ErrorKind::FilePermission("Could not save credentials information properly.".to_owned())
        })?;
        info!("wrote {}", path.display());
        Ok(path)
    }

    pub fn app_config(&self) -> Result<SectionFile> {
        SectionFile::load(self.path(APP_CONFIG_FILENAME))
    }

    /// Records the id of an application under its invoke name.
    pub fn save_app_config(&self, app_id: &str, invoke_name: &str) -> Result<()> {
        let mut config = self.app_config()?;
        config.set(invoke_name, "invoke_name", invoke_name);
        config.set(invoke_name, "id", app_id);
        config.save()
    }

    pub fn read_app_id(&self, invoke_name: &str) -> Result<Option<String>> {
        Ok(self
            .app_config()?
            .get(invoke_name, "id")
            .map(str::to_owned))
    }
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_yaml::to_string(value)?)?;
    Ok(())
}

fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = File::create(path)?;
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut file, formatter);
    value.serialize(&mut ser)?;
    file.write_all(b"\n")?;
    Ok(())
}
