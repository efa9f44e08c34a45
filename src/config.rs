use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

/// Keys of the flat settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ClientId,
    ClientSecret,
    RedirectUri,
    AccessToken,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::ClientId,
        SettingKey::ClientSecret,
        SettingKey::RedirectUri,
        SettingKey::AccessToken,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::ClientId => "client_id",
            SettingKey::ClientSecret => "client_secret",
            SettingKey::RedirectUri => "redirect_uri",
            SettingKey::AccessToken => "access_token",
        }
    }

    /// Values that `config list` must not echo back.
    pub fn is_secret(self) -> bool {
        matches!(self, SettingKey::ClientSecret | SettingKey::AccessToken)
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "client_id" => Ok(SettingKey::ClientId),
            "client_secret" => Ok(SettingKey::ClientSecret),
            "redirect_uri" => Ok(SettingKey::RedirectUri),
            "access_token" => Ok(SettingKey::AccessToken),
            other => bail!(
                "Unknown config key '{}'. Expected one of: client_id, client_secret, redirect_uri, access_token",
                other
            ),
        }
    }
}

/// The three OAuth application credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.redirect_uri.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default)]
    pub access_token: String,
}

impl Config {
    pub fn get(&self, key: SettingKey) -> &str {
        match key {
            SettingKey::ClientId => &self.client_id,
            SettingKey::ClientSecret => &self.client_secret,
            SettingKey::RedirectUri => &self.redirect_uri,
            SettingKey::AccessToken => &self.access_token,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            SettingKey::ClientId => self.client_id = value,
            SettingKey::ClientSecret => self.client_secret = value,
            SettingKey::RedirectUri => self.redirect_uri = value,
            SettingKey::AccessToken => self.access_token = value,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        if self.access_token.is_empty() {
            None
        } else {
            Some(&self.access_token)
        }
    }

    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().context("Could not determine config directory")?;
        path.push("ticktick-tui");
        path.push("config.json");
        Ok(path)
    }

    /// A missing file is an empty config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

/// Key-value settings access used by the TUI and the CLI.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: SettingKey) -> String;
    /// Persists immediately.
    fn set(&self, key: SettingKey, value: &str) -> Result<()>;
}

/// `ConfigStore` backed by a JSON file on disk.
pub struct ConfigFile {
    path: PathBuf,
    config: Mutex<Config>,
}

impl ConfigFile {
    pub fn open(path: PathBuf) -> Result<Self> {
        let config = Config::load_from(&path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            path,
            config: Mutex::new(config),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Config {
        self.config
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl ConfigStore for ConfigFile {
    fn get(&self, key: SettingKey) -> String {
        self.config
            .lock()
            .map(|c| c.get(key).to_string())
            .unwrap_or_default()
    }

    fn set(&self, key: SettingKey, value: &str) -> Result<()> {
        let mut config = match self.config.lock() {
            Ok(c) => c,
            Err(_) => bail!("Config lock poisoned"),
        };
        config.set(key, value);
        config.save_to(&self.path)?;
        tracing::info!(key = %key, "saved setting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.credentials().is_complete());
        assert_eq!(config.access_token(), None);
    }

    #[test]
    fn set_persists_immediately_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = ConfigFile::open(path.clone()).unwrap();

        store.set(SettingKey::ClientId, "abc").unwrap();
        store.set(SettingKey::AccessToken, "tok").unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.client_id, "abc");
        assert_eq!(reloaded.access_token(), Some("tok"));
        assert_eq!(store.get(SettingKey::ClientId), "abc");
        assert_eq!(store.get(SettingKey::RedirectUri), "");
    }

    #[test]
    fn partial_file_fills_missing_keys_with_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"client_id":"only"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.client_id, "only");
        assert_eq!(config.client_secret, "");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn setting_key_parses_known_names_only() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
        assert!("token".parse::<SettingKey>().is_err());
        assert!(SettingKey::AccessToken.is_secret());
        assert!(!SettingKey::RedirectUri.is_secret());
    }

    #[test]
    fn credentials_complete_requires_all_three() {
        let mut config = Config {
            client_id: "id".into(),
            client_secret: "secret".into(),
            redirect_uri: String::new(),
            access_token: String::new(),
        };
        assert!(!config.credentials().is_complete());
        config.set(SettingKey::RedirectUri, "http://localhost");
        assert!(config.credentials().is_complete());
    }
}
