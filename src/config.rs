//! Configuration file handling.
//!
//! The configuration file is stored at `$EXPENSE_HOME/config.json` and contains the base URL of the
//! expense tracker API, the request timeout, the display currency, and, optionally, a custom
//! location for the stored credentials.

use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "expense";
const CONFIG_VERSION: u8 = 1;
const TIMEOUT_SECS: u64 = 30;
const CURRENCY: &str = "₹";
const SECRETS: &str = ".secrets";
const CREDENTIALS_JSON: &str = "credentials.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSE_HOME` and from there it loads `$EXPENSE_HOME/config.json`. It provides
/// paths to other items that are expected in a certain location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the home directory, its `.secrets` subdirectory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/expense`
    /// - `api_url` - The base URL of the expense tracker API, e.g. `https://example.com/api`
    /// - `timeout_secs` - Request timeout, defaults to 30 seconds
    /// - `currency` - Symbol printed in front of amounts, defaults to `₹`
    ///
    /// # Errors
    /// - Returns an error if the URL is invalid or any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        api_url: &str,
        timeout_secs: Option<u64>,
        currency: Option<String>,
    ) -> Res<Self> {
        let api_url_parsed = parse_api_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expense home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            timeout_secs: timeout_secs.unwrap_or(TIMEOUT_SECS),
            currency: currency.unwrap_or_else(|| CURRENCY.to_string()),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            api_url: api_url_parsed,
        })
    }

    /// This will
    /// - validate that `expense_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(expense_home: impl Into<PathBuf>) -> Res<Self> {
        let maybe_relative = expense_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The expense home directory is missing, run 'expense init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)?;

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            api_url,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The base URL of the API, always ending in `/` so that endpoint paths can be joined onto it.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.timeout_secs)
    }

    pub fn currency(&self) -> &str {
        &self.config_file.currency
    }

    /// Returns the stored `credentials_path` if it is absolute, otherwise resolves the relative
    /// path against the home directory.
    pub fn credentials_path(&self) -> PathBuf {
        let p = self.config_file.credentials_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expense",
///   "config_version": 1,
///   "api_url": "https://expenses.example.com/api",
///   "timeout_secs": 30,
///   "currency": "₹",
///   "credentials_path": ".secrets/credentials.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expense"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the expense tracker API
    api_url: String,

    /// Seconds to wait for any single request
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    /// Symbol printed in front of amounts
    #[serde(default = "default_currency")]
    currency: String,

    /// Path to the stored credentials (optional, relative to the home directory or absolute)
    /// Defaults to $EXPENSE_HOME/.secrets/credentials.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials_path: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    TIMEOUT_SECS
}

fn default_currency() -> String {
    CURRENCY.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            timeout_secs: TIMEOUT_SECS,
            currency: CURRENCY.to_string(),
            credentials_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or has the wrong `app_name`.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.timeout_secs > 0,
            "Invalid timeout_secs in config file: it must be greater than zero"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    #[cfg(test)]
    fn new(api_url: &str, timeout_secs: u64, credentials_path: Option<PathBuf>) -> Self {
        Self {
            api_url: api_url.to_string(),
            timeout_secs,
            credentials_path,
            ..Self::default()
        }
    }

    /// Gets the credentials path. If None, defaults to `.secrets/credentials.json`.
    fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CREDENTIALS_JSON))
    }
}

/// Parses the API base URL and makes sure it ends with a `/`. Without the trailing slash,
/// `Url::join` would replace the last path segment instead of appending to it.
fn parse_api_url(s: &str) -> Res<Url> {
    let mut url = Url::parse(s).with_context(|| format!("Invalid API URL '{s}'"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("The API URL must use http or https, got '{}'", url.scheme());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("expense_home");

        let created = Config::create(&home, "https://example.com/api", Some(5), None)
            .await
            .unwrap();
        assert!(created.secrets().is_dir());
        assert!(created.config_path().is_file());

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.api_url().as_str(), "https://example.com/api/");
        assert_eq!(loaded.timeout(), Duration::from_secs(5));
        assert_eq!(loaded.currency(), "₹");
        assert_eq!(
            loaded.credentials_path(),
            loaded.root().join(".secrets").join("credentials.json")
        );
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let result = Config::create(dir.path(), "ftp://example.com", None, None).await;
        assert!(result.is_err());
        assert!(!dir.path().join(CONFIG_JSON).exists());
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let original = ConfigFile::new(
            "http://localhost:5000",
            12,
            Some(PathBuf::from("/tmp/creds.json")),
        );
        original.save(&path).await.unwrap();
        let loaded = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, loaded);
        assert_eq!(loaded.credentials_path(), PathBuf::from("/tmp/creds.json"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "expense",
            "config_version": 1,
            "api_url": "http://localhost:5000/api"
        }"#;
        utils::write(&path, json).await.unwrap();

        let config = ConfigFile::load(&path).await.unwrap();
        assert_eq!(config.timeout_secs, TIMEOUT_SECS);
        assert_eq!(config.currency, CURRENCY);
        assert_eq!(
            config.credentials_path(),
            PathBuf::from(SECRETS).join(CREDENTIALS_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "api_url": "http://localhost:5000/api"
        }"#;
        utils::write(&path, json).await.unwrap();

        let result = ConfigFile::load(&path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let config = ConfigFile::new("http://localhost", 30, None);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("credentials_path"));
    }

    #[test]
    fn test_parse_api_url_adds_trailing_slash() {
        let url = parse_api_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join("auth/login").unwrap().as_str(),
            "http://localhost:5000/api/auth/login"
        );

        let root = parse_api_url("https://example.com").unwrap();
        assert_eq!(root.as_str(), "https://example.com/");

        assert!(parse_api_url("not a url").is_err());
    }
}
