//! Durable storage for the bearer token and the user it belongs to.
//!
//! Both live under fixed keys in one JSON file, `$EXPENSE_HOME/.secrets/credentials.json`:
//!
//! ```json
//! {
//!   "token": "eyJhbGciOi...",
//!   "user": { "id": "65f0c1", "name": "Asha", "email": "asha@example.com" }
//! }
//! ```
//!
//! The file is replaced in a single rename, so the token and the user are always written together,
//! and it is removed to clear them together.

use crate::error::Res;
use crate::model::User;
use crate::{utils, Config};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// The key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";

/// The key the serialized user is stored under.
pub const USER_KEY: &str = "user";

/// A bearer token together with the user it was issued to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Credential {
    token: String,
    user: User,
}

impl Credential {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}

/// On-disk representation. Either key may be missing in a damaged or hand-edited file, which is
/// why both are optional here even though they are always written as a pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(rename = "token", skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

/// Reads, writes and clears the persisted `Credential`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored credential. A missing file, or a file that holds only one of the two
    /// keys, yields `None`.
    pub async fn load(&self) -> Res<Option<Credential>> {
        if !self.path.is_file() {
            trace!("No credentials at {}", self.path.display());
            return Ok(None);
        }
        let file: CredentialFile = utils::deserialize(&self.path)
            .await
            .context("Unable to read stored credentials")?;
        match (file.token, file.user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok(Some(Credential { token, user })),
            _ => {
                debug!(
                    "Ignoring incomplete credentials at {}, both '{TOKEN_KEY}' and '{USER_KEY}' \
                    are required",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    /// Returns only the stored bearer token, if a complete credential is stored.
    pub async fn token(&self) -> Res<Option<String>> {
        Ok(self.load().await?.map(|c| c.token))
    }

    /// Writes the token and user together. The data goes to a temporary file first, which then
    /// replaces the real one.
    pub async fn save(&self, credential: &Credential) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            utils::make_dir(parent).await?;
        }
        let file = CredentialFile {
            token: Some(credential.token.clone()),
            user: Some(credential.user.clone()),
        };
        let json =
            serde_json::to_string_pretty(&file).context("Failed to serialize credentials")?;

        let temp = self.temp_path();
        utils::write(&temp, json).await?;

        // Set restrictive permissions on Unix-like systems
        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&temp, Permissions::from_mode(0o600))
                .await
                .context("Failed to set file permissions")?;
        }

        utils::rename(&temp, &self.path).await?;
        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }

    /// Removes the token and user together.
    pub async fn clear(&self) -> Res<()> {
        utils::remove(&self.temp_path()).await?;
        utils::remove(&self.path).await?;
        debug!("Cleared credentials at {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join(".secrets").join("credentials.json"));
        assert_eq!(store.load().await.unwrap(), None);

        let credential = Credential::new("tok-123", user());
        store.save(&credential).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(credential));
        assert_eq!(store.token().await.unwrap().as_deref(), Some("tok-123"));
        assert!(!store.temp_path().exists());

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().await.unwrap(), None);

        // Clearing twice is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_stored_keys() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        store.save(&Credential::new("abc", user())).await.unwrap();

        let raw: serde_json::Value = utils::deserialize(store.path()).await.unwrap();
        assert_eq!(raw[TOKEN_KEY], "abc");
        assert_eq!(raw[USER_KEY]["email"], "asha@example.com");
    }

    #[tokio::test]
    async fn test_token_without_user_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        utils::write(store.path(), r#"{"token": "orphan"}"#)
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        assert_eq!(store.token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        utils::write(store.path(), "not json").await.unwrap();
        assert!(store.load().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        store.save(&Credential::new("abc", user())).await.unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
