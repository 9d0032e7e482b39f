//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::MemoryApi;
use crate::credentials::CredentialStore;
use crate::{Config, SessionManager, TransactionView};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Test environment that sets up an expense home directory with a Config and an in-memory API
/// seeded with the demo account and sample transactions.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
    api: MemoryApi,
}

impl TestEnv {
    /// Creates a test environment with a Config and the seeded in-memory API.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("expense");
        let config = Config::create(&root, "http://localhost:5000/api", None, None)
            .await
            .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
            api: MemoryApi::default(),
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Returns a handle to the in-memory API. Clones share state, so failures and delays set on it
    /// affect every manager and view created by this environment.
    pub fn api(&self) -> MemoryApi {
        self.api.clone()
    }

    /// The credential store inside the temporary home.
    pub fn store(&self) -> CredentialStore {
        CredentialStore::from_config(&self.config)
    }

    /// A new, uninitialized session manager using the configured timeout.
    pub fn session_manager(&self) -> SessionManager {
        SessionManager::new(Arc::new(self.api()), self.store(), self.config.timeout())
    }

    /// A new transaction view using the configured timeout.
    pub fn transaction_view(&self) -> TransactionView {
        self.transaction_view_with_timeout(self.config.timeout())
    }

    pub fn transaction_view_with_timeout(&self, timeout: Duration) -> TransactionView {
        TransactionView::new(Arc::new(self.api()), timeout)
    }
}
