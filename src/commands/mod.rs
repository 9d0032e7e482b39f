//! Command handlers for the expense CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod auth;
mod dashboard;
mod init;
mod transactions;

use crate::api::Mode;
use crate::credentials::CredentialStore;
use crate::error::{ErrorType, IntoResult};
use crate::model::Amount;
use crate::{Config, Result, SessionManager, TransactionView};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

pub use auth::{login, logout, signup, whoami};
pub use dashboard::dashboard;
pub use init::init;
pub use transactions::{add, delete, list};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Everything a command needs once the home directory is known: the loaded config, an initialized
/// session and a transaction view sharing the same API.
struct Client {
    config: Config,
    session: SessionManager,
    view: TransactionView,
}

impl Client {
    async fn connect(expense_home: &Path, mode: Mode) -> Result<Self> {
        let config = Config::load(expense_home)
            .await
            .pub_result(ErrorType::Config)?;
        let store = CredentialStore::from_config(&config);
        let api = crate::api::api(&config, store.clone(), mode)
            .context("Unable to set up the API client")
            .pub_result(ErrorType::Config)?;
        debug!("Using {mode:?} API at {}", config.api_url());

        let session = SessionManager::new(api.clone(), store, config.timeout());
        session.initialize().await;
        let view = TransactionView::new(api, config.timeout());
        Ok(Self {
            config,
            session,
            view,
        })
    }

    /// Formats an amount with the configured currency symbol, e.g. `₹1,250.00` or `-₹40.00`.
    fn money(&self, amount: &Amount) -> String {
        money(self.config.currency(), amount)
    }
}

fn money(currency: &str, amount: &Amount) -> String {
    let formatted = amount.to_string();
    match formatted.strip_prefix('-') {
        Some(abs) => format!("-{currency}{abs}"),
        None => format!("{currency}{formatted}"),
    }
}
