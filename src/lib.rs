//! A client for an expense tracker API.
//!
//! - `SessionManager` owns who is logged in, persists the credential and notifies subscribers.
//! - `TransactionView` owns the filter, the fetched transactions and the analytics, and makes sure
//!   that the most recently issued fetch is the one that is shown.
//! - `ExpenseApi` is the request layer; `api` creates the HTTP implementation or, in test mode,
//!   an in-memory one.

mod api;
pub mod args;
pub mod commands;
mod config;
mod credentials;
mod error;
pub mod model;
mod session;
mod transactions;
mod utils;

#[cfg(test)]
mod test;

pub use api::{api, ExpenseApi, Mode, TEST_MODE_ENV};
pub use config::Config;
pub use credentials::{Credential, CredentialStore};
pub use error::{Error, ErrorType, Result};
pub use session::{Access, Session, SessionManager, Subscription};
pub use transactions::{Fetch, FetchStatus, TransactionView};
