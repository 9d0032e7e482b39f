use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its `.secrets` subdirectory and an initial `config.json`.
///
/// # Arguments
/// - `expense_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/expense`
/// - `api_url` - The base URL of the expense tracker API, e.g. `https://example.com/api`
/// - `timeout_secs` - Request timeout in seconds, defaults to 30
/// - `currency` - Symbol printed in front of amounts, defaults to `₹`
///
/// # Errors
/// - Returns an error if the URL is invalid or any file operations fail.
pub async fn init(
    expense_home: &Path,
    api_url: &str,
    timeout_secs: Option<u64>,
    currency: Option<String>,
) -> Result<Out<()>> {
    let config = Config::create(expense_home, api_url, timeout_secs, currency)
        .await
        .context("Unable to create the home directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Created '{}' for the API at {}",
        config.config_path().display(),
        config.api_url()
    )
    .into())
}
