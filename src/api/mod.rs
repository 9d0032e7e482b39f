//! The request layer between the session and transaction components and the expense tracker API.
//!
//! `ExpenseApi` is the seam: `HttpApi` talks to the real server and attaches the stored bearer
//! token to each request, `MemoryApi` keeps everything in memory so the whole program can run, and
//! be tested, without a server.

mod http;
mod memory;

use crate::credentials::CredentialStore;
use crate::error::{Elapsed, Res};
use crate::model::{
    AnalyticsSummary, AuthResponse, CategoryBreakdown, MonthlyTrend, NewTransaction, Transaction,
    TransactionFilter,
};
use crate::Config;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub(crate) use memory::MemoryApi;
#[cfg(test)]
pub(crate) use memory::{Endpoint, DEMO_EMAIL, DEMO_PASSWORD};

/// The environment variable that switches the program to the in-memory API.
pub const TEST_MODE_ENV: &str = "EXPENSE_CLIENT_IN_TEST_MODE";

pub(crate) const LOGIN: &str = "auth/login";
pub(crate) const SIGNUP: &str = "auth/signup";
pub(crate) const TRANSACTIONS: &str = "transactions";
pub(crate) const SUMMARY: &str = "transactions/analytics/summary";
pub(crate) const BY_CATEGORY: &str = "transactions/analytics/by-category";
pub(crate) const MONTHLY_TREND: &str = "transactions/analytics/monthly-trend";

/// The operations the expense tracker API offers. Any failure, including a non-2xx status, is an
/// error; classifying it is left to the caller.
#[async_trait::async_trait]
pub trait ExpenseApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, email: &str, password: &str) -> anyhow::Result<AuthResponse>;

    /// `POST /auth/signup`
    async fn signup(&self, name: &str, email: &str, password: &str)
        -> anyhow::Result<AuthResponse>;

    /// `GET /transactions?type&category&startDate&endDate&search`
    async fn list_transactions(&self, filter: &TransactionFilter)
        -> anyhow::Result<Vec<Transaction>>;

    /// `POST /transactions`
    async fn create_transaction(&self, input: &NewTransaction) -> anyhow::Result<Transaction>;

    /// `DELETE /transactions/{id}`
    async fn delete_transaction(&self, id: &str) -> anyhow::Result<()>;

    /// `GET /transactions/analytics/summary`
    async fn summary(&self) -> anyhow::Result<AnalyticsSummary>;

    /// `GET /transactions/analytics/by-category`
    async fn by_category(&self) -> anyhow::Result<CategoryBreakdown>;

    /// `GET /transactions/analytics/monthly-trend`
    async fn monthly_trend(&self) -> anyhow::Result<MonthlyTrend>;
}

/// Selects which `ExpenseApi` implementation the program uses.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Talk to the server at the configured URL.
    #[default]
    Http,
    /// Use an in-memory API seeded with sample data.
    Test,
}

impl Mode {
    /// Returns `Mode::Test` when `EXPENSE_CLIENT_IN_TEST_MODE` is set and non-empty, otherwise
    /// `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// Creates the `ExpenseApi` for `mode`. The HTTP implementation reads the bearer token from
/// `credentials` on every request.
pub fn api(config: &Config, credentials: CredentialStore, mode: Mode) -> Res<Arc<dyn ExpenseApi>> {
    Ok(match mode {
        Mode::Http => Arc::new(http::HttpApi::new(config, credentials)?),
        Mode::Test => Arc::new(MemoryApi::default()),
    })
}

/// Awaits `fut`, failing with `Elapsed` if it takes longer than `limit`.
pub(crate) async fn deadline<T, F>(limit: Duration, fut: F) -> Res<T>
where
    F: Future<Output = Res<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::Error::new(Elapsed::new(limit))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let value = deadline(Duration::from_secs(1), async { Ok(5) })
            .await
            .unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let result: Res<()> = deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<Elapsed>().is_some());
    }
}
