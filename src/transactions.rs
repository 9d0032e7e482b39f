//! The transaction view controller: the current filter, the list fetched with it, the analytics,
//! and the create and delete flows.
//!
//! Every fetch is tagged with a sequence number when it is issued. A response, successful or not,
//! is only applied if its sequence number is still the latest one, so when fetches overlap the most
//! recently issued one always wins.

use crate::api::{deadline, ExpenseApi};
use crate::error::{ErrorType, IntoResult, Result};
use crate::model::{
    Analytics, FilterUpdate, NewTransaction, Transaction, TransactionFilter, TransactionForm,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the transaction list is in its fetch cycle.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Nothing has been fetched yet.
    #[default]
    Idle,
    Loading,
    Loaded,
    /// The latest fetch failed. The list still holds whatever the last successful fetch returned.
    Failed,
}

serde_plain::derive_display_from_serialize!(FetchStatus);

/// What happened to the response of a fetch.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Fetch {
    /// The response was the latest and has been stored.
    Applied,
    /// A newer fetch was issued while this one was in flight, so its response was thrown away.
    Superseded,
}

#[derive(Debug, Default)]
struct ViewState {
    filter: TransactionFilter,
    transactions: Vec<Transaction>,
    status: FetchStatus,
    analytics: Analytics,
    latest: u64,
}

/// Holds the state behind the transaction list and the dashboard. Operations take `&self` so that
/// several of them can be in flight at once; the state is locked only between awaits.
pub struct TransactionView {
    api: Arc<dyn ExpenseApi>,
    timeout: Duration,
    state: Mutex<ViewState>,
}

impl TransactionView {
    pub fn new(api: Arc<dyn ExpenseApi>, timeout: Duration) -> Self {
        Self {
            api,
            timeout,
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Merges `update` into the current filter and fetches with the result.
    pub async fn set_filter(&self, update: FilterUpdate) -> Result<Fetch> {
        let (seq, filter) = self.begin(|filter| filter.apply(update));
        self.fetch(seq, filter).await
    }

    /// Fetches again with the current filter.
    pub async fn refresh(&self) -> Result<Fetch> {
        let (seq, filter) = self.begin(|_| {});
        self.fetch(seq, filter).await
    }

    /// Makes `filter` the current filter and fetches with it.
    ///
    /// # Errors
    /// - `ErrorType::FetchFailed` if this fetch is the latest and the request failed. The previous
    ///   list is kept and the filter is not rolled back.
    /// - `ErrorType::Timeout` if this fetch is the latest and the request timed out.
    pub async fn fetch_transactions(&self, filter: TransactionFilter) -> Result<Fetch> {
        let (seq, filter) = self.begin(|current| *current = filter);
        self.fetch(seq, filter).await
    }

    /// Sends `input` to the API and refreshes the list. Input with an amount that is not greater
    /// than zero is rejected without calling the API.
    ///
    /// A failed refresh afterwards is logged and leaves the status `Failed`, but the transaction
    /// was created, so the result is still `Ok`.
    pub async fn create_transaction(&self, input: NewTransaction) -> Result<Transaction> {
        input.validate().pub_result(ErrorType::CreateFailed)?;
        let created = deadline(self.timeout, self.api.create_transaction(&input))
            .await
            .context("Unable to create the transaction")
            .pub_result(ErrorType::CreateFailed)?;
        info!("Created transaction {}", created.id);
        self.refresh_after("create").await;
        Ok(created)
    }

    /// Parses raw input and creates a transaction from it. Nothing is sent if any field is
    /// invalid, for example an unknown category.
    pub async fn submit(&self, form: &TransactionForm) -> Result<Transaction> {
        let input = form.parse().pub_result(ErrorType::CreateFailed)?;
        self.create_transaction(input).await
    }

    /// Deletes the transaction with `id` and refreshes the list. The list is not touched until the
    /// API confirms the delete.
    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        deadline(self.timeout, self.api.delete_transaction(id))
            .await
            .with_context(|| format!("Unable to delete transaction {id}"))
            .pub_result(ErrorType::DeleteFailed)?;
        info!("Deleted transaction {id}");
        self.refresh_after("delete").await;
        Ok(())
    }

    /// Loads the summary, the category breakdown and the monthly trend together. If any of the
    /// three fails, the previously loaded analytics are kept as they were.
    pub async fn load_analytics(&self) -> Result<Analytics> {
        let (summary, by_category, monthly_trend) = tokio::try_join!(
            deadline(self.timeout, self.api.summary()),
            deadline(self.timeout, self.api.by_category()),
            deadline(self.timeout, self.api.monthly_trend()),
        )
        .context("Unable to load analytics")
        .pub_result(ErrorType::AnalyticsLoadFailed)?;

        let analytics = Analytics {
            summary,
            by_category,
            monthly_trend,
        };
        self.lock().analytics = analytics.clone();
        debug!("Analytics loaded");
        Ok(analytics)
    }

    pub fn filter(&self) -> TransactionFilter {
        self.lock().filter.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.lock().status
    }

    pub fn analytics(&self) -> Analytics {
        self.lock().analytics.clone()
    }

    /// Changes the filter and issues a new sequence number in one step.
    fn begin(&self, change: impl FnOnce(&mut TransactionFilter)) -> (u64, TransactionFilter) {
        let mut state = self.lock();
        change(&mut state.filter);
        state.latest += 1;
        state.status = FetchStatus::Loading;
        debug!("Fetch {} issued with '{}'", state.latest, state.filter.query_string());
        (state.latest, state.filter.clone())
    }

    async fn fetch(&self, seq: u64, filter: TransactionFilter) -> Result<Fetch> {
        let result = deadline(self.timeout, self.api.list_transactions(&filter))
            .await
            .context("Unable to list transactions");

        let mut state = self.lock();
        if state.latest != seq {
            debug!(
                "Discarding the response to fetch {seq}, fetch {} is newer",
                state.latest
            );
            return Ok(Fetch::Superseded);
        }
        match result {
            Ok(transactions) => {
                debug!("Fetch {seq} returned {} transactions", transactions.len());
                state.transactions = transactions;
                state.status = FetchStatus::Loaded;
                Ok(Fetch::Applied)
            }
            Err(e) => {
                state.status = FetchStatus::Failed;
                Err::<Fetch, _>(e).pub_result(ErrorType::FetchFailed)
            }
        }
    }

    async fn refresh_after(&self, operation: &str) {
        if let Err(e) = self.refresh().await {
            warn!(
                "The {operation} succeeded but the list could not be refreshed: {}",
                e.detail()
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
