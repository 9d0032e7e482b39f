//! Implements the `ExpenseApi` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without an expense tracker server. It behaves like the server: it filters,
//! sorts and aggregates, and it can be told to fail or stall on specific endpoints.

use crate::api::ExpenseApi;
use crate::error::Res;
use crate::model::{
    AnalyticsSummary, AuthResponse, CategoryBreakdown, CategoryTotal, MonthlyTotal, MonthlyTrend,
    NewTransaction, Transaction, TransactionFilter, TransactionType, User,
};
use crate::model::{Amount, Category};
use anyhow::{bail, Context};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// Identifies one of the API's endpoints, for injecting failures and counting calls.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Endpoint {
    Login,
    Signup,
    ListTransactions,
    CreateTransaction,
    DeleteTransaction,
    Summary,
    ByCategory,
    MonthlyTrend,
}

serde_plain::derive_display_from_serialize!(Endpoint);

/// The email of the account the in-memory API is seeded with.
pub(crate) const DEMO_EMAIL: &str = "demo@example.com";

/// The password of the seeded account.
pub(crate) const DEMO_PASSWORD: &str = "demo1234";

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<String, Account>,
    transactions: Vec<Transaction>,
    failing: HashSet<Endpoint>,
    delays: HashMap<Endpoint, VecDeque<Duration>>,
    calls: Vec<Endpoint>,
}

/// An in-memory implementation of `ExpenseApi`. Clones share the same data.
#[derive(Debug, Clone)]
pub(crate) struct MemoryApi {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryApi {
    /// Seeds the demo account and sample transactions from this module.
    fn default() -> Self {
        let api = Self::empty();
        api.add_account("Demo User", DEMO_EMAIL, DEMO_PASSWORD);
        // The seed data is a constant in this file; a parse failure is a bug in the constant.
        let seed = load_csv(TRANSACTION_DATA).unwrap_or_default();
        api.lock().transactions = seed;
        api
    }
}

impl MemoryApi {
    /// Creates an API with no accounts and no transactions.
    pub(crate) fn empty() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an account and returns its user record.
    pub(crate) fn add_account(&self, name: &str, email: &str, password: &str) -> User {
        let user = User {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            email: email.to_string(),
        };
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// A copy of every stored transaction, unfiltered.
    #[cfg(test)]
    pub(crate) fn transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    /// Makes every call to `endpoint` fail until `recover` is called.
    #[cfg(test)]
    pub(crate) fn fail(&self, endpoint: Endpoint) {
        self.lock().failing.insert(endpoint);
    }

    #[cfg(test)]
    pub(crate) fn recover(&self, endpoint: Endpoint) {
        self.lock().failing.remove(&endpoint);
    }

    /// Makes the next call to `endpoint` wait for `delay` before answering. Delays queue up, one
    /// per call.
    #[cfg(test)]
    pub(crate) fn delay_next(&self, endpoint: Endpoint, delay: Duration) {
        self.lock()
            .delays
            .entry(endpoint)
            .or_default()
            .push_back(delay);
    }

    /// Every call received so far, in order.
    #[cfg(test)]
    pub(crate) fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    #[cfg(test)]
    pub(crate) fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.iter().filter(|&&e| e == endpoint).count()
    }

    /// Records the call, waits out any queued delay, then fails if the endpoint is set to fail.
    /// The lock is never held across the sleep.
    async fn enter(&self, endpoint: Endpoint) -> Res<()> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(endpoint);
            state
                .delays
                .get_mut(&endpoint)
                .and_then(|queue| queue.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.lock().failing.contains(&endpoint) {
            bail!("Request to {endpoint} failed with status 500 Internal Server Error");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExpenseApi for MemoryApi {
    async fn login(&self, email: &str, password: &str) -> Res<AuthResponse> {
        self.enter(Endpoint::Login).await?;
        let state = self.lock();
        match state.accounts.get(email) {
            Some(account) if account.password == password => Ok(AuthResponse {
                token: new_token(),
                user: account.user.clone(),
            }),
            _ => bail!("Request to {} failed with status 401 Unauthorized", Endpoint::Login),
        }
    }

    async fn signup(&self, name: &str, email: &str, password: &str) -> Res<AuthResponse> {
        self.enter(Endpoint::Signup).await?;
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            bail!("Request to {} failed with status 400 Bad Request", Endpoint::Signup);
        }
        if self.lock().accounts.contains_key(email) {
            bail!("Request to {} failed with status 409 Conflict", Endpoint::Signup);
        }
        let user = self.add_account(name, email, password);
        Ok(AuthResponse {
            token: new_token(),
            user,
        })
    }

    async fn list_transactions(&self, filter: &TransactionFilter) -> Res<Vec<Transaction>> {
        self.enter(Endpoint::ListTransactions).await?;
        let mut found: Vec<Transaction> = self
            .lock()
            .transactions
            .iter()
            .filter(|tx| matches(filter, tx))
            .cloned()
            .collect();
        // Newest first, like the server.
        found.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(found)
    }

    async fn create_transaction(&self, input: &NewTransaction) -> Res<Transaction> {
        self.enter(Endpoint::CreateTransaction).await?;
        if !input.amount.is_positive() {
            bail!(
                "Request to {} failed with status 400 Bad Request",
                Endpoint::CreateTransaction
            );
        }
        let created = input.clone().into_transaction(Uuid::new_v4().simple().to_string());
        self.lock().transactions.push(created.clone());
        Ok(created)
    }

    async fn delete_transaction(&self, id: &str) -> Res<()> {
        self.enter(Endpoint::DeleteTransaction).await?;
        let mut state = self.lock();
        let before = state.transactions.len();
        state.transactions.retain(|tx| tx.id != id);
        if state.transactions.len() == before {
            bail!(
                "Request to {} failed with status 404 Not Found",
                Endpoint::DeleteTransaction
            );
        }
        Ok(())
    }

    async fn summary(&self) -> Res<AnalyticsSummary> {
        self.enter(Endpoint::Summary).await?;
        let state = self.lock();
        let total_income = total(&state.transactions, TransactionType::Income);
        let total_expense = total(&state.transactions, TransactionType::Expense);
        Ok(AnalyticsSummary {
            total_income,
            total_expense,
            savings: total_income - total_expense,
        })
    }

    async fn by_category(&self) -> Res<CategoryBreakdown> {
        self.enter(Endpoint::ByCategory).await?;
        let mut totals: BTreeMap<Category, Amount> = BTreeMap::new();
        for tx in self
            .lock()
            .transactions
            .iter()
            .filter(|tx| tx.kind == TransactionType::Expense)
        {
            let entry = totals.entry(tx.category).or_default();
            *entry = *entry + tx.amount;
        }
        let mut breakdown: CategoryBreakdown = totals
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total,
            })
            .collect();
        // Largest spend first.
        breakdown.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(breakdown)
    }

    async fn monthly_trend(&self) -> Res<MonthlyTrend> {
        self.enter(Endpoint::MonthlyTrend).await?;
        let mut months: BTreeMap<u32, (Amount, Amount)> = BTreeMap::new();
        for tx in self.lock().transactions.iter() {
            let (income, expense) = months.entry(tx.date.month()).or_default();
            match tx.kind {
                TransactionType::Income => *income = *income + tx.amount,
                TransactionType::Expense => *expense = *expense + tx.amount,
            }
        }
        Ok(months
            .into_iter()
            .map(|(month, (income, expense))| MonthlyTotal {
                month,
                income,
                expense,
            })
            .collect())
    }
}

/// Applies the filter the way the server does: exact type and category, inclusive date range, and
/// a case-insensitive search of the description.
fn matches(filter: &TransactionFilter, tx: &Transaction) -> bool {
    if filter.kind.is_some_and(|kind| kind != tx.kind) {
        return false;
    }
    if filter.category.is_some_and(|category| category != tx.category) {
        return false;
    }
    if filter.start_date.is_some_and(|start| tx.date < start) {
        return false;
    }
    if filter.end_date.is_some_and(|end| tx.date > end) {
        return false;
    }
    match filter.search.as_deref().filter(|s| !s.is_empty()) {
        Some(search) => tx
            .description
            .to_lowercase()
            .contains(&search.to_lowercase()),
        None => true,
    }
}

fn total(transactions: &[Transaction], kind: TransactionType) -> Amount {
    transactions
        .iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

fn new_token() -> String {
    format!("memory-{}", Uuid::new_v4().simple())
}

/// Loads transactions from a CSV-formatted string with the columns
/// `id,type,category,amount,date,description`.
fn load_csv(csv_data: &str) -> Res<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut transactions = Vec::new();
    for (ix, result) in rdr.deserialize::<Transaction>().enumerate() {
        let tx = result.with_context(|| format!("Invalid seed transaction at row {}", ix + 2))?;
        transactions.push(tx);
    }
    Ok(transactions)
}

/// Seed transaction data.
const TRANSACTION_DATA: &str = r##"id,type,category,amount,date,description
seed-01,income,Income,52000,2025-01-01,January salary
seed-02,expense,Rent,15000,2025-01-03,Apartment rent
seed-03,expense,Food,842.50,2025-01-06,Groceries at the market
seed-04,expense,Travel,320,2025-01-09,Metro card top-up
seed-05,expense,Entertainment,499,2025-01-14,Streaming subscription
seed-06,expense,Shopping,2450,2025-01-20,Winter jacket
seed-07,expense,Food,615.75,2025-01-27,Dinner with friends
seed-08,income,Income,52000,2025-02-01,February salary
seed-09,expense,Rent,15000,2025-02-03,Apartment rent
seed-10,expense,Food,910.20,2025-02-08,Groceries at the market
seed-11,expense,Travel,4800,2025-02-15,Train tickets home
seed-12,expense,Misc,250,2025-02-18,Phone recharge
seed-13,income,Income,3500,2025-02-22,Freelance design work
seed-14,expense,Entertainment,1200,2025-02-26,Concert tickets
"##;
