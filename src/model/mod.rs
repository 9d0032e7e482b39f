//! Types that represent the data exchanged with the expense tracker API, such as `Transaction`,
//! `TransactionFilter` and `Analytics`.
mod amount;
mod analytics;
mod category;
mod filter;
mod transaction;
mod user;

pub use amount::{Amount, AmountError};
pub use analytics::{
    Analytics, AnalyticsSummary, CategoryBreakdown, CategoryTotal, MonthlyTotal, MonthlyTrend,
};
pub use category::{Category, TransactionType};
pub use filter::{FilterUpdate, TransactionFilter};
pub use transaction::{NewTransaction, Transaction, TransactionForm};
pub(crate) use user::{LoginRequest, SignupRequest};
pub use user::{AuthResponse, User};
