//! These structs provide the CLI interface for the expense CLI.

use crate::model::{Category, TransactionFilter, TransactionForm, TransactionType};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// expense: A command-line client for an expense tracker.
///
/// Log in to your expense tracker account, list and filter your transactions, add and delete
/// them, and see a dashboard of your income, spending and savings.
///
/// Start with `expense init --api-url <URL>` to point the program at your server, then
/// `expense login`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. By default the data directory is
    /// $HOME/expense; pass --expense-home if you want it somewhere else.
    Init(InitArgs),
    /// Log in and remember the session.
    Login(LoginArgs),
    /// Create an account and log in as it.
    Signup(SignupArgs),
    /// Forget the stored session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// List transactions, newest first.
    List(ListArgs),
    /// Add a transaction.
    Add(AddArgs),
    /// Delete a transaction by its ID.
    Delete(DeleteArgs),
    /// Show income, spending and savings with text charts.
    Dashboard,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and credentials are held. Defaults to ~/expense
    #[arg(long, env = "EXPENSE_HOME", default_value_t = default_expense_home())]
    expense_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, expense_home: PathBuf) -> Self {
        Self {
            log_level,
            expense_home: expense_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn expense_home(&self) -> &DisplayPath {
        &self.expense_home
    }
}

/// (Not shown): Args for the `expense init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the expense tracker API, e.g. https://expenses.example.com/api
    #[arg(long)]
    api_url: String,

    /// Seconds to wait for any single request. Defaults to 30.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// The symbol printed in front of amounts. Defaults to ₹.
    #[arg(long)]
    currency: Option<String>,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            timeout_secs: None,
            currency: None,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }
}

/// (Not shown): Args for the `expense login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    email: String,

    /// Can also be given with the EXPENSE_PASSWORD environment variable.
    #[arg(long, env = "EXPENSE_PASSWORD", hide_env_values = true)]
    password: String,
}

impl LoginArgs {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// (Not shown): Args for the `expense signup` command.
#[derive(Debug, Parser, Clone)]
pub struct SignupArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    /// Can also be given with the EXPENSE_PASSWORD environment variable.
    #[arg(long, env = "EXPENSE_PASSWORD", hide_env_values = true)]
    password: String,
}

impl SignupArgs {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// (Not shown): Args for the `expense list` command. Every option narrows the list; leave them
/// all out to see everything.
#[derive(Debug, Parser, Clone, Default)]
pub struct ListArgs {
    /// income or expense
    #[arg(long = "type")]
    kind: Option<TransactionType>,

    /// One of Food, Travel, Rent, Shopping, Entertainment, Misc, Income
    #[arg(long)]
    category: Option<Category>,

    /// Only transactions on or after this date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Only transactions on or before this date (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Only transactions whose description contains this text, ignoring case
    #[arg(long)]
    search: Option<String>,
}

impl ListArgs {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            kind: self.kind,
            category: self.category,
            start_date: self.start_date,
            end_date: self.end_date,
            search: self.search.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// (Not shown): Args for the `expense add` command. Values are checked before anything is sent
/// to the server.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// income or expense
    #[arg(long = "type")]
    kind: String,

    /// A number greater than zero, e.g. 1250 or 1,250.50
    #[arg(long)]
    amount: String,

    /// One of Food, Travel, Rent, Shopping, Entertainment, Misc, Income
    #[arg(long)]
    category: String,

    /// The date of the transaction (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    description: Option<String>,
}

impl AddArgs {
    pub fn form(&self) -> TransactionForm {
        TransactionForm {
            kind: self.kind.clone(),
            amount: self.amount.clone(),
            category: self.category.clone(),
            date: self.date.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
        }
    }
}

/// (Not shown): Args for the `expense delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The ID of the transaction, as shown by `expense list`
    id: String,
}

impl DeleteArgs {
    pub fn id(&self) -> &str {
        &self.id
    }
}

fn default_expense_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expense"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --expense-home or EXPENSE_HOME instead of relying on the default \
                expense home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("expense")
        }
    })
}

/// A path that implements `Display` so that it can be used as a clap default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
