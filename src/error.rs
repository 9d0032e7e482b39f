//! Error handling for the crate.
//!
//! Internally everything returns `Res<T>` which is an `anyhow` result with `.context(..)` attached
//! as errors travel upward. At the boundary of a public operation the error is classified with
//! `pub_result(ErrorType::..)` and becomes the public `Error`, which displays a short message that
//! is safe to show to the user.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies a failure by the operation that produced it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Login was rejected or could not be completed.
    InvalidCredentials,
    /// Signup was rejected or could not be completed.
    SignupFailed,
    /// Listing transactions failed.
    FetchFailed,
    /// Creating a transaction was rejected locally or by the server.
    CreateFailed,
    /// Deleting a transaction failed.
    DeleteFailed,
    /// At least one of the analytics requests failed.
    AnalyticsLoadFailed,
    /// A request did not complete within the configured timeout.
    Timeout,
    /// The configuration or home directory is missing or invalid.
    Config,
    /// The credential store could not be read or written.
    Storage,
    /// The operation requires a logged-in user.
    Unauthenticated,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

impl ErrorType {
    /// The short, non-detailed message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorType::InvalidCredentials => "Invalid credentials",
            ErrorType::SignupFailed => "Signup failed",
            ErrorType::FetchFailed => "Unable to load transactions",
            ErrorType::CreateFailed => "Unable to save the transaction",
            ErrorType::DeleteFailed => "Unable to delete the transaction",
            ErrorType::AnalyticsLoadFailed => "Unable to load analytics",
            ErrorType::Timeout => "The request timed out",
            ErrorType::Config => "The configuration is missing or invalid",
            ErrorType::Storage => "Unable to access stored credentials",
            ErrorType::Unauthenticated => "You are not logged in, run 'expense login' first",
        }
    }
}

/// The public error type. `Display` prints only the short message for the `ErrorType`; use
/// `detail` to get the full chain of causes for logs.
pub struct Error {
    kind: ErrorType,
    source: anyhow::Error,
}

impl Error {
    pub(crate) fn new(kind: ErrorType, source: anyhow::Error) -> Self {
        Self { kind, source }
    }

    /// Creates an error with no underlying cause other than its own message.
    pub(crate) fn from_kind(kind: ErrorType) -> Self {
        Self::new(kind, anyhow::anyhow!(kind.message()))
    }

    pub fn kind(&self) -> ErrorType {
        self.kind
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    /// The full chain of causes, one per line.
    pub fn detail(&self) -> String {
        format!("{:#}", self.source)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Marks a request that ran past its deadline. It sits in the `anyhow` chain so that
/// `pub_result` can report `ErrorType::Timeout` no matter which operation timed out.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Elapsed {
    limit: Duration,
}

impl Elapsed {
    pub(crate) fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl Display for Elapsed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Request did not complete within {:?}", self.limit)
    }
}

impl std::error::Error for Elapsed {}

/// Converts an internal result into a public one.
pub(crate) trait IntoResult<T> {
    /// Classifies the error as `kind`, unless the cause was a timeout, in which case it is
    /// classified as `ErrorType::Timeout`.
    fn pub_result(self, kind: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, kind: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let timed_out = e.downcast_ref::<Elapsed>().is_some()
                || e.chain().any(|cause| cause.is::<Elapsed>());
            let kind = if timed_out {
                ErrorType::Timeout
            } else {
                kind
            };
            Error::new(kind, e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_classifies() {
        let res: Res<()> = Err(anyhow::anyhow!("status 401"));
        let err = res.pub_result(ErrorType::InvalidCredentials).unwrap_err();
        assert_eq!(err.kind(), ErrorType::InvalidCredentials);
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(err.detail().contains("status 401"));
    }

    #[test]
    fn test_pub_result_keeps_timeout() {
        let res: Res<()> = Err(anyhow::Error::new(Elapsed::new(Duration::from_secs(3))))
            .context("Unable to list transactions");
        let err = res.pub_result(ErrorType::FetchFailed).unwrap_err();
        assert_eq!(err.kind(), ErrorType::Timeout);
        assert!(err.detail().contains("Unable to list transactions"));
    }

    #[test]
    fn test_pub_result_ok_passes_through() {
        let res: Res<u8> = Ok(7);
        assert_eq!(res.pub_result(ErrorType::FetchFailed).unwrap(), 7);
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(
            ErrorType::AnalyticsLoadFailed.to_string(),
            "analytics_load_failed"
        );
        assert_eq!(
            "delete_failed".parse::<ErrorType>().unwrap(),
            ErrorType::DeleteFailed
        );
    }
}
