//! The session manager: the single source of truth for who is logged in.
//!
//! Identity is derived from the `CredentialStore`, so it survives across runs. Every change is
//! broadcast to subscribers. There is no global session; the `SessionManager` is created once and
//! handed to whatever needs it.

use crate::api::{deadline, ExpenseApi};
use crate::credentials::{Credential, CredentialStore};
use crate::error::{Error, ErrorType, IntoResult, Res, Result};
use crate::model::{AuthResponse, User};
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A snapshot of the session.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Session {
    user: Option<User>,
    loading: bool,
}

impl Session {
    fn starting() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    fn resolved(user: Option<User>) -> Self {
        Self {
            user,
            loading: false,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// True until `SessionManager::initialize` has run.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// The outcome of checking whether a gated view may be shown.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Access {
    /// The stored credential has not been read yet.
    Loading,
    /// Nobody is logged in; send the user to the login flow.
    LoginRequired,
    /// The view may be shown to this user.
    Granted(User),
}

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    map: BTreeMap<u64, Listener>,
}

/// Keeps a subscription alive. Dropping it, or calling `unsubscribe`, stops the callbacks.
#[must_use = "the subscription ends as soon as this handle is dropped"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).map.remove(&self.id);
        }
    }
}

/// Owns the current session and the operations that change it.
pub struct SessionManager {
    api: Arc<dyn ExpenseApi>,
    store: CredentialStore,
    timeout: Duration,
    session: Mutex<Session>,
    initialized: AtomicBool,
    listeners: Arc<Mutex<Listeners>>,
}

impl SessionManager {
    /// Creates a manager whose session is loading until `initialize` is called.
    pub fn new(api: Arc<dyn ExpenseApi>, store: CredentialStore, timeout: Duration) -> Self {
        Self {
            api,
            store,
            timeout,
            session: Mutex::new(Session::starting()),
            initialized: AtomicBool::new(false),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Resolves the session from the stored credential. Both the token and the user must be
    /// present, otherwise the session is anonymous. Only the first call does anything; later calls
    /// return the current session.
    pub async fn initialize(&self) -> Session {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("The session has already been initialized");
            return self.session();
        }
        let user = match self.store.load().await {
            Ok(credential) => credential.map(|c| c.user().clone()),
            Err(e) => {
                warn!("Treating the session as anonymous: {e:#}");
                None
            }
        };
        debug!(
            "Session initialized as {}",
            user.as_ref().map_or("anonymous", |u| u.email.as_str())
        );
        self.publish(Session::resolved(user))
    }

    /// Logs in with the API and persists the returned credential. On failure the session is left
    /// unchanged.
    ///
    /// # Errors
    /// - `ErrorType::InvalidCredentials` if the API rejects the login or cannot be reached.
    /// - `ErrorType::Timeout` if the API does not answer in time.
    /// - `ErrorType::Storage` if the credential cannot be saved.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let response = deadline(self.timeout, self.api.login(email, password))
            .await
            .with_context(|| format!("Login failed for {email}"))
            .pub_result(ErrorType::InvalidCredentials)?;
        self.establish(response).await
    }

    /// Creates an account with the API and logs in as it.
    ///
    /// # Errors
    /// Same as `login`, with `ErrorType::SignupFailed` in place of `InvalidCredentials`.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let response = deadline(self.timeout, self.api.signup(name, email, password))
            .await
            .with_context(|| format!("Signup failed for {email}"))
            .pub_result(ErrorType::SignupFailed)?;
        self.establish(response).await
    }

    /// Forgets the stored credential and makes the session anonymous. This never fails and never
    /// calls the API; a storage problem is only logged.
    pub async fn logout(&self) {
        if let Err(e) = self.store.clear().await {
            warn!("Unable to clear stored credentials: {e:#}");
        }
        self.publish(Session::resolved(None));
        info!("Logged out");
    }

    /// Registers `callback` to be called with the new session after every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.map.insert(id, Arc::new(callback));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// A snapshot of the current session.
    pub fn session(&self) -> Session {
        lock(&self.session).clone()
    }

    /// Decides whether a gated view may be shown.
    pub fn gate(&self) -> Access {
        let session = self.session();
        match session.user {
            _ if session.loading => Access::Loading,
            Some(user) => Access::Granted(user),
            None => Access::LoginRequired,
        }
    }

    /// Returns the logged-in user, or an `ErrorType::Unauthenticated` error telling the user to
    /// log in.
    pub fn require_user(&self) -> Result<User> {
        match self.gate() {
            Access::Granted(user) => Ok(user),
            Access::Loading | Access::LoginRequired => {
                Err(Error::from_kind(ErrorType::Unauthenticated))
            }
        }
    }

    async fn establish(&self, response: AuthResponse) -> Result<User> {
        let AuthResponse { token, user } = response;
        self.persist(&Credential::new(token, user.clone()))
            .await
            .pub_result(ErrorType::Storage)?;
        self.publish(Session::resolved(Some(user.clone())));
        info!("Logged in as {}", user.email);
        Ok(user)
    }

    async fn persist(&self, credential: &Credential) -> Res<()> {
        self.store
            .save(credential)
            .await
            .context("Unable to store the credential")
    }

    /// Replaces the session and notifies subscribers. Callbacks run after every lock is released
    /// so that they can read the session or subscribe again.
    fn publish(&self, session: Session) -> Session {
        *lock(&self.session) = session.clone();
        let callbacks: Vec<Listener> = lock(&self.listeners).map.values().cloned().collect();
        for callback in callbacks {
            callback(&session);
        }
        session
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
