//! Cookie-backed sessions.
//!
//! The client only ever holds a signed random token. Values live in a
//! [`SessionStore`]; a [`Session`] handle is the per-request view of one
//! record, and [`SessionManager`] loads it from the request cookie and writes
//! it back (plus `Set-Cookie`) once the response is ready.

mod store;

pub use store::{MemorySessionStore, SessionRecord, SessionStore};

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::infrastructure::security::signing::{CookieSigner, SigningError, generate_token};

pub const DEFAULT_COOKIE_NAME: &str = "session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store failure: {message}")]
    Store { message: String },

    #[error("session value '{key}' could not be converted: {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// Cookie and lifetime settings shared by every session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Absolute lifetime counted from the session's creation
    pub lifetime: chrono::Duration,
    /// Send the cookie over HTTPS only
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            lifetime: chrono::Duration::hours(12),
            secure: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Unchanged,
    Modified,
}

#[derive(Debug)]
struct SessionState {
    token: Option<String>,
    previous_token: Option<String>,
    record: SessionRecord,
    status: Status,
}

/// What [`SessionManager::commit`] has to persist
#[derive(Debug)]
struct PendingCommit {
    token: String,
    previous_token: Option<String>,
    record: SessionRecord,
}

/// Per-request handle to one session. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    fn from_state(token: Option<String>, record: SessionRecord) -> Self {
        let state = SessionState { token, previous_token: None, record, status: Status::Unchanged };
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    /// A session that is not stored anywhere until something is written to it
    pub fn fresh(lifetime: chrono::Duration) -> Self {
        Self::from_state(None, SessionRecord::new(lifetime))
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decode the value stored under `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        let state = self.lock();
        state
            .record
            .values
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(|source| SessionError::Value { key: key.to_string(), source })
    }

    /// The value under `key` if it is a string
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.lock().record.values.get(key).and_then(serde_json::Value::as_str).map(str::to_owned)
    }

    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)
            .map_err(|source| SessionError::Value { key: key.to_string(), source })?;

        let mut state = self.lock();
        state.record.values.insert(key.to_string(), value);
        state.status = Status::Modified;
        Ok(())
    }

    /// Remove `key`, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        let mut state = self.lock();
        let removed = state.record.values.remove(key).is_some();
        if removed {
            state.status = Status::Modified;
        }
        removed
    }

    pub fn exists(&self, key: &str) -> bool {
        self.lock().record.values.contains_key(key)
    }

    /// Read and remove a one-shot string value such as a flash message
    pub fn pop_string(&self, key: &str) -> Option<String> {
        let mut state = self.lock();
        let value = state.record.values.remove(key)?;
        state.status = Status::Modified;
        value.as_str().map(str::to_owned)
    }

    /// Move the data to a new token on commit and discard the old one.
    /// Called on privilege changes such as login.
    pub fn renew_token(&self) {
        let mut state = self.lock();
        if let Some(old) = state.token.take() {
            state.previous_token.get_or_insert(old);
        }
        state.status = Status::Modified;
    }

    pub fn is_modified(&self) -> bool {
        self.lock().status == Status::Modified
    }

    fn take_pending(&self) -> Option<PendingCommit> {
        let mut state = self.lock();
        if state.status == Status::Unchanged {
            return None;
        }
        state.status = Status::Unchanged;

        let token = state.token.get_or_insert_with(generate_token).clone();
        Some(PendingCommit {
            token,
            previous_token: state.previous_token.take(),
            record: state.record.clone(),
        })
    }
}

/// Loads sessions from request cookies and persists them after the response
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    signer: CookieSigner,
    config: Arc<SessionConfig>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        secret: &[u8],
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        Ok(Self { store, signer: CookieSigner::new(secret)?, config: Arc::new(config) })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve the session named by the request cookie. Missing, forged or
    /// expired cookies all produce a fresh session.
    pub async fn load(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let jar = CookieJar::from_headers(headers);
        let Some(cookie) = jar.get(&self.config.cookie_name) else {
            return Ok(Session::fresh(self.config.lifetime));
        };

        let Some(token) = self.signer.verify(cookie.value()) else {
            warn!("Ignoring session cookie with an invalid signature");
            return Ok(Session::fresh(self.config.lifetime));
        };

        match self.store.load(&token).await? {
            Some(record) if !record.is_expired_at(Utc::now()) => {
                Ok(Session::from_state(Some(token), record))
            }
            _ => {
                debug!("Session cookie refers to an unknown or expired session");
                Ok(Session::fresh(self.config.lifetime))
            }
        }
    }

    /// Persist a modified session and return the cookie the client must store.
    /// Unmodified sessions produce no cookie.
    pub async fn commit(&self, session: &Session) -> Result<Option<Cookie<'static>>, SessionError> {
        let Some(pending) = session.take_pending() else {
            return Ok(None);
        };

        if let Some(previous) = &pending.previous_token {
            self.store.delete(previous).await?;
        }
        self.store.save(&pending.token, &pending.record).await?;

        let remaining = (pending.record.expires_at - Utc::now()).num_seconds().max(0);
        let cookie = Cookie::build((self.config.cookie_name.clone(), self.signer.sign(&pending.token)))
            .path("/")
            .http_only(true)
            .secure(self.config.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(remaining))
            .build();

        Ok(Some(cookie))
    }

    /// Periodically drop expired records from the store
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                match store.sweep_expired().await {
                    Ok(0) => {}
                    Ok(removed) => info!(removed, "Swept expired sessions"),
                    Err(e) => warn!(error = %e, "Session sweep failed"),
                }
            }
        })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").field("config", &self.config).finish_non_exhaustive()
    }
}
