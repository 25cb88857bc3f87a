//! Token Store: the single owner of session credentials.
//!
//! The session is held in an [`ArcSwap`] so reads are lock-free snapshots and
//! never observe a half-applied update. Writes are serialised by a mutex,
//! published in memory, then persisted through a [`SessionStorage`] backend.
//! Each write bumps a revision counter carried by the snapshot.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pettravel_client::session::{FileStorage, TokenStore};
//!
//! let storage = Arc::new(FileStorage::new("/home/me/.pettravel/default")?);
//! let store = TokenStore::load(storage);
//! if store.is_authenticated() {
//!     println!("resuming session for {:?}", store.user());
//! }
//! ```

pub mod jwt;
mod storage;

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tokio::sync::broadcast;

use crate::models::{AuthTokens, User};

pub use jwt::is_access_token_expired;
pub use storage::{
    ACCESS_TOKEN_KEY, FileStorage, MemoryStorage, REFRESH_TOKEN_KEY, SessionStorage, StorageError,
    USER_KEY,
};

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// Credentials and profile of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    /// True exactly when an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Both tokens, when both are held.
    pub fn tokens(&self) -> Option<AuthTokens> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(AuthTokens {
                access: access.clone(),
                refresh: refresh.clone(),
            }),
            _ => None,
        }
    }
}

/// An immutable view of the session at one revision.
#[derive(Debug, Default)]
pub struct SessionSnapshot {
    session: Session,
    revision: u64,
}

impl SessionSnapshot {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Monotonic write counter; changes on every store write.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.session.refresh_token.as_deref()
    }
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_id: u64 },
    TokenRefreshed,
    LoggedOut,
    /// The refresh token was rejected or missing; the user must log in again.
    Expired,
}

/// Owner of the session credentials.
pub struct TokenStore {
    current: ArcSwap<SessionSnapshot>,
    storage: Arc<dyn SessionStorage>,
    write_lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("TokenStore")
            .field("authenticated", &snapshot.session.is_authenticated())
            .field("revision", &snapshot.revision)
            .finish()
    }
}

impl TokenStore {
    /// Rehydrates the session from `storage`.
    ///
    /// Unreadable keys are treated as absent. A stored user that no longer
    /// parses is dropped and its key removed; the tokens are kept.
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        let read = |key: &str| match storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read stored session value");
                None
            }
        };

        let access_token = read(ACCESS_TOKEN_KEY);
        let refresh_token = read(REFRESH_TOKEN_KEY);
        let user = read(USER_KEY).and_then(|raw| match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unparsable stored user");
                if let Err(e) = storage.remove(USER_KEY) {
                    tracing::warn!(error = %e, "Failed to remove stored user");
                }
                None
            }
        });

        tracing::debug!(
            authenticated = access_token.is_some(),
            "Rehydrated session from storage"
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            current: ArcSwap::from_pointee(SessionSnapshot {
                session: Session {
                    user,
                    access_token,
                    refresh_token,
                },
                revision: 0,
            }),
            storage,
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// A store backed by [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStorage::new()))
    }

    /// Current snapshot. Never blocks.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.current.load_full()
    }

    pub fn session(&self) -> Session {
        self.current.load().session.clone()
    }

    /// Both tokens, when a full session is held.
    pub fn tokens(&self) -> Option<AuthTokens> {
        self.current.load().session.tokens()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current.load().session.access_token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.current.load().session.user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.load().session.is_authenticated()
    }

    /// See [`jwt::is_access_token_expired`].
    pub fn is_access_token_expired(token: &str) -> bool {
        jwt::is_access_token_expired(token)
    }

    /// Receives session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Replaces the whole session after login or registration.
    pub fn set_session(&self, user: User, tokens: AuthTokens) -> Result<(), StorageError> {
        let user_id = user.id;
        let user_json = serde_json::to_string(&user)?;
        let session = Session {
            user: Some(user),
            access_token: Some(tokens.access.clone()),
            refresh_token: Some(tokens.refresh.clone()),
        };

        let result = self.commit(session, |storage| {
            storage.set(ACCESS_TOKEN_KEY, &tokens.access)?;
            storage.set(REFRESH_TOKEN_KEY, &tokens.refresh)?;
            storage.set(USER_KEY, &user_json)
        });
        tracing::info!(user_id, "Session established");
        self.notify(SessionEvent::LoggedIn { user_id });
        result
    }

    /// Stores a refreshed access token, and the rotated refresh token if any.
    pub fn update_access_token(
        &self,
        access: String,
        refresh: Option<String>,
    ) -> Result<(), StorageError> {
        let result = self.commit_with(
            |current| Session {
                access_token: Some(access.clone()),
                refresh_token: refresh.clone().or_else(|| current.refresh_token.clone()),
                ..current.clone()
            },
            |storage| {
                storage.set(ACCESS_TOKEN_KEY, &access)?;
                match &refresh {
                    Some(refresh) => storage.set(REFRESH_TOKEN_KEY, refresh),
                    None => Ok(()),
                }
            },
        );
        self.notify(SessionEvent::TokenRefreshed);
        result
    }

    /// Replaces the stored profile, keeping the tokens.
    pub fn set_user(&self, user: User) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&user)?;
        self.commit_with(
            |current| Session {
                user: Some(user.clone()),
                ..current.clone()
            },
            |storage| storage.set(USER_KEY, &user_json),
        )
    }

    /// Drops the session. Idempotent; storage failures are logged, not returned.
    pub fn clear_session(&self) {
        self.clear_with(SessionEvent::LoggedOut);
    }

    /// Drops the session after an irrecoverable refresh failure.
    pub(crate) fn expire_session(&self) {
        self.clear_with(SessionEvent::Expired);
    }

    fn clear_with(&self, event: SessionEvent) {
        let result = self.commit(Session::default(), |storage| {
            storage.remove(ACCESS_TOKEN_KEY)?;
            storage.remove(REFRESH_TOKEN_KEY)?;
            storage.remove(USER_KEY)
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to remove persisted session");
        }
        tracing::info!(?event, "Session cleared");
        self.notify(event);
    }

    fn commit(
        &self,
        session: Session,
        persist: impl FnOnce(&dyn SessionStorage) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        self.commit_with(move |_| session, persist)
    }

    /// Publishes the next session then persists it, both under the write lock
    /// so storage sees writes in the same order as readers do.
    fn commit_with(
        &self,
        next: impl FnOnce(&Session) -> Session,
        persist: impl FnOnce(&dyn SessionStorage) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current.load();
        let snapshot = SessionSnapshot {
            session: next(&current.session),
            revision: current.revision + 1,
        };
        self.current.store(Arc::new(snapshot));
        persist(self.storage.as_ref())
    }

    fn notify(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}
