//! Token Refresh Interceptor.
//!
//! Wraps the [`RequestExecutor`] with one refresh-and-retry cycle per request:
//!
//! ```text
//!          401                      refresh 2xx
//!   Idle ────────► Refreshing ───────────────────► Idle  (retry once with new token)
//!                      │
//!                      │ refresh non-2xx / no refresh token
//!                      ▼
//!                   Failed  (session cleared, Expired broadcast)
//! ```
//!
//! Refreshes are single-flight: they run under an async mutex, and a task that
//! reaches the gate after the token it failed with has already been replaced
//! reuses the newer token instead of refreshing again.
//!
//! Requests sent without a token (login, registration, password reset) have
//! nothing to refresh; their 401 is returned as is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::error::ApiError;
use crate::executor::{ApiRequest, HttpOutcome, RequestExecutor};
use crate::models::{RefreshTokenRequest, RefreshTokenResponse};
use crate::session::TokenStore;

/// Refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "auth/token/refresh/";

/// Observable state of the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
    Failed,
}

/// Returns the state to `Idle` when a refresh is dropped before it settles.
struct RefreshingGuard<'a> {
    interceptor: &'a RefreshInterceptor,
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self
            .interceptor
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *state == RefreshState::Refreshing {
            *state = RefreshState::Idle;
        }
    }
}

/// Executes requests, refreshing the access token once on 401.
#[derive(Debug)]
pub struct RefreshInterceptor {
    executor: RequestExecutor,
    gate: tokio::sync::Mutex<()>,
    state: Mutex<RefreshState>,
    refresh_calls: AtomicU64,
}

impl RefreshInterceptor {
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            gate: tokio::sync::Mutex::new(()),
            state: Mutex::new(RefreshState::Idle),
            refresh_calls: AtomicU64::new(0),
        }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    fn store(&self) -> &Arc<TokenStore> {
        self.executor.store()
    }

    pub fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: RefreshState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Returns to `Idle` after a new login.
    pub fn reset(&self) {
        self.set_state(RefreshState::Idle);
    }

    /// Number of refresh calls sent so far.
    pub fn refresh_calls(&self) -> u64 {
        self.refresh_calls.load(Ordering::Relaxed)
    }

    /// Sends `req`; on 401, refreshes once and retries once.
    pub async fn send(&self, req: &ApiRequest) -> Result<Value, ApiError> {
        let snapshot = self.store().snapshot();
        let outcome = self
            .executor
            .execute_with_token(req, snapshot.access_token())
            .await?;

        let Some(sent_token) = snapshot.access_token() else {
            return outcome.into_result();
        };
        if !outcome.is_unauthorized() {
            return outcome.into_result();
        }

        tracing::debug!(path = %req.path, "Received 401, attempting token refresh");
        let token = self.refresh_after(sent_token).await?;

        let retried = self.executor.execute_with_token(req, Some(&token)).await?;
        match retried {
            HttpOutcome::Failure { status: 401, .. } => {
                tracing::warn!(path = %req.path, "Request still unauthorized after refresh");
                retried.into_result()
            }
            other => other.into_result(),
        }
    }

    /// Obtains an access token to replace `rejected`.
    ///
    /// Only one task refreshes at a time. A waiter that finds the token
    /// already replaced uses the current one, or fails if the session was
    /// cleared meanwhile.
    async fn refresh_after(&self, rejected: &str) -> Result<String, ApiError> {
        let _gate = self.gate.lock().await;

        let current = self.store().snapshot();
        match current.access_token() {
            Some(token) if token != rejected => {
                tracing::debug!("Token replaced while waiting, reusing current token");
                return Ok(token.to_string());
            }
            Some(_) => {}
            None => return Err(ApiError::session_expired(401)),
        }

        let Some(refresh) = current.refresh_token().map(str::to_string) else {
            tracing::warn!("No refresh token held, forcing logout");
            return Err(self.fail());
        };

        self.set_state(RefreshState::Refreshing);
        let _refreshing = RefreshingGuard { interceptor: self };
        self.refresh_calls.fetch_add(1, Ordering::Relaxed);

        let body = serde_json::to_value(RefreshTokenRequest { refresh }).map_err(ApiError::decode)?;
        let request = ApiRequest::post(REFRESH_PATH).with_json(body);

        let outcome = match self.executor.execute_with_token(&request, None).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The credentials were never rejected; keep them.
                tracing::warn!(error = %e, "Token refresh did not reach the server");
                self.set_state(RefreshState::Idle);
                return Err(e);
            }
        };

        match outcome {
            HttpOutcome::Success { data, .. } => {
                let tokens: RefreshTokenResponse = match serde_json::from_value(data) {
                    Ok(tokens) => tokens,
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed refresh response");
                        return Err(self.fail());
                    }
                };
                if let Err(e) = self
                    .store()
                    .update_access_token(tokens.access.clone(), tokens.refresh)
                {
                    tracing::warn!(error = %e, "Failed to persist refreshed token");
                }
                self.set_state(RefreshState::Idle);
                tracing::info!("Access token refreshed");
                Ok(tokens.access)
            }
            HttpOutcome::Failure { status, .. } => {
                tracing::warn!(status, "Token refresh rejected, forcing logout");
                Err(self.fail())
            }
        }
    }

    fn fail(&self) -> ApiError {
        self.store().expire_session();
        self.set_state(RefreshState::Failed);
        ApiError::session_expired(401)
    }
}
