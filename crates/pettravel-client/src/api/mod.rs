//! Typed client over the PetTravel REST API.
//!
//! [`PetTravelClient`] ties the pieces together: reads go through the
//! [`QueryCache`], every call goes through the [`RefreshInterceptor`], and
//! successful mutations invalidate the tags their [`Endpoint`] declares.

mod auth;
mod pets;
mod plans;
mod travel;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ApiResult;
use crate::cache::{QueryCache, Subscription};
use crate::config::ClientConfig;
use crate::endpoints::{Endpoint, list_items};
use crate::error::ApiError;
use crate::executor::{RequestBody, RequestExecutor};
use crate::refresh::{RefreshInterceptor, RefreshState};
use crate::session::TokenStore;

/// Attempts a live query makes to store a result that is not immediately
/// invalidated again.
const LIVE_FETCH_ATTEMPTS: usize = 3;

/// Whether a read may be answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    CacheFirst,
    NetworkOnly,
}

struct ClientInner {
    config: ClientConfig,
    store: Arc<TokenStore>,
    interceptor: RefreshInterceptor,
    cache: Arc<QueryCache>,
}

/// PetTravel API client. Cheap to clone; clones share session and cache.
#[derive(Clone)]
pub struct PetTravelClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for PetTravelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetTravelClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("authenticated", &self.inner.store.is_authenticated())
            .finish()
    }
}

impl PetTravelClient {
    pub fn new(config: ClientConfig, store: Arc<TokenStore>) -> ApiResult<Self> {
        let executor = RequestExecutor::new(&config, Arc::clone(&store))?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                store,
                interceptor: RefreshInterceptor::new(executor),
                cache: Arc::new(QueryCache::new()),
            }),
        })
    }

    /// Client with an in-memory session, mostly for tests.
    pub fn in_memory(config: ClientConfig) -> ApiResult<Self> {
        Self::new(config, Arc::new(TokenStore::in_memory()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.inner.store
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.inner.interceptor.state()
    }

    /// Refresh calls issued since the client was built.
    pub fn refresh_calls(&self) -> u64 {
        self.inner.interceptor.refresh_calls()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.store.is_authenticated()
    }

    /// Drops every cached read.
    pub fn reset(&self) {
        self.inner.cache.clear();
    }

    /// Sends one call to `endpoint`, refreshing the token on 401 when the
    /// endpoint is authenticated.
    pub async fn send(
        &self,
        endpoint: &Endpoint,
        body: Option<RequestBody>,
    ) -> ApiResult<Value> {
        let Some(mut request) = endpoint.request() else {
            return Err(ApiError::decode(format!(
                "{} has no remote route",
                endpoint.name()
            )));
        };
        request.body = body;

        let result = if endpoint.requires_auth() {
            self.inner.interceptor.send(&request).await
        } else {
            self.inner
                .interceptor
                .executor()
                .execute_with_token(&request, None)
                .await
                .and_then(|outcome| outcome.into_result())
        };

        if let Err(e) = &result {
            if e.requires_login() {
                self.inner.cache.clear();
            }
            tracing::debug!(endpoint = endpoint.name(), error = %e, "API call failed");
        }
        result
    }

    /// Reads `endpoint`, serving fresh cached data when allowed.
    pub async fn fetch(&self, endpoint: &Endpoint, policy: FetchPolicy) -> ApiResult<Value> {
        self.fetch_tracked(endpoint, policy)
            .await
            .map(|(value, _)| value)
    }

    /// Like [`fetch`](Self::fetch), also reporting whether the result was
    /// stored (or came from the cache).
    async fn fetch_tracked(
        &self,
        endpoint: &Endpoint,
        policy: FetchPolicy,
    ) -> ApiResult<(Value, bool)> {
        let Some(key) = endpoint.cache_key() else {
            return self.send(endpoint, None).await.map(|v| (v, false));
        };

        if policy == FetchPolicy::CacheFirst
            && let Some(cached) = self.inner.cache.get(&key)
        {
            tracing::trace!(%key, "Cache hit");
            return Ok((cached, true));
        }

        let ticket = self.inner.cache.begin_fetch(key);
        let value = self.send(endpoint, None).await?;
        let tags = endpoint.provides(&value);
        let stored = self.inner.cache.complete_fetch(ticket, value.clone(), tags);
        Ok((value, stored))
    }

    /// Reads and decodes `endpoint`.
    pub async fn query<T: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResult<T> {
        let value = self.fetch(&endpoint, FetchPolicy::CacheFirst).await?;
        decode(value)
    }

    /// Re-issues a read regardless of the cache (manual retry).
    pub async fn refetch<T: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResult<T> {
        let value = self.fetch(&endpoint, FetchPolicy::NetworkOnly).await?;
        decode(value)
    }

    /// Reads a list endpoint, accepting plain and paginated responses.
    pub async fn query_list<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
    ) -> ApiResult<Vec<T>> {
        let value = self.fetch(&endpoint, FetchPolicy::CacheFirst).await?;
        decode_list(value)
    }

    /// Sends a mutation and invalidates its tags once it succeeds.
    pub async fn mutate<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: Option<RequestBody>,
    ) -> ApiResult<T> {
        let value = self.send(&endpoint, body).await?;
        self.inner.cache.invalidate(&endpoint.invalidates());
        decode(value)
    }

    /// [`mutate`](Self::mutate) with a JSON body.
    pub async fn mutate_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> ApiResult<T> {
        self.mutate(endpoint, Some(json_body(body)?)).await
    }

    /// Mutation whose response body is ignored (deletes).
    pub async fn mutate_unit(&self, endpoint: Endpoint) -> ApiResult<()> {
        self.send(&endpoint, None).await?;
        self.inner.cache.invalidate(&endpoint.invalidates());
        Ok(())
    }

    /// Subscribes to `endpoint` and performs the first read.
    pub async fn watch<T: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResult<LiveQuery<T>> {
        let Some(key) = endpoint.cache_key() else {
            return Err(ApiError::decode(format!(
                "{} is not a read endpoint",
                endpoint.name()
            )));
        };
        let subscription = self.inner.cache.subscribe(key);
        let mut live = LiveQuery {
            client: self.clone(),
            endpoint,
            subscription,
            current: Value::Null,
            _marker: PhantomData,
        };
        live.load(FetchPolicy::CacheFirst).await?;
        Ok(live)
    }
}

/// A read held open like a mounted view: it re-fetches whenever one of the
/// tags its data provides is invalidated.
#[derive(Debug)]
pub struct LiveQuery<T> {
    client: PetTravelClient,
    endpoint: Endpoint,
    subscription: Subscription,
    current: Value,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> LiveQuery<T> {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The latest data, decoded.
    pub fn current(&self) -> ApiResult<T> {
        decode(self.current.clone())
    }

    /// Waits for an invalidation, then re-issues the read.
    pub async fn changed(&mut self) -> ApiResult<T> {
        self.subscription.invalidated().await;
        self.load(FetchPolicy::NetworkOnly).await?;
        self.current()
    }

    /// Re-issues the read now.
    pub async fn refetch(&mut self) -> ApiResult<T> {
        self.load(FetchPolicy::NetworkOnly).await?;
        self.current()
    }

    async fn load(&mut self, policy: FetchPolicy) -> ApiResult<()> {
        let mut policy = policy;
        for _ in 0..LIVE_FETCH_ATTEMPTS {
            let (value, stored) = self.client.fetch_tracked(&self.endpoint, policy).await?;
            self.current = value;
            if stored {
                return Ok(());
            }
            policy = FetchPolicy::NetworkOnly;
        }
        tracing::debug!(endpoint = self.endpoint.name(), "Live query kept an unstored result");
        Ok(())
    }
}

pub(crate) fn json_body<B: Serialize>(body: &B) -> ApiResult<RequestBody> {
    serde_json::to_value(body)
        .map(RequestBody::Json)
        .map_err(ApiError::decode)
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(ApiError::decode)
}

pub(crate) fn decode_list<T: DeserializeOwned>(value: Value) -> ApiResult<Vec<T>> {
    match list_items(&value) {
        Some(items) => decode(Value::Array(items.clone())),
        None => decode(value),
    }
}
