//! # pettravel-client
//!
//! Client layer for the PetTravel REST API.
//!
//! This crate provides:
//! - A persistent session store with lock-free snapshots
//! - An authenticated request executor with uniform error normalisation
//! - Single-flight token refresh with one retry per request
//! - A tag-based query cache invalidated by successful mutations
//! - Typed endpoints for auth, pets, travel plans and the requirement catalogue
//!
//! ## Modules
//!
//! - [`session`] - Token Store and its storage backends
//! - [`executor`] - One HTTP call with the bearer token attached
//! - [`refresh`] - Token refresh interceptor
//! - [`cache`] - Cache tags and the query cache
//! - [`endpoints`] - Endpoint registry: routes, provided and invalidated tags
//! - [`api`] - [`PetTravelClient`] and [`LiveQuery`]
//! - [`models`] - Wire types
//! - [`validation`] - Form checks run before sending
//! - [`planning`] - Date rules, requirement urgency, dashboard aggregates
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pettravel_client::{ClientConfig, PetTravelClient, TokenStore, FileStorage};
//!
//! let store = Arc::new(TokenStore::load(Arc::new(FileStorage::new(dir)?)));
//! let client = PetTravelClient::new(ClientConfig::from_env()?, store)?;
//! client.login("me@example.com", "Secret!123").await?;
//! for pet in client.pets().await? {
//!     println!("{} ({})", pet.name, pet.kind);
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod executor;
pub mod models;
pub mod planning;
pub mod refresh;
pub mod session;
pub mod validation;

pub use api::{FetchPolicy, LiveQuery, PetTravelClient};
pub use cache::{CacheEvent, QueryCache, QueryKey, Subscription, Tag, TagId, TagType};
pub use config::{ClientConfig, ConfigError};
pub use endpoints::Endpoint;
pub use error::{ApiError, ErrorKind, NetworkErrorKind};
pub use executor::{ApiRequest, HttpOutcome, RequestExecutor};
pub use refresh::{RefreshInterceptor, RefreshState};
pub use session::{
    FileStorage, MemoryStorage, Session, SessionEvent, SessionSnapshot, SessionStorage,
    StorageError, TokenStore,
};

/// Result alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;
