//! Query Cache & Invalidation.
//!
//! Read results are keyed by [`QueryKey`] and annotated with the [`Tag`]s they
//! provide. A successful mutation invalidates tags; every entry providing a
//! matched tag is evicted, or marked stale and re-fetched if it has a live
//! [`Subscription`].

mod store;
mod tags;

pub use store::{CacheEvent, FetchTicket, QueryCache, QueryKey, Subscription};
pub use tags::{Tag, TagId, TagType};
