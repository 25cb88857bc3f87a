use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;

use super::tags::{Tag, TagType};

/// Invalidations remembered for in-flight fetches.
const INVALIDATION_LOG_LEN: usize = 128;

/// Capacity of the cache event channel.
const EVENT_CAPACITY: usize = 64;

/// Identity of one cached read: endpoint plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notifications sent to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// The entry went stale and must be re-issued.
    Invalidated(QueryKey),
    /// Fresh data was stored for the entry.
    Updated(QueryKey),
    /// Every entry was dropped.
    Cleared,
}

#[derive(Debug, Default)]
struct CacheEntry {
    data: Option<Value>,
    tags: Vec<Tag>,
    stale: bool,
    subscribers: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<QueryKey, CacheEntry>,
    /// Sequence number of the latest invalidation.
    seq: u64,
    /// Recent invalidations, oldest first.
    log: VecDeque<(u64, Vec<Tag>)>,
    /// Highest sequence number dropped from `log`.
    floor: u64,
}

impl CacheInner {
    fn record(&mut self, tags: Vec<Tag>) {
        self.seq += 1;
        self.log.push_back((self.seq, tags));
        while self.log.len() > INVALIDATION_LOG_LEN {
            if let Some((seq, _)) = self.log.pop_front() {
                self.floor = seq;
            }
        }
    }

    /// Whether an invalidation after `since` touched any of `tags`.
    fn invalidated_since(&self, since: u64, tags: &[Tag]) -> bool {
        if since < self.floor {
            return true;
        }
        self.log
            .iter()
            .filter(|(seq, _)| *seq > since)
            .any(|(_, invalidated)| {
                invalidated
                    .iter()
                    .any(|inv| tags.iter().any(|provided| inv.invalidates(provided)))
            })
    }
}

/// Marker handed out when a read starts; completing it stores the result.
#[derive(Debug)]
#[must_use = "a fetch ticket does nothing unless completed"]
pub struct FetchTicket {
    key: QueryKey,
    seq: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

/// Tag-indexed cache of read results.
///
/// Entries are stored only from completed fetches that no intervening
/// invalidation touched, so data invalidated while a read was in flight is
/// never served.
#[derive(Debug)]
pub struct QueryCache {
    inner: Mutex<CacheInner>,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(CacheInner::default()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: CacheEvent) {
        let _ = self.events.send(event);
    }

    /// Fresh data for `key`. Stale entries are never returned.
    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        let inner = self.lock();
        inner
            .entries
            .get(key)
            .filter(|e| !e.stale)
            .and_then(|e| e.data.clone())
    }

    /// Whether `key` holds data that must be refetched before use.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.lock().entries.get(key).is_some_and(|e| e.stale)
    }

    /// Tags provided by the data stored for `key`.
    pub fn provided_tags(&self, key: &QueryKey) -> Vec<Tag> {
        self.lock()
            .entries
            .get(key)
            .map(|e| e.tags.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock()
            .entries
            .values()
            .filter(|e| e.data.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a read of `key`.
    pub fn begin_fetch(&self, key: QueryKey) -> FetchTicket {
        let seq = self.lock().seq;
        FetchTicket { key, seq }
    }

    /// Stores a read result unless an invalidation since the ticket was
    /// issued touched the tags it provides. Returns whether it was stored.
    pub fn complete_fetch(&self, ticket: FetchTicket, data: Value, tags: Vec<Tag>) -> bool {
        let mut inner = self.lock();
        if inner.invalidated_since(ticket.seq, &tags) {
            tracing::debug!(key = %ticket.key, "Discarding response invalidated while in flight");
            return false;
        }
        let entry = inner.entries.entry(ticket.key.clone()).or_default();
        entry.data = Some(data);
        entry.tags = tags;
        entry.stale = false;
        drop(inner);

        self.emit(CacheEvent::Updated(ticket.key));
        true
    }

    /// Invalidates every entry that provided a tag matched by `tags`.
    ///
    /// Entries with subscribers are marked stale and their subscribers
    /// notified; entries without subscribers are evicted. Returns the
    /// affected keys.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<QueryKey> {
        if tags.is_empty() {
            return Vec::new();
        }

        let mut inner = self.lock();
        inner.record(tags.to_vec());

        let affected: Vec<QueryKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry
                    .tags
                    .iter()
                    .any(|provided| tags.iter().any(|t| t.invalidates(provided)))
            })
            .map(|(key, _)| key.clone())
            .collect();

        let mut notify = Vec::new();
        for key in &affected {
            let evict = match inner.entries.get_mut(key) {
                Some(entry) if entry.subscribers > 0 => {
                    entry.stale = true;
                    notify.push(key.clone());
                    false
                }
                Some(_) => true,
                None => false,
            };
            if evict {
                inner.entries.remove(key);
            }
        }
        drop(inner);

        let tags_display: Vec<String> = tags.iter().map(ToString::to_string).collect();
        tracing::debug!(tags = ?tags_display, affected = affected.len(), "Invalidated cache tags");

        for key in notify {
            self.emit(CacheEvent::Invalidated(key));
        }
        affected
    }

    /// Drops all cached data (logout). In-flight reads are discarded too.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.record(TagType::ALL.into_iter().map(Tag::of).collect());
        inner.entries.retain(|_, entry| entry.subscribers > 0);
        for entry in inner.entries.values_mut() {
            entry.data = None;
            entry.tags.clear();
            entry.stale = true;
        }
        drop(inner);

        tracing::debug!("Cleared query cache");
        self.emit(CacheEvent::Cleared);
    }

    /// Registers a consumer of `key`, the way a mounted view holds a query.
    pub fn subscribe(self: &Arc<Self>, key: QueryKey) -> Subscription {
        let rx = self.events.subscribe();
        self.lock().entries.entry(key.clone()).or_default().subscribers += 1;
        Subscription {
            cache: Arc::clone(self),
            key,
            rx,
        }
    }

    /// Receives every cache event.
    pub fn events(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn unsubscribe(&self, key: &QueryKey) {
        let mut inner = self.lock();
        let remove = match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.subscribers = entry.subscribers.saturating_sub(1);
                entry.subscribers == 0 && (entry.stale || entry.data.is_none())
            }
            None => false,
        };
        if remove {
            inner.entries.remove(key);
        }
    }
}

/// A live interest in one cache key. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    cache: Arc<QueryCache>,
    key: QueryKey,
    rx: broadcast::Receiver<CacheEvent>,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Waits until the subscribed entry is invalidated or the cache cleared.
    ///
    /// A lagging receiver may have missed the event, so lag counts as an
    /// invalidation.
    pub async fn invalidated(&mut self) {
        loop {
            match self.rx.recv().await {
                Ok(CacheEvent::Invalidated(key)) if key == self.key => return,
                Ok(CacheEvent::Cleared) => return,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => return,
                Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.unsubscribe(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tags::TagType;
    use serde_json::json;

    fn key(s: &str) -> QueryKey {
        QueryKey::new(s)
    }

    fn store(cache: &QueryCache, k: &str, data: Value, tags: Vec<Tag>) {
        let ticket = cache.begin_fetch(key(k));
        assert!(cache.complete_fetch(ticket, data, tags));
    }

    #[test]
    fn test_list_invalidation_keeps_unrelated_items() {
        let cache = QueryCache::new();
        store(
            &cache,
            "requirements",
            json!([]),
            vec![Tag::list(TagType::Requirements)],
        );
        store(
            &cache,
            "requirement/5",
            json!({"id": 5}),
            vec![Tag::item(TagType::Requirements, 5)],
        );

        let affected = cache.invalidate(&[Tag::list(TagType::Requirements)]);

        assert_eq!(affected, vec![key("requirements")]);
        assert_eq!(cache.get(&key("requirements")), None);
        assert_eq!(cache.get(&key("requirement/5")), Some(json!({"id": 5})));
    }

    #[test]
    fn test_bare_type_invalidates_all_of_type() {
        let cache = QueryCache::new();
        store(&cache, "pets", json!([]), vec![Tag::list(TagType::Pets)]);
        store(&cache, "pet/1", json!({}), vec![Tag::item(TagType::Pets, 1)]);
        store(&cache, "plans", json!([]), vec![Tag::list(TagType::TravelPlans)]);

        let mut affected = cache.invalidate(&[Tag::of(TagType::Pets)]);
        affected.sort();
        assert_eq!(affected, vec![key("pet/1"), key("pets")]);
        assert!(cache.get(&key("plans")).is_some());
    }

    #[test]
    fn test_in_flight_read_invalidated_is_discarded() {
        let cache = QueryCache::new();
        let ticket = cache.begin_fetch(key("plans"));

        cache.invalidate(&[Tag::list(TagType::TravelPlans)]);

        let stored = cache.complete_fetch(
            ticket,
            json!([{"id": 1}]),
            vec![Tag::list(TagType::TravelPlans), Tag::item(TagType::TravelPlans, 1)],
        );
        assert!(!stored);
        assert_eq!(cache.get(&key("plans")), None);
    }

    #[test]
    fn test_in_flight_read_unrelated_invalidation_is_kept() {
        let cache = QueryCache::new();
        let ticket = cache.begin_fetch(key("countries"));
        cache.invalidate(&[Tag::list(TagType::Pets)]);
        assert!(cache.complete_fetch(ticket, json!([]), vec![Tag::list(TagType::Countries)]));
        assert!(cache.get(&key("countries")).is_some());
    }

    #[test]
    fn test_old_tickets_are_discarded_after_log_rollover() {
        let cache = QueryCache::new();
        let ticket = cache.begin_fetch(key("countries"));
        for _ in 0..=INVALIDATION_LOG_LEN {
            cache.invalidate(&[Tag::of(TagType::Pets)]);
        }
        assert!(!cache.complete_fetch(ticket, json!([]), vec![Tag::list(TagType::Countries)]));
    }

    #[tokio::test]
    async fn test_subscribed_entry_is_marked_stale_and_notified() {
        let cache = Arc::new(QueryCache::new());
        let mut sub = cache.subscribe(key("plan/3"));
        store(
            &cache,
            "plan/3",
            json!({"id": 3}),
            vec![Tag::item(TagType::TravelPlans, 3)],
        );

        cache.invalidate(&[Tag::item(TagType::TravelPlans, 3)]);

        assert!(cache.is_stale(&key("plan/3")));
        assert_eq!(cache.get(&key("plan/3")), None);
        tokio::time::timeout(std::time::Duration::from_secs(1), sub.invalidated())
            .await
            .expect("subscriber should be notified");
    }

    #[test]
    fn test_dropping_last_subscriber_evicts_stale_entry() {
        let cache = Arc::new(QueryCache::new());
        let sub = cache.subscribe(key("pets"));
        store(&cache, "pets", json!([]), vec![Tag::list(TagType::Pets)]);
        cache.invalidate(&[Tag::list(TagType::Pets)]);
        assert!(cache.is_stale(&key("pets")));

        drop(sub);
        assert!(!cache.is_stale(&key("pets")));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_drops_data_and_in_flight() {
        let cache = QueryCache::new();
        store(&cache, "profile", json!({"id": 1}), vec![Tag::of(TagType::Profile)]);
        let ticket = cache.begin_fetch(key("pets"));

        cache.clear();

        assert!(cache.is_empty());
        assert!(!cache.complete_fetch(ticket, json!([]), vec![Tag::list(TagType::Pets)]));
    }
}
