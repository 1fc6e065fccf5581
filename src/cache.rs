use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::builder::CacheBuilder;
use crate::entry::Entry;
use crate::error::CacheError;
use crate::flight::LoadGroup;
use crate::listener::{AddedListener, EvictionCause, EvictionListener, PurgeVisitor};
use crate::loader::{Loaded, Loader};
use crate::metrics::stats::{Metrics, StatsCounter};
use crate::policy::{Admission, Policy};

// ---------------------------------------------------------------------------
// Cache interior
// ---------------------------------------------------------------------------

/// Everything a [`Cache`] is built from besides its policy.
pub(crate) struct Hooks<K, V> {
    pub(crate) time_to_live: Option<Duration>,
    pub(crate) loader: Option<Box<dyn Loader<K, V>>>,
    pub(crate) added: Option<Box<dyn AddedListener<K, V>>>,
    pub(crate) listener: Option<Box<dyn EvictionListener<K, V>>>,
    pub(crate) purge_visitor: Option<PurgeVisitor<K, V>>,
}

/// Shared interior of a [`Cache`].
struct Inner<K, V> {
    policy: RwLock<Box<dyn Policy<K, V>>>,
    /// Whether hits must take the exclusive lock.
    tracks_access: bool,
    /// Set once any entry has been written with a deadline.
    may_expire: AtomicBool,
    flights: LoadGroup<K, Arc<V>>,
    hooks: Hooks<K, V>,
    metrics: StatsCounter,
}

// ---------------------------------------------------------------------------
// Cache handle
// ---------------------------------------------------------------------------

/// A concurrent in-memory cache with a pluggable eviction policy.
///
/// Cloning is cheap and yields another handle to the same cache.
///
/// # Example
/// ```
/// use cairn::CacheBuilder;
///
/// let cache: cairn::Cache<String, String> = CacheBuilder::new(100).build();
/// cache.set("hello".to_string(), "world".to_string());
/// assert_eq!(*cache.get(&"hello".to_string()).unwrap(), "world");
/// assert!(cache.get(&"bye".to_string()).unwrap_err().is_not_found());
/// ```
pub struct Cache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Cache {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = self.inner.policy.read();
        f.debug_struct("Cache")
            .field("entries", &policy.len())
            .field("weight", &policy.weight())
            .field("capacity", &policy.capacity())
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub(crate) fn new(policy: Box<dyn Policy<K, V>>, hooks: Hooks<K, V>) -> Self {
        Cache {
            inner: Arc::new(Inner {
                tracks_access: policy.tracks_access(),
                may_expire: AtomicBool::new(hooks.time_to_live.is_some()),
                policy: RwLock::new(policy),
                flights: LoadGroup::new(),
                hooks,
                metrics: StatsCounter::new(),
            }),
        }
    }

    /// Returns a [`CacheBuilder`] for constructing a new cache.
    pub fn builder(capacity: u64) -> CacheBuilder<K, V> {
        CacheBuilder::new(capacity)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Returns the value for `key`, loading it on a miss if the cache has a
    /// loader.
    ///
    /// Concurrent misses on the same key share one loader call and all
    /// observe its outcome.  Without a loader a miss is
    /// [`CacheError::KeyNotFound`].
    pub fn get(&self, key: &K) -> Result<Arc<V>, CacheError> {
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }
        if self.inner.hooks.loader.is_none() {
            return Err(CacheError::KeyNotFound);
        }
        let (result, _) = self.inner.flights.work(key, || {
            // A load that finished while we were joining may already have
            // committed the value.
            if let Some(value) = self.peek_live(key) {
                return Ok(value);
            }
            self.load_and_commit(key)
        });
        result
    }

    /// Returns the value for `key` without ever invoking the loader.
    pub fn get_if_present(&self, key: &K) -> Result<Arc<V>, CacheError> {
        self.lookup(key).ok_or(CacheError::KeyNotFound)
    }

    /// Snapshot of every live entry.  Does not count toward hit statistics
    /// or change eviction order.
    pub fn get_all(&self) -> HashMap<K, Arc<V>> {
        let now = Instant::now();
        let policy = self.inner.policy.read();
        policy
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), Arc::clone(&entry.value)))
            .collect()
    }

    /// Live keys in unspecified order.
    pub fn keys(&self) -> Vec<K> {
        let now = Instant::now();
        let policy = self.inner.policy.read();
        policy
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let policy = self.inner.policy.read();
        if !self.inner.may_expire.load(Ordering::Relaxed) {
            return policy.len();
        }
        let now = Instant::now();
        policy.iter().filter(|(_, entry)| !entry.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` has a live entry.  No statistics, no reordering.
    pub fn contains(&self, key: &K) -> bool {
        self.peek_live(key).is_some()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Inserts or replaces the value for `key`.
    ///
    /// The entry expires after the cache's default time-to-live, if any.
    /// Admitting a new key may evict others.
    pub fn set(&self, key: K, value: V) {
        self.commit(key, Arc::new(value), self.inner.hooks.time_to_live);
    }

    /// Like [`set`](Cache::set), with a time-to-live for this entry only.
    pub fn set_with_expiry(&self, key: K, value: V, ttl: Duration) {
        self.commit(key, Arc::new(value), Some(ttl));
    }

    /// Removes `key`, returning whether a live entry was present.
    ///
    /// The eviction listener sees [`EvictionCause::Explicit`].
    pub fn remove(&self, key: &K) -> bool {
        let mut policy = self.inner.policy.write();
        let Some(entry) = policy.remove(key) else {
            return false;
        };
        let cause = if entry.is_expired(Instant::now()) {
            EvictionCause::Expired
        } else {
            EvictionCause::Explicit
        };
        self.notify(key, entry.value, cause);
        cause == EvictionCause::Explicit
    }

    /// Drops every entry.
    ///
    /// The eviction listener is not called; the purge visitor, if configured,
    /// sees each entry instead.
    pub fn purge(&self) {
        let mut policy = self.inner.policy.write();
        if let Some(visit) = &self.inner.hooks.purge_visitor {
            for (key, entry) in policy.iter() {
                visit(key, Arc::clone(&entry.value));
            }
        }
        let count = policy.len();
        policy.clear();
        tracing::debug!(count, "purged cache");
    }

    /// Reloads `key` on a background thread while readers keep seeing the
    /// current value.
    ///
    /// Returns `None` if the cache has no loader or a load for `key` is
    /// already in flight.  Callers that miss on `key` before the refresh
    /// completes wait for it instead of starting their own load.
    pub fn refresh(&self, key: K) -> Option<JoinHandle<Result<Arc<V>, CacheError>>> {
        self.inner.hooks.loader.as_ref()?;
        let flight = self.inner.flights.try_begin(&key)?;
        let cache = self.clone();
        Some(thread::spawn(move || {
            let result = cache.load_and_commit(flight.key());
            flight.finish(result.clone());
            result
        }))
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Aggregate weight of the held entries; the entry count for
    /// count-bounded policies.
    ///
    /// Unlike [`len`](Cache::len) this includes entries whose time-to-live
    /// has elapsed but which no write has removed yet, since they still
    /// occupy capacity until then.
    pub fn weight(&self) -> u64 {
        self.inner.policy.read().weight()
    }

    pub fn capacity(&self) -> u64 {
        self.inner.policy.read().capacity()
    }

    pub fn stats(&self) -> Metrics {
        self.inner.metrics.snapshot()
    }

    pub fn hit_count(&self) -> u64 {
        self.inner.metrics.hits()
    }

    pub fn miss_count(&self) -> u64 {
        self.inner.metrics.misses()
    }

    pub fn lookup_count(&self) -> u64 {
        self.hit_count() + self.miss_count()
    }

    /// `hits / lookups`, or `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        self.inner.metrics.snapshot().hit_rate
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Looks `key` up as a hit or a miss.
    fn lookup(&self, key: &K) -> Option<Arc<V>> {
        let now = Instant::now();
        let found = if self.inner.tracks_access {
            let mut policy = self.inner.policy.write();
            let expired = policy.peek(key).map(|entry| entry.is_expired(now));
            match expired {
                None => None,
                Some(true) => {
                    self.expire(&mut **policy, key);
                    None
                }
                Some(false) => policy.access(key).map(|entry| Arc::clone(&entry.value)),
            }
        } else {
            let policy = self.inner.policy.read();
            policy
                .peek(key)
                .filter(|entry| !entry.is_expired(now))
                .map(|entry| Arc::clone(&entry.value))
        };
        match &found {
            Some(_) => self.inner.metrics.record_hit(),
            None => self.inner.metrics.record_miss(),
        }
        found
    }

    fn peek_live(&self, key: &K) -> Option<Arc<V>> {
        let now = Instant::now();
        let policy = self.inner.policy.read();
        policy
            .peek(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Runs the loader for `key` and commits a successful result.
    fn load_and_commit(&self, key: &K) -> Result<Arc<V>, CacheError> {
        let loader = self
            .inner
            .hooks
            .loader
            .as_deref()
            .ok_or(CacheError::KeyNotFound)?;
        tracing::debug!("loading missing key");
        match loader.load(key) {
            Ok(Loaded { value, expires_in }) => {
                self.inner.metrics.record_load(true);
                let value = Arc::new(value);
                let ttl = expires_in.or(self.inner.hooks.time_to_live);
                self.commit(key.clone(), Arc::clone(&value), ttl);
                Ok(value)
            }
            Err(err) => {
                self.inner.metrics.record_load(false);
                tracing::debug!(error = %err, "loader failed");
                Err(CacheError::load(err))
            }
        }
    }

    /// Writes `value` under the exclusive lock, dispatching every listener
    /// the write triggers.
    fn commit(&self, key: K, value: Arc<V>, ttl: Option<Duration>) {
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        if expires_at.is_some() {
            self.inner.may_expire.store(true, Ordering::Relaxed);
        }
        let added_key = self.inner.hooks.added.as_ref().map(|_| key.clone());
        let mut evicted = Vec::new();

        let mut policy = self.inner.policy.write();
        let now = Instant::now();
        if policy.peek(&key).is_some_and(|entry| entry.is_expired(now)) {
            self.expire(&mut **policy, &key);
        }
        let admission = policy.insert(key, Entry::new(Arc::clone(&value), expires_at), &mut evicted);

        if !evicted.is_empty() {
            tracing::trace!(count = evicted.len(), "evicted entries to make room");
        }
        for (victim, entry) in evicted {
            if entry.is_expired(now) {
                self.notify(&victim, entry.value, EvictionCause::Expired);
            } else {
                self.inner.metrics.record_eviction(1);
                self.notify(&victim, entry.value, EvictionCause::Capacity);
            }
        }

        if admission == Admission::Inserted {
            if let (Some(added), Some(key)) = (&self.inner.hooks.added, added_key) {
                added.on_add(&key, &value);
            }
        }
    }

    /// Removes an entry already known to be expired.
    fn expire(&self, policy: &mut dyn Policy<K, V>, key: &K) {
        if let Some(entry) = policy.remove(key) {
            tracing::trace!("dropping expired entry");
            self.notify(key, entry.value, EvictionCause::Expired);
        }
    }

    fn notify(&self, key: &K, value: Arc<V>, cause: EvictionCause) {
        if let Some(listener) = &self.inner.hooks.listener {
            listener.on_evict(key, value, cause);
        }
    }
}
