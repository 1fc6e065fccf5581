pub mod arc;
pub mod lfu;
pub mod lru;
pub mod scored;

use crate::entry::Entry;

/// Entries pushed out by a policy to make room, in eviction order.
pub type Evicted<K, V> = Vec<(K, Entry<V>)>;

/// Outcome of [`Policy::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The key was not present and has been admitted.
    Inserted,
    /// The key was present; its value has been replaced in place.
    Replaced,
}

/// Eviction strategy that owns the working set.
///
/// A policy holds every live entry together with its own ordering structure
/// and decides which entries leave when capacity is exceeded.  All methods
/// run under the cache's lock: `&self` methods under the shared lock,
/// `&mut self` methods under the exclusive one.  Policies never fire
/// listeners themselves; they hand evicted entries back to the cache.
pub trait Policy<K, V>: Send + Sync {
    /// Looks up `key` without touching the ordering.
    fn peek(&self, key: &K) -> Option<&Entry<V>>;

    /// Looks up `key` as a cache hit, updating recency or frequency
    /// bookkeeping where the policy keeps any.
    fn access(&mut self, key: &K) -> Option<&Entry<V>> {
        self.peek(key)
    }

    /// Whether [`access`](Policy::access) mutates the policy.  When `false`
    /// the cache serves hits under its shared lock.
    fn tracks_access(&self) -> bool {
        false
    }

    /// Inserts or replaces `key`.  Victims chosen to make room for a new key
    /// are appended to `evicted` before the key is admitted.
    fn insert(&mut self, key: K, entry: Entry<V>, evicted: &mut Evicted<K, V>) -> Admission;

    /// Removes `key`, returning its entry if present.
    fn remove(&mut self, key: &K) -> Option<Entry<V>>;

    /// Drops every entry and resets all bookkeeping.
    fn clear(&mut self);

    /// Number of entries held, expired ones included.
    fn len(&self) -> usize;

    /// Iterates over all held entries in unspecified order.
    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Entry<V>)> + '_>;

    /// Aggregate weight of the held entries.
    fn weight(&self) -> u64;

    /// Maximum aggregate weight before admissions start evicting.
    fn capacity(&self) -> u64;
}
