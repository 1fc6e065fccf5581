//! Listeners — callbacks invoked when entries enter or leave the cache.
//!
//! Every listener runs **synchronously while the cache's write lock is held**.
//! Calling back into the same cache from a listener deadlocks.
//!
//! # Example
//! ```
//! use cairn::CacheBuilder;
//! use cairn::listener::EvictionCause;
//! use std::sync::{Arc, Mutex};
//!
//! let log: Arc<Mutex<Vec<(u64, EvictionCause)>>> = Arc::new(Mutex::new(Vec::new()));
//! let log2 = Arc::clone(&log);
//!
//! let cache: cairn::Cache<u64, u64> = CacheBuilder::new(2)
//!     .eviction_listener(move |key: &u64, _val, cause| {
//!         log2.lock().unwrap().push((*key, cause));
//!     })
//!     .build();
//!
//! cache.set(1, 10);
//! cache.set(2, 20);
//! cache.set(3, 30); // capacity eviction of key 1
//! cache.remove(&2); // explicit removal
//! assert_eq!(
//!     *log.lock().unwrap(),
//!     vec![(1, EvictionCause::Capacity), (2, EvictionCause::Explicit)]
//! );
//! ```

use std::sync::Arc;

// ---------------------------------------------------------------------------
// EvictionCause
// ---------------------------------------------------------------------------

/// The reason an entry left the cache.
///
/// [`Cache::purge`](crate::Cache::purge) is not an eviction and never reports
/// a cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionCause {
    /// Chosen as the victim by the eviction policy to make room.
    Capacity,
    /// Its time-to-live elapsed and the cache noticed on a later access.
    Expired,
    /// Removed via [`Cache::remove`](crate::Cache::remove).
    Explicit,
}

// ---------------------------------------------------------------------------
// EvictionListener
// ---------------------------------------------------------------------------

/// A callback invoked each time an entry is evicted, expires or is removed.
///
/// **Do not call any cache method from inside the listener.**
pub trait EvictionListener<K, V>: Send + Sync + 'static {
    fn on_evict(&self, key: &K, value: Arc<V>, cause: EvictionCause);
}

/// An [`EvictionListener`] backed by a closure.
///
/// Created via [`CacheBuilder::eviction_listener`](crate::CacheBuilder::eviction_listener).
pub struct FnListener<F>(pub F);

impl<K, V, F> EvictionListener<K, V> for FnListener<F>
where
    F: Fn(&K, Arc<V>, EvictionCause) + Send + Sync + 'static,
{
    fn on_evict(&self, key: &K, value: Arc<V>, cause: EvictionCause) {
        (self.0)(key, value, cause)
    }
}

// ---------------------------------------------------------------------------
// AddedListener
// ---------------------------------------------------------------------------

/// A callback invoked when a key is admitted for the first time.
///
/// Replacing the value of a live key does not call it.
pub trait AddedListener<K, V>: Send + Sync + 'static {
    fn on_add(&self, key: &K, value: &V);
}

/// An [`AddedListener`] backed by a closure.
pub struct FnAddedListener<F>(pub F);

impl<K, V, F> AddedListener<K, V> for FnAddedListener<F>
where
    F: Fn(&K, &V) + Send + Sync + 'static,
{
    fn on_add(&self, key: &K, value: &V) {
        (self.0)(key, value)
    }
}

/// Visits every entry dropped by [`Cache::purge`](crate::Cache::purge).
pub(crate) type PurgeVisitor<K, V> = Box<dyn Fn(&K, Arc<V>) + Send + Sync + 'static>;
