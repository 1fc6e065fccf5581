use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, Hooks};
use crate::error::{BoxError, ConfigError};
use crate::listener::{
    AddedListener, EvictionCause, EvictionListener, FnAddedListener, FnListener, PurgeVisitor,
};
use crate::loader::{FnLoader, Loaded, Loader};
use crate::policy::arc::ArcPolicy;
use crate::policy::lfu::LfuPolicy;
use crate::policy::lru::LruPolicy;
use crate::policy::scored::ScoredPolicy;
use crate::policy::Policy;
use crate::scorer::{FnScorer, Scorer};
use crate::weigher::{FnWeigher, Weigher};

enum PolicyKind<V> {
    Lru,
    Lfu,
    Adaptive,
    Scored {
        scorer: Box<dyn Scorer<V>>,
        weigher: Box<dyn Weigher<V>>,
    },
}

impl<V> PolicyKind<V> {
    fn name(&self) -> &'static str {
        match self {
            PolicyKind::Lru => "lru",
            PolicyKind::Lfu => "lfu",
            PolicyKind::Adaptive => "arc",
            PolicyKind::Scored { .. } => "scored",
        }
    }
}

/// Builder for configuring and constructing a [`Cache`].
///
/// The eviction policy defaults to LRU.
///
/// # Example
/// ```
/// use cairn::CacheBuilder;
/// use std::time::Duration;
///
/// let cache: cairn::Cache<String, String> = CacheBuilder::new(1_000)
///     .lfu()
///     .time_to_live(Duration::from_secs(60))
///     .build();
/// # let _ = cache;
/// ```
pub struct CacheBuilder<K, V> {
    capacity: u64,
    policy: PolicyKind<V>,
    time_to_live: Option<Duration>,
    loader: Option<Box<dyn Loader<K, V>>>,
    added: Option<Box<dyn AddedListener<K, V>>>,
    listener: Option<Box<dyn EvictionListener<K, V>>>,
    purge_visitor: Option<PurgeVisitor<K, V>>,
}

impl<K: 'static, V: 'static> CacheBuilder<K, V> {
    /// Starts a builder for a cache bounded by `capacity`.
    ///
    /// For the score-weighted policy `capacity` bounds the sum of weights;
    /// for every other policy it is the maximum number of entries.
    pub fn new(capacity: u64) -> Self {
        CacheBuilder {
            capacity,
            policy: PolicyKind::Lru,
            time_to_live: None,
            loader: None,
            added: None,
            listener: None,
            purge_visitor: None,
        }
    }

    // -----------------------------------------------------------------------
    // Policy
    // -----------------------------------------------------------------------

    /// Evict the least recently used entry.
    pub fn lru(mut self) -> Self {
        self.policy = PolicyKind::Lru;
        self
    }

    /// Evict the least frequently used entry, oldest first among equals.
    pub fn lfu(mut self) -> Self {
        self.policy = PolicyKind::Lfu;
        self
    }

    /// Adaptive replacement: balance recency against frequency using ghost
    /// lists of recently evicted keys.
    pub fn arc(mut self) -> Self {
        self.policy = PolicyKind::Adaptive;
        self
    }

    /// Evict the lowest-scored value first and bound the sum of weights.
    ///
    /// Both closures run on every write of a value.
    ///
    /// # Example
    /// ```
    /// use cairn::CacheBuilder;
    ///
    /// // Value is (priority, payload); capacity is a byte budget.
    /// let cache: cairn::Cache<&str, (i64, Vec<u8>)> = CacheBuilder::new(8)
    ///     .scored(|v: &(i64, Vec<u8>)| v.0, |v: &(i64, Vec<u8>)| v.1.len() as u64)
    ///     .build();
    ///
    /// cache.set("keep", (10, vec![0; 4]));
    /// cache.set("drop", (1, vec![0; 4]));
    /// cache.set("new", (5, vec![0; 4]));
    /// assert!(cache.contains(&"keep"));
    /// assert!(!cache.contains(&"drop"));
    /// assert_eq!(cache.weight(), 8);
    /// ```
    pub fn scored<S, W>(self, scorer: S, weigher: W) -> Self
    where
        S: Fn(&V) -> i64 + Send + Sync + 'static,
        W: Fn(&V) -> u64 + Send + Sync + 'static,
    {
        self.scored_impl(FnScorer(scorer), FnWeigher(weigher))
    }

    /// Like [`scored`](CacheBuilder::scored), with [`Scorer`] and
    /// [`Weigher`] implementations.
    pub fn scored_impl<S: Scorer<V>, W: Weigher<V>>(mut self, scorer: S, weigher: W) -> Self {
        self.policy = PolicyKind::Scored {
            scorer: Box::new(scorer),
            weigher: Box::new(weigher),
        };
        self
    }

    // -----------------------------------------------------------------------
    // Loading and expiry
    // -----------------------------------------------------------------------

    /// Populate missing keys from `f`.
    ///
    /// The closure runs outside the cache's lock, once per key no matter how
    /// many callers miss on it concurrently.  Its errors are returned to
    /// every waiting caller as [`CacheError::Load`](crate::CacheError::Load)
    /// and are not cached.
    pub fn loader<F, E>(mut self, f: F) -> Self
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.loader = Some(Box::new(FnLoader(
            move |key: &K| -> Result<Loaded<V>, BoxError> {
                f(key).map(Loaded::new).map_err(|err| err.into())
            },
        )));
        self
    }

    /// Like [`loader`](CacheBuilder::loader), where `f` also picks the
    /// loaded entry's time-to-live.
    pub fn expiring_loader<F, E>(mut self, f: F) -> Self
    where
        F: Fn(&K) -> Result<(V, Duration), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.loader = Some(Box::new(FnLoader(
            move |key: &K| -> Result<Loaded<V>, BoxError> {
                f(key)
                    .map(|(value, ttl)| Loaded::expiring(value, ttl))
                    .map_err(|err| err.into())
            },
        )));
        self
    }

    /// Populate missing keys via the [`Loader`] trait.
    pub fn loader_impl<L: Loader<K, V>>(mut self, loader: L) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Each entry expires `ttl` after it was written.
    ///
    /// Expiry is lazy: an elapsed entry reads as absent and is dropped the
    /// next time a write or an access-tracking read touches it.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Register a closure called when a key is first admitted.
    pub fn added_listener<F>(mut self, f: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.added = Some(Box::new(FnAddedListener(f)));
        self
    }

    /// Register an eviction listener closure.
    ///
    /// The closure is called **synchronously under the cache's write lock**
    /// each time an entry is evicted, expires or is removed.  Do **not** call
    /// cache methods from within the closure.
    ///
    /// # Example
    /// ```
    /// use cairn::CacheBuilder;
    ///
    /// let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
    ///     .eviction_listener(|key: &u64, _val, cause| {
    ///         println!("evicted key={key} cause={cause:?}");
    ///     })
    ///     .build();
    /// # let _ = cache;
    /// ```
    pub fn eviction_listener<F>(mut self, f: F) -> Self
    where
        F: Fn(&K, Arc<V>, EvictionCause) + Send + Sync + 'static,
    {
        self.listener = Some(Box::new(FnListener(f)));
        self
    }

    /// Register an eviction listener via the [`EvictionListener`] trait.
    pub fn eviction_listener_impl<L: EvictionListener<K, V>>(mut self, l: L) -> Self {
        self.listener = Some(Box::new(l));
        self
    }

    /// Register a closure that sees every entry dropped by
    /// [`Cache::purge`].
    pub fn purge_visitor<F>(mut self, f: F) -> Self
    where
        F: Fn(&K, Arc<V>) + Send + Sync + 'static,
    {
        self.purge_visitor = Some(Box::new(f));
        self
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Validates the configuration and builds the cache.
    pub fn try_build(self) -> Result<Cache<K, V>, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::new("capacity must be greater than 0"));
        }
        if self.time_to_live == Some(Duration::ZERO) {
            return Err(ConfigError::new("time_to_live must be greater than 0"));
        }

        let name = self.policy.name();
        let policy: Box<dyn Policy<K, V>> = match self.policy {
            PolicyKind::Lru => Box::new(LruPolicy::new(count_capacity(self.capacity)?)),
            PolicyKind::Lfu => Box::new(LfuPolicy::new(count_capacity(self.capacity)?)),
            PolicyKind::Adaptive => Box::new(ArcPolicy::new(count_capacity(self.capacity)?)),
            PolicyKind::Scored { scorer, weigher } => {
                Box::new(ScoredPolicy::new(self.capacity, scorer, weigher))
            }
        };
        tracing::debug!(capacity = self.capacity, policy = name, "building cache");

        Ok(Cache::new(
            policy,
            Hooks {
                time_to_live: self.time_to_live,
                loader: self.loader,
                added: self.added,
                listener: self.listener,
                purge_visitor: self.purge_visitor,
            },
        ))
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid; see
    /// [`try_build`](CacheBuilder::try_build).
    pub fn build(self) -> Cache<K, V> {
        match self.try_build() {
            Ok(cache) => cache,
            Err(err) => panic!("invalid cache configuration: {err}"),
        }
    }
}

/// Item-count policies index entries by `usize`.
fn count_capacity(capacity: u64) -> Result<usize, ConfigError> {
    usize::try_from(capacity)
        .map_err(|_| ConfigError::new(format!("capacity {capacity} exceeds the addressable entry count")))
}
